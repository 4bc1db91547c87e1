//! Trait definitions for graph abstractions.
//!
//! The trait hierarchy is minimal and composable:
//!
//! - [`GraphBase`] - Core properties: node count and node iteration
//! - [`Successors`] - Forward edge traversal (outgoing edges)
//! - [`Predecessors`] - Backward edge traversal (incoming edges)
//! - [`RootedGraph`] - Graphs with a designated entry node (for dominator computation)
//!
//! All adjacency queries return iterators rather than collections, so simple
//! traversals do not allocate.

use crate::utils::graph::NodeId;

/// Base trait providing core graph properties.
pub trait GraphBase {
    /// Returns the number of nodes in the graph.
    ///
    /// Node identifiers are dense: every id in `0..node_count()` is valid.
    fn node_count(&self) -> usize;

    /// Returns an iterator over all node identifiers in the graph, by ascending index.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns an iterator over the successor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `v` is a successor of `u`. A node with
    /// two parallel edges to the same target yields that target twice.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns an iterator over the predecessor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `u` is a predecessor of `v`.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs with a designated entry (root) node.
///
/// In a control flow graph this is the first basic block of the function; in the
/// reversed graph used for post-dominance it is the virtual exit.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry (root) node of the graph.
    fn entry(&self) -> NodeId;
}
