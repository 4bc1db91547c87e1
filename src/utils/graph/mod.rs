//! Generic graph infrastructure for control flow analysis.
//!
//! The control flow graph, the interval graphs of its derived sequence and the
//! reversed view used for post-dominance all expose the same small trait surface.
//! Algorithms in [`algorithms`] are written against those traits, so dominance and
//! traversal code is shared instead of being re-implemented per graph shape.
//!
//! # Key Components
//!
//! - [`NodeId`] - Strongly-typed vertex identifier
//! - [`GraphBase`], [`Successors`], [`Predecessors`], [`RootedGraph`] - Abstraction traits
//! - [`algorithms`] - Postorder traversal and iterative dominator computation
//!
//! # Usage Examples
//!
//! ```rust
//! use smxscope::utils::graph::{algorithms, GraphBase, NodeId, Predecessors, Successors};
//!
//! // A diamond: 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
//! struct Diamond;
//!
//! static EDGES: [(usize, usize); 4] = [(0, 1), (0, 2), (1, 3), (2, 3)];
//!
//! impl GraphBase for Diamond {
//!     fn node_count(&self) -> usize { 4 }
//!     fn node_ids(&self) -> impl Iterator<Item = NodeId> { (0..4).map(NodeId::new) }
//! }
//!
//! impl Successors for Diamond {
//!     fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
//!         EDGES.iter().filter(move |e| e.0 == node.index()).map(|e| NodeId::new(e.1))
//!     }
//! }
//!
//! impl Predecessors for Diamond {
//!     fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
//!         EDGES.iter().filter(move |e| e.1 == node.index()).map(|e| NodeId::new(e.0))
//!     }
//! }
//!
//! let tree = algorithms::compute_dominators(&Diamond, NodeId::new(0));
//! assert_eq!(tree.immediate_dominator(NodeId::new(3)), Some(NodeId::new(0)));
//! ```

pub mod algorithms;
mod node;
mod traits;

pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
