//! Dominator tree computation using the iterative reverse-postorder algorithm.
//!
//! # Theory
//!
//! A node `d` **dominates** a node `n` if every path from the entry node to `n`
//! must pass through `d`. The **immediate dominator** of `n` (idom(n)) is the
//! unique node that strictly dominates `n` but does not strictly dominate any
//! other dominator of `n`.
//!
//! # Algorithm
//!
//! This is the Cooper-Harvey-Kennedy formulation: nodes are visited in reverse
//! postorder, each node's idom is the intersection of the dominator chains of its
//! already-processed predecessors, and full passes repeat until no idom changes.
//! `intersect` compares nodes by reverse-postorder index and walks whichever finger
//! has the larger index up its idom chain until both meet. For the block counts of
//! a single bytecode function this beats Lengauer-Tarjan in practice and keeps the
//! per-node state to two vectors.

use crate::utils::graph::{NodeId, Predecessors, Successors};

use super::traversal::reverse_postorder;

/// Result of dominator tree computation.
///
/// Each reachable node except the entry has exactly one immediate dominator.
/// Nodes unreachable from the entry have none and are dominated only by themselves.
///
/// # Examples
///
/// ```rust,ignore
/// let tree = compute_dominators(&cfg, entry);
/// assert!(tree.dominates(entry, exit));
/// assert_eq!(tree.immediate_dominator(b), Some(a));
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// The entry (root) node of the dominator tree
    entry: NodeId,
    /// Immediate dominator for each node; the entry maps to itself, unreachable nodes to `None`
    idom: Vec<Option<NodeId>>,
}

impl DominatorTree {
    /// Returns the entry (root) node of the dominator tree.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the immediate dominator of a node, or `None` for the entry node and
    /// for nodes unreachable from the entry.
    ///
    /// # Panics
    ///
    /// Panics if the node index is out of bounds.
    #[inline]
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.entry {
            None
        } else {
            self.idom[node.index()]
        }
    }

    /// Returns `true` if `node` is reachable from the entry.
    #[inline]
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.idom.get(node.index()).is_some_and(Option::is_some)
    }

    /// Checks if node `a` dominates node `b`.
    ///
    /// A node dominates itself. The entry node dominates all reachable nodes.
    ///
    /// # Complexity
    ///
    /// O(depth) where depth is the depth of `b` in the dominator tree.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        self.dominators(b).any(|d| d == a)
    }

    /// Checks if node `a` strictly dominates node `b` (`a` dominates `b` and `a != b`).
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns an iterator over all dominators of a node, from the node itself up to
    /// (and including) the entry node.
    ///
    /// For an unreachable node the iterator yields only the node itself.
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: Some(node),
        }
    }

    /// Returns the depth of a node in the dominator tree (entry has depth 0).
    #[must_use]
    pub fn depth(&self, node: NodeId) -> usize {
        self.dominators(node).count().saturating_sub(1)
    }

    /// Returns all children of a node in the dominator tree.
    ///
    /// # Complexity
    ///
    /// O(V) where V is the number of nodes.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.idom.len())
            .map(NodeId::new)
            .filter(|&n| n != self.entry && self.idom[n.index()] == Some(node))
            .collect()
    }

    /// Returns the number of nodes covered by the tree (reachable or not).
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }
}

/// Iterator over dominators of a node, from the node up to the entry.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = match self.tree.idom.get(current.index()).copied().flatten() {
            Some(parent) if parent != current => Some(parent),
            _ => None,
        };
        Some(current)
    }
}

/// Computes the dominator tree of all nodes reachable from `entry`.
///
/// # Arguments
///
/// * `graph` - The graph to analyze
/// * `entry` - The root node
///
/// # Returns
///
/// A `DominatorTree` containing the dominator relationships.
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Successors + Predecessors,
{
    let order = reverse_postorder(graph, entry);
    compute_dominators_in_order(graph, &order)
}

/// Computes the dominator tree using a caller-supplied reverse postorder.
///
/// `order[0]` is taken as the entry. Nodes absent from `order` are treated as
/// unreachable. This entry point lets graphs with their own traversal machinery
/// (the control flow graph's epoch-marked walk) reuse the fixed point.
pub fn compute_dominators_in_order<G>(graph: &G, order: &[NodeId]) -> DominatorTree
where
    G: Predecessors,
{
    let node_count = graph.node_count();
    let mut idom: Vec<Option<NodeId>> = vec![None; node_count];

    let Some(&entry) = order.first() else {
        return DominatorTree {
            entry: NodeId::new(0),
            idom,
        };
    };

    let mut rpo_index = vec![usize::MAX; node_count];
    for (position, node) in order.iter().enumerate() {
        rpo_index[node.index()] = position;
    }

    idom[entry.index()] = Some(entry);

    let mut changed = true;
    while changed {
        changed = false;

        for &node in &order[1..] {
            let mut new_idom: Option<NodeId> = None;
            for pred in graph.predecessors(node) {
                // Unprocessed or unreachable predecessors carry no information yet
                if idom[pred.index()].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => pred,
                    Some(current) => intersect(&idom, &rpo_index, entry, pred, current),
                });
            }

            if let Some(new_idom) = new_idom {
                if idom[node.index()] != Some(new_idom) {
                    idom[node.index()] = Some(new_idom);
                    changed = true;
                }
            }
        }
    }

    DominatorTree { entry, idom }
}

/// Walks two dominator chains toward the root until they meet.
fn intersect(
    idom: &[Option<NodeId>],
    rpo_index: &[usize],
    entry: NodeId,
    mut finger1: NodeId,
    mut finger2: NodeId,
) -> NodeId {
    while finger1 != finger2 {
        while rpo_index[finger1.index()] > rpo_index[finger2.index()] {
            finger1 = idom[finger1.index()].unwrap_or(entry);
        }
        while rpo_index[finger2.index()] > rpo_index[finger1.index()] {
            finger2 = idom[finger2.index()].unwrap_or(entry);
        }
    }
    finger1
}
