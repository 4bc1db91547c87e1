//! Depth-first orderings.
//!
//! Both traversals are iterative (explicit stack), so deeply nested control flow
//! cannot overflow the call stack.

use crate::utils::graph::{NodeId, Successors};

/// Computes the postorder of all nodes reachable from `start`.
///
/// Successors are explored in their natural order, so for a conditional branch the
/// true target's subtree is finished before the false target's.
///
/// # Arguments
///
/// * `graph` - The graph to traverse
/// * `start` - The starting node for traversal
///
/// # Returns
///
/// A vector of `NodeId` in postorder, or an empty vector when `start` is out of range.
///
/// # Complexity
///
/// - Time: O(V + E)
/// - Space: O(V)
#[allow(clippy::items_after_statements)]
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return Vec::new();
    }

    let mut visited = vec![false; node_count];
    let mut result = Vec::with_capacity(node_count);

    #[derive(Clone, Copy)]
    enum State {
        Enter,
        Exit,
    }

    let mut stack = vec![(start, State::Enter)];
    while let Some((node, state)) = stack.pop() {
        match state {
            State::Enter => {
                if visited[node.index()] {
                    continue;
                }
                visited[node.index()] = true;
                stack.push((node, State::Exit));

                // Reverse push so the first successor is explored first
                let successors: Vec<NodeId> = graph.successors(node).collect();
                for &succ in successors.iter().rev() {
                    if !visited[succ.index()] {
                        stack.push((succ, State::Enter));
                    }
                }
            }
            State::Exit => result.push(node),
        }
    }

    result
}

/// Computes the reverse postorder of all nodes reachable from `start`.
///
/// In reverse postorder every node precedes its successors except along back
/// edges, which is the iteration order the dominator fixed point relies on.
///
/// # Examples
///
/// ```rust,ignore
/// let order = reverse_postorder(&graph, entry);
/// assert_eq!(order.first(), Some(&entry));
/// ```
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut result = postorder(graph, start);
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::algorithms::testgraph::TestGraph;

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId::new(i)).collect()
    }

    #[test]
    fn test_postorder_linear() {
        let graph = TestGraph::new(3, &[(0, 1), (1, 2)]);
        assert_eq!(postorder(&graph, NodeId::new(0)), ids(&[2, 1, 0]));
    }

    #[test]
    fn test_reverse_postorder_diamond() {
        let graph = TestGraph::new(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let order = reverse_postorder(&graph, NodeId::new(0));
        assert_eq!(order, ids(&[0, 2, 1, 3]));
    }

    #[test]
    fn test_postorder_cycle_terminates() {
        let graph = TestGraph::new(3, &[(0, 1), (1, 2), (2, 1)]);
        assert_eq!(postorder(&graph, NodeId::new(0)), ids(&[2, 1, 0]));
    }

    #[test]
    fn test_postorder_skips_unreachable() {
        let graph = TestGraph::new(3, &[(0, 1)]);
        let order = postorder(&graph, NodeId::new(0));
        assert!(!order.contains(&NodeId::new(2)));
    }

    #[test]
    fn test_postorder_invalid_start() {
        let graph = TestGraph::new(2, &[(0, 1)]);
        assert!(postorder(&graph, NodeId::new(7)).is_empty());
    }
}
