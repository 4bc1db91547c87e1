//! Dominance, post-dominance, back edges and natural loops over the IL CFG.

use std::collections::BTreeSet;

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    utils::graph::{
        self,
        algorithms::{compute_dominators, compute_dominators_in_order, DominatorTree},
        GraphBase, Predecessors, Successors,
    },
};

/// A natural loop: a header plus every block that reaches one of its back-edge
/// sources without passing through the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLoop {
    /// The single entry of the loop.
    pub header: BlockId,
    /// All blocks of the loop, header included.
    pub body: BTreeSet<BlockId>,
    /// Sources of the edges back into the header.
    pub back_edges: Vec<BlockId>,
    /// Number of enclosing loops (0 = outermost).
    pub depth: usize,
}

impl NaturalLoop {
    /// Returns `true` if the block belongs to this loop.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.body.contains(&block)
    }

    /// Returns the number of blocks in the loop, header included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Post-dominator tree of a CFG.
///
/// Computed on the reversed graph with a virtual exit node whose reverse successors
/// are the blocks without successors. Blocks that cannot reach any exit (infinite
/// loops) have no post-dominator.
#[derive(Debug, Clone)]
pub struct PostDominatorTree {
    tree: DominatorTree,
    exit: graph::NodeId,
}

impl PostDominatorTree {
    /// Returns the immediate post-dominator of `block`, or `None` when the block is
    /// post-dominated only by the virtual exit or cannot reach an exit.
    #[must_use]
    pub fn ipdom(&self, block: BlockId) -> Option<BlockId> {
        self.tree
            .immediate_dominator(block.into())
            .filter(|&node| node != self.exit)
            .map(BlockId::from)
    }

    /// Returns `true` if every path from `b` to the exit passes through `a`.
    #[must_use]
    pub fn post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.tree.dominates(a.into(), b.into())
    }

    /// Returns `true` if some exit is reachable from `block`.
    #[must_use]
    pub fn reaches_exit(&self, block: BlockId) -> bool {
        self.tree.is_reachable(block.into())
    }
}

/// The CFG with every edge reversed and a virtual exit appended.
struct Reversed<'a> {
    cfg: &'a IlControlFlowGraph,
}

impl Reversed<'_> {
    fn exit(&self) -> graph::NodeId {
        graph::NodeId::new(self.cfg.num_blocks())
    }
}

impl GraphBase for Reversed<'_> {
    fn node_count(&self) -> usize {
        self.cfg.num_blocks() + 1
    }

    fn node_ids(&self) -> impl Iterator<Item = graph::NodeId> {
        (0..self.node_count()).map(graph::NodeId::new)
    }
}

impl Successors for Reversed<'_> {
    fn successors(&self, node: graph::NodeId) -> impl Iterator<Item = graph::NodeId> {
        let nodes: Vec<graph::NodeId> = if node == self.exit() {
            self.cfg
                .blocks()
                .filter(|block| block.succs().is_empty())
                .map(|block| block.id().into())
                .collect()
        } else {
            self.cfg.predecessors(node).collect()
        };
        nodes.into_iter()
    }
}

impl Predecessors for Reversed<'_> {
    fn predecessors(&self, node: graph::NodeId) -> impl Iterator<Item = graph::NodeId> {
        let nodes: Vec<graph::NodeId> = if node == self.exit() {
            Vec::new()
        } else if self.cfg.block(node.into()).succs().is_empty() {
            vec![self.exit()]
        } else {
            self.cfg.successors(node).collect()
        };
        nodes.into_iter()
    }
}

impl IlControlFlowGraph {
    /// Computes the immediate dominator of every block and stores it in the blocks.
    ///
    /// Iterative fixed point over the reverse postorder produced by an epoch-marked
    /// walk. The entry becomes its own immediate dominator; unreachable blocks get
    /// none.
    pub fn compute_dominance(&mut self) {
        let tree = self.dominator_tree();
        let entry = self.entry();
        for block in &mut self.blocks {
            block.idom = if block.id == entry {
                tree.is_reachable(entry.into()).then_some(entry)
            } else {
                tree.immediate_dominator(block.id.into()).map(BlockId::from)
            };
        }
    }

    /// Computes a fresh dominator tree without storing it in the blocks.
    pub fn dominator_tree(&mut self) -> DominatorTree {
        let order: Vec<graph::NodeId> = self
            .reverse_postorder()
            .into_iter()
            .map(graph::NodeId::from)
            .collect();
        compute_dominators_in_order(&*self, &order)
    }

    /// Computes the post-dominator tree.
    #[must_use]
    pub fn post_dominator_tree(&self) -> PostDominatorTree {
        let reversed = Reversed { cfg: self };
        let exit = reversed.exit();
        PostDominatorTree {
            tree: compute_dominators(&reversed, exit),
            exit,
        }
    }

    /// Returns the stored immediate dominator of `block`.
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.block(block).idom
    }

    /// Returns `true` if `a` dominates `b`, walking the stored idom links up from `b`.
    ///
    /// Every block dominates itself. Requires a prior
    /// [`compute_dominance`](Self::compute_dominance).
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            match self.block(current).idom {
                Some(idom) if idom != current => current = idom,
                _ => return false,
            }
        }
    }

    /// Returns `true` if the `index`-th out edge of `block` goes to a block that comes
    /// before it in construction order.
    ///
    /// A self loop is not a back edge under this test; [`natural_loop`](Self::natural_loop)
    /// still finds it through dominance.
    ///
    /// # Panics
    ///
    /// Panics if `block` has no out edge `index`.
    #[must_use]
    pub fn is_back_edge(&self, block: BlockId, index: usize) -> bool {
        self.block(block).succs[index] < block
    }

    /// Returns `true` if `block` is the target of at least one back edge.
    #[must_use]
    pub fn is_loop_header(&self, block: BlockId) -> bool {
        self.block(block).preds.iter().any(|&pred| pred > block)
    }

    /// Returns the natural loop headed by `header`, if any block dominated by the
    /// header jumps back to it.
    ///
    /// Requires a prior [`compute_dominance`](Self::compute_dominance).
    #[must_use]
    pub fn natural_loop(&self, header: BlockId) -> Option<NaturalLoop> {
        let back_edges: Vec<BlockId> = self
            .block(header)
            .preds
            .iter()
            .copied()
            .filter(|&pred| self.dominates(header, pred))
            .collect();
        if back_edges.is_empty() {
            return None;
        }

        let mut body = BTreeSet::from([header]);
        let mut worklist = back_edges.clone();
        while let Some(block) = worklist.pop() {
            if body.insert(block) {
                worklist.extend(self.block(block).preds.iter().copied());
            }
        }

        Some(NaturalLoop {
            header,
            body,
            back_edges,
            depth: 0,
        })
    }

    /// Returns every natural loop, ordered by header, with nesting depths.
    #[must_use]
    pub fn loops(&self) -> Vec<NaturalLoop> {
        let mut loops: Vec<NaturalLoop> =
            self.block_ids().filter_map(|block| self.natural_loop(block)).collect();
        for i in 0..loops.len() {
            let header = loops[i].header;
            loops[i].depth = loops
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && other.contains(header))
                .count();
        }
        loops
    }
}
