//! Basic blocks of the IL control flow graph.

use std::fmt;

use crate::{il::NodeId, symbols::Cell, utils::graph};

/// Dense index of a block within its [`IlControlFlowGraph`](crate::cfg::IlControlFlowGraph).
///
/// Block ids are renumbered when blocks are removed, so they are only stable between
/// two calls to [`remove_multiple`](crate::cfg::IlControlFlowGraph::remove_multiple).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a `BlockId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        BlockId(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl From<BlockId> for graph::NodeId {
    fn from(block: BlockId) -> Self {
        graph::NodeId::new(block.0)
    }
}

impl From<graph::NodeId> for BlockId {
    fn from(node: graph::NodeId) -> Self {
        BlockId(node.index())
    }
}

/// A basic block: an ordered list of root nodes with at most one control transfer,
/// which is always last.
///
/// Successor order follows the terminator: `[true, false]` for a conditional jump,
/// `[target]` for a jump or a fallthrough, `[case_0, .., case_n, default]` for a
/// switch. Predecessors form a set.
#[derive(Debug, Clone)]
pub struct IlBlock {
    pub(crate) id: BlockId,
    pub(crate) pc: Cell,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) preds: Vec<BlockId>,
    pub(crate) succs: Vec<BlockId>,
    pub(crate) idom: Option<BlockId>,
    pub(crate) epoch: u32,
}

impl IlBlock {
    pub(crate) fn new(id: BlockId, pc: Cell) -> Self {
        Self {
            id,
            pc,
            nodes: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
            idom: None,
            epoch: 0,
        }
    }

    /// Returns the block's index.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the program counter of the block's first instruction.
    #[must_use]
    pub fn pc(&self) -> Cell {
        self.pc
    }

    /// Returns the root nodes of the block in execution order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the number of root nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the last root node, if any.
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Returns the predecessor blocks.
    #[must_use]
    pub fn preds(&self) -> &[BlockId] {
        &self.preds
    }

    /// Returns the successor blocks in terminator order.
    #[must_use]
    pub fn succs(&self) -> &[BlockId] {
        &self.succs
    }

    /// Returns the number of incoming edges.
    #[must_use]
    pub fn num_in_edges(&self) -> usize {
        self.preds.len()
    }

    /// Returns the number of outgoing edges.
    #[must_use]
    pub fn num_out_edges(&self) -> usize {
        self.succs.len()
    }

    /// Returns the immediate dominator computed by the last dominance run.
    ///
    /// The entry is its own immediate dominator; unreachable blocks have none.
    #[must_use]
    pub fn idom(&self) -> Option<BlockId> {
        self.idom
    }
}
