//! The IL control flow graph: blocks, edges and graph surgery.

use std::collections::HashSet;

use crate::{
    cfg::block::{BlockId, IlBlock},
    il::{IlGraph, NodeId, NodeKind},
    symbols::Cell,
    utils::graph::{self, GraphBase, Predecessors, RootedGraph, Successors},
    Error::GraphError,
    Result,
};

/// Control flow graph of one function.
///
/// Owns the function's [`IlGraph`] and its blocks. Block 0 is always the entry.
/// Edges are kept on both sides: `b` is in `a.succs()` iff `a` is in `b.preds()`.
/// The paired surgery primitives ([`replace_out_edge`](Self::replace_out_edge),
/// [`add_in_edge`](Self::add_in_edge), [`remove_in_edge`](Self::remove_in_edge))
/// each edit one side, and callers use them in pairs.
///
/// # Traversal Epochs
///
/// Every block stores the epoch in which it was last visited. Starting a walk with
/// [`new_epoch`](Self::new_epoch) invalidates all marks at once, so no walk has to
/// reset per-block flags.
#[derive(Debug, Clone)]
pub struct IlControlFlowGraph {
    graph: IlGraph,
    pub(crate) blocks: Vec<IlBlock>,
    epoch: u32,
    nargs: u32,
}

impl IlControlFlowGraph {
    /// Creates an empty CFG over a fresh node graph.
    #[must_use]
    pub fn new(nargs: u32) -> Self {
        Self::with_graph(IlGraph::new(), nargs)
    }

    /// Creates an empty CFG taking ownership of an existing node graph.
    #[must_use]
    pub fn with_graph(graph: IlGraph, nargs: u32) -> Self {
        Self {
            graph,
            blocks: Vec::new(),
            epoch: 1,
            nargs,
        }
    }

    /// Returns the node graph.
    #[must_use]
    pub fn graph(&self) -> &IlGraph {
        &self.graph
    }

    /// Returns the node graph for mutation.
    pub fn graph_mut(&mut self) -> &mut IlGraph {
        &mut self.graph
    }

    /// Returns the number of declared arguments of the function.
    #[must_use]
    pub fn nargs(&self) -> u32 {
        self.nargs
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the graph has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the entry block id.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// Returns a block.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &IlBlock {
        &self.blocks[id.0]
    }

    /// Iterates over the blocks in index order.
    pub fn blocks(&self) -> impl Iterator<Item = &IlBlock> + '_ {
        self.blocks.iter()
    }

    /// Iterates over the block ids in index order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// Appends a block starting at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if a block already starts at `pc`.
    pub fn add_block(&mut self, pc: Cell) -> Result<BlockId> {
        if let Some(existing) = self.find_block_at(pc) {
            return Err(GraphError(format!("{existing} already starts at pc {pc:#x}")));
        }
        let id = BlockId(self.blocks.len());
        self.blocks.push(IlBlock::new(id, pc));
        Ok(id)
    }

    /// Returns the block whose entry pc is `pc`.
    #[must_use]
    pub fn find_block_at(&self, pc: Cell) -> Option<BlockId> {
        self.blocks.iter().find(|block| block.pc == pc).map(|block| block.id)
    }

    /// Adds the edge `from -> to` on both sides.
    ///
    /// Successors are positional and may repeat; predecessors are a set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if either block does not exist.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        for block in [from, to] {
            if block.0 >= self.blocks.len() {
                return Err(GraphError(format!(
                    "edge {from} -> {to} references missing block {block}"
                )));
            }
        }
        self.blocks[from.0].succs.push(to);
        self.add_in_edge(to, from);
        Ok(())
    }

    /// Appends a root node to a block.
    ///
    /// # Panics
    ///
    /// Panics if the block already ends in a control transfer or the node is dead.
    pub fn append(&mut self, block: BlockId, node: NodeId) {
        assert!(self.graph.is_live(node), "cannot append dead node {node} to {block}");
        assert!(
            self.terminator(block).is_none(),
            "{block} already ends in a control transfer"
        );
        self.blocks[block.0].nodes.push(node);
    }

    /// Inserts a root node at `index` of a block.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end, or if a control transfer would not end up
    /// last.
    pub fn insert_node(&mut self, block: BlockId, index: usize, node: NodeId) {
        let nodes = &self.blocks[block.0].nodes;
        assert!(index <= nodes.len(), "{block} has no slot {index}");
        assert!(
            index == nodes.len() || !self.graph.kind(node).is_terminator(),
            "control transfer {node} must be last in {block}"
        );
        self.blocks[block.0].nodes.insert(index, node);
    }

    /// Prepends root nodes to a block, keeping their order.
    pub fn prepend_nodes(&mut self, block: BlockId, nodes: &[NodeId]) {
        self.blocks[block.0].nodes.splice(0..0, nodes.iter().copied());
    }

    /// Removes and returns the root node at `index` of a block.
    ///
    /// The node itself is not unlinked.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_node_at(&mut self, block: BlockId, index: usize) -> NodeId {
        self.blocks[block.0].nodes.remove(index)
    }

    /// Replaces the root node at `index` of a block and returns the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn replace_node_at(&mut self, block: BlockId, index: usize, node: NodeId) -> NodeId {
        std::mem::replace(&mut self.blocks[block.0].nodes[index], node)
    }

    /// Removes and returns every root node of a block.
    pub fn take_nodes(&mut self, block: BlockId) -> Vec<NodeId> {
        std::mem::take(&mut self.blocks[block.0].nodes)
    }

    /// Returns the block and slot holding `node` as a root.
    #[must_use]
    pub fn find_root(&self, node: NodeId) -> Option<(BlockId, usize)> {
        self.blocks.iter().find_map(|block| {
            block
                .nodes
                .iter()
                .position(|&root| root == node)
                .map(|index| (block.id, index))
        })
    }

    /// Replaces every root slot holding `old` with `new`; returns the number of slots
    /// rewritten.
    pub fn replace_root(&mut self, old: NodeId, new: NodeId) -> usize {
        let mut count = 0;
        for block in &mut self.blocks {
            for root in &mut block.nodes {
                if *root == old {
                    *root = new;
                    count += 1;
                }
            }
        }
        count
    }

    /// Returns the block's last node if it is a control transfer.
    #[must_use]
    pub fn terminator(&self, block: BlockId) -> Option<NodeId> {
        self.blocks[block.0]
            .last()
            .filter(|&node| self.graph.kind(node).is_terminator())
    }

    /// Starts a new traversal; every block becomes unvisited.
    pub fn new_epoch(&mut self) -> u32 {
        self.epoch += 1;
        self.epoch
    }

    /// Returns `true` if the block was visited in the current traversal.
    #[must_use]
    pub fn is_visited(&self, block: BlockId) -> bool {
        self.blocks[block.0].epoch == self.epoch
    }

    /// Marks the block visited in the current traversal.
    pub fn set_visited(&mut self, block: BlockId) {
        self.blocks[block.0].epoch = self.epoch;
    }

    /// Returns the blocks reachable from the entry in reverse postorder.
    pub fn reverse_postorder(&mut self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.blocks.len());
        if self.blocks.is_empty() {
            return order;
        }
        self.new_epoch();
        let entry = self.entry();
        self.set_visited(entry);
        // (block, index of the next successor to explore)
        let mut stack = vec![(entry, 0usize)];
        while let Some(top) = stack.last_mut() {
            let block = top.0;
            if let Some(&succ) = self.blocks[block.0].succs.get(top.1) {
                top.1 += 1;
                if !self.is_visited(succ) {
                    self.set_visited(succ);
                    stack.push((succ, 0));
                }
            } else {
                order.push(block);
                stack.pop();
            }
        }
        order.reverse();
        order
    }

    /// Replaces every successor slot of `block` holding `old` with `new`.
    ///
    /// Only the successor side changes; pair with [`add_in_edge`](Self::add_in_edge)
    /// on `new` and [`remove_in_edge`](Self::remove_in_edge) on `old`.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a successor of `block`.
    pub fn replace_out_edge(&mut self, block: BlockId, old: BlockId, new: BlockId) {
        let mut found = false;
        for succ in &mut self.blocks[block.0].succs {
            if *succ == old {
                *succ = new;
                found = true;
            }
        }
        assert!(found, "{old} is not a successor of {block}");
    }

    /// Records `pred` as a predecessor of `block`.
    pub fn add_in_edge(&mut self, block: BlockId, pred: BlockId) {
        let preds = &mut self.blocks[block.0].preds;
        if !preds.contains(&pred) {
            preds.push(pred);
        }
    }

    /// Removes `pred` from the predecessors of `block`.
    ///
    /// # Panics
    ///
    /// Panics if `pred` is not a predecessor of `block`.
    pub fn remove_in_edge(&mut self, block: BlockId, pred: BlockId) {
        let preds = &mut self.blocks[block.0].preds;
        let position = preds
            .iter()
            .position(|&p| p == pred)
            .unwrap_or_else(|| panic!("{pred} is not a predecessor of {block}"));
        preds.remove(position);
    }

    /// Deletes a batch of blocks together with every edge touching them.
    ///
    /// Remaining blocks are renumbered densely in their previous order. Returns the
    /// map from old block index to new id (`None` for removed blocks). Dominance
    /// information is cleared and must be recomputed.
    ///
    /// # Panics
    ///
    /// Panics if the entry block is among `remove`.
    pub fn remove_multiple(&mut self, remove: &[BlockId]) -> Vec<Option<BlockId>> {
        assert!(!remove.contains(&self.entry()), "the entry block cannot be removed");
        let removed: HashSet<BlockId> = remove.iter().copied().collect();

        let mut remap = Vec::with_capacity(self.blocks.len());
        let mut next = 0;
        for index in 0..self.blocks.len() {
            if removed.contains(&BlockId(index)) {
                remap.push(None);
            } else {
                remap.push(Some(BlockId(next)));
                next += 1;
            }
        }

        let blocks = std::mem::take(&mut self.blocks);
        self.blocks = blocks
            .into_iter()
            .filter_map(|mut block| {
                let id = remap[block.id.0]?;
                block.id = id;
                block.succs = block.succs.iter().filter_map(|s| remap[s.0]).collect();
                block.preds = block.preds.iter().filter_map(|p| remap[p.0]).collect();
                block.idom = None;
                Some(block)
            })
            .collect();
        remap
    }

    /// Verifies that every block's successor count matches its terminator and that no
    /// control transfer appears before the end of a block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for the first block breaking either rule.
    pub fn check_terminators(&self) -> Result<()> {
        for block in &self.blocks {
            let count = block.nodes.len();
            for (index, &node) in block.nodes.iter().enumerate() {
                if index + 1 < count && self.graph.kind(node).is_terminator() {
                    return Err(malformed_error!(
                        "{} has control transfer {node} at slot {index} of {count}",
                        block.id
                    ));
                }
            }

            let expected = match block.last().map(|node| self.graph.kind(node)) {
                Some(NodeKind::JumpCond { .. }) => 2..=2,
                Some(NodeKind::Jump) => 1..=1,
                Some(NodeKind::Switch { cases, .. }) => cases.len() + 1..=cases.len() + 1,
                Some(NodeKind::Return { .. }) => 0..=0,
                _ => 0..=1,
            };
            if !expected.contains(&block.succs.len()) {
                return Err(malformed_error!(
                    "{} has {} successors, its terminator expects {:?}",
                    block.id,
                    block.succs.len(),
                    expected
                ));
            }
        }
        Ok(())
    }

    /// Verifies that predecessor and successor lists mirror each other.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] naming the first one-sided edge.
    pub fn check_edges(&self) -> Result<()> {
        let count = self.blocks.len();
        for block in &self.blocks {
            for &succ in &block.succs {
                if succ.0 >= count {
                    return Err(GraphError(format!("{} has missing successor {succ}", block.id)));
                }
                if !self.blocks[succ.0].preds.contains(&block.id) {
                    return Err(GraphError(format!(
                        "{} -> {succ} is missing from the predecessors of {succ}",
                        block.id
                    )));
                }
            }
            for &pred in &block.preds {
                if pred.0 >= count {
                    return Err(GraphError(format!("{} has missing predecessor {pred}", block.id)));
                }
                if !self.blocks[pred.0].succs.contains(&block.id) {
                    return Err(GraphError(format!(
                        "{pred} is a predecessor of {} without a matching successor",
                        block.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl GraphBase for IlControlFlowGraph {
    fn node_count(&self) -> usize {
        self.blocks.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = graph::NodeId> {
        (0..self.blocks.len()).map(graph::NodeId::new)
    }
}

impl Successors for IlControlFlowGraph {
    fn successors(&self, node: graph::NodeId) -> impl Iterator<Item = graph::NodeId> {
        self.blocks[node.index()].succs.iter().map(|&s| s.into())
    }
}

impl Predecessors for IlControlFlowGraph {
    fn predecessors(&self, node: graph::NodeId) -> impl Iterator<Item = graph::NodeId> {
        self.blocks[node.index()].preds.iter().map(|&p| p.into())
    }
}

impl RootedGraph for IlControlFlowGraph {
    fn entry(&self) -> graph::NodeId {
        graph::NodeId::new(0)
    }
}
