//! Interval decomposition and the derived sequence of a CFG.
//!
//! An interval `I(h)` is the maximal single-entry region headed by `h`: starting
//! from `{h}`, any node all of whose predecessors are already in the interval joins
//! it. Partitioning a graph into intervals and collapsing each to one node yields
//! the next graph of the derived sequence. A graph is reducible iff its derived
//! sequence ends in a single node.

use crate::cfg::{BlockId, IlControlFlowGraph};

/// A node of an [`IntervalGraph`]: one interval of the previous level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalNode {
    /// Index of the interval's header in the previous level (the block index at the
    /// first level).
    pub header: usize,
    /// Indices of the previous-level nodes collapsed into this one, header first.
    pub members: Vec<usize>,
    /// CFG blocks represented by this node.
    pub blocks: Vec<BlockId>,
    /// Predecessor nodes in this level.
    pub preds: Vec<usize>,
    /// Successor nodes in this level.
    pub succs: Vec<usize>,
}

/// One graph of the derived sequence. Node 0 is the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalGraph {
    nodes: Vec<IntervalNode>,
}

impl IntervalGraph {
    /// Builds the first level: one node per block reachable from the entry.
    pub fn from_cfg(cfg: &mut IlControlFlowGraph) -> Self {
        let order = cfg.reverse_postorder();
        let mut position = vec![None; cfg.num_blocks()];
        let mut sorted = order.clone();
        sorted.sort_unstable();
        for (index, block) in sorted.iter().enumerate() {
            position[block.index()] = Some(index);
        }

        let nodes = sorted
            .iter()
            .map(|&block| {
                let data = cfg.block(block);
                IntervalNode {
                    header: block.index(),
                    members: vec![block.index()],
                    blocks: vec![block],
                    preds: data.preds().iter().filter_map(|p| position[p.index()]).collect(),
                    succs: dedup(data.succs().iter().filter_map(|s| position[s.index()])),
                }
            })
            .collect();
        Self { nodes }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the nodes of this level.
    #[must_use]
    pub fn nodes(&self) -> &[IntervalNode] {
        &self.nodes
    }

    /// Returns the members of the interval headed by `header`, header first, in the
    /// order they joined.
    #[must_use]
    pub fn interval_for_header(&self, header: usize) -> Vec<usize> {
        self.grow_interval(header, &vec![false; self.nodes.len()])
    }

    /// Closure of `{header}` over nodes not already `taken` by another interval.
    fn grow_interval(&self, header: usize, taken: &[bool]) -> Vec<usize> {
        let mut inside = vec![false; self.nodes.len()];
        inside[header] = true;
        let mut members = vec![header];

        let mut changed = true;
        while changed {
            changed = false;
            for (index, node) in self.nodes.iter().enumerate() {
                if inside[index] || taken[index] || index == 0 || node.preds.is_empty() {
                    continue;
                }
                if node.preds.iter().all(|&pred| inside[pred]) {
                    inside[index] = true;
                    members.push(index);
                    changed = true;
                }
            }
        }
        members
    }

    /// Returns the node of this level representing `block`.
    #[must_use]
    pub fn find_outer_target(&self, block: BlockId) -> Option<usize> {
        self.nodes.iter().position(|node| node.blocks.contains(&block))
    }

    /// Partitions this graph into intervals and collapses each into one node.
    ///
    /// Returns `None` when no interval holds more than one node, i.e. the graph is
    /// the limit of its derived sequence.
    #[must_use]
    pub fn next(&self) -> Option<IntervalGraph> {
        if self.nodes.len() <= 1 {
            return None;
        }

        let mut owner: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut intervals: Vec<Vec<usize>> = Vec::new();
        let mut headers = vec![0];
        let mut next_header = 0;
        while next_header < headers.len() {
            let header = headers[next_header];
            next_header += 1;
            if owner[header].is_some() {
                continue;
            }

            let taken: Vec<bool> = owner.iter().map(Option::is_some).collect();
            let members = self.grow_interval(header, &taken);
            for &member in &members {
                owner[member] = Some(intervals.len());
            }
            intervals.push(members);

            for (index, node) in self.nodes.iter().enumerate() {
                if owner[index].is_none()
                    && !headers.contains(&index)
                    && node.preds.iter().any(|&pred| owner[pred].is_some())
                {
                    headers.push(index);
                }
            }
        }

        if intervals.len() == self.nodes.len() {
            return None;
        }

        let mut nodes: Vec<IntervalNode> = intervals
            .iter()
            .map(|members| IntervalNode {
                header: members[0],
                members: members.clone(),
                blocks: members
                    .iter()
                    .flat_map(|&m| self.nodes[m].blocks.iter().copied())
                    .collect(),
                preds: Vec::new(),
                succs: Vec::new(),
            })
            .collect();

        for (from, members) in intervals.iter().enumerate() {
            let targets = members.iter().flat_map(|&m| self.nodes[m].succs.iter()).filter_map(
                |&succ| owner[succ].filter(|&to| to != from),
            );
            nodes[from].succs = dedup(targets);
        }
        for from in 0..nodes.len() {
            for to in nodes[from].succs.clone() {
                nodes[to].preds.push(from);
            }
        }

        Some(IntervalGraph { nodes })
    }

    /// Returns the derived sequence of `cfg`, starting with the block-level graph and
    /// ending with its limit graph.
    pub fn derived_sequence(cfg: &mut IlControlFlowGraph) -> Vec<IntervalGraph> {
        let mut sequence = vec![IntervalGraph::from_cfg(cfg)];
        while let Some(next) = sequence.last().and_then(IntervalGraph::next) {
            sequence.push(next);
        }
        sequence
    }

    /// Returns `true` if the derived sequence of `cfg` reduces it to a single node.
    pub fn is_reducible(cfg: &mut IlControlFlowGraph) -> bool {
        Self::derived_sequence(cfg)
            .last()
            .is_some_and(|limit| limit.len() <= 1)
    }
}

fn dedup(items: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
