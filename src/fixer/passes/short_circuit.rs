//! Short-circuit conditions.
//!
//! `&&` and `||` compile to a branch that stores 1 or 0 into a temporary, followed
//! by a block testing the temporary:
//!
//! ```text
//! bb:    if (a && b) goto then else other
//! then:  tmp = 1
//! other: tmp = 0; goto cont
//! cont:  if (tmp) ...            →    cont:  if (a && b) ...
//! ```
//!
//! The condition is negated when the taken branch stores 0. `bb`, `then` and `other`
//! are removed, the predecessors of `bb` are retargeted to `cont`, and the
//! statements of `bb` before the branch move to the start of `cont`. Every
//! precondition is checked before anything is mutated.

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::replace_node,
    },
    il::{IlGraph, NodeId, NodeKind},
    symbols::Cell,
};

/// A matched short-circuit diamond.
struct ShortCircuit {
    cond_block: BlockId,
    then_block: BlockId,
    else_block: BlockId,
    cont: BlockId,
    condition: NodeId,
    tmp: NodeId,
    then_val: Cell,
    loads: Vec<NodeId>,
}

/// Collapses the boolean temporary of `&&`/`||` back into the branch condition.
pub struct ShortCircuitPass;

impl ShortCircuitPass {
    /// Returns the variable and constant of a `var = <const>` store.
    fn const_store(graph: &IlGraph, node: NodeId) -> Option<(NodeId, Cell)> {
        let NodeKind::Store { var, value } = *graph.kind(node) else {
            return None;
        };
        match *graph.kind(value) {
            NodeKind::Const { value } => Some((var, value)),
            _ => None,
        }
    }

    fn match_shape(cfg: &IlControlFlowGraph, bb: BlockId) -> Option<ShortCircuit> {
        if bb == cfg.entry() {
            return None;
        }
        let graph = cfg.graph();
        let branch = cfg.terminator(bb)?;
        let NodeKind::JumpCond { condition } = *graph.kind(branch) else {
            return None;
        };
        let &[then_block, else_block] = cfg.block(bb).succs() else {
            return None;
        };
        if then_block == else_block || then_block == bb || else_block == bb {
            return None;
        }

        let then_bb = cfg.block(then_block);
        let else_bb = cfg.block(else_block);
        if then_bb.num_nodes() != 1
            || else_bb.num_nodes() != 2
            || then_bb.preds() != [bb]
            || else_bb.preds() != [bb]
        {
            return None;
        }
        if !matches!(else_bb.last().map(|n| graph.kind(n)), Some(NodeKind::Jump)) {
            return None;
        }
        let (&[then_cont], &[cont]) = (then_bb.succs(), else_bb.succs()) else {
            return None;
        };
        if then_cont != cont || cont == bb || cont == then_block || cont == else_block {
            return None;
        }

        let (tmp, then_val) = Self::const_store(graph, then_bb.nodes()[0])?;
        let (else_var, else_val) = Self::const_store(graph, else_bb.nodes()[0])?;
        if tmp != else_var || !matches!(graph.kind(tmp), NodeKind::LocalVar { .. }) {
            return None;
        }
        if !matches!((then_val, else_val), (1, 0) | (0, 1)) {
            return None;
        }

        let stores = [then_bb.nodes()[0], else_bb.nodes()[0]];
        let mut loads = Vec::new();
        for &user in graph.uses(tmp) {
            if stores.contains(&user) {
                continue;
            }
            if !matches!(graph.kind(user), NodeKind::Load { .. }) {
                return None;
            }
            if !loads.contains(&user) {
                loads.push(user);
            }
        }
        if loads.is_empty() {
            return None;
        }

        Some(ShortCircuit {
            cond_block: bb,
            then_block,
            else_block,
            cont,
            condition,
            tmp,
            then_val,
            loads,
        })
    }

    /// Rewrites a matched diamond and returns the new id of the continuation.
    fn flatten(cfg: &mut IlControlFlowGraph, shape: ShortCircuit) -> BlockId {
        let ShortCircuit {
            cond_block,
            then_block,
            else_block,
            cont,
            condition,
            tmp,
            then_val,
            loads,
        } = shape;

        let condition = if then_val == 0 {
            cfg.graph_mut().negate(condition)
        } else {
            condition
        };

        cfg.remove_in_edge(cont, then_block);
        cfg.remove_in_edge(cont, else_block);
        for pred in cfg.block(cond_block).preds().to_vec() {
            cfg.replace_out_edge(pred, cond_block, cont);
            cfg.add_in_edge(cont, pred);
        }

        let mut moved = cfg.take_nodes(cond_block);
        let branch = moved.pop();
        cfg.prepend_nodes(cont, &moved);

        for load in loads {
            replace_node(cfg, load, condition);
        }
        let dead = branch
            .into_iter()
            .chain(cfg.take_nodes(then_block))
            .chain(cfg.take_nodes(else_block))
            .collect::<Vec<_>>();
        for node in dead {
            cfg.graph_mut().discard(node);
        }
        Self::remove_declaration(cfg, tmp);

        let remap = cfg.remove_multiple(&[cond_block, then_block, else_block]);
        remap[cont.index()].unwrap_or(cont)
    }

    /// Drops the declaration of a temporary left without uses.
    fn remove_declaration(cfg: &mut IlControlFlowGraph, tmp: NodeId) {
        if cfg.graph().num_uses(tmp) > 0 {
            return;
        }
        let NodeKind::LocalVar { value, .. } = *cfg.graph().kind(tmp) else {
            return;
        };
        if let Some(value) = value {
            if !matches!(cfg.graph().kind(value), NodeKind::Const { .. }) {
                return;
            }
            cfg.graph_mut().remove_param(tmp, value);
            cfg.graph_mut().discard(value);
        }
        if let Some((block, index)) = cfg.find_root(tmp) {
            cfg.remove_node_at(block, index);
            cfg.graph_mut().unlink(tmp);
        }
    }
}

impl FixerPass for ShortCircuitPass {
    fn name(&self) -> &'static str {
        "short-circuit"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::SHORT_CIRCUIT
    }

    fn description(&self) -> &'static str {
        "Replaces boolean temporaries of && and || with the branch condition"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        let mut changed = false;
        'rounds: loop {
            for index in (0..cfg.num_blocks()).rev() {
                let Some(shape) = Self::match_shape(cfg, BlockId::new(index)) else {
                    continue;
                };
                let removed = [shape.cond_block, shape.then_block, shape.else_block];
                let cont = Self::flatten(cfg, shape);

                events
                    .record(EventKind::ShortCircuitFlattened)
                    .block(cont)
                    .pass(self.name());
                for block in removed {
                    events
                        .record(EventKind::BlockRemoved)
                        .block(block)
                        .pass(self.name())
                        .message(format!("merged into {cont}"));
                }
                changed = true;
                continue 'rounds;
            }
            break;
        }
        changed
    }
}
