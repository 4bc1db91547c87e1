//! Compiler temporaries.
//!
//! Intermediate values are often spilled into an unnamed local that is read exactly
//! once:
//!
//! ```text
//! int local_3212 = x;
//! PrintToServer("%i", local_3212);    →    PrintToServer("%i", x);
//! ```
//!
//! Only locals without debug information are touched, so variables the programmer
//! named survive even when they are just as redundant. An unused temporary whose
//! initializer calls, stores or increments leaves that initializer behind as a
//! statement.

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::replace_node,
    },
    il::{IlGraph, NodeId, NodeKind},
};

/// Inlines single-use compiler temporaries and drops unused ones.
pub struct DeadTemporariesPass;

impl DeadTemporariesPass {
    /// Returns the initializer of `local` if it is a temporary this pass may remove.
    fn candidate(graph: &IlGraph, local: NodeId) -> Option<NodeId> {
        let NodeKind::LocalVar {
            value: Some(value),
            symbol: None,
            ..
        } = *graph.kind(local)
        else {
            return None;
        };
        if graph.ty(local).is_some_and(|ty| ty.is_array())
            || graph.num_uses(local) > 1
            || Self::is_reassigned(graph, local)
            || Self::expression(graph, value).contains(&local)
        {
            return None;
        }
        Some(value)
    }

    /// Returns the nodes of the expression rooted at `value`. Other declarations are
    /// leaves; their initializers belong to them.
    fn expression(graph: &IlGraph, value: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut stack = vec![value];
        while let Some(node) = stack.pop() {
            if nodes.contains(&node) {
                continue;
            }
            nodes.push(node);
            if !matches!(graph.kind(node), NodeKind::LocalVar { .. }) {
                stack.extend(graph.kind(node).operands());
            }
        }
        nodes
    }

    fn is_reassigned(graph: &IlGraph, local: NodeId) -> bool {
        let modifies = |user: NodeId, target: NodeId| match graph.kind(user) {
            NodeKind::Store { var, .. } => *var == target,
            NodeKind::Unary { op, value } => op.is_inc_dec() && *value == target,
            _ => false,
        };
        graph.uses(local).iter().any(|&user| {
            modifies(user, local)
                || (matches!(graph.kind(user), NodeKind::Load { .. })
                    && graph.uses(user).iter().any(|&u| modifies(u, user)))
        })
    }

    fn remove(
        &self,
        cfg: &mut IlControlFlowGraph,
        block: BlockId,
        index: usize,
        local: NodeId,
        value: NodeId,
        events: &mut EventLog,
    ) {
        cfg.graph_mut().remove_param(local, value);

        let kind = if cfg.graph().num_uses(local) == 0 {
            cfg.remove_node_at(block, index);
            cfg.graph_mut().unlink(local);
            let effects = Self::expression(cfg.graph(), value)
                .into_iter()
                .any(|node| cfg.graph().kind(node).has_side_effects());
            if effects {
                cfg.insert_node(block, index, value);
            } else if cfg.graph().num_uses(value) == 0 {
                cfg.graph_mut().discard(value);
            }
            EventKind::TemporaryRemoved
        } else {
            let user = cfg.graph().use_at(local, 0);
            if matches!(cfg.graph().kind(user), NodeKind::Load { .. }) {
                replace_node(cfg, user, value);
            } else {
                cfg.graph_mut().replace_uses_with(local, value);
            }
            cfg.remove_node_at(block, index);
            cfg.graph_mut().unlink(local);
            EventKind::TemporaryInlined
        };

        events.record(kind).at(block, local).pass(self.name());
    }
}

impl FixerPass for DeadTemporariesPass {
    fn name(&self) -> &'static str {
        "dead-temporaries"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::DEAD_TEMPORARIES
    }

    fn description(&self) -> &'static str {
        "Inlines compiler temporaries that are used at most once"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        let mut changed = false;
        for block in cfg.block_ids().collect::<Vec<_>>() {
            for index in (0..cfg.block(block).num_nodes()).rev() {
                let local = cfg.block(block).nodes()[index];
                if let Some(value) = Self::candidate(cfg.graph(), local) {
                    self.remove(cfg, block, index, local, value, events);
                    changed = true;
                }
            }
        }
        changed
    }
}
