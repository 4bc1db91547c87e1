//! Stores of increments and decrements.
//!
//! The `inc`/`dec` opcodes store implicitly, but the lifted code still writes the
//! result back:
//!
//! ```text
//! i = ++i    →    ++i
//! ```

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
    },
    il::NodeKind,
};

/// Replaces stores of `++x`/`--x` with the bare operation.
pub struct IncDecPass;

impl FixerPass for IncDecPass {
    fn name(&self) -> &'static str {
        "inc-dec"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::INC_DEC
    }

    fn description(&self) -> &'static str {
        "Drops the explicit store around increments and decrements"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        let mut changed = false;
        for block in cfg.block_ids().collect::<Vec<_>>() {
            for i in (0..cfg.block(block).num_nodes()).rev() {
                let store = cfg.block(block).nodes()[i];
                let NodeKind::Store { value, .. } = *cfg.graph().kind(store) else {
                    continue;
                };
                if !matches!(cfg.graph().kind(value), NodeKind::Unary { op, .. } if op.is_inc_dec()) {
                    continue;
                }

                cfg.replace_node_at(block, i, value);
                cfg.graph_mut().unlink(store);
                events
                    .record(EventKind::IncDecUnwrapped)
                    .at(block, value)
                    .pass(self.name());
                changed = true;
            }
        }
        changed
    }
}
