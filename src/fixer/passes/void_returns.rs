//! Returned values of void functions.
//!
//! Functions declared `void` still leave whatever is in the primary register when
//! they return, and the lifter records that as the returned value:
//!
//! ```text
//! return 0          →    return
//! return f(x)       →    f(x); return
//! ```
//!
//! A call is kept as a statement of its own so its side effects survive.

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
    },
    il::NodeKind,
};

/// Strips returned values from functions declared `void`.
pub struct VoidReturnPass;

impl FixerPass for VoidReturnPass {
    fn name(&self) -> &'static str {
        "void-returns"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::VOID_RETURNS
    }

    fn description(&self) -> &'static str {
        "Removes returned values from void functions"
    }

    fn should_run(&self, ctx: &FixerContext<'_>) -> bool {
        ctx.signature.returns_void()
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        let mut changed = false;
        for block in cfg.block_ids().collect::<Vec<_>>() {
            let Some(ret) = cfg.terminator(block) else {
                continue;
            };
            let NodeKind::Return { value: Some(value) } = *cfg.graph().kind(ret) else {
                continue;
            };

            cfg.graph_mut().remove_param(ret, value);
            let (is_call, is_var) = {
                let kind = cfg.graph().kind(value);
                (kind.is_call(), kind.is_var())
            };
            if is_call {
                let slot = cfg.block(block).num_nodes() - 1;
                cfg.insert_node(block, slot, value);
            } else if !is_var {
                cfg.graph_mut().discard(value);
            }

            events
                .record(EventKind::ReturnValueStripped)
                .at(block, ret)
                .pass(self.name());
            changed = true;
        }
        changed
    }
}
