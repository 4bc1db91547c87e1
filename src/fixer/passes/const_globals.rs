//! Global-by-address fix.
//!
//! Globals are sometimes addressed by their constant data address. To the lifter
//! that is an ordinary constant, but as the base of an element access it can only
//! be a variable:
//!
//! ```text
//! 2332[i] = 0    →    global_2332[i] = 0
//! ```

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::{replace_node, rewrite_expressions},
    },
    il::NodeKind,
};

/// Turns constants used as array bases into global references.
pub struct ConstGlobalsPass;

impl FixerPass for ConstGlobalsPass {
    fn name(&self) -> &'static str {
        "const-globals"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::CONST_GLOBALS
    }

    fn description(&self) -> &'static str {
        "Resolves constant array bases to global variable references"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        rewrite_expressions(cfg, |cfg, block, node| {
            let NodeKind::ArrayElementVar { base, .. } = *cfg.graph().kind(node) else {
                return false;
            };
            let NodeKind::Const { value: addr } = *cfg.graph().kind(base) else {
                return false;
            };

            let global = cfg.graph_mut().global_var(addr, None);
            replace_node(cfg, base, global);
            events
                .record(EventKind::GlobalResolved)
                .at(block, node)
                .pass(self.name())
                .message(format!("{addr} -> global_{addr}"));
            true
        })
    }
}
