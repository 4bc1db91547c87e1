//! Declarations followed by their first store.
//!
//! ```text
//! float x;
//! x = a + b;     →    float x = a + b;
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

/// Folds a store directly following an uninitialized declaration into it.
pub struct StoreCoalescingPass;

impl FixerPass for StoreCoalescingPass {
    fn name(&self) -> &'static str {
        "store-coalescing"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::STORE_COALESCING
    }

    fn description(&self) -> &'static str {
        "Merges a declaration and the store that initializes it"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        let mut changed = false;
        for block in cfg.block_ids().collect::<Vec<_>>() {
            let mut i = cfg.block(block).num_nodes();
            while i > 1 {
                i -= 1;
                let store = cfg.block(block).nodes()[i];
                let decl = cfg.block(block).nodes()[i - 1];
                let NodeKind::Store { var, value } = *cfg.graph().kind(store) else {
                    continue;
                };
                if var != decl || !matches!(cfg.graph().kind(var), NodeKind::LocalVar { value: None, .. }) {
                    continue;
                }

                cfg.remove_node_at(block, i);
                let graph = cfg.graph_mut();
                graph.unlink(store);
                graph.set_value(decl, value);
                events
                    .record(EventKind::StoreCoalesced)
                    .at(block, decl)
                    .pass(self.name());
                changed = true;
            }
        }
        changed
    }
}
