//! Comparisons of bools against zero.
//!
//! ```text
//! b == 0    →    !b
//! b != 0    →    b
//! ```
//!
//! Only the `bool == 0` operand order is matched; `0 == b` is left alone, as are
//! comparisons whose left operand is not known to be a bool.

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::{replace_node, rewrite_expressions},
    },
    il::{BinaryOp, NodeKind},
};

/// Simplifies `bool == 0` and `bool != 0`.
pub struct BoolOpsPass;

impl FixerPass for BoolOpsPass {
    fn name(&self) -> &'static str {
        "bool-ops"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::BOOL_OPS
    }

    fn description(&self) -> &'static str {
        "Simplifies comparisons of bools against zero"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        rewrite_expressions(cfg, |cfg, block, node| {
            let NodeKind::Binary { op, left, right } = *cfg.graph().kind(node) else {
                return false;
            };
            if !matches!(op, BinaryOp::Eq | BinaryOp::Ne)
                || !cfg.graph().ty(left).is_some_and(|ty| ty.is_bool())
                || *cfg.graph().kind(right) != (NodeKind::Const { value: 0 })
            {
                return false;
            }

            let replacement = if op == BinaryOp::Eq {
                cfg.graph_mut().negate(left)
            } else {
                left
            };
            replace_node(cfg, node, replacement);
            events
                .record(EventKind::BoolCompareSimplified)
                .at(block, replacement)
                .pass(self.name());
            true
        })
    }
}
