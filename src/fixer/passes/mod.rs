//! The rewrite passes of the code fixer, in pipeline order.
//!
//! | # | Pass | Rewrite |
//! |---|------|---------|
//! | 1 | [`ConstGlobalsPass`] | `2332[i]` → `g[i]` |
//! | 2 | [`ArrayIndexPass`] | `arr = x` → `arr[0] = x`, `arr + i` → `arr[i]` |
//! | 3 | [`FloatNativesPass`] | `FloatAdd(a, b)` → `a + b` |
//! | 4 | [`VoidReturnPass`] | `return x` → `return` in void functions |
//! | 5 | [`BoolOpsPass`] | `b == 0` → `!b`, `b != 0` → `b` |
//! | 6 | [`StoreCoalescingPass`] | `int x; x = v;` → `int x = v;` |
//! | 7 | [`IncDecPass`] | `i = ++i` → `++i` |
//! | 8 | [`DeadTemporariesPass`] | `int t = x; f(t);` → `f(x);` |
//! | 9 | [`ShortCircuitPass`] | `if (c) t = 1; else t = 0; if (t)` → `if (c)` |

mod arrays;
mod bool_ops;
mod const_globals;
mod float_natives;
mod inc_dec;
mod short_circuit;
mod store_coalescing;
mod temporaries;
mod void_returns;

pub use arrays::ArrayIndexPass;
pub use bool_ops::BoolOpsPass;
pub use const_globals::ConstGlobalsPass;
pub use float_natives::FloatNativesPass;
pub use inc_dec::IncDecPass;
pub use short_circuit::ShortCircuitPass;
pub use store_coalescing::StoreCoalescingPass;
pub use temporaries::DeadTemporariesPass;
pub use void_returns::VoidReturnPass;

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    il::NodeId,
};

/// Visits every expression node of every block, operands before their consumers.
///
/// Nodes unlinked by an earlier callback of the same walk are skipped. Returns `true`
/// if any callback returned `true`.
pub(crate) fn rewrite_expressions<F>(cfg: &mut IlControlFlowGraph, mut rewrite: F) -> bool
where
    F: FnMut(&mut IlControlFlowGraph, BlockId, NodeId) -> bool,
{
    let mut changed = false;
    for block in cfg.block_ids().collect::<Vec<_>>() {
        let order = cfg.graph().postorder(cfg.block(block).nodes().iter().copied());
        for node in order {
            if cfg.graph().is_live(node) && rewrite(cfg, block, node) {
                changed = true;
            }
        }
    }
    changed
}

/// Substitutes `new` for `old` in every operand slot and every block slot, then
/// discards `old` together with any expression operands left unused.
pub(crate) fn replace_node(cfg: &mut IlControlFlowGraph, old: NodeId, new: NodeId) {
    cfg.graph_mut().replace_uses_with(old, new);
    cfg.replace_root(old, new);
    cfg.graph_mut().discard(old);
}
