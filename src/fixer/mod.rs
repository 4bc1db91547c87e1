//! The code fixer: an ordered pipeline of rewrite passes over one function.
//!
//! Lifted IL mirrors the bytecode closely. Globals appear as raw addresses, array
//! accesses as pointer arithmetic, float operators as native calls and `&&`/`||` as
//! diamonds storing into temporaries. The fixer rewrites these idioms back into the
//! shapes a programmer would have written, so the structurer and emitter can work
//! on something that reads like source.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         CodeFixer                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  FixerConfig          which passes run, verification       │
//! │  FixerContext         native table + function signature    │
//! │                                                            │
//! │  Expression passes    (every node, operands first)         │
//! │    1. const-globals   2. arrays   3. float-natives         │
//! │    4. void-returns    5. bool-ops                          │
//! │                                                            │
//! │  Cleanup phase        (repeated until a round is quiet)    │
//! │    6. store-coalescing   7. inc-dec   8. dead-temporaries  │
//! │    9. short-circuit                                        │
//! │                                                            │
//! │  compute_dominance()  once, after the last pass            │
//! │  EventLog             every rewrite, with block and node   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The expression passes run once, in the order above; later passes rely on the
//! normal forms produced by earlier ones. The cleanup passes expose work for each
//! other (inlining a temporary can leave a declaration right before its store, and
//! flattening a diamond moves statements into the continuation), so they repeat as
//! a group until no pass changes anything. Running the pipeline a second time over
//! its own output changes nothing.
//!
//! # Example
//!
//! ```rust
//! use smxscope::{
//!     cfg::IlControlFlowGraph,
//!     fixer::{CodeFixer, EventKind, FixerConfig, FixerContext},
//!     symbols::{FunctionSignature, NativeTable, VarType},
//! };
//!
//! let mut cfg = IlControlFlowGraph::new(0);
//! let entry = cfg.add_block(0)?;
//! let zero = cfg.graph_mut().constant(0);
//! let ret = cfg.graph_mut().ret(Some(zero));
//! cfg.append(entry, ret);
//!
//! let natives = NativeTable::new();
//! let signature = FunctionSignature::new("OnPluginStart", Some(VarType::VOID));
//! let fixer = CodeFixer::new(FixerConfig::default());
//! let events = fixer.apply_fixes(&mut cfg, &FixerContext::new(&natives, &signature));
//!
//! assert!(events.has(EventKind::ReturnValueStripped));
//! assert_eq!(cfg.graph().render_statement(ret, None), "return");
//! # Ok::<(), smxscope::Error>(())
//! ```

mod config;
mod events;
mod pass;
mod passes;

pub use config::{FixerConfig, FixerPasses};
pub use events::{Event, EventBuilder, EventKind, EventLog};
pub use pass::{FixerContext, FixerPass};
pub use passes::{
    ArrayIndexPass, BoolOpsPass, ConstGlobalsPass, DeadTemporariesPass, FloatNativesPass,
    IncDecPass, ShortCircuitPass, StoreCoalescingPass, VoidReturnPass,
};

use crate::cfg::IlControlFlowGraph;

/// Passes that repeat as a group until none of them changes the function.
const CLEANUP_PHASE: FixerPasses = FixerPasses::STORE_COALESCING
    .union(FixerPasses::INC_DEC)
    .union(FixerPasses::DEAD_TEMPORARIES)
    .union(FixerPasses::SHORT_CIRCUIT);

/// Upper bound on rounds of the cleanup phase. Every cleanup rewrite removes a node
/// or a block, so the bound is only hit on a broken pass.
const MAX_CLEANUP_ROUNDS: usize = 64;

/// Runs the selected fixer passes over a function, in pipeline order.
pub struct CodeFixer {
    passes: Vec<Box<dyn FixerPass>>,
    config: FixerConfig,
}

impl Default for CodeFixer {
    fn default() -> Self {
        Self::new(FixerConfig::default())
    }
}

impl CodeFixer {
    /// Creates a fixer running the passes selected by `config`.
    #[must_use]
    pub fn new(config: FixerConfig) -> Self {
        let pipeline: [Box<dyn FixerPass>; 9] = [
            Box::new(ConstGlobalsPass),
            Box::new(ArrayIndexPass),
            Box::new(FloatNativesPass),
            Box::new(VoidReturnPass),
            Box::new(BoolOpsPass),
            Box::new(StoreCoalescingPass),
            Box::new(IncDecPass),
            Box::new(DeadTemporariesPass),
            Box::new(ShortCircuitPass),
        ];
        let passes = pipeline
            .into_iter()
            .filter(|pass| config.passes.contains(pass.flag()))
            .collect();
        Self { passes, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FixerConfig {
        &self.config
    }

    /// Returns the enabled passes, in the order they run.
    pub fn passes(&self) -> impl Iterator<Item = &dyn FixerPass> + '_ {
        self.passes.iter().map(|pass| pass.as_ref())
    }

    /// Runs the enabled passes over `cfg` and returns the log of rewrites.
    ///
    /// Each enabled pass records exactly one [`EventKind::PassCompleted`], even when
    /// the cleanup phase ran it several times.
    ///
    /// # Panics
    ///
    /// With [`FixerConfig::verify_after_each_pass`] set, panics if a pass leaves
    /// use lists or block edges inconsistent.
    pub fn apply_fixes(&self, cfg: &mut IlControlFlowGraph, ctx: &FixerContext<'_>) -> EventLog {
        let mut events = EventLog::new();

        let mut start = 0;
        while start < self.passes.len() {
            let cleanup = CLEANUP_PHASE.contains(self.passes[start].flag());
            let len = if cleanup {
                self.passes[start..]
                    .iter()
                    .take_while(|pass| CLEANUP_PHASE.contains(pass.flag()))
                    .count()
            } else {
                1
            };
            let rounds = if cleanup { MAX_CLEANUP_ROUNDS } else { 1 };
            self.run_phase(&self.passes[start..start + len], rounds, cfg, ctx, &mut events);
            start += len;
        }

        if self.config.recompute_dominance {
            cfg.compute_dominance();
        }
        events
    }

    /// Runs `phase` in order, repeating until a round changes nothing or `rounds`
    /// rounds have run.
    fn run_phase(
        &self,
        phase: &[Box<dyn FixerPass>],
        rounds: usize,
        cfg: &mut IlControlFlowGraph,
        ctx: &FixerContext<'_>,
        events: &mut EventLog,
    ) {
        let mut enabled: Vec<(&dyn FixerPass, bool)> = Vec::with_capacity(phase.len());
        for pass in phase {
            if pass.should_run(ctx) {
                enabled.push((pass.as_ref(), false));
            } else {
                tracing::trace!(pass = pass.name(), function = %ctx.signature.name, "pass skipped");
            }
        }

        for round in 0..rounds {
            let mut round_changed = false;
            for (pass, changed) in &mut enabled {
                let before = events.len();
                let pass_changed = pass.run(cfg, ctx, events);
                tracing::debug!(
                    pass = pass.name(),
                    function = %ctx.signature.name,
                    round,
                    changed = pass_changed,
                    rewrites = events.len() - before,
                    "fixer pass finished"
                );
                *changed |= pass_changed;
                round_changed |= pass_changed;

                if self.config.verify_after_each_pass {
                    if let Err(error) = cfg.graph().check_use_def().and_then(|()| cfg.check_edges()) {
                        panic!("pass {} left the graph inconsistent: {error}", pass.name());
                    }
                }
            }
            if !round_changed {
                break;
            }
        }

        for (pass, changed) in enabled {
            events
                .record(EventKind::PassCompleted)
                .pass(pass.name())
                .message(if changed { "changed" } else { "unchanged" });
        }
    }
}
