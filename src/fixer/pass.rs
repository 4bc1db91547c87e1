//! The fixer pass trait and its per-function context.

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{config::FixerPasses, events::EventLog},
    symbols::{FunctionSignature, NativeTable},
};

/// Read-only module data a pass may consult.
#[derive(Debug, Clone, Copy)]
pub struct FixerContext<'a> {
    /// Natives of the module, keyed by index.
    pub natives: &'a NativeTable,
    /// Declared signature of the function being fixed.
    pub signature: &'a FunctionSignature,
}

impl<'a> FixerContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(natives: &'a NativeTable, signature: &'a FunctionSignature) -> Self {
        Self { natives, signature }
    }
}

/// A rewrite pass of the code fixer.
///
/// All passes must be thread-safe (Send + Sync) so one pipeline can fix many
/// functions in parallel. A pass never fails: a shape it does not recognize is left
/// untouched.
pub trait FixerPass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// The selection flag enabling this pass.
    fn flag(&self) -> FixerPasses;

    /// Should this pass run on the function described by `ctx`?
    fn should_run(&self, _ctx: &FixerContext<'_>) -> bool {
        true
    }

    /// Runs the pass over the whole function.
    ///
    /// Returns `true` if anything changed. Every rewrite is recorded in `events`.
    fn run(
        &self,
        cfg: &mut IlControlFlowGraph,
        ctx: &FixerContext<'_>,
        events: &mut EventLog,
    ) -> bool;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
