//! Configuration for the code fixer.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Selection of fixer passes.
    ///
    /// Pipeline order is fixed; the selection only switches passes on or off.
    pub struct FixerPasses : u16 {
        /// Constants used as array bases become global references
        const CONST_GLOBALS = 0x0001;
        /// Implicit element-zero accesses and array pointer arithmetic become indexing
        const ARRAYS = 0x0002;
        /// Float native calls become operators
        const FLOAT_NATIVES = 0x0004;
        /// Returned values are stripped in void functions
        const VOID_RETURNS = 0x0008;
        /// Comparisons of bools against zero are simplified
        const BOOL_OPS = 0x0010;
        /// Stores are folded into the declaration before them
        const STORE_COALESCING = 0x0020;
        /// Stores wrapping `++`/`--` are dropped
        const INC_DEC = 0x0040;
        /// Single-use compiler temporaries are inlined
        const DEAD_TEMPORARIES = 0x0080;
        /// `&&`/`||` temporaries are folded into the branch
        const SHORT_CIRCUIT = 0x0100;
    }
}

impl Default for FixerPasses {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for the code fixer.
#[derive(Debug, Clone)]
pub struct FixerConfig {
    /// Passes to run (default: all).
    pub passes: FixerPasses,

    /// Recompute dominance after the passes (default: true).
    pub recompute_dominance: bool,

    /// Verify use-def lists and edges after every pass (default: false).
    ///
    /// A failed verification panics; it means a pass broke the graph.
    pub verify_after_each_pass: bool,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            passes: FixerPasses::default(),
            recompute_dominance: true,
            verify_after_each_pass: false,
        }
    }
}

impl FixerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the passes to run.
    #[must_use]
    pub fn with_passes(mut self, passes: FixerPasses) -> Self {
        self.passes = passes;
        self
    }

    /// Removes passes from the selection.
    #[must_use]
    pub fn without(mut self, passes: FixerPasses) -> Self {
        self.passes.remove(passes);
        self
    }

    /// Enables or disables dominance recomputation after the passes.
    #[must_use]
    pub fn with_dominance(mut self, enable: bool) -> Self {
        self.recompute_dominance = enable;
        self
    }

    /// Enables or disables verification after every pass.
    #[must_use]
    pub fn with_verification(mut self, enable: bool) -> Self {
        self.verify_after_each_pass = enable;
        self
    }
}
