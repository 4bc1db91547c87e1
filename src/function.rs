//! Function-level orchestration of the middle-end.
//!
//! An [`IlFunction`] bundles the lifted control flow graph of one function with
//! its signature and drives it through the code fixer and the structurer.
//! Functions are independent of each other, so [`fix_functions`] fixes a whole
//! module's worth of them in parallel.

use rayon::prelude::*;

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{CodeFixer, EventLog, FixerConfig, FixerContext},
    structure::{structure, Statement},
    symbols::{FunctionSignature, NativeTable},
    Error, Result,
};

/// One lifted function: its signature and its control flow graph.
#[derive(Debug)]
pub struct IlFunction {
    signature: FunctionSignature,
    cfg: IlControlFlowGraph,
}

impl IlFunction {
    /// Wraps a lifted control flow graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for a graph without blocks, and the verifier's error
    /// when a block's terminator disagrees with its successors or an edge is only
    /// recorded on one side.
    pub fn new(signature: FunctionSignature, cfg: IlControlFlowGraph) -> Result<Self> {
        if cfg.is_empty() {
            return Err(Error::Empty);
        }
        cfg.check_terminators()?;
        cfg.check_edges()?;
        Ok(Self { signature, cfg })
    }

    /// Returns the signature.
    #[must_use]
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Returns the control flow graph.
    #[must_use]
    pub fn cfg(&self) -> &IlControlFlowGraph {
        &self.cfg
    }

    /// Returns the control flow graph for mutation.
    pub fn cfg_mut(&mut self) -> &mut IlControlFlowGraph {
        &mut self.cfg
    }

    /// Runs the code fixer over the function.
    pub fn fix(&mut self, natives: &NativeTable, config: &FixerConfig) -> EventLog {
        let fixer = CodeFixer::new(config.clone());
        self.fix_with(&fixer, natives)
    }

    fn fix_with(&mut self, fixer: &CodeFixer, natives: &NativeTable) -> EventLog {
        let ctx = FixerContext::new(natives, &self.signature);
        let events = fixer.apply_fixes(&mut self.cfg, &ctx);
        tracing::debug!(
            function = %self.signature.name,
            rewrites = events.transformation_count(),
            "function fixed"
        );
        events
    }

    /// Structures the function into a statement tree.
    pub fn structure(&mut self) -> Statement {
        structure(&mut self.cfg)
    }

    /// Fixes the function, then structures it.
    pub fn decompile(&mut self, natives: &NativeTable, config: &FixerConfig) -> (EventLog, Statement) {
        let events = self.fix(natives, config);
        let tree = self.structure();
        (events, tree)
    }
}

/// Fixes every function of a module in parallel.
///
/// Returns one event log per function, in the order of `functions`.
pub fn fix_functions(
    functions: &mut [IlFunction],
    natives: &NativeTable,
    config: &FixerConfig,
) -> Vec<EventLog> {
    let fixer = CodeFixer::new(config.clone());
    functions
        .par_iter_mut()
        .map(|function| function.fix_with(&fixer, natives))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixer::EventKind, symbols::VarType};

    fn returning_zero(name: &str) -> IlFunction {
        let mut cfg = IlControlFlowGraph::new(0);
        let entry = cfg.add_block(0).unwrap();
        let zero = cfg.graph_mut().constant(0);
        let ret = cfg.graph_mut().ret(Some(zero));
        cfg.append(entry, ret);
        IlFunction::new(FunctionSignature::new(name, Some(VarType::VOID)), cfg).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        let signature = FunctionSignature::new("f", None);
        let result = IlFunction::new(signature, IlControlFlowGraph::new(0));
        assert!(matches!(result, Err(Error::Empty)));
    }

    #[test]
    fn test_new_rejects_missing_successor() {
        let mut cfg = IlControlFlowGraph::new(0);
        let entry = cfg.add_block(0).unwrap();
        let jump = cfg.graph_mut().jump();
        cfg.append(entry, jump);
        let result = IlFunction::new(FunctionSignature::new("f", None), cfg);
        assert!(result.is_err());
    }

    #[test]
    fn test_decompile() {
        let mut function = returning_zero("OnPluginStart");
        let (events, tree) = function.decompile(&NativeTable::new(), &FixerConfig::default());
        assert!(events.has(EventKind::ReturnValueStripped));
        assert_eq!(tree.outline(function.cfg().graph()), "return\n");
    }

    #[test]
    fn test_fix_functions_keeps_order() {
        let mut functions: Vec<_> = (0..8).map(|i| returning_zero(&format!("f{i}"))).collect();
        let logs = fix_functions(&mut functions, &NativeTable::new(), &FixerConfig::default());
        assert_eq!(logs.len(), 8);
        assert!(logs
            .iter()
            .all(|log| log.count_kind(EventKind::ReturnValueStripped) == 1));
    }
}
