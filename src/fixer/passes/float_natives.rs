//! Float operator natives.
//!
//! SourcePawn has no float instructions; the compiler emits calls to natives bound
//! to the float operators instead. Calls with the operator's arity are folded back
//! into the operator:
//!
//! ```text
//! FloatAdd(a, b)        →    a + b
//! __FLOAT_GT__(a, b)    →    a > b
//! __FLOAT_NOT__(a)      →    !a
//! ```

use crate::{
    cfg::IlControlFlowGraph,
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::{replace_node, rewrite_expressions},
    },
    il::{BinaryOp, NodeKind, UnaryOp},
};

/// The operator a float native stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloatOperator {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl FloatOperator {
    fn for_native(name: &str) -> Option<Self> {
        let op = match name {
            "FloatMul" | "__FLOAT_MUL__" => Self::Binary(BinaryOp::FloatMul),
            "FloatDiv" | "__FLOAT_DIV__" => Self::Binary(BinaryOp::FloatDiv),
            "FloatAdd" | "__FLOAT_ADD__" => Self::Binary(BinaryOp::FloatAdd),
            "FloatSub" | "__FLOAT_SUB__" => Self::Binary(BinaryOp::FloatSub),
            "__FLOAT_GT__" => Self::Binary(BinaryOp::FloatGt),
            "__FLOAT_GE__" => Self::Binary(BinaryOp::FloatGe),
            "__FLOAT_LT__" => Self::Binary(BinaryOp::FloatLt),
            "__FLOAT_LE__" => Self::Binary(BinaryOp::FloatLe),
            "__FLOAT_EQ__" => Self::Binary(BinaryOp::FloatEq),
            "__FLOAT_NE__" => Self::Binary(BinaryOp::FloatNe),
            "__FLOAT_NOT__" => Self::Unary(UnaryOp::FloatNot),
            _ => return None,
        };
        Some(op)
    }

    fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }
}

/// Replaces calls of float operator natives with the operators.
pub struct FloatNativesPass;

impl FixerPass for FloatNativesPass {
    fn name(&self) -> &'static str {
        "float-natives"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::FLOAT_NATIVES
    }

    fn description(&self) -> &'static str {
        "Folds float operator natives into float operators"
    }

    /// # Panics
    ///
    /// Panics if a native call references an index missing from the native table.
    fn run(&self, cfg: &mut IlControlFlowGraph, ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        rewrite_expressions(cfg, |cfg, block, node| {
            let NodeKind::Native { index, args } = cfg.graph().kind(node) else {
                return false;
            };
            let Some(native) = ctx.natives.get(*index) else {
                panic!("{node} calls native {index} which the module does not declare");
            };
            let Some(op) = FloatOperator::for_native(&native.name) else {
                return false;
            };
            if args.len() != op.arity() {
                return false;
            }

            let args = args.clone();
            let graph = cfg.graph_mut();
            let replacement = match op {
                FloatOperator::Unary(op) => graph.unary(op, args[0]),
                FloatOperator::Binary(op) => graph.binary(op, args[0], args[1]),
            };
            replace_node(cfg, node, replacement);
            events
                .record(EventKind::FloatNativeReplaced)
                .at(block, replacement)
                .pass(self.name())
                .message(native.name.clone());
            true
        })
    }
}
