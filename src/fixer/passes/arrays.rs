//! Explicit element access for arrays.
//!
//! The VM addresses the first element of an array through the array's own address,
//! and indexes by adding an offset to it. Both read as scalar operations until the
//! variable's type says otherwise:
//!
//! ```text
//! arr = 5          →    arr[0] = 5
//! x = arr          →    x = arr[0]
//! arr + i          →    arr[i]
//! ```
//!
//! When both operands of an addition are arrays the left one is taken as the base.

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    fixer::{
        config::FixerPasses,
        events::{EventKind, EventLog},
        pass::{FixerContext, FixerPass},
        passes::{replace_node, rewrite_expressions},
    },
    il::{BinaryOp, NodeId, NodeKind},
};

/// Makes array element accesses explicit.
pub struct ArrayIndexPass;

impl ArrayIndexPass {
    fn is_array(cfg: &IlControlFlowGraph, node: NodeId) -> bool {
        cfg.graph().ty(node).is_some_and(|ty| ty.is_array())
    }

    fn is_array_var(cfg: &IlControlFlowGraph, node: NodeId) -> bool {
        cfg.graph().kind(node).is_var() && Self::is_array(cfg, node)
    }

    /// `arr` accessed as a scalar becomes `arr[0]`.
    fn index_access(
        &self,
        cfg: &mut IlControlFlowGraph,
        block: BlockId,
        node: NodeId,
        var: NodeId,
        events: &mut EventLog,
    ) -> bool {
        if matches!(cfg.graph().kind(var), NodeKind::ArrayElementVar { .. }) || !Self::is_array(cfg, var) {
            return false;
        }
        let graph = cfg.graph_mut();
        let zero = graph.constant(0);
        let element = graph.array_element(var, zero);
        graph.replace_param(node, var, element);
        events
            .record(EventKind::ArrayIndexInserted)
            .at(block, node)
            .pass(self.name());
        true
    }

    /// `arr + i` becomes `arr[i]`.
    fn index_arithmetic(
        &self,
        cfg: &mut IlControlFlowGraph,
        block: BlockId,
        node: NodeId,
        left: NodeId,
        right: NodeId,
        events: &mut EventLog,
    ) -> bool {
        let (base, index) = if Self::is_array_var(cfg, left) {
            (left, right)
        } else if Self::is_array_var(cfg, right) {
            (right, left)
        } else {
            return false;
        };
        let element = cfg.graph_mut().array_element(base, index);
        replace_node(cfg, node, element);
        events
            .record(EventKind::ArrayArithmeticIndexed)
            .at(block, element)
            .pass(self.name());
        true
    }
}

impl FixerPass for ArrayIndexPass {
    fn name(&self) -> &'static str {
        "arrays"
    }

    fn flag(&self) -> FixerPasses {
        FixerPasses::ARRAYS
    }

    fn description(&self) -> &'static str {
        "Rewrites implicit element-zero accesses and pointer arithmetic on arrays"
    }

    fn run(&self, cfg: &mut IlControlFlowGraph, _ctx: &FixerContext<'_>, events: &mut EventLog) -> bool {
        rewrite_expressions(cfg, |cfg, block, node| match *cfg.graph().kind(node) {
            NodeKind::Load { var } | NodeKind::Store { var, .. } => {
                self.index_access(cfg, block, node, var, events)
            }
            NodeKind::Binary {
                op: BinaryOp::Add,
                left,
                right,
            } => self.index_arithmetic(cfg, block, node, left, right, events),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixer::passes::testutil::{run_pass, single_block},
        symbols::{DebugSymbol, TypeTag, VarType},
    };

    fn char_array() -> DebugSymbol {
        DebugSymbol::new("name", VarType::array(TypeTag::Char, 1))
    }

    #[test]
    fn test_store_to_array_gets_index_zero() {
        let (mut cfg, entry) = single_block();
        let graph = cfg.graph_mut();
        let arr = graph.named_local(-64, char_array());
        let five = graph.constant(5);
        let store = graph.store(arr, five);
        cfg.append(entry, arr);
        cfg.append(entry, store);

        let (changed, events) = run_pass(&ArrayIndexPass, &mut cfg);

        assert!(changed);
        assert_eq!(events.count_kind(EventKind::ArrayIndexInserted), 1);
        assert_eq!(cfg.graph().render_statement(store, None), "name[0] = 5");

        let (changed, _) = run_pass(&ArrayIndexPass, &mut cfg);
        assert!(!changed);
    }

    #[test]
    fn test_add_on_array_becomes_element() {
        let (mut cfg, entry) = single_block();
        let graph = cfg.graph_mut();
        let arr = graph.named_local(-64, char_array());
        let i = graph.local_var(-4, Some(VarType::INT));
        let index = graph.load(i);
        let sum = graph.binary(BinaryOp::Add, index, arr);
        let value = graph.load(sum);
        let ret = graph.ret(Some(value));
        cfg.append(entry, arr);
        cfg.append(entry, i);
        cfg.append(entry, ret);

        let (changed, events) = run_pass(&ArrayIndexPass, &mut cfg);

        assert!(changed);
        assert_eq!(events.count_kind(EventKind::ArrayArithmeticIndexed), 1);
        assert!(!cfg.graph().is_live(sum));
        let NodeKind::Load { var } = *cfg.graph().kind(value) else {
            panic!("load was replaced");
        };
        assert_eq!(*cfg.graph().kind(var), NodeKind::ArrayElementVar { base: arr, index });
        assert_eq!(cfg.graph().render_statement(ret, None), "return name[local_4]");
    }

    #[test]
    fn test_left_operand_wins_when_both_are_arrays() {
        let (mut cfg, entry) = single_block();
        let graph = cfg.graph_mut();
        let a = graph.named_local(-8, DebugSymbol::new("a", VarType::array(TypeTag::Int, 1)));
        let b = graph.named_local(-16, DebugSymbol::new("b", VarType::array(TypeTag::Int, 1)));
        let sum = graph.binary(BinaryOp::Add, a, b);
        let ret = graph.ret(Some(sum));
        cfg.append(entry, ret);

        run_pass(&ArrayIndexPass, &mut cfg);

        let NodeKind::Return { value: Some(element) } = *cfg.graph().kind(ret) else {
            panic!("return lost its value");
        };
        assert_eq!(*cfg.graph().kind(element), NodeKind::ArrayElementVar { base: a, index: b });
    }

    #[test]
    fn test_untyped_variables_untouched() {
        let (mut cfg, entry) = single_block();
        let graph = cfg.graph_mut();
        let var = graph.local_var(-4, None);
        let one = graph.constant(1);
        let store = graph.store(var, one);
        let sum = graph.binary(BinaryOp::Add, one, one);
        let ret = graph.ret(Some(sum));
        cfg.append(entry, store);
        cfg.append(entry, ret);

        let (changed, events) = run_pass(&ArrayIndexPass, &mut cfg);
        assert!(!changed);
        assert!(events.is_empty());
    }
}
