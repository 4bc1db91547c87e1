//! Code fixer integration tests.
//!
//! These tests drive whole functions through the public pipeline:
//! 1. Build the lifted IL and its CFG the way the lifter hands them over
//! 2. Run `CodeFixer::apply_fixes` with the default configuration
//! 3. Verify the rewritten shapes, the event journal and graph consistency
//! 4. Re-run the pipeline and verify nothing changes

use smxscope::prelude::*;

fn run(cfg: &mut IlControlFlowGraph, natives: &NativeTable, signature: &FunctionSignature) -> EventLog {
    let fixer = CodeFixer::new(FixerConfig::default().with_verification(true));
    fixer.apply_fixes(cfg, &FixerContext::new(natives, signature))
}

fn int_signature() -> FunctionSignature {
    FunctionSignature::new("f", Some(VarType::INT))
}

fn assert_consistent(cfg: &IlControlFlowGraph) -> Result<()> {
    cfg.graph().check_use_def()?;
    cfg.check_edges()?;
    cfg.check_terminators()
}

#[test]
fn test_array_index_example() -> Result<()> {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    let matrix = graph.named_local(-32, DebugSymbol::new("m", VarType::array(TypeTag::Int, 2)));
    let arr = graph.named_local(-64, DebugSymbol::new("arr", VarType::array(TypeTag::Int, 1)));
    let i = graph.named_local(-4, DebugSymbol::new("i", VarType::INT));
    let row = graph.load(matrix);
    let call = graph.call(0x100, vec![row]);
    let index = graph.load(i);
    let sum = graph.binary(BinaryOp::Add, arr, index);
    let element = graph.load(sum);
    let ret = graph.ret(Some(element));
    for node in [matrix, arr, i, call, ret] {
        cfg.append(entry, node);
    }

    let events = run(&mut cfg, &NativeTable::new(), &int_signature());

    assert_eq!(events.count_kind(EventKind::ArrayIndexInserted), 1);
    assert_eq!(events.count_kind(EventKind::ArrayArithmeticIndexed), 1);
    assert_eq!(cfg.graph().render(call), "func_100(m[0])");
    assert_eq!(cfg.graph().render_statement(ret, None), "return arr[i]");
    assert!(!cfg.graph().is_live(sum));
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &int_signature());
    assert_eq!(second.transformation_count(), 0);
    Ok(())
}

#[test]
fn test_bool_compare_example() -> Result<()> {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    let x = graph.named_global(0x40, DebugSymbol::new("x", VarType::BOOL));
    let x_eq = graph.load(x);
    let zero = graph.constant(0);
    let eq = graph.binary(BinaryOp::Eq, x_eq, zero);
    let first = graph.call(0x100, vec![eq]);
    let x_ne = graph.load(x);
    let zero = graph.constant(0);
    let ne = graph.binary(BinaryOp::Ne, x_ne, zero);
    let ret = graph.ret(Some(ne));
    cfg.append(entry, first);
    cfg.append(entry, ret);

    let events = run(&mut cfg, &NativeTable::new(), &int_signature());

    assert_eq!(events.count_kind(EventKind::BoolCompareSimplified), 2);
    assert_eq!(cfg.graph().render(first), "func_100(!x)");
    // `x != 0` collapses to the very load that was compared
    assert_eq!(*cfg.graph().kind(ret), NodeKind::Return { value: Some(x_ne) });
    assert!(!cfg.graph().is_live(ne));
    assert_consistent(&cfg)
}

#[test]
fn test_float_native_example() -> Result<()> {
    let natives: NativeTable = ["FloatAdd", "__FLOAT_NOT__", "PrintToServer"].into_iter().collect();
    let mut cfg = IlControlFlowGraph::new(2);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    let a = graph.named_local(12, DebugSymbol::new("a", VarType::FLOAT));
    let b = graph.named_local(16, DebugSymbol::new("b", VarType::FLOAT));
    let a_load = graph.load(a);
    let b_load = graph.load(b);
    let add = graph.native(0, vec![a_load, b_load]);
    let print = graph.native(2, vec![add]);
    let x_load = graph.load(a);
    let not = graph.native(1, vec![x_load]);
    let ret = graph.ret(Some(not));
    cfg.append(entry, print);
    cfg.append(entry, ret);

    let events = run(&mut cfg, &natives, &FunctionSignature::new("f", Some(VarType::BOOL)));

    assert_eq!(events.count_kind(EventKind::FloatNativeReplaced), 2);
    assert_eq!(cfg.graph().render_with(print, Some(&natives)), "PrintToServer(a + b)");
    let NodeKind::Return { value: Some(folded) } = *cfg.graph().kind(ret) else {
        panic!("return lost its value");
    };
    assert_eq!(
        *cfg.graph().kind(folded),
        NodeKind::Unary {
            op: UnaryOp::FloatNot,
            value: x_load
        }
    );
    assert!(!cfg.graph().is_live(add));
    assert_consistent(&cfg)
}

#[test]
fn test_void_return_example() -> Result<()> {
    let build = || -> Result<(IlControlFlowGraph, NodeId)> {
        let mut cfg = IlControlFlowGraph::new(0);
        let entry = cfg.add_block(0)?;
        let one = cfg.graph_mut().constant(1);
        let ret = cfg.graph_mut().ret(Some(one));
        cfg.append(entry, ret);
        Ok((cfg, ret))
    };

    let (mut cfg, ret) = build()?;
    let events = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", Some(VarType::VOID)));
    assert_eq!(events.count_kind(EventKind::ReturnValueStripped), 1);
    assert_eq!(*cfg.graph().kind(ret), NodeKind::Return { value: None });

    let (mut cfg, ret) = build()?;
    let events = run(&mut cfg, &NativeTable::new(), &int_signature());
    assert!(!events.has(EventKind::ReturnValueStripped));
    assert_eq!(cfg.graph().render_statement(ret, None), "return 1");
    Ok(())
}

/// `if (!a && ...)` style diamond: `bb` computes the condition, `then`/`else`
/// store 1/0 into a compiler temporary, `cont` branches on it.
fn short_circuit_function() -> Result<(IlControlFlowGraph, NodeId)> {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0x00)?;
    let bb = cfg.add_block(0x08)?;
    let then_block = cfg.add_block(0x10)?;
    let else_block = cfg.add_block(0x18)?;
    let cont = cfg.add_block(0x20)?;
    let body = cfg.add_block(0x28)?;
    let exit = cfg.add_block(0x30)?;

    let graph = cfg.graph_mut();
    let tmp = graph.local_var(-4, Some(VarType::BOOL));
    let a = graph.named_global(0x40, DebugSymbol::new("a", VarType::BOOL));
    let entry_jump = graph.jump();
    let a_load = graph.load(a);
    let zero = graph.constant(0);
    let condition = graph.binary(BinaryOp::Eq, a_load, zero);
    let branch = graph.jump_cond(condition);
    let one = graph.constant(1);
    let then_store = graph.store(tmp, one);
    let zero = graph.constant(0);
    let else_store = graph.store(tmp, zero);
    let else_jump = graph.jump();
    let tmp_load = graph.load(tmp);
    let cont_branch = graph.jump_cond(tmp_load);
    let work = graph.call(0x200, Vec::new());
    let body_jump = graph.jump();
    let ret = graph.ret(None);

    cfg.append(entry, tmp);
    cfg.append(entry, entry_jump);
    cfg.append(bb, branch);
    cfg.append(then_block, then_store);
    cfg.append(else_block, else_store);
    cfg.append(else_block, else_jump);
    cfg.append(cont, cont_branch);
    cfg.append(body, work);
    cfg.append(body, body_jump);
    cfg.append(exit, ret);
    for (from, to) in [
        (entry, bb),
        (bb, then_block),
        (bb, else_block),
        (then_block, cont),
        (else_block, cont),
        (cont, body),
        (cont, exit),
        (body, exit),
    ] {
        cfg.add_edge(from, to)?;
    }
    Ok((cfg, cont_branch))
}

#[test]
fn test_short_circuit_example() -> Result<()> {
    let (mut cfg, cont_branch) = short_circuit_function()?;
    let signature = FunctionSignature::new("f", Some(VarType::VOID));

    let events = run(&mut cfg, &NativeTable::new(), &signature);

    assert_eq!(events.count_kind(EventKind::ShortCircuitFlattened), 1);
    assert_eq!(events.count_kind(EventKind::BlockRemoved), 3);
    // bool-ops ran first and turned `a == 0` into `!a`
    assert_eq!(events.count_kind(EventKind::BoolCompareSimplified), 1);
    assert_eq!(cfg.num_blocks(), 4);
    assert_eq!(cfg.block(cfg.entry()).nodes().len(), 1);
    assert_eq!(cfg.graph().render_statement(cont_branch, None), "if (!a) goto");

    let cont = cfg.block(cfg.entry()).succs()[0];
    assert_eq!(cfg.block(cont).pc(), 0x20);
    assert_eq!(cfg.block(cont).preds(), &[cfg.entry()]);
    assert_eq!(cfg.block(cont).idom(), Some(cfg.entry()));
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &signature);
    assert_eq!(second.transformation_count(), 0);
    assert_eq!(cfg.num_blocks(), 4);
    Ok(())
}

#[test]
fn test_local_idioms_cleaned_up() -> Result<()> {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    // int i; i = 5;
    let i = graph.named_local(-4, DebugSymbol::new("i", VarType::INT));
    let five = graph.constant(5);
    let init = graph.store(i, five);
    // i = ++i;
    let i_var = graph.load(i);
    let inc = graph.unary(UnaryOp::Inc, i);
    let bump = graph.store(i, inc);
    // any tmp = func_100(); return tmp;
    let call = graph.call(0x100, vec![i_var]);
    let tmp = graph.local_var(-8, Some(VarType::INT));
    graph.set_value(tmp, call);
    let tmp_load = graph.load(tmp);
    let ret = graph.ret(Some(tmp_load));
    for node in [i, init, bump, tmp, ret] {
        cfg.append(entry, node);
    }

    let events = run(&mut cfg, &NativeTable::new(), &int_signature());

    assert_eq!(events.count_kind(EventKind::StoreCoalesced), 1);
    assert_eq!(events.count_kind(EventKind::IncDecUnwrapped), 1);
    assert_eq!(events.count_kind(EventKind::TemporaryInlined), 1);
    assert_eq!(cfg.block(entry).nodes(), &[i, inc, ret]);
    assert_eq!(cfg.graph().render_statement(i, None), "int i = 5");
    assert_eq!(cfg.graph().render_statement(ret, None), "return func_100(i)");
    assert!(!cfg.graph().is_live(tmp));
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &int_signature());
    assert_eq!(second.transformation_count(), 0);
    Ok(())
}

#[test]
fn test_self_referential_temporary_kept() -> Result<()> {
    // any t; t = t + 1;
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    let t = graph.local_var(-4, None);
    let t_load = graph.load(t);
    let one = graph.constant(1);
    let sum = graph.binary(BinaryOp::Add, t_load, one);
    let store = graph.store(t, sum);
    let ret = graph.ret(None);
    for node in [t, store, ret] {
        cfg.append(entry, node);
    }

    let events = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", Some(VarType::VOID)));

    assert_eq!(events.count_kind(EventKind::StoreCoalesced), 1);
    assert!(!events.has(EventKind::TemporaryInlined));
    assert!(!events.has(EventKind::TemporaryRemoved));
    assert_eq!(cfg.block(entry).nodes(), &[t, ret]);
    assert_eq!(*cfg.graph().kind(t), NodeKind::LocalVar { offset: -4, value: Some(sum), symbol: None });
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", Some(VarType::VOID)));
    assert_eq!(second.transformation_count(), 0);
    Ok(())
}

#[test]
fn test_inlined_temporary_exposes_store_coalescing() -> Result<()> {
    // int x; int local_8 = a + 1; x = local_8; return x;
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let graph = cfg.graph_mut();
    let x = graph.named_local(-4, DebugSymbol::new("x", VarType::INT));
    let a = graph.named_global(0x40, DebugSymbol::new("a", VarType::INT));
    let a_load = graph.load(a);
    let one = graph.constant(1);
    let sum = graph.binary(BinaryOp::Add, a_load, one);
    let tmp = graph.local_var(-8, Some(VarType::INT));
    graph.set_value(tmp, sum);
    let tmp_load = graph.load(tmp);
    let store = graph.store(x, tmp_load);
    let x_load = graph.load(x);
    let ret = graph.ret(Some(x_load));
    for node in [x, tmp, store, ret] {
        cfg.append(entry, node);
    }

    let events = run(&mut cfg, &NativeTable::new(), &int_signature());

    assert_eq!(events.count_kind(EventKind::TemporaryInlined), 1);
    assert_eq!(events.count_kind(EventKind::StoreCoalesced), 1);
    assert_eq!(events.count_kind(EventKind::PassCompleted), 8);
    assert_eq!(cfg.block(entry).nodes(), &[x, ret]);
    assert_eq!(cfg.graph().render_statement(x, None), "int x = a + 1");
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &int_signature());
    assert_eq!(second.transformation_count(), 0);
    Ok(())
}

#[test]
fn test_short_circuit_retargets_every_predecessor() -> Result<()> {
    // entry: if (g) goto bb else other; other: func_10(); goto bb; then the diamond
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0x00)?;
    let other = cfg.add_block(0x04)?;
    let bb = cfg.add_block(0x08)?;
    let then_block = cfg.add_block(0x10)?;
    let else_block = cfg.add_block(0x18)?;
    let cont = cfg.add_block(0x20)?;
    let body = cfg.add_block(0x28)?;
    let exit = cfg.add_block(0x30)?;

    let graph = cfg.graph_mut();
    let tmp = graph.local_var(-4, Some(VarType::BOOL));
    let g = graph.named_global(0x40, DebugSymbol::new("g", VarType::BOOL));
    let b = graph.named_global(0x44, DebugSymbol::new("b", VarType::BOOL));
    let g_load = graph.load(g);
    let entry_branch = graph.jump_cond(g_load);
    let side = graph.call(0x10, Vec::new());
    let other_jump = graph.jump();
    let b_load = graph.load(b);
    let branch = graph.jump_cond(b_load);
    let one = graph.constant(1);
    let then_store = graph.store(tmp, one);
    let zero = graph.constant(0);
    let else_store = graph.store(tmp, zero);
    let else_jump = graph.jump();
    let tmp_load = graph.load(tmp);
    let cont_branch = graph.jump_cond(tmp_load);
    let work = graph.call(0x200, Vec::new());
    let body_jump = graph.jump();
    let ret = graph.ret(None);

    cfg.append(entry, tmp);
    cfg.append(entry, entry_branch);
    cfg.append(other, side);
    cfg.append(other, other_jump);
    cfg.append(bb, branch);
    cfg.append(then_block, then_store);
    cfg.append(else_block, else_store);
    cfg.append(else_block, else_jump);
    cfg.append(cont, cont_branch);
    cfg.append(body, work);
    cfg.append(body, body_jump);
    cfg.append(exit, ret);
    for (from, to) in [
        (entry, bb),
        (entry, other),
        (other, bb),
        (bb, then_block),
        (bb, else_block),
        (then_block, cont),
        (else_block, cont),
        (cont, body),
        (cont, exit),
        (body, exit),
    ] {
        cfg.add_edge(from, to)?;
    }

    let events = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", Some(VarType::VOID)));

    assert_eq!(events.count_kind(EventKind::ShortCircuitFlattened), 1);
    assert_eq!(cfg.num_blocks(), 5);
    let cont = cfg.find_block_at(0x20).unwrap();
    let other = cfg.find_block_at(0x04).unwrap();
    assert_eq!(cfg.block(entry).succs(), &[cont, other]);
    assert_eq!(cfg.block(other).succs(), &[cont]);
    assert_eq!(cfg.block(cont).preds(), &[entry, other]);
    assert_eq!(cfg.block(cont).idom(), Some(entry));
    assert_eq!(cfg.graph().render_statement(cont_branch, None), "if (b) goto");
    assert_consistent(&cfg)?;

    let second = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", Some(VarType::VOID)));
    assert_eq!(second.transformation_count(), 0);
    Ok(())
}

#[test]
fn test_event_summary_and_filters() -> Result<()> {
    let (mut cfg, _) = short_circuit_function()?;
    let events = run(&mut cfg, &NativeTable::new(), &FunctionSignature::new("f", None));

    assert_eq!(events.count_kind(EventKind::PassCompleted), 8);
    assert_eq!(events.filter_pass("short-circuit").filter(|e| e.kind.is_transformation()).count(), 4);
    assert!(events.summary().contains("1 short circuit flattened"));
    Ok(())
}

#[test]
fn test_fix_functions_in_parallel() -> Result<()> {
    let mut functions = Vec::new();
    for n in 0..16 {
        let (cfg, _) = short_circuit_function()?;
        let signature = FunctionSignature::new(format!("f{n}"), Some(VarType::VOID));
        functions.push(IlFunction::new(signature, cfg)?);
    }

    let logs = fix_functions(&mut functions, &NativeTable::new(), &FixerConfig::default());

    assert_eq!(logs.len(), functions.len());
    for (function, log) in functions.iter().zip(&logs) {
        assert_eq!(log.count_kind(EventKind::ShortCircuitFlattened), 1);
        assert_eq!(function.cfg().num_blocks(), 4);
    }
    Ok(())
}
