//! Structuring integration tests.
//!
//! These tests run lifted functions through the whole middle-end using the
//! public API:
//! 1. Build the lifted IL and CFG
//! 2. Wrap them in an `IlFunction`
//! 3. Fix and structure with `IlFunction::decompile`
//! 4. Verify the statement tree through its outline, labels and gotos

use smxscope::prelude::*;

fn void_function(cfg: IlControlFlowGraph) -> Result<IlFunction> {
    IlFunction::new(FunctionSignature::new("f", Some(VarType::VOID)), cfg)
}

fn decompile(function: &mut IlFunction) -> Statement {
    let (_, tree) = function.decompile(&NativeTable::new(), &FixerConfig::default());
    tree
}

#[test]
fn test_counting_loop() -> Result<()> {
    // int i; i = 0; while (i < 10) { func_100(i); i = ++i; } return;
    let mut cfg = IlControlFlowGraph::new(0);
    let init = cfg.add_block(0x00)?;
    let header = cfg.add_block(0x10)?;
    let body = cfg.add_block(0x20)?;
    let exit = cfg.add_block(0x30)?;

    let graph = cfg.graph_mut();
    let i = graph.named_local(-4, DebugSymbol::new("i", VarType::INT));
    let zero = graph.constant(0);
    let store = graph.store(i, zero);
    let init_jump = graph.jump();
    let i_cond = graph.load(i);
    let ten = graph.constant(10);
    let less = graph.binary(BinaryOp::Lt, i_cond, ten);
    let test = graph.jump_cond(less);
    let i_arg = graph.load(i);
    let call = graph.call(0x100, vec![i_arg]);
    let inc = graph.unary(UnaryOp::Inc, i);
    let bump = graph.store(i, inc);
    let back = graph.jump();
    let ret = graph.ret(None);

    for node in [i, store, init_jump] {
        cfg.append(init, node);
    }
    cfg.append(header, test);
    for node in [call, bump, back] {
        cfg.append(body, node);
    }
    cfg.append(exit, ret);
    for (from, to) in [(init, header), (header, body), (header, exit), (body, header)] {
        cfg.add_edge(from, to)?;
    }

    let mut function = void_function(cfg)?;
    let tree = decompile(&mut function);

    assert_eq!(tree.count("While"), 1);
    assert!(tree.labels().is_empty());
    assert_eq!(
        tree.outline(function.cfg().graph()),
        "int i = 0\nwhile (i < 10)\n    func_100(i)\n    ++i\nreturn\n"
    );
    Ok(())
}

#[test]
fn test_short_circuit_structures_to_single_if() -> Result<()> {
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

    let mut function = void_function(cfg)?;
    let tree = decompile(&mut function);

    assert_eq!(tree.count("If"), 1);
    assert_eq!(
        tree.outline(function.cfg().graph()),
        "if (!a)\n    func_200()\nreturn\n"
    );
    Ok(())
}

#[test]
fn test_switch_case_leaving_directly() -> Result<()> {
    let mut cfg = IlControlFlowGraph::new(0);
    let head = cfg.add_block(0x00)?;
    let first = cfg.add_block(0x10)?;
    let merge = cfg.add_block(0x20)?;
    let default = cfg.add_block(0x30)?;

    let graph = cfg.graph_mut();
    let v = graph.named_global(0x100, DebugSymbol::new("v", VarType::INT));
    let value = graph.load(v);
    let switch = graph.switch(value, vec![1, 2]);
    let first_call = graph.call(0x10, Vec::new());
    let first_jump = graph.jump();
    let merge_call = graph.call(0x20, Vec::new());
    let ret = graph.ret(None);
    let default_call = graph.call(0x30, Vec::new());
    let default_jump = graph.jump();

    cfg.append(head, switch);
    cfg.append(first, first_call);
    cfg.append(first, first_jump);
    cfg.append(merge, merge_call);
    cfg.append(merge, ret);
    cfg.append(default, default_call);
    cfg.append(default, default_jump);
    for (from, to) in [
        (head, first),
        (head, merge),
        (head, default),
        (first, merge),
        (default, merge),
    ] {
        cfg.add_edge(from, to)?;
    }

    let mut function = void_function(cfg)?;
    let tree = decompile(&mut function);

    let StatementKind::Sequence(statements) = &tree.kind else {
        panic!("root is not a sequence");
    };
    let StatementKind::Switch { cases, default_case, .. } = &statements[0].kind else {
        panic!("first statement is not a switch");
    };
    assert_eq!(cases.len(), 2);
    assert!(cases[1].body.is_empty());
    assert!(default_case.is_some());
    assert_eq!(
        tree.outline(function.cfg().graph()),
        "switch (v)\ncase 1:\n    func_10()\ncase 2:\ndefault:\n    func_30()\nfunc_20()\nreturn\n"
    );
    Ok(())
}

#[test]
fn test_loop_exit_from_middle_uses_labelled_goto() -> Result<()> {
    // 0 -> 1; 1: if (c) 2 else 3; 2 -> 1; 3: return
    let mut cfg = IlControlFlowGraph::new(0);
    let blocks: Vec<BlockId> = [0x00, 0x10, 0x20, 0x30]
        .into_iter()
        .map(|pc| cfg.add_block(pc))
        .collect::<Result<_>>()?;

    let graph = cfg.graph_mut();
    let c = graph.named_global(0x40, DebugSymbol::new("c", VarType::BOOL));
    let enter = graph.jump();
    let step = graph.call(0x10, Vec::new());
    let c_load = graph.load(c);
    let test = graph.jump_cond(c_load);
    let work = graph.call(0x20, Vec::new());
    let back = graph.jump();
    let ret = graph.ret(None);

    cfg.append(blocks[0], enter);
    cfg.append(blocks[1], step);
    cfg.append(blocks[1], test);
    cfg.append(blocks[2], work);
    cfg.append(blocks[2], back);
    cfg.append(blocks[3], ret);
    for (from, to) in [(0, 1), (1, 2), (1, 3), (2, 1)] {
        cfg.add_edge(blocks[from], blocks[to])?;
    }

    let mut function = void_function(cfg)?;
    let tree = decompile(&mut function);

    assert_eq!(tree.count("Goto"), 1);
    assert_eq!(tree.goto_targets(), vec![Label(0x30)]);
    assert_eq!(tree.labels(), tree.goto_targets());
    assert_eq!(
        tree.outline(function.cfg().graph()),
        "while (1)\n    func_10()\n    if (c)\n        func_20()\n    else\n        goto label_48\nlabel_48:\nreturn\n"
    );
    Ok(())
}

#[test]
fn test_structure_without_fixing() -> Result<()> {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0)?;
    let one = cfg.graph_mut().constant(1);
    let ret = cfg.graph_mut().ret(Some(one));
    cfg.append(entry, ret);

    let tree = structure(&mut cfg);

    assert_eq!(tree.outline(cfg.graph()), "return 1\n");
    assert_eq!(tree.descendants().len(), 2);
    Ok(())
}
