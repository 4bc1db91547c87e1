//! Benchmarks for the middle-end pipeline.
//!
//! Measures the code fixer and the structurer on synthetic functions:
//! - Chains of `&&`/`||` diamonds (short-circuit flattening, block removal)
//! - Straight-line blocks full of temporaries and local stores
//! - Structuring of the fixed graphs
//! - Parallel batches of functions

extern crate smxscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use smxscope::prelude::*;
use std::hint::black_box;

/// Builds `count` short-circuit diamonds in a row, each guarding a call.
fn diamond_chain(count: usize) -> IlControlFlowGraph {
    let mut cfg = IlControlFlowGraph::new(0);
    let mut pc = 0;
    let mut next_pc = || {
        pc += 8;
        pc
    };

    let entry = cfg.add_block(0).unwrap();
    let jump = cfg.graph_mut().jump();
    cfg.append(entry, jump);

    let mut previous = entry;
    for n in 0..count {
        let bb = cfg.add_block(next_pc()).unwrap();
        let then_block = cfg.add_block(next_pc()).unwrap();
        let else_block = cfg.add_block(next_pc()).unwrap();
        let cont = cfg.add_block(next_pc()).unwrap();
        let body = cfg.add_block(next_pc()).unwrap();

        let graph = cfg.graph_mut();
        let tmp = graph.local_var(-4 * (n as Cell + 1), Some(VarType::BOOL));
        let flag = graph.named_global(n as Cell * 4, DebugSymbol::new(format!("g{n}"), VarType::BOOL));
        let load = graph.load(flag);
        let zero = graph.constant(0);
        let compare = graph.binary(BinaryOp::Eq, load, zero);
        let branch = graph.jump_cond(compare);
        let one = graph.constant(1);
        let then_store = graph.store(tmp, one);
        let zero = graph.constant(0);
        let else_store = graph.store(tmp, zero);
        let else_jump = graph.jump();
        let tmp_load = graph.load(tmp);
        let cont_branch = graph.jump_cond(tmp_load);
        let call = graph.call(0x1000 + n as Cell, Vec::new());
        let body_jump = graph.jump();

        cfg.insert_node(entry, n, tmp);
        cfg.append(bb, branch);
        cfg.append(then_block, then_store);
        cfg.append(else_block, else_store);
        cfg.append(else_block, else_jump);
        cfg.append(cont, cont_branch);
        cfg.append(body, call);
        cfg.append(body, body_jump);

        cfg.add_edge(previous, bb).unwrap();
        cfg.add_edge(bb, then_block).unwrap();
        cfg.add_edge(bb, else_block).unwrap();
        cfg.add_edge(then_block, cont).unwrap();
        cfg.add_edge(else_block, cont).unwrap();
        cfg.add_edge(cont, body).unwrap();

        // the body and the skip edge both continue at the next diamond
        let join = cfg.add_block(next_pc()).unwrap();
        let join_jump = cfg.graph_mut().jump();
        cfg.append(join, join_jump);
        cfg.add_edge(cont, join).unwrap();
        cfg.add_edge(body, join).unwrap();
        previous = join;
    }

    let exit = cfg.add_block(next_pc()).unwrap();
    let ret = cfg.graph_mut().ret(None);
    cfg.append(exit, ret);
    cfg.add_edge(previous, exit).unwrap();
    cfg
}

/// Builds one block of `count` temporaries, each inlined into a call argument.
fn temporaries_block(count: usize) -> IlControlFlowGraph {
    let mut cfg = IlControlFlowGraph::new(0);
    let entry = cfg.add_block(0).unwrap();
    for n in 0..count {
        let graph = cfg.graph_mut();
        let offset = -4 * (n as Cell + 1);
        let value = graph.call(0x100, Vec::new());
        let tmp = graph.local_var(offset, Some(VarType::INT));
        graph.set_value(tmp, value);
        let load = graph.load(tmp);
        let print = graph.call(0x200, vec![load]);
        cfg.append(entry, tmp);
        cfg.append(entry, print);
    }
    let ret = cfg.graph_mut().ret(None);
    cfg.append(entry, ret);
    cfg
}

fn bench_fix_diamonds(c: &mut Criterion) {
    let natives = NativeTable::new();
    let signature = FunctionSignature::new("bench", Some(VarType::VOID));
    let fixer = CodeFixer::default();

    let mut group = c.benchmark_group("fix_diamonds");
    for count in [4, 32, 128] {
        let template = diamond_chain(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &template, |b, template| {
            b.iter(|| {
                let mut cfg = template.clone();
                let events = fixer.apply_fixes(&mut cfg, &FixerContext::new(&natives, &signature));
                black_box(events)
            });
        });
    }
    group.finish();
}

fn bench_fix_temporaries(c: &mut Criterion) {
    let natives = NativeTable::new();
    let signature = FunctionSignature::new("bench", Some(VarType::VOID));
    let fixer = CodeFixer::default();
    let template = temporaries_block(256);

    c.bench_function("fix_temporaries_256", |b| {
        b.iter(|| {
            let mut cfg = template.clone();
            let events = fixer.apply_fixes(&mut cfg, &FixerContext::new(&natives, &signature));
            black_box(events)
        });
    });
}

fn bench_structure(c: &mut Criterion) {
    let natives = NativeTable::new();
    let signature = FunctionSignature::new("bench", Some(VarType::VOID));
    let mut fixed = diamond_chain(128);
    CodeFixer::default().apply_fixes(&mut fixed, &FixerContext::new(&natives, &signature));

    c.bench_function("structure_diamonds_128", |b| {
        b.iter(|| {
            let mut cfg = fixed.clone();
            black_box(structure(&mut cfg))
        });
    });
}

fn bench_fix_functions(c: &mut Criterion) {
    let natives = NativeTable::new();
    let config = FixerConfig::default();
    let template = diamond_chain(32);

    c.bench_function("fix_functions_64x32", |b| {
        b.iter(|| {
            let mut functions: Vec<IlFunction> = (0..64)
                .map(|n| {
                    let signature = FunctionSignature::new(format!("f{n}"), Some(VarType::VOID));
                    IlFunction::new(signature, template.clone()).unwrap()
                })
                .collect();
            black_box(fix_functions(&mut functions, &natives, &config))
        });
    });
}

criterion_group!(
    benches,
    bench_fix_diamonds,
    bench_fix_temporaries,
    bench_structure,
    bench_fix_functions
);
criterion_main!(benches);
