//! Benchmarks for the snippet pipeline.

#![allow(missing_docs)] // Benchmark macros generate undocumented functions
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use codetrail::{Bindings, Catalog, ChallengeRunner, RunnerConfig, Sandbox, Value, lang, vet};
use criterion::{Criterion, criterion_group, criterion_main};

const LOOP: &str = "total = 0\nfor i in range(1000):\n    if i % 3 == 0:\n        total += i\n";

const FACTORIAL: &str = "def factorial(k):\n    if k <= 1:\n        return 1\n    return k * factorial(k - 1)\nresult = [factorial(n) for n in range(20)]\n";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_factorial", |b| {
        b.iter(|| black_box(lang::parse(black_box(FACTORIAL))));
    });
}

fn bench_execute(c: &mut Criterion) {
    let sandbox = Sandbox::default();
    let starter = Bindings::new();

    let program = vet(LOOP).unwrap();
    c.bench_function("execute_loop_1k", |b| {
        b.iter(|| black_box(sandbox.execute(&program, &starter)));
    });

    let program = vet(FACTORIAL).unwrap();
    c.bench_function("execute_recursion", |b| {
        b.iter(|| black_box(sandbox.execute(&program, &starter)));
    });

    let big: Bindings = [(
        "L",
        Value::List((0..10_000).rev().map(Value::Int).collect()),
    )]
    .into_iter()
    .collect();
    let program = vet("S = sorted(L)\nm = max(L)").unwrap();
    c.bench_function("execute_sort_10k", |b| {
        b.iter(|| black_box(sandbox.execute(&program, &big)));
    });
}

fn bench_catalog(c: &mut Criterion) {
    let catalog = Catalog::builtin().unwrap();
    let mut runner = ChallengeRunner::new(RunnerConfig::default());
    c.bench_function("evaluate_all_solutions", |b| {
        b.iter(|| {
            for challenge in catalog.challenges() {
                black_box(runner.evaluate(challenge, &challenge.solution));
            }
        });
    });
}

criterion_group!(benches, bench_parse, bench_execute, bench_catalog);
criterion_main!(benches);
