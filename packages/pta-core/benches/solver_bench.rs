//! Benchmarks for the points-to solver.
//!
//! Run with: cargo bench --bench solver_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pta_core::{AnalysisConfig, ConstraintExpr, PointsToAnalysis};

fn scalar(var: u32, off: u64) -> ConstraintExpr {
    ConstraintExpr::Scalar { var, off }
}
fn addr(var: u32) -> ConstraintExpr {
    ConstraintExpr::AddrOf { var, off: 0 }
}
fn deref(var: u32, off: u64) -> ConstraintExpr {
    ConstraintExpr::Deref { var, off }
}

/// A chain of `n` pointers, each taking the address of the previous and
/// copying from it, loosely modeling a linked-list-shaped points-to graph.
fn build_chain(n: usize) -> PointsToAnalysis {
    let mut an = PointsToAnalysis::new(AnalysisConfig::default());
    let obj = an.new_variable(Some(0), "obj", Some(64), &[]);
    let mut prev = an.new_variable(Some(1), "p0", Some(64), &[]);
    an.add_constraint(scalar(prev, 0), addr(obj));
    for i in 1..n {
        let cur = an.new_variable(Some(i as u64 + 1), format!("p{i}"), Some(64), &[]);
        an.add_constraint(scalar(cur, 0), scalar(prev, 0));
        prev = cur;
    }
    an
}

/// A star of `n` pointers all loading/storing through one central pointer,
/// exercising the complex-constraint (deref) path rather than plain copies.
fn build_star(n: usize) -> PointsToAnalysis {
    let mut an = PointsToAnalysis::new(AnalysisConfig::default());
    let hub = an.new_variable(Some(0), "hub", Some(64), &[]);
    for i in 0..n {
        let obj = an.new_variable(Some(i as u64 * 2 + 1), format!("o{i}"), Some(64), &[]);
        let p = an.new_variable(Some(i as u64 * 2 + 2), format!("p{i}"), Some(64), &[]);
        an.add_constraint(scalar(p, 0), addr(obj));
        an.add_constraint(deref(hub, 0), scalar(p, 0)); // *hub := p
        let out = an.new_variable(Some(i as u64 * 2 + 3), format!("q{i}"), Some(64), &[]);
        an.add_constraint(scalar(out, 0), deref(hub, 0)); // out := *hub
    }
    an
}

/// A cycle of `n` pointers, forcing the SCC-collapse path every time.
fn build_cycle(n: usize) -> PointsToAnalysis {
    let mut an = PointsToAnalysis::new(AnalysisConfig::default());
    let vars: Vec<u32> = (0..n)
        .map(|i| an.new_variable(Some(i as u64), format!("c{i}"), Some(64), &[]))
        .collect();
    for i in 0..n {
        let next = vars[(i + 1) % n];
        an.add_constraint(scalar(vars[i], 0), addr(next));
    }
    an
}

fn bench_solve_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_chain");
    for &n in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut an = black_box(build_chain(n));
                an.solve();
                an
            });
        });
    }
    group.finish();
}

fn bench_solve_star(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_star");
    for &n in [10usize, 50, 200].iter() {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut an = black_box(build_star(n));
                an.solve();
                an
            });
        });
    }
    group.finish();
}

fn bench_solve_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_cycle");
    for &n in [10usize, 100, 500].iter() {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut an = black_box(build_cycle(n));
                an.solve();
                an
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve_chain, bench_solve_star, bench_solve_cycle);
criterion_main!(benches);
