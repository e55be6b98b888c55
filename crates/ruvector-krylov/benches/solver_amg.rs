//! Benchmarks for the multigrid and incomplete-factorization preconditioners.
//!
//! Separates setup (hierarchy or factor construction) from the preconditioned
//! CG solve on 2-D Poisson problems.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ruvector_krylov::amg::AmgPreconditioner;
use ruvector_krylov::cg::ConjugateGradientSolver;
use ruvector_krylov::config::AmgConfig;
use ruvector_krylov::icc::IccPreconditioner;
use ruvector_krylov::monitor::DefaultIterationMonitor;
use ruvector_krylov::traits::{IterativeSolver, Preconditioner};
use ruvector_krylov::types::CsrMatrix;

/// Five-point Laplacian on a `k x k` grid.
fn poisson_2d(k: usize) -> CsrMatrix<f64> {
    let n = k * k;
    let mut entries = Vec::with_capacity(5 * n);
    for j in 0..k {
        for i in 0..k {
            let row = j * k + i;
            entries.push((row, row, 4.0));
            if i > 0 {
                entries.push((row, row - 1, -1.0));
            }
            if i + 1 < k {
                entries.push((row, row + 1, -1.0));
            }
            if j > 0 {
                entries.push((row, row - k, -1.0));
            }
            if j + 1 < k {
                entries.push((row, row + k, -1.0));
            }
        }
    }
    CsrMatrix::<f64>::from_coo(n, n, entries)
}

fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[inline(never)]
fn pcg_solve(matrix: &CsrMatrix<f64>, rhs: &[f64], preconditioner: Box<dyn Preconditioner>) -> usize {
    let mut solver = ConjugateGradientSolver::new(rhs);
    solver.set_preconditioner(preconditioner);
    solver.set_monitor(Box::new(DefaultIterationMonitor::new(5_000, 1e-8, 1e-50, 1e5)));
    let mut x = vec![0.0; rhs.len()];
    solver.solve(matrix, rhs, &mut x).unwrap().iterations
}

fn amg_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("amg_setup");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(30);

    for &k in &[32usize, 64, 128] {
        let matrix = poisson_2d(k);
        group.throughput(Throughput::Elements(matrix.nnz() as u64));

        group.bench_with_input(BenchmarkId::new("grid", k), &k, |b, _| {
            b.iter(|| {
                let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
                amg.set_matrix(criterion::black_box(&matrix)).unwrap();
                amg.levels()
            });
        });
    }
    group.finish();
}

fn preconditioned_cg(c: &mut Criterion) {
    let mut group = c.benchmark_group("preconditioned_cg");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(20);

    for &k in &[32usize, 64] {
        let matrix = poisson_2d(k);
        let rhs = random_vector(k * k, 5);

        group.bench_with_input(BenchmarkId::new("amg_v_cycle", k), &k, |b, _| {
            b.iter(|| {
                let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
                amg.set_matrix(&matrix).unwrap();
                pcg_solve(&matrix, criterion::black_box(&rhs), Box::new(amg))
            });
        });

        group.bench_with_input(BenchmarkId::new("amg_w_cycle", k), &k, |b, _| {
            b.iter(|| {
                let mut amg = AmgPreconditioner::new(AmgConfig {
                    gamma: 2,
                    ..Default::default()
                })
                .unwrap();
                amg.set_matrix(&matrix).unwrap();
                pcg_solve(&matrix, criterion::black_box(&rhs), Box::new(amg))
            });
        });

        group.bench_with_input(BenchmarkId::new("icc", k), &k, |b, _| {
            b.iter(|| {
                let mut icc = IccPreconditioner::new();
                icc.set_matrix(&matrix).unwrap();
                pcg_solve(&matrix, criterion::black_box(&rhs), Box::new(icc))
            });
        });
    }
    group.finish();
}

criterion_group!(amg, amg_setup, preconditioned_cg);
criterion_main!(amg);
