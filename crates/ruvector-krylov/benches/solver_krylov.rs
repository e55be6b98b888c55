//! Benchmarks for the Krylov solvers.
//!
//! Measures CG scaling on SPD systems, the cost of the general-purpose
//! methods on one nonsymmetric system, and GMRES restart lengths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ruvector_krylov::config::{MonitorConfig, PreconditionerKind, SolverConfig};
use ruvector_krylov::types::{Algorithm, CsrMatrix};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Random sparse matrix, diagonal `sum_j |a_ij| + shift`, optionally mirrored
/// across the diagonal.
fn sparse_system(n: usize, density: f64, symmetric: bool, seed: u64) -> CsrMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut off = vec![0.0f64; n];

    for i in 0..n {
        let first = if symmetric { i + 1 } else { 0 };
        for j in (first..n).filter(|&j| j != i) {
            if !rng.gen_bool(density) {
                continue;
            }
            let a: f64 = rng.gen_range(-0.5..0.5);
            triplets.push((i, j, a));
            off[i] += a.abs();
            if symmetric {
                triplets.push((j, i, a));
                off[j] += a.abs();
            }
        }
    }
    let shift = if symmetric { 1.0 } else { 0.5 };
    triplets.extend(off.iter().enumerate().map(|(i, s)| (i, i, s + shift)));

    CsrMatrix::<f64>::from_coo(n, n, triplets)
}

fn spd_csr_matrix(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    sparse_system(n, density, true, seed)
}

fn nonsymmetric_csr_matrix(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    sparse_system(n, density, false, seed)
}

fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn solver_config(algorithm: Algorithm, preconditioner: PreconditionerKind) -> SolverConfig {
    SolverConfig {
        algorithm,
        preconditioner,
        monitor: MonitorConfig {
            relative_tolerance: 1e-8,
            max_iterations: 5_000,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build, bind and run one configured solve; returns the iteration count.
#[inline(never)]
fn run(config: &SolverConfig, matrix: &CsrMatrix<f64>, rhs: &[f64]) -> usize {
    let mut solver = config.build(rhs).unwrap();
    solver.preconditioner_mut().set_matrix(matrix).unwrap();
    let mut x = vec![0.0; rhs.len()];
    solver.solve(matrix, rhs, &mut x).unwrap().iterations
}

// ---------------------------------------------------------------------------
// CG scaling
// ---------------------------------------------------------------------------

fn cg_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cg_scaling");
    group.warm_up_time(Duration::from_secs(3));

    for &n in &[100, 1000, 10_000] {
        let density = if n <= 1000 { 0.02 } else { 0.001 };
        let matrix = spd_csr_matrix(n, density, 42);
        let rhs = random_vector(n, 43);
        let config = solver_config(Algorithm::Cg, PreconditionerKind::Identity);

        let sample_count = if n >= 10_000 { 20 } else { 100 };
        group.sample_size(sample_count);
        group.throughput(Throughput::Elements(matrix.nnz() as u64));

        group.bench_with_input(BenchmarkId::new("n", n), &n, |b, _| {
            b.iter(|| run(&config, criterion::black_box(&matrix), criterion::black_box(&rhs)));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// General solvers on one system
// ---------------------------------------------------------------------------

fn general_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("general_solvers");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(50);

    let n = 1000;
    let matrix = nonsymmetric_csr_matrix(n, 0.01, 7);
    let rhs = random_vector(n, 8);

    for algorithm in [
        Algorithm::BiCg,
        Algorithm::BiCgStab,
        Algorithm::Cgs,
        Algorithm::Gmres,
        Algorithm::Qmr,
    ] {
        let config = solver_config(algorithm, PreconditionerKind::Diagonal);
        group.bench_with_input(BenchmarkId::new(algorithm.to_string(), n), &n, |b, _| {
            b.iter(|| run(&config, criterion::black_box(&matrix), criterion::black_box(&rhs)));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// GMRES restart length
// ---------------------------------------------------------------------------

fn gmres_restart(c: &mut Criterion) {
    let mut group = c.benchmark_group("gmres_restart");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(50);

    let n = 2000;
    let matrix = nonsymmetric_csr_matrix(n, 0.005, 11);
    let rhs = random_vector(n, 12);

    for &restart in &[5usize, 20, 50] {
        let config = SolverConfig {
            restart,
            ..solver_config(Algorithm::Gmres, PreconditionerKind::Ilu)
        };
        group.bench_with_input(BenchmarkId::new("restart", restart), &restart, |b, _| {
            b.iter(|| run(&config, criterion::black_box(&matrix), criterion::black_box(&rhs)));
        });
    }
    group.finish();
}

criterion_group!(krylov, cg_scaling, general_solvers, gmres_restart);
criterion_main!(krylov);
