//! Fixtures shared by the integration tests: seeded sparse systems, an
//! independent dense elimination and vector error measures.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ruvector_krylov::traits::LinearOperator;
use ruvector_krylov::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Sparse systems
// ---------------------------------------------------------------------------

/// Nonsymmetric matrix whose diagonal strictly dominates each row.
///
/// Off-diagonal entries appear with probability `density` and every row of a
/// matrix larger than 1x1 gets at least one of them.
pub fn random_diag_dominant_csr(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();

    for i in 0..n {
        let row_start = triplets.len();
        for j in (0..n).filter(|&j| j != i) {
            if rng.gen_bool(density) {
                triplets.push((i, j, rng.gen_range(-1.0..1.0)));
            }
        }
        if triplets.len() == row_start && n > 1 {
            triplets.push((i, (i + 1) % n, rng.gen_range(0.1..0.5)));
        }
        let off: f64 = triplets[row_start..].iter().map(|t| t.2.abs()).sum();
        triplets.push((i, i, off + rng.gen_range(1.0..2.0)));
    }

    CsrMatrix::<f64>::from_coo(n, n, triplets)
}

/// Symmetric matrix made positive definite by a dominant diagonal.
pub fn random_spd_csr(n: usize, density: f64, seed: u64) -> CsrMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut off = vec![0.0f64; n];

    for i in 0..n {
        for j in i + 1..n {
            if !rng.gen_bool(density) {
                continue;
            }
            let a: f64 = rng.gen_range(-1.0..1.0);
            triplets.push((i, j, a));
            triplets.push((j, i, a));
            off[i] += a.abs();
            off[j] += a.abs();
        }
    }
    for (i, s) in off.into_iter().enumerate() {
        triplets.push((i, i, s + rng.gen_range(0.5..1.5)));
    }

    CsrMatrix::<f64>::from_coo(n, n, triplets)
}

/// Constant-band tridiagonal matrix.
pub fn tridiagonal(n: usize, lower: f64, diag: f64, upper: f64) -> CsrMatrix<f64> {
    let bands = (0..n).flat_map(|i| {
        let below = (i > 0).then(|| (i, i - 1, lower));
        let above = (i + 1 < n).then(|| (i, i + 1, upper));
        below.into_iter().chain([(i, i, diag)]).chain(above)
    });
    CsrMatrix::<f64>::from_coo(n, n, bands)
}

/// Dirichlet five-point stencil on an `nx` by `ny` grid, numbered row by row.
pub fn laplacian_2d(nx: usize, ny: usize) -> CsrMatrix<f64> {
    let mut triplets = Vec::new();
    for y in 0..ny {
        for x in 0..nx {
            let p = y * nx + x;
            triplets.push((p, p, 4.0));
            let neighbours = [
                (x > 0, p.wrapping_sub(1)),
                (x + 1 < nx, p + 1),
                (y > 0, p.wrapping_sub(nx)),
                (y + 1 < ny, p + nx),
            ];
            for (inside, q) in neighbours {
                if inside {
                    triplets.push((p, q, -1.0));
                }
            }
        }
    }
    CsrMatrix::<f64>::from_coo(nx * ny, nx * ny, triplets)
}

/// Seeded vector, entries uniform in `[-1, 1)`.
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// `A x`, used as the right-hand side of a manufactured solution.
pub fn rhs_for(matrix: &CsrMatrix<f64>, x: &[f64]) -> Vec<f64> {
    let mut b = vec![0.0; matrix.rows];
    matrix.mult(x, &mut b);
    b
}

// ---------------------------------------------------------------------------
// Reference solution
// ---------------------------------------------------------------------------

/// Solve with row-pivoted elimination on a dense row-major copy.
pub fn dense_solve(matrix: &CsrMatrix<f64>, rhs: &[f64]) -> Vec<f64> {
    let n = matrix.rows;
    assert!(n == matrix.cols && rhs.len() == n, "shape mismatch");

    let mut a = vec![0.0f64; n * n];
    for i in 0..n {
        for (j, &v) in matrix.row_entries(i) {
            a[i * n + j] = v;
        }
    }
    let mut x = rhs.to_vec();

    for k in 0..n {
        let p = (k..n)
            .max_by(|&r, &s| a[r * n + k].abs().total_cmp(&a[s * n + k].abs()))
            .unwrap();
        assert!(a[p * n + k] != 0.0, "singular at column {k}");
        if p != k {
            for c in 0..n {
                a.swap(p * n + c, k * n + c);
            }
            x.swap(p, k);
        }
        for r in k + 1..n {
            let m = a[r * n + k] / a[k * n + k];
            if m == 0.0 {
                continue;
            }
            for c in k..n {
                a[r * n + c] -= m * a[k * n + c];
            }
            x[r] -= m * x[k];
        }
    }

    for k in (0..n).rev() {
        let tail: f64 = (k + 1..n).map(|c| a[k * n + c] * x[c]).sum();
        x[k] = (x[k] - tail) / a[k * n + k];
    }
    x
}

// ---------------------------------------------------------------------------
// Error measures
// ---------------------------------------------------------------------------

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|e| e * e).sum::<f64>().sqrt()
}

/// `||a - b||` over equal-length vectors.
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    let diff: Vec<f64> = a.iter().zip(b).map(|(p, q)| p - q).collect();
    l2_norm(&diff)
}

/// Error of `approx` relative to `exact`; absolute when `exact` is zero.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let scale = l2_norm(exact);
    let err = l2_distance(approx, exact);
    if scale > 0.0 {
        err / scale
    } else {
        err
    }
}

/// `b - A x`.
pub fn compute_residual(matrix: &CsrMatrix<f64>, x: &[f64], rhs: &[f64]) -> Vec<f64> {
    let ax = rhs_for(matrix, x);
    rhs.iter().zip(ax).map(|(b, v)| b - v).collect()
}
