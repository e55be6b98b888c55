//! Dense vector kernels shared by every solver.
//!
//! Vectors are plain `f64` slices owned by the caller or by a solver's
//! working set. The kernels use 4-wide accumulation to shorten dependency
//! chains in the inner products that drive the Krylov recurrences.

use serde::{Deserialize, Serialize};

/// Vector norm used by an iteration monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormKind {
    /// Sum of absolute values.
    One,
    /// Euclidean norm.
    #[default]
    Two,
    /// Euclidean norm computed with a running scale, safe against overflow
    /// and underflow of the squared entries.
    TwoRobust,
    /// Largest absolute value.
    Infinity,
}

/// Dot product with 4-wide accumulation.
///
/// # Panics
///
/// Panics if `a.len() != b.len()`.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let n = a.len();
    let chunks = n / 4;
    let remainder = n % 4;

    let mut acc0: f64 = 0.0;
    let mut acc1: f64 = 0.0;
    let mut acc2: f64 = 0.0;
    let mut acc3: f64 = 0.0;

    for i in 0..chunks {
        let j = i * 4;
        acc0 += a[j] * b[j];
        acc1 += a[j + 1] * b[j + 1];
        acc2 += a[j + 2] * b[j + 2];
        acc3 += a[j + 3] * b[j + 3];
    }

    let base = chunks * 4;
    for i in 0..remainder {
        acc0 += a[base + i] * b[base + i];
    }

    (acc0 + acc1) + (acc2 + acc3)
}

/// `y[i] += alpha * x[i]` for all `i`.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");

    let n = x.len();
    let chunks = n / 4;
    let base = chunks * 4;

    for i in 0..chunks {
        let j = i * 4;
        y[j] += alpha * x[j];
        y[j + 1] += alpha * x[j + 1];
        y[j + 2] += alpha * x[j + 2];
        y[j + 3] += alpha * x[j + 3];
    }
    for i in base..n {
        y[i] += alpha * x[i];
    }
}

/// `y[i] = x[i] + beta * y[i]` for all `i`.
#[inline]
pub fn xpay(x: &[f64], beta: f64, y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "xpay: length mismatch");
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = xi + beta * *yi;
    }
}

/// `x[i] *= alpha` for all `i`.
#[inline]
pub fn scale(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Overwrite `y` with `x`.
#[inline]
pub fn copy(x: &[f64], y: &mut [f64]) {
    y.copy_from_slice(x);
}

/// Set every entry of `x` to zero.
#[inline]
pub fn zero(x: &mut [f64]) {
    x.fill(0.0);
}

/// Euclidean norm.
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Norm of `x` of the requested kind.
pub fn norm(x: &[f64], kind: NormKind) -> f64 {
    match kind {
        NormKind::One => x.iter().map(|v| v.abs()).sum(),
        NormKind::Two => norm2(x),
        NormKind::TwoRobust => robust_norm2(x),
        NormKind::Infinity => x.iter().fold(0.0f64, |acc, v| {
            if v.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(v.abs())
            }
        }),
    }
}

/// Scaled sum-of-squares Euclidean norm (the BLAS `nrm2` recurrence).
fn robust_norm2(x: &[f64]) -> f64 {
    let mut scale = 0.0f64;
    let mut ssq = 1.0f64;
    for &v in x {
        if v == 0.0 {
            continue;
        }
        if v.is_nan() {
            return f64::NAN;
        }
        let absv = v.abs();
        if scale < absv {
            ssq = 1.0 + ssq * (scale / absv) * (scale / absv);
            scale = absv;
        } else {
            ssq += (absv / scale) * (absv / scale);
        }
    }
    scale * ssq.sqrt()
}
