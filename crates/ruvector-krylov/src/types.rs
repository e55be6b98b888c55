//! Core types for sparse iterative solvers.
//!
//! Provides [`CsrMatrix`] for compressed sparse row storage and the result
//! types returned by every solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::traits::{LinearOperator, Matrix};

// ---------------------------------------------------------------------------
// CsrMatrix<T>
// ---------------------------------------------------------------------------

/// Sparse matrix in compressed sparse row form.
///
/// Row `i` occupies `row_ptr[i]..row_ptr[i + 1]` of `col_indices` and
/// `values`, with column indices strictly increasing inside the row. This is
/// the storage every factorization and the multigrid setup work on; other
/// formats convert into it through [`Matrix::to_csr`].
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    /// Offsets into `col_indices`/`values`, one per row plus a terminator.
    pub row_ptr: Vec<usize>,
    /// Column of every stored entry.
    pub col_indices: Vec<usize>,
    /// Value of every stored entry, aligned with `col_indices`.
    pub values: Vec<T>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl<T> CsrMatrix<T> {
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `(column, &value)` pairs of `row` in column order.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &T)> {
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_indices[span.clone()]
            .iter()
            .copied()
            .zip(&self.values[span])
    }

    /// Offset of the diagonal entry of `row` in the value array.
    #[inline]
    pub fn diagonal_index(&self, row: usize) -> Option<usize> {
        let first = self.row_ptr[row];
        self.col_indices[first..self.row_ptr[row + 1]]
            .binary_search(&row)
            .ok()
            .map(|k| first + k)
    }
}

impl<T: Copy + Default> CsrMatrix<T> {
    /// `A^T`, still in CSR form.
    ///
    /// Bucketing by column keeps each output row sorted since source rows
    /// are scanned in order.
    pub fn transpose(&self) -> CsrMatrix<T> {
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &j in &self.col_indices {
            row_ptr[j + 1] += 1;
        }
        for j in 0..self.cols {
            row_ptr[j + 1] += row_ptr[j];
        }

        let mut next = row_ptr[..self.cols].to_vec();
        let mut col_indices = vec![0usize; self.nnz()];
        let mut values = vec![T::default(); self.nnz()];
        for i in 0..self.rows {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                let j = self.col_indices[k];
                col_indices[next[j]] = i;
                values[next[j]] = self.values[k];
                next[j] += 1;
            }
        }

        CsrMatrix {
            row_ptr,
            col_indices,
            values,
            rows: self.cols,
            cols: self.rows,
        }
    }
}

impl CsrMatrix<f64> {
    /// Assemble from `(row, col, value)` triplets in any order.
    ///
    /// Repeated positions accumulate into one entry.
    ///
    /// # Panics
    ///
    /// If a triplet lies outside `rows x cols`.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut triplets: Vec<_> = entries.into_iter().collect();
        triplets.sort_by_key(|&(i, j, _)| (i, j));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut previous = None;

        for (i, j, v) in triplets {
            assert!(i < rows && j < cols, "entry ({i}, {j}) outside {rows}x{cols}");
            match values.last_mut() {
                Some(acc) if previous == Some((i, j)) => *acc += v,
                _ => {
                    row_ptr[i + 1] += 1;
                    col_indices.push(j);
                    values.push(v);
                    previous = Some((i, j));
                }
            }
        }
        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    pub fn identity(n: usize) -> Self {
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: vec![1.0; n],
            rows: n,
            cols: n,
        }
    }

    /// Entry at `(row, col)`; unstored positions read as zero.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let first = self.row_ptr[row];
        self.col_indices[first..self.row_ptr[row + 1]]
            .binary_search(&col)
            .map_or(0.0, |k| self.values[first + k])
    }
}

impl LinearOperator for CsrMatrix<f64> {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "mult_add: x length must equal cols");
        assert_eq!(y.len(), self.rows, "mult_add: y length must equal rows");
        for i in 0..self.rows {
            let mut sum = 0.0f64;
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] += alpha * sum;
        }
    }

    fn trans_mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.rows, "trans_mult_add: x length must equal rows");
        assert_eq!(y.len(), self.cols, "trans_mult_add: y length must equal cols");
        for i in 0..self.rows {
            let xi = alpha * x[i];
            if xi == 0.0 {
                continue;
            }
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                y[self.col_indices[idx]] += self.values[idx] * xi;
            }
        }
    }
}

impl Matrix for CsrMatrix<f64> {
    fn get(&self, row: usize, col: usize) -> f64 {
        CsrMatrix::get(self, row, col)
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn to_csr(&self) -> CsrMatrix<f64> {
        self.clone()
    }
}

// ---------------------------------------------------------------------------
// Solver result types
// ---------------------------------------------------------------------------

/// Algorithm identifier for solver selection and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Preconditioned Conjugate Gradient. Symmetric positive-definite only.
    Cg,
    /// Bi-Conjugate Gradient. General matrices; needs `A^T` products.
    BiCg,
    /// Bi-Conjugate Gradient Stabilized. General matrices.
    BiCgStab,
    /// Conjugate Gradient Squared. General matrices.
    Cgs,
    /// Restarted Generalized Minimal Residual. General matrices.
    Gmres,
    /// Chebyshev iteration. SPD matrices with known spectral bounds.
    Chebyshev,
    /// Quasi-Minimal Residual with left and right preconditioning.
    Qmr,
    /// Iterative refinement (preconditioned Richardson).
    Ir,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Cg => write!(f, "cg"),
            Algorithm::BiCg => write!(f, "bicg"),
            Algorithm::BiCgStab => write!(f, "bicgstab"),
            Algorithm::Cgs => write!(f, "cgs"),
            Algorithm::Gmres => write!(f, "gmres"),
            Algorithm::Chebyshev => write!(f, "chebyshev"),
            Algorithm::Qmr => write!(f, "qmr"),
            Algorithm::Ir => write!(f, "ir"),
        }
    }
}

/// Per-iteration convergence snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Iteration index (0-based).
    pub iteration: usize,
    /// Residual norm at this iteration.
    pub residual_norm: f64,
}

/// Summary returned by a successful solve. The solution itself is written
/// into the caller's `x`.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    /// Algorithm used.
    pub algorithm: Algorithm,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Residual norm that satisfied the monitor.
    pub residual_norm: f64,
    /// Wall-clock time taken.
    pub wall_time: Duration,
}
