//! Incomplete Cholesky factorization with zero fill, ICC(0).
//!
//! Computes an upper triangular `R` on the pattern of the upper triangle of
//! a symmetric positive definite `A` such that `R^T R` approximates `A`.

use crate::error::{PreconditionerError, SolverError};
use crate::traits::{Matrix, Preconditioner};
use crate::triangular::LuFactor;
use crate::types::CsrMatrix;
use crate::validation::square_csr_snapshot;

/// ICC(0) preconditioner.
#[derive(Debug, Clone, Default)]
pub struct IccPreconditioner {
    /// `R` stored as the upper part of an [`LuFactor`] with an empty lower
    /// triangle.
    factor: Option<LuFactor>,
}

impl IccPreconditioner {
    /// Unbound preconditioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// The upper Cholesky factor `R` computed by the last `set_matrix`.
    pub fn factor(&self) -> Option<&CsrMatrix<f64>> {
        self.factor.as_ref().map(LuFactor::matrix)
    }

    fn bound(&self) -> &LuFactor {
        self.factor
            .as_ref()
            .unwrap_or_else(|| panic!("icc: set_matrix must be called before apply"))
    }
}

impl Preconditioner for IccPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        self.factor = Some(factor_icc0(&square_csr_snapshot(a)?)?);
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        // R^T y = b, then R x = y.
        let upper = self.bound().upper();
        x.copy_from_slice(b);
        upper.trans_solve_in_place(x);
        upper.solve_in_place(x);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.apply(b, x);
    }
}

fn factor_icc0(a: &CsrMatrix<f64>) -> Result<LuFactor, PreconditionerError> {
    let n = a.rows;

    // Upper triangle of A, diagonal first in every row.
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    let mut diag_ind = Vec::with_capacity(n);
    row_ptr.push(0);
    for i in 0..n {
        let diag = a
            .diagonal_index(i)
            .ok_or(PreconditionerError::MissingDiagonal { row: i })?;
        diag_ind.push(col_indices.len());
        col_indices.extend_from_slice(&a.col_indices[diag..a.row_ptr[i + 1]]);
        values.extend_from_slice(&a.values[diag..a.row_ptr[i + 1]]);
        row_ptr.push(col_indices.len());
    }
    let mut r = CsrMatrix {
        row_ptr,
        col_indices,
        values,
        rows: n,
        cols: n,
    };

    let mut position: Vec<Option<usize>> = vec![None; n];

    for k in 0..n {
        let start = r.row_ptr[k];
        let end = r.row_ptr[k + 1];

        let pivot = r.values[start];
        if pivot <= 0.0 {
            return Err(PreconditionerError::ZeroPivot { row: k });
        }
        let rkk = pivot.sqrt();
        r.values[start] = rkk;
        for idx in (start + 1)..end {
            r.values[idx] /= rkk;
        }

        // Right-looking update of the trailing rows, restricted to the
        // pattern: r_ji -= r_kj * r_ki for k < j <= i.
        for jdx in (start + 1)..end {
            let j = r.col_indices[jdx];
            let rkj = r.values[jdx];
            for idx in r.row_ptr[j]..r.row_ptr[j + 1] {
                position[r.col_indices[idx]] = Some(idx);
            }
            for idx in jdx..end {
                if let Some(target) = position[r.col_indices[idx]] {
                    r.values[target] -= rkj * r.values[idx];
                }
            }
            for idx in r.row_ptr[j]..r.row_ptr[j + 1] {
                position[r.col_indices[idx]] = None;
            }
        }
    }

    Ok(LuFactor::new(r, diag_ind))
}
