//! Incomplete LU factorization with zero fill, ILU(0).
//!
//! The factor keeps exactly the sparsity pattern of `A`; updates that would
//! land outside it are discarded.

use crate::error::{PreconditionerError, SolverError};
use crate::traits::{Matrix, Preconditioner};
use crate::triangular::LuFactor;
use crate::types::CsrMatrix;
use crate::validation::square_csr_snapshot;

/// ILU(0) preconditioner.
#[derive(Debug, Clone, Default)]
pub struct IluPreconditioner {
    factor: Option<LuFactor>,
}

impl IluPreconditioner {
    /// Unbound preconditioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// The factor computed by the last `set_matrix`.
    pub fn factor(&self) -> Option<&LuFactor> {
        self.factor.as_ref()
    }

    fn bound(&self) -> &LuFactor {
        self.factor
            .as_ref()
            .unwrap_or_else(|| panic!("ilu: set_matrix must be called before apply"))
    }
}

impl Preconditioner for IluPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        self.factor = Some(factor_ilu0(square_csr_snapshot(a)?)?);
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.bound().solve(b, x);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.bound().trans_solve(b, x);
    }
}

fn factor_ilu0(mut lu: CsrMatrix<f64>) -> Result<LuFactor, PreconditionerError> {
    let n = lu.rows;
    let mut diag_ind = Vec::with_capacity(n);
    for i in 0..n {
        diag_ind.push(
            lu.diagonal_index(i)
                .ok_or(PreconditionerError::MissingDiagonal { row: i })?,
        );
    }

    // position[j] = index of column j in the current row, if stored.
    let mut position: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let start = lu.row_ptr[i];
        let end = lu.row_ptr[i + 1];
        for idx in start..end {
            position[lu.col_indices[idx]] = Some(idx);
        }

        for idx in start..diag_ind[i] {
            let k = lu.col_indices[idx];
            let pivot = lu.values[diag_ind[k]];
            if pivot == 0.0 {
                return Err(PreconditionerError::ZeroPivot { row: k });
            }
            let lik = lu.values[idx] / pivot;
            lu.values[idx] = lik;

            for kidx in (diag_ind[k] + 1)..lu.row_ptr[k + 1] {
                if let Some(target) = position[lu.col_indices[kidx]] {
                    lu.values[target] -= lik * lu.values[kidx];
                }
            }
        }

        if lu.values[diag_ind[i]] == 0.0 {
            return Err(PreconditionerError::ZeroPivot { row: i });
        }

        for idx in start..end {
            position[lu.col_indices[idx]] = None;
        }
    }

    Ok(LuFactor::new(lu, diag_ind))
}
