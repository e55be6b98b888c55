//! Identity and diagonal (Jacobi) preconditioners.

use crate::error::{PreconditionerError, SolverError};
use crate::traits::{Matrix, Preconditioner};
use crate::validation::square_csr_snapshot;

/// `M = I`. The default preconditioner of every solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn set_matrix(&mut self, _a: &dyn Matrix) -> Result<(), SolverError> {
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        x.copy_from_slice(b);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        x.copy_from_slice(b);
    }
}

/// Jacobi preconditioner, `M = diag(A)`.
#[derive(Debug, Clone, Default)]
pub struct DiagonalPreconditioner {
    inv_diag: Vec<f64>,
}

impl DiagonalPreconditioner {
    /// Unbound preconditioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reciprocal diagonal captured by the last `set_matrix`.
    pub fn inverse_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for DiagonalPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        let csr = square_csr_snapshot(a)?;
        let mut inv_diag = vec![0.0f64; csr.rows];
        for (row, slot) in inv_diag.iter_mut().enumerate() {
            let d = csr.diagonal_index(row).map_or(0.0, |idx| csr.values[idx]);
            if d == 0.0 {
                return Err(PreconditionerError::ZeroDiagonal { row }.into());
            }
            *slot = 1.0 / d;
        }
        self.inv_diag = inv_diag;
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        assert_eq!(b.len(), self.inv_diag.len(), "diagonal: b length mismatch");
        assert_eq!(x.len(), self.inv_diag.len(), "diagonal: x length mismatch");

        let n = b.len();
        let chunks = n / 4;
        let base = chunks * 4;

        for i in 0..chunks {
            let j = i * 4;
            x[j] = self.inv_diag[j] * b[j];
            x[j + 1] = self.inv_diag[j + 1] * b[j + 1];
            x[j + 2] = self.inv_diag[j + 2] * b[j + 2];
            x[j + 3] = self.inv_diag[j + 3] * b[j + 3];
        }
        for i in base..n {
            x[i] = self.inv_diag[i] * b[i];
        }
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.apply(b, x);
    }
}
