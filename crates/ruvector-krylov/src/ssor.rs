//! Symmetric successive over-relaxation.
//!
//! One application is a forward Gauss-Seidel sweep relaxed by `omega_forward`
//! followed by a backward sweep relaxed by `omega_reverse`. Disabling the
//! backward sweep gives SOR. The same sweeps serve as the smoother of the
//! multigrid hierarchy through [`SsorPreconditioner::relax`].

use crate::config::SsorConfig;
use crate::error::{PreconditionerError, SolverError};
use crate::traits::{Matrix, Preconditioner};
use crate::types::CsrMatrix;
use crate::validation::{square_csr_snapshot, validate_relaxation};

/// SSOR preconditioner over a private CSR copy of the matrix.
#[derive(Debug, Clone)]
pub struct SsorPreconditioner {
    config: SsorConfig,
    matrix: CsrMatrix<f64>,
    diag_ind: Vec<usize>,
    /// Half-iterate of the forward sweep.
    xx: Vec<f64>,
}

impl SsorPreconditioner {
    /// Unbound preconditioner.
    ///
    /// # Errors
    ///
    /// [`ParameterOutOfRange`](crate::error::ValidationError::ParameterOutOfRange)
    /// when a relaxation factor lies outside `[0, 2]`.
    pub fn new(config: SsorConfig) -> Result<Self, SolverError> {
        validate_relaxation("omega_forward", config.omega_forward)?;
        validate_relaxation("omega_reverse", config.omega_reverse)?;
        Ok(Self {
            config,
            matrix: CsrMatrix {
                row_ptr: vec![0],
                col_indices: Vec::new(),
                values: Vec::new(),
                rows: 0,
                cols: 0,
            },
            diag_ind: Vec::new(),
            xx: Vec::new(),
        })
    }

    /// Symmetric sweep with the same factor in both directions.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_omega(omega: f64) -> Result<Self, SolverError> {
        Self::new(SsorConfig {
            omega_forward: omega,
            omega_reverse: omega,
            reverse: true,
        })
    }

    /// Build and bind in one step.
    ///
    /// # Errors
    ///
    /// Parameter errors from [`new`](Self::new) or matrix errors from
    /// `set_matrix`.
    pub fn for_matrix(a: &dyn Matrix, config: SsorConfig) -> Result<Self, SolverError> {
        let mut ssor = Self::new(config)?;
        ssor.set_matrix(a)?;
        Ok(ssor)
    }

    /// Change the relaxation factors.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new); the previous factors are kept on error.
    pub fn set_omegas(&mut self, omega_forward: f64, omega_reverse: f64) -> Result<(), SolverError> {
        validate_relaxation("omega_forward", omega_forward)?;
        validate_relaxation("omega_reverse", omega_reverse)?;
        self.config.omega_forward = omega_forward;
        self.config.omega_reverse = omega_reverse;
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> &SsorConfig {
        &self.config
    }

    /// Size of the bound matrix.
    pub fn size(&self) -> usize {
        self.matrix.rows
    }

    /// Run one forward (and optionally backward) sweep on `A x = b`,
    /// starting from the incoming `x`.
    ///
    /// # Panics
    ///
    /// Panics if `b` or `x` differ in length from the bound matrix.
    pub fn relax(&mut self, b: &[f64], x: &mut [f64]) {
        let n = self.matrix.rows;
        assert_eq!(b.len(), n, "ssor: b length mismatch");
        assert_eq!(x.len(), n, "ssor: x length mismatch");

        let a = &self.matrix;
        let xx = &mut self.xx;
        let omega_f = self.config.omega_forward;
        let omega_r = self.config.omega_reverse;

        // Forward sweep: entries left of the diagonal read the half-iterate,
        // entries right of it the incoming x.
        for i in 0..n {
            let start = a.row_ptr[i];
            let diag = self.diag_ind[i];
            let end = a.row_ptr[i + 1];

            let mut sigma = 0.0f64;
            for idx in start..diag {
                sigma += a.values[idx] * xx[a.col_indices[idx]];
            }
            for idx in (diag + 1)..end {
                sigma += a.values[idx] * x[a.col_indices[idx]];
            }
            xx[i] = x[i] + omega_f * ((b[i] - sigma) / a.values[diag] - x[i]);
        }

        if !self.config.reverse {
            x.copy_from_slice(xx);
            return;
        }

        // Backward sweep over the half-iterate.
        for i in (0..n).rev() {
            let start = a.row_ptr[i];
            let diag = self.diag_ind[i];
            let end = a.row_ptr[i + 1];

            let mut sigma = 0.0f64;
            for idx in start..diag {
                sigma += a.values[idx] * xx[a.col_indices[idx]];
            }
            for idx in (diag + 1)..end {
                sigma += a.values[idx] * x[a.col_indices[idx]];
            }
            x[i] = xx[i] + omega_r * ((b[i] - sigma) / a.values[diag] - xx[i]);
        }
    }
}

impl Preconditioner for SsorPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        let csr = square_csr_snapshot(a)?;
        let mut diag_ind = Vec::with_capacity(csr.rows);
        for row in 0..csr.rows {
            let idx = csr
                .diagonal_index(row)
                .ok_or(PreconditionerError::MissingDiagonal { row })?;
            if csr.values[idx] == 0.0 {
                return Err(PreconditionerError::ZeroDiagonal { row }.into());
            }
            diag_ind.push(idx);
        }

        self.xx = vec![0.0; csr.rows];
        self.diag_ind = diag_ind;
        self.matrix = csr;
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        x.fill(0.0);
        self.relax(b, x);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.apply(b, x);
    }
}
