//! Trait hierarchy tying solvers, preconditioners and monitors together.
//!
//! Solvers only ever see a [`LinearOperator`]: storage format is the matrix's
//! business, not the solver's. Preconditioners need element access for their
//! setup and therefore bind to the richer [`Matrix`] contract.

use crate::error::{NotConverged, NotConvergedReason, SolverError};
use crate::types::{Algorithm, CsrMatrix, SolveSummary};
use crate::vector::NormKind;

/// A linear map `y = A x` with an additive accumulation contract.
///
/// Implementors provide the two accumulating products; the overwriting
/// variants are derived from them.
pub trait LinearOperator: Send + Sync {
    /// Number of rows of `A`.
    fn rows(&self) -> usize;

    /// Number of columns of `A`.
    fn cols(&self) -> usize;

    /// Whether `A` is square.
    fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// `y += alpha * A * x`.
    fn mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]);

    /// `y += alpha * A^T * x`.
    fn trans_mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]);

    /// `y = A * x`.
    fn mult(&self, x: &[f64], y: &mut [f64]) {
        y.fill(0.0);
        self.mult_add(1.0, x, y);
    }

    /// `y = A^T * x`.
    fn trans_mult(&self, x: &[f64], y: &mut [f64]) {
        y.fill(0.0);
        self.trans_mult_add(1.0, x, y);
    }
}

/// A linear operator backed by stored entries.
pub trait Matrix: LinearOperator {
    /// Entry at `(row, col)`; zero when not stored.
    fn get(&self, row: usize, col: usize) -> f64;

    /// Number of stored entries.
    fn nnz(&self) -> usize;

    /// Compressed-row snapshot of the matrix.
    ///
    /// The provided implementation probes every position and is only meant
    /// for small operators; storage formats override it.
    fn to_csr(&self) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                let v = self.get(i, j);
                if v != 0.0 {
                    entries.push((i, j, v));
                }
            }
        }
        CsrMatrix::<f64>::from_coo(self.rows(), self.cols(), entries)
    }
}

/// Approximate inverse `M^{-1}` applied once per solver iteration.
///
/// A preconditioner is bound to a matrix by [`set_matrix`](Self::set_matrix),
/// which takes a snapshot; the matrix itself is never mutated.
pub trait Preconditioner: Send {
    /// Analyse `a` and build whatever is needed to apply `M^{-1}`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] when the matrix is unsuitable (zero or missing
    /// diagonal, zero pivot, empty or non-square matrix).
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError>;

    /// `x = M^{-1} b`.
    ///
    /// # Panics
    ///
    /// Panics when called before a successful `set_matrix` or with vectors
    /// whose length differs from the bound matrix.
    fn apply(&mut self, b: &[f64], x: &mut [f64]);

    /// `x = M^{-T} b`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`apply`](Self::apply).
    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]);
}

/// Receives every residual a monitor observes.
pub trait IterationReporter: Send {
    /// Called once per convergence test.
    fn monitor(&mut self, residual: f64, x: Option<&[f64]>, iteration: usize);

    /// Called when the monitor declares convergence.
    fn converged(&mut self, _iterations: usize, _residual: f64) {}

    /// Called when the monitor declares an irrecoverable failure.
    fn failed(&mut self, _reason: NotConvergedReason, _iterations: usize, _residual: f64) {}
}

/// Iteration bookkeeping and stopping policy for an iterative solver.
///
/// The solver calls [`set_first`](Self::set_first) once, then alternates
/// convergence tests with [`next`](Self::next). A test either reports
/// progress (`Ok(false)`), success (`Ok(true)`), or a terminal failure
/// (`Err`).
pub trait IterationMonitor: Send {
    /// Reset the iteration count and start a new run.
    fn set_first(&mut self);

    /// True between `set_first` and the first `next`.
    fn is_first(&self) -> bool;

    /// Advance the iteration count.
    fn next(&mut self);

    /// Iterations completed so far.
    fn iterations(&self) -> usize;

    /// Last residual norm observed.
    fn residual(&self) -> f64;

    /// Norm applied to residual vectors.
    fn norm_kind(&self) -> NormKind;

    /// Change the norm applied to residual vectors.
    fn set_norm_kind(&mut self, kind: NormKind);

    /// Attach a progress reporter, replacing the current one.
    fn set_reporter(&mut self, reporter: Box<dyn IterationReporter>);

    /// Test a residual norm that the solver has already computed.
    ///
    /// # Errors
    ///
    /// Returns [`NotConverged`] when the stopping policy declares failure.
    fn converged_norm(&mut self, r: f64, x: Option<&[f64]>) -> Result<bool, NotConverged>;

    /// Test a residual vector, measured with [`norm_kind`](Self::norm_kind).
    ///
    /// # Errors
    ///
    /// Returns [`NotConverged`] when the stopping policy declares failure.
    fn converged(&mut self, r: &[f64], x: Option<&[f64]>) -> Result<bool, NotConverged> {
        let norm = crate::vector::norm(r, self.norm_kind());
        self.converged_norm(norm, x)
    }

    /// Build a failure carrying the current iteration count and residual,
    /// moving the monitor into its failed state.
    fn not_converged(&mut self, reason: NotConvergedReason, detail: &str) -> NotConverged;
}

/// Common interface of every Krylov solver in the crate.
pub trait IterativeSolver: Send {
    /// Solve `A x = b`.
    ///
    /// `x` holds the initial guess on entry and the solution on success.
    /// The caller binds the preconditioner to `a` beforehand.
    ///
    /// # Errors
    ///
    /// [`SolverError::InvalidInput`] on dimension mismatches,
    /// [`SolverError::NotConverged`] when the monitor gives up or the
    /// recurrence breaks down.
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError>;

    /// Replace the preconditioner.
    fn set_preconditioner(&mut self, preconditioner: Box<dyn Preconditioner>);

    /// Mutable access to the preconditioner, e.g. to call `set_matrix`.
    fn preconditioner_mut(&mut self) -> &mut dyn Preconditioner;

    /// Replace the iteration monitor.
    fn set_monitor(&mut self, monitor: Box<dyn IterationMonitor>);

    /// The iteration monitor.
    fn monitor(&self) -> &dyn IterationMonitor;

    /// Mutable access to the iteration monitor.
    fn monitor_mut(&mut self) -> &mut dyn IterationMonitor;

    /// Algorithm implemented by this solver.
    fn algorithm(&self) -> Algorithm;
}
