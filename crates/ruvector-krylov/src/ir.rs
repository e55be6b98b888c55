//! Iterative refinement: `x += M^{-1}(b - A x)` until the residual has
//! converged.
//!
//! With an exact preconditioner this converges in one step; with an
//! approximate one it is the stationary iteration defined by `M`.

use std::time::Instant;

use tracing::debug;

use crate::diagonal::IdentityPreconditioner;
use crate::error::SolverError;
use crate::monitor::DefaultIterationMonitor;
use crate::solver::{finish, residual, solver_accessors};
use crate::traits::{IterationMonitor, IterativeSolver, LinearOperator, Preconditioner};
use crate::types::{Algorithm, SolveSummary};
use crate::validation::validate_system;
use crate::vector::axpy;

/// Iterative refinement solver.
pub struct IrSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    r: Vec<f64>,
    z: Vec<f64>,
}

impl IrSolver {
    /// Create a solver for systems the size of `template`.
    pub fn new(template: &[f64]) -> Self {
        let n = template.len();
        Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            r: vec![0.0; n],
            z: vec![0.0; n],
        }
    }
}

impl IterativeSolver for IrSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "ir: starting solve");

        residual(a, b, x, &mut self.r);

        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            self.preconditioner.apply(&self.r, &mut self.z);
            axpy(1.0, &self.z, x);
            residual(a, b, x, &mut self.r);
            self.monitor.next();
        }

        Ok(finish(Algorithm::Ir, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::Ir);
}
