//! Preconditioned Conjugate Gradient for symmetric positive-definite systems.
//!
//! # Algorithm
//!
//! ```text
//! r = b - A*x
//! loop until the monitor reports convergence on r:
//!     z   = M^{-1} * r
//!     rho = r . z
//!     p   = z                          (first iteration)
//!     p   = z + (rho / rho_prev) * p   (afterwards)
//!     q   = A * p
//!     alpha = rho / (p . q)
//!     x  += alpha * p
//!     r  -= alpha * q
//! ```
//!
//! The preconditioner must be symmetric positive definite as well. A zero
//! `rho` after the first iteration is reported as a breakdown.
//!
//! # Convergence
//!
//! Theoretical bound:
//! `||x_k - x*||_A <= 2 * ((sqrt(kappa) - 1)/(sqrt(kappa) + 1))^k * ||x_0 - x*||_A`
//! where `kappa` is the 2-condition number of `M^{-1} A`.

use std::time::Instant;

use tracing::debug;

use crate::diagonal::IdentityPreconditioner;
use crate::error::{NotConvergedReason, SolverError};
use crate::monitor::DefaultIterationMonitor;
use crate::solver::{finish, residual, solver_accessors};
use crate::traits::{IterationMonitor, IterativeSolver, LinearOperator, Preconditioner};
use crate::types::{Algorithm, SolveSummary};
use crate::validation::validate_system;
use crate::vector::{axpy, dot, xpay};

/// Conjugate Gradient solver.
///
/// Working vectors are sized from the template passed to [`new`](Self::new)
/// and reused by every solve.
pub struct ConjugateGradientSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    /// Residual.
    r: Vec<f64>,
    /// Preconditioned residual.
    z: Vec<f64>,
    /// Search direction.
    p: Vec<f64>,
    /// `A * p`.
    q: Vec<f64>,
}

impl ConjugateGradientSolver {
    /// Create a solver for systems the size of `template`, with no
    /// preconditioning and the default monitor.
    pub fn new(template: &[f64]) -> Self {
        let n = template.len();
        Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            r: vec![0.0; n],
            z: vec![0.0; n],
            p: vec![0.0; n],
            q: vec![0.0; n],
        }
    }
}

impl IterativeSolver for ConjugateGradientSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "cg: starting solve");

        residual(a, b, x, &mut self.r);

        let mut rho_prev = 0.0f64;
        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            self.preconditioner.apply(&self.r, &mut self.z);
            let rho = dot(&self.r, &self.z);

            if self.monitor.is_first() {
                self.p.copy_from_slice(&self.z);
            } else {
                if rho == 0.0 {
                    return Err(self
                        .monitor
                        .not_converged(NotConvergedReason::Breakdown, "rho")
                        .into());
                }
                xpay(&self.z, rho / rho_prev, &mut self.p);
            }

            a.mult(&self.p, &mut self.q);
            let pq = dot(&self.p, &self.q);
            if pq == 0.0 {
                return Err(self
                    .monitor
                    .not_converged(NotConvergedReason::Breakdown, "p.q")
                    .into());
            }
            let alpha = rho / pq;

            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.q, &mut self.r);

            rho_prev = rho;
            self.monitor.next();
        }

        Ok(finish(Algorithm::Cg, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::Cg);
}
