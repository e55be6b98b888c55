//! Chebyshev iteration for symmetric positive-definite systems.
//!
//! Needs no inner products: the step lengths come from caller-supplied
//! bounds `[eig_min, eig_max]` on the spectrum of `M^{-1} A`. With
//! `c = (eig_max - eig_min) / 2` and `d = (eig_max + eig_min) / 2`:
//!
//! ```text
//! r = b - A*x
//! loop until the monitor reports convergence on r:
//!     z = M^{-1} r
//!     p = z,               alpha = 2 / d                 (first iteration)
//!     beta = (alpha*c/2)^2, alpha = 1 / (d - beta),
//!     p = z + beta * p                                   (afterwards)
//!     x += alpha * p
//!     r -= alpha * A p
//! ```
//!
//! The iteration is only as good as the bounds; nothing detects a bound
//! that misses part of the spectrum except the monitor's divergence test.

use std::time::Instant;

use tracing::debug;

use crate::diagonal::IdentityPreconditioner;
use crate::error::SolverError;
use crate::monitor::DefaultIterationMonitor;
use crate::solver::{finish, residual, solver_accessors};
use crate::traits::{IterationMonitor, IterativeSolver, LinearOperator, Preconditioner};
use crate::types::{Algorithm, SolveSummary};
use crate::validation::{validate_eigenvalue_bounds, validate_system};
use crate::vector::{axpy, xpay};

/// Chebyshev iteration.
pub struct ChebyshevSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    eig_min: f64,
    eig_max: f64,
    r: Vec<f64>,
    z: Vec<f64>,
    p: Vec<f64>,
    q: Vec<f64>,
}

impl ChebyshevSolver {
    /// Solver for systems the size of `template` whose preconditioned
    /// spectrum lies in `[eig_min, eig_max]`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] unless
    /// `0 < eig_min <= eig_max`.
    ///
    /// [`ValidationError::ParameterOutOfRange`]: crate::error::ValidationError::ParameterOutOfRange
    pub fn new(template: &[f64], eig_min: f64, eig_max: f64) -> Result<Self, SolverError> {
        validate_eigenvalue_bounds(eig_min, eig_max)?;
        let n = template.len();
        Ok(Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            eig_min,
            eig_max,
            r: vec![0.0; n],
            z: vec![0.0; n],
            p: vec![0.0; n],
            q: vec![0.0; n],
        })
    }

    /// Replace the spectral bounds.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new); the old bounds are kept on
    /// error.
    pub fn set_eigenvalues(&mut self, eig_min: f64, eig_max: f64) -> Result<(), SolverError> {
        validate_eigenvalue_bounds(eig_min, eig_max)?;
        self.eig_min = eig_min;
        self.eig_max = eig_max;
        Ok(())
    }

    /// Current `(eig_min, eig_max)`.
    pub fn eigenvalues(&self) -> (f64, f64) {
        (self.eig_min, self.eig_max)
    }
}

impl IterativeSolver for ChebyshevSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(
            n = b.len(),
            eig_min = self.eig_min,
            eig_max = self.eig_max,
            "chebyshev: starting solve"
        );

        let c = (self.eig_max - self.eig_min) / 2.0;
        let d = (self.eig_max + self.eig_min) / 2.0;

        residual(a, b, x, &mut self.r);

        let mut alpha = 0.0f64;
        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            self.preconditioner.apply(&self.r, &mut self.z);

            if self.monitor.is_first() {
                self.p.copy_from_slice(&self.z);
                alpha = 2.0 / d;
            } else {
                let half = alpha * c / 2.0;
                let beta = half * half;
                alpha = 1.0 / (d - beta);
                xpay(&self.z, beta, &mut self.p);
            }

            a.mult(&self.p, &mut self.q);
            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.q, &mut self.r);

            self.monitor.next();
        }

        Ok(finish(Algorithm::Chebyshev, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::Chebyshev);
}
