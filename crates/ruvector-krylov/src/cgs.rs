//! Conjugate gradient squared (CGS) for general nonsymmetric systems.
//!
//! Squares the BiCG residual polynomial, which avoids products with `A^T`
//! at the price of less smooth convergence.

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

/// CGS solver.
pub struct CgsSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    r: Vec<f64>,
    rtilde: Vec<f64>,
    p: Vec<f64>,
    phat: Vec<f64>,
    q: Vec<f64>,
    qhat: Vec<f64>,
    u: Vec<f64>,
    uhat: Vec<f64>,
    vhat: Vec<f64>,
    sum: Vec<f64>,
}

impl CgsSolver {
    /// Create a solver for systems the size of `template`.
    pub fn new(template: &[f64]) -> Self {
        let n = template.len();
        Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            r: vec![0.0; n],
            rtilde: vec![0.0; n],
            p: vec![0.0; n],
            phat: vec![0.0; n],
            q: vec![0.0; n],
            qhat: vec![0.0; n],
            u: vec![0.0; n],
            uhat: vec![0.0; n],
            vhat: vec![0.0; n],
            sum: vec![0.0; n],
        }
    }
}

impl IterativeSolver for CgsSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "cgs: starting solve");

        residual(a, b, x, &mut self.r);
        self.rtilde.copy_from_slice(&self.r);

        let mut rho_prev = 0.0f64;
        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            let rho = dot(&self.rtilde, &self.r);
            if rho == 0.0 {
                return Err(self
                    .monitor
                    .not_converged(NotConvergedReason::Breakdown, "rho")
                    .into());
            }

            if self.monitor.is_first() {
                self.u.copy_from_slice(&self.r);
                self.p.copy_from_slice(&self.u);
            } else {
                let beta = rho / rho_prev;
                // u = r + beta q, p = u + beta (q + beta p)
                self.u.copy_from_slice(&self.q);
                xpay(&self.r, beta, &mut self.u);
                xpay(&self.q, beta, &mut self.p);
                xpay(&self.u, beta, &mut self.p);
            }

            self.preconditioner.apply(&self.p, &mut self.phat);
            a.mult(&self.phat, &mut self.vhat);

            let rv = dot(&self.rtilde, &self.vhat);
            if rv == 0.0 {
                return Err(self
                    .monitor
                    .not_converged(NotConvergedReason::Breakdown, "r~.v")
                    .into());
            }
            let alpha = rho / rv;

            // q = u - alpha v
            self.q.copy_from_slice(&self.u);
            axpy(-alpha, &self.vhat, &mut self.q);

            self.sum.copy_from_slice(&self.u);
            axpy(1.0, &self.q, &mut self.sum);
            self.preconditioner.apply(&self.sum, &mut self.uhat);

            axpy(alpha, &self.uhat, x);
            a.mult(&self.uhat, &mut self.qhat);
            axpy(-alpha, &self.qhat, &mut self.r);

            rho_prev = rho;
            self.monitor.next();
        }

        Ok(finish(Algorithm::Cgs, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::Cgs);
}
