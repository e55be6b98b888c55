//! Bi-conjugate gradient (BiCG) for general nonsymmetric systems.
//!
//! Runs CG-like recurrences on `A` and `A^T` side by side, so it needs both
//! `mult_add` and `trans_mult_add` from the operator and both `apply` and
//! `trans_apply` from the preconditioner.

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

/// BiCG solver.
pub struct BiCgSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    r: Vec<f64>,
    rtilde: Vec<f64>,
    z: Vec<f64>,
    ztilde: Vec<f64>,
    p: Vec<f64>,
    ptilde: Vec<f64>,
    q: Vec<f64>,
    qtilde: Vec<f64>,
}

impl BiCgSolver {
    /// Create a solver for systems the size of `template`.
    pub fn new(template: &[f64]) -> Self {
        let n = template.len();
        Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            r: vec![0.0; n],
            rtilde: vec![0.0; n],
            z: vec![0.0; n],
            ztilde: vec![0.0; n],
            p: vec![0.0; n],
            ptilde: vec![0.0; n],
            q: vec![0.0; n],
            qtilde: vec![0.0; n],
        }
    }
}

impl IterativeSolver for BiCgSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "bicg: starting solve");

        residual(a, b, x, &mut self.r);
        self.rtilde.copy_from_slice(&self.r);

        let mut rho_prev = 0.0f64;
        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            self.preconditioner.apply(&self.r, &mut self.z);
            self.preconditioner.trans_apply(&self.rtilde, &mut self.ztilde);

            let rho = dot(&self.z, &self.rtilde);
            if rho == 0.0 {
                return Err(self
                    .monitor
                    .not_converged(NotConvergedReason::Breakdown, "rho")
                    .into());
            }

            if self.monitor.is_first() {
                self.p.copy_from_slice(&self.z);
                self.ptilde.copy_from_slice(&self.ztilde);
            } else {
                let beta = rho / rho_prev;
                xpay(&self.z, beta, &mut self.p);
                xpay(&self.ztilde, beta, &mut self.ptilde);
            }

            a.mult(&self.p, &mut self.q);
            a.trans_mult(&self.ptilde, &mut self.qtilde);

            let pq = dot(&self.ptilde, &self.q);
            if pq == 0.0 {
                return Err(self
                    .monitor
                    .not_converged(NotConvergedReason::Breakdown, "p~.q")
                    .into());
            }
            let alpha = rho / pq;

            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.q, &mut self.r);
            axpy(-alpha, &self.qtilde, &mut self.rtilde);

            rho_prev = rho;
            self.monitor.next();
        }

        Ok(finish(Algorithm::BiCg, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::BiCg);
}
