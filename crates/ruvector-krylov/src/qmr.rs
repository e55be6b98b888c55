//! Quasi-minimal residual (QMR) for general nonsymmetric systems.
//!
//! Look-ahead-free QMR built on the two-sided Lanczos process, with a split
//! preconditioner `M = M1 M2`: `M1` is applied from the left and `M2` from
//! the right. [`IterativeSolver::set_preconditioner`] installs `M1` and
//! resets `M2` to the identity.
//!
//! Breakdown is reported when any of `rho`, `xi`, `delta`, `epsilon`,
//! `beta` or `gamma` vanishes.

use std::time::Instant;

use tracing::debug;

use crate::diagonal::IdentityPreconditioner;
use crate::error::{NotConvergedReason, SolverError};
use crate::monitor::DefaultIterationMonitor;
use crate::solver::{finish, residual, solver_accessors};
use crate::traits::{IterationMonitor, IterativeSolver, LinearOperator, Preconditioner};
use crate::types::{Algorithm, SolveSummary};
use crate::validation::validate_system;
use crate::vector::{axpy, dot, norm2, scale, xpay};

/// QMR solver.
pub struct QmrSolver {
    left: Box<dyn Preconditioner>,
    right: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    r: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    v: Vec<f64>,
    w: Vec<f64>,
    y_tld: Vec<f64>,
    z_tld: Vec<f64>,
    v_tld: Vec<f64>,
    w_tld: Vec<f64>,
    p: Vec<f64>,
    q: Vec<f64>,
    p_tld: Vec<f64>,
    d: Vec<f64>,
    s: Vec<f64>,
}

impl QmrSolver {
    /// Create a solver for systems the size of `template`, with identity
    /// preconditioners on both sides.
    pub fn new(template: &[f64]) -> Self {
        let n = template.len();
        Self {
            left: Box::new(IdentityPreconditioner),
            right: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            r: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
            v: vec![0.0; n],
            w: vec![0.0; n],
            y_tld: vec![0.0; n],
            z_tld: vec![0.0; n],
            v_tld: vec![0.0; n],
            w_tld: vec![0.0; n],
            p: vec![0.0; n],
            q: vec![0.0; n],
            p_tld: vec![0.0; n],
            d: vec![0.0; n],
            s: vec![0.0; n],
        }
    }

    /// Install the left preconditioner `M1`.
    pub fn set_left_preconditioner(&mut self, preconditioner: Box<dyn Preconditioner>) {
        self.left = preconditioner;
    }

    /// Install the right preconditioner `M2`.
    pub fn set_right_preconditioner(&mut self, preconditioner: Box<dyn Preconditioner>) {
        self.right = preconditioner;
    }

    /// Left preconditioner `M1`.
    pub fn left_preconditioner_mut(&mut self) -> &mut dyn Preconditioner {
        self.left.as_mut()
    }

    /// Right preconditioner `M2`.
    pub fn right_preconditioner_mut(&mut self) -> &mut dyn Preconditioner {
        self.right.as_mut()
    }

    fn breakdown(&mut self, detail: &str) -> SolverError {
        self.monitor
            .not_converged(NotConvergedReason::Breakdown, detail)
            .into()
    }
}

impl IterativeSolver for QmrSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "qmr: starting solve");

        residual(a, b, x, &mut self.r);

        self.v_tld.copy_from_slice(&self.r);
        self.left.apply(&self.v_tld, &mut self.y);
        let mut rho = norm2(&self.y);

        self.w_tld.copy_from_slice(&self.r);
        self.right.trans_apply(&self.w_tld, &mut self.z);
        let mut xi = norm2(&self.z);

        let mut gamma = 1.0f64;
        let mut eta = -1.0f64;
        let mut theta = 0.0f64;
        let mut epsilon = 1.0f64;

        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            if rho == 0.0 {
                return Err(self.breakdown("rho"));
            }
            if xi == 0.0 {
                return Err(self.breakdown("xi"));
            }

            self.v.copy_from_slice(&self.v_tld);
            scale(1.0 / rho, &mut self.v);
            scale(1.0 / rho, &mut self.y);
            self.w.copy_from_slice(&self.w_tld);
            scale(1.0 / xi, &mut self.w);
            scale(1.0 / xi, &mut self.z);

            let delta = dot(&self.z, &self.y);
            if delta == 0.0 {
                return Err(self.breakdown("delta"));
            }

            self.right.apply(&self.y, &mut self.y_tld);
            self.left.trans_apply(&self.z, &mut self.z_tld);

            if self.monitor.is_first() {
                self.p.copy_from_slice(&self.y_tld);
                self.q.copy_from_slice(&self.z_tld);
            } else {
                xpay(&self.y_tld, -(xi * delta / epsilon), &mut self.p);
                xpay(&self.z_tld, -(rho * delta / epsilon), &mut self.q);
            }

            a.mult(&self.p, &mut self.p_tld);
            epsilon = dot(&self.q, &self.p_tld);
            if epsilon == 0.0 {
                return Err(self.breakdown("epsilon"));
            }

            let beta = epsilon / delta;
            if beta == 0.0 {
                return Err(self.breakdown("beta"));
            }

            self.v_tld.copy_from_slice(&self.p_tld);
            axpy(-beta, &self.v, &mut self.v_tld);
            self.left.apply(&self.v_tld, &mut self.y);
            let rho_prev = rho;
            rho = norm2(&self.y);

            a.trans_mult(&self.q, &mut self.w_tld);
            axpy(-beta, &self.w, &mut self.w_tld);
            self.right.trans_apply(&self.w_tld, &mut self.z);
            xi = norm2(&self.z);

            let gamma_prev = gamma;
            let theta_prev = theta;
            theta = rho / (gamma_prev * beta.abs());
            gamma = 1.0 / (1.0 + theta * theta).sqrt();
            if gamma == 0.0 {
                return Err(self.breakdown("gamma"));
            }
            eta = -eta * rho_prev * gamma * gamma / (beta * gamma_prev * gamma_prev);

            if self.monitor.is_first() {
                self.d.copy_from_slice(&self.p);
                scale(eta, &mut self.d);
                self.s.copy_from_slice(&self.p_tld);
                scale(eta, &mut self.s);
            } else {
                let k = (theta_prev * gamma) * (theta_prev * gamma);
                scale(k, &mut self.d);
                axpy(eta, &self.p, &mut self.d);
                scale(k, &mut self.s);
                axpy(eta, &self.p_tld, &mut self.s);
            }

            axpy(1.0, &self.d, x);
            axpy(-1.0, &self.s, &mut self.r);

            self.monitor.next();
        }

        Ok(finish(Algorithm::Qmr, self.monitor.as_ref(), start))
    }

    fn set_preconditioner(&mut self, preconditioner: Box<dyn Preconditioner>) {
        self.left = preconditioner;
        self.right = Box::new(IdentityPreconditioner);
    }

    fn preconditioner_mut(&mut self) -> &mut dyn Preconditioner {
        self.left.as_mut()
    }

    solver_accessors!(@monitor Algorithm::Qmr);
}
