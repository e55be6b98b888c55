//! Stabilized bi-conjugate gradient (BiCGstab) for general nonsymmetric
//! systems.
//!
//! Each iteration takes a BiCG half-step followed by a one-dimensional
//! residual minimization:
//!
//! ```text
//! r = b - A*x, r~ = r
//! loop until the monitor reports convergence on r:
//!     rho   = r~ . r                      (breakdown if 0, or if omega == 0)
//!     p     = r                           (first iteration)
//!     p     = r + beta * (p - omega * v)  (beta = rho/rho_prev * alpha/omega)
//!     p^    = M^{-1} p,  v = A p^
//!     alpha = rho / (r~ . v)
//!     s     = r - alpha * v
//!     x    += alpha * p^                  (return here if s has converged)
//!     s^    = M^{-1} s,  t = A s^
//!     omega = (t . s) / (t . t)
//!     x    += omega * s^
//!     r     = s - omega * t
//! ```
//!
//! The half-step test goes through the same monitor, so on the first
//! iteration it also becomes the monitor's reference residual.

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

/// BiCGstab solver.
pub struct BiCgStabSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    r: Vec<f64>,
    /// Shadow residual, fixed at the initial residual.
    rtilde: Vec<f64>,
    p: Vec<f64>,
    phat: Vec<f64>,
    s: Vec<f64>,
    shat: Vec<f64>,
    t: Vec<f64>,
    v: Vec<f64>,
}

impl BiCgStabSolver {
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
            s: vec![0.0; n],
            shat: vec![0.0; n],
            t: vec![0.0; n],
            v: vec![0.0; n],
        }
    }

    fn breakdown(&mut self, detail: &str) -> SolverError {
        self.monitor
            .not_converged(NotConvergedReason::Breakdown, detail)
            .into()
    }
}

impl IterativeSolver for BiCgStabSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.r.len())?;
        let start = Instant::now();
        debug!(n = b.len(), "bicgstab: starting solve");

        residual(a, b, x, &mut self.r);
        self.rtilde.copy_from_slice(&self.r);

        let mut rho_prev = 1.0f64;
        let mut alpha = 1.0f64;
        let mut omega = 1.0f64;

        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            let rho = dot(&self.rtilde, &self.r);
            if rho == 0.0 {
                return Err(self.breakdown("rho"));
            }
            if omega == 0.0 {
                return Err(self.breakdown("omega"));
            }

            if self.monitor.is_first() {
                self.p.copy_from_slice(&self.r);
            } else {
                let beta = (rho / rho_prev) * (alpha / omega);
                axpy(-omega, &self.v, &mut self.p);
                xpay(&self.r, beta, &mut self.p);
            }

            self.preconditioner.apply(&self.p, &mut self.phat);
            a.mult(&self.phat, &mut self.v);

            let rv = dot(&self.rtilde, &self.v);
            if rv == 0.0 {
                return Err(self.breakdown("r~.v"));
            }
            alpha = rho / rv;

            self.s.copy_from_slice(&self.r);
            axpy(-alpha, &self.v, &mut self.s);
            axpy(alpha, &self.phat, x);

            if self.monitor.converged(&self.s, Some(&*x))? {
                return Ok(finish(Algorithm::BiCgStab, self.monitor.as_ref(), start));
            }

            self.preconditioner.apply(&self.s, &mut self.shat);
            a.mult(&self.shat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            if tt == 0.0 {
                return Err(self.breakdown("t.t"));
            }
            omega = dot(&self.t, &self.s) / tt;

            axpy(omega, &self.shat, x);
            self.r.copy_from_slice(&self.s);
            axpy(-omega, &self.t, &mut self.r);

            rho_prev = rho;
            self.monitor.next();
        }

        Ok(finish(Algorithm::BiCgStab, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::BiCgStab);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagonal::DiagonalPreconditioner;
    use crate::types::CsrMatrix;
    use crate::vector::norm2;

    /// Convection-diffusion stencil: nonsymmetric, diagonally dominant.
    fn convection_diffusion(n: usize) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push((i, i, 4.0));
            if i > 0 {
                entries.push((i, i - 1, -1.5));
            }
            if i + 1 < n {
                entries.push((i, i + 1, -0.5));
            }
        }
        CsrMatrix::<f64>::from_coo(n, n, entries)
    }

    fn true_residual(a: &CsrMatrix<f64>, b: &[f64], x: &[f64]) -> f64 {
        let mut r = vec![0.0; b.len()];
        residual(a, b, x, &mut r);
        norm2(&r)
    }

    #[test]
    fn solves_nonsymmetric_system() {
        let n = 40;
        let a = convection_diffusion(n);
        let b: Vec<f64> = (0..n).map(|i| 1.0 + (i % 4) as f64).collect();
        let mut x = vec![0.0; n];

        let mut solver = BiCgStabSolver::new(&b);
        let summary = solver.solve(&a, &b, &mut x).unwrap();
        assert_eq!(summary.algorithm, Algorithm::BiCgStab);
        assert!(true_residual(&a, &b, &x) <= 1e-4 * norm2(&b));
    }

    #[test]
    fn diagonal_preconditioner_and_initial_guess() {
        let n = 25;
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push((i, i, 3.0 + i as f64));
            if i > 0 {
                entries.push((i, i - 1, -1.0));
            }
            if i + 2 < n {
                entries.push((i, i + 2, 0.7));
            }
        }
        let a = CsrMatrix::<f64>::from_coo(n, n, entries);
        let x_true: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).cos()).collect();
        let mut b = vec![0.0; n];
        a.mult(&x_true, &mut b);

        let mut m = DiagonalPreconditioner::new();
        m.set_matrix(&a).unwrap();
        let mut solver = BiCgStabSolver::new(&b);
        solver.set_preconditioner(Box::new(m));
        solver.set_monitor(Box::new(DefaultIterationMonitor::new(500, 1e-10, 1e-50, 1e5)));

        let mut x = vec![0.5; n];
        solver.solve(&a, &b, &mut x).unwrap();
        for i in 0..n {
            assert!((x[i] - x_true[i]).abs() < 1e-6, "x[{i}] = {}", x[i]);
        }
    }

    #[test]
    fn orthogonal_shadow_direction_is_breakdown() {
        // A rotation maps r onto a vector orthogonal to r~ = r.
        let a = CsrMatrix::<f64>::from_coo(2, 2, vec![(0, 1, -1.0), (1, 0, 1.0)]);
        let b = [1.0, 0.0];
        let mut x = [0.0, 0.0];
        let mut solver = BiCgStabSolver::new(&b);
        let err = solver.solve(&a, &b, &mut x).unwrap_err();
        assert_eq!(err.reason(), Some(NotConvergedReason::Breakdown));
    }
}
