//! Restarted GMRES for general nonsymmetric systems.
//!
//! Left-preconditioned: the Krylov basis is built for `M^{-1} A` starting
//! from the preconditioned residual `r = M^{-1}(b - A x)`. Within a cycle
//! the basis is orthogonalized with modified Gram-Schmidt and the upper
//! Hessenberg matrix is reduced to triangular form on the fly by Givens
//! rotations, so `|s[i]|` tracks the residual norm of the least-squares
//! problem without forming `x`.
//!
//! ```text
//! r = M^{-1}(b - A x)
//! loop until the monitor reports convergence on r:
//!     v_0 = r / ||r||,  s = (||r||, 0, ..., 0)
//!     for i in 0..restart while |s[i]| has not converged:
//!         w = M^{-1} A v_i
//!         H[k][i] = w . v_k,  w -= H[k][i] v_k    for k = 0..=i
//!         H[i+1][i] = ||w||,  v_{i+1} = w / H[i+1][i]
//!         rotate column i by the previous rotations, build rotation i
//!         from (H[i][i], H[i+1][i]) and apply it to H and s
//!     solve H y = s on the leading triangle, x += V y
//!     r = M^{-1}(b - A x)
//! ```
//!
//! A zero subdiagonal `H[i+1][i]` means the Krylov space is invariant and
//! the current cycle already contains the exact solution ("happy
//! breakdown"): the cycle ends and `x` is updated from it.

use std::time::Instant;

use tracing::{debug, trace};

use crate::diagonal::IdentityPreconditioner;
use crate::error::{NotConvergedReason, SolverError, ValidationError};
use crate::givens::GivensRotation;
use crate::monitor::DefaultIterationMonitor;
use crate::solver::{finish, residual, solver_accessors};
use crate::traits::{IterationMonitor, IterativeSolver, LinearOperator, Preconditioner};
use crate::types::{Algorithm, SolveSummary};
use crate::validation::validate_system;
use crate::vector::{axpy, dot, norm2, scale};

/// Default Krylov basis size between restarts.
pub const DEFAULT_RESTART: usize = 30;

/// Restarted GMRES solver.
pub struct GmresSolver {
    preconditioner: Box<dyn Preconditioner>,
    monitor: Box<dyn IterationMonitor>,
    restart: usize,
    /// Unpreconditioned residual and `A v_i` scratch.
    u: Vec<f64>,
    /// Preconditioned residual.
    r: Vec<f64>,
    /// Vector being orthogonalized.
    w: Vec<f64>,
    /// Orthonormal basis, `restart + 1` vectors.
    v: Vec<Vec<f64>>,
    /// Hessenberg matrix by column: `h[col][row]`, `restart` columns of
    /// `restart + 1` rows.
    h: Vec<Vec<f64>>,
    /// Rotated right-hand side of the least-squares problem.
    s: Vec<f64>,
    /// Coefficients of the update in the basis.
    y: Vec<f64>,
    rotations: Vec<GivensRotation>,
}

impl GmresSolver {
    /// Solver for systems the size of `template`, restarting every
    /// [`DEFAULT_RESTART`] iterations.
    pub fn new(template: &[f64]) -> Self {
        Self::with_restart(template, DEFAULT_RESTART)
    }

    /// Solver with an explicit restart length. A restart of zero is
    /// rejected when solving.
    pub fn with_restart(template: &[f64], restart: usize) -> Self {
        let n = template.len();
        let mut solver = Self {
            preconditioner: Box::new(IdentityPreconditioner),
            monitor: Box::new(DefaultIterationMonitor::default()),
            restart: 0,
            u: vec![0.0; n],
            r: vec![0.0; n],
            w: vec![0.0; n],
            v: Vec::new(),
            h: Vec::new(),
            s: Vec::new(),
            y: Vec::new(),
            rotations: Vec::new(),
        };
        solver.set_restart(restart);
        solver
    }

    /// Change the restart length, reallocating the basis.
    pub fn set_restart(&mut self, restart: usize) {
        let n = self.u.len();
        self.restart = restart;
        self.v = vec![vec![0.0; n]; restart + 1];
        self.h = vec![vec![0.0; restart + 1]; restart];
        self.s = vec![0.0; restart + 1];
        self.y = vec![0.0; restart];
        self.rotations = vec![GivensRotation::new(1.0, 0.0); restart];
    }

    /// Current restart length.
    pub fn restart(&self) -> usize {
        self.restart
    }

    fn breakdown(&mut self, detail: &str) -> SolverError {
        self.monitor
            .not_converged(NotConvergedReason::Breakdown, detail)
            .into()
    }

    /// `r = M^{-1}(b - A x)`; returns `||r||_2`.
    fn preconditioned_residual(&mut self, a: &dyn LinearOperator, b: &[f64], x: &[f64]) -> f64 {
        residual(a, b, x, &mut self.u);
        self.preconditioner.apply(&self.u, &mut self.r);
        norm2(&self.r)
    }

    /// Extend the basis by one vector; returns `false` on happy breakdown.
    fn arnoldi_step(&mut self, a: &dyn LinearOperator, i: usize) -> bool {
        a.mult(&self.v[i], &mut self.u);
        self.preconditioner.apply(&self.u, &mut self.w);

        for k in 0..=i {
            let hki = dot(&self.w, &self.v[k]);
            self.h[i][k] = hki;
            axpy(-hki, &self.v[k], &mut self.w);
        }

        let subdiagonal = norm2(&self.w);
        self.h[i][i + 1] = subdiagonal;
        let invariant = subdiagonal == 0.0;
        if invariant {
            self.v[i + 1].fill(0.0);
        } else {
            self.v[i + 1].copy_from_slice(&self.w);
            scale(1.0 / subdiagonal, &mut self.v[i + 1]);
        }

        for k in 0..i {
            self.rotations[k].apply_to_column(&mut self.h, i, k, k + 1);
        }
        let rotation = GivensRotation::new(self.h[i][i], self.h[i][i + 1]);
        rotation.apply_to_column(&mut self.h, i, i, i + 1);
        rotation.apply_to_vector(&mut self.s, i, i + 1);
        self.rotations[i] = rotation;

        !invariant
    }

    /// Back-substitute the leading `k x k` triangle of `H` into `y` and
    /// add `V y` to `x`.
    fn update(&mut self, x: &mut [f64], k: usize) -> Result<(), SolverError> {
        for j in (0..k).rev() {
            let mut sum = self.s[j];
            for col in (j + 1)..k {
                sum -= self.h[col][j] * self.y[col];
            }
            let diag = self.h[j][j];
            if diag == 0.0 {
                return Err(self.breakdown("H"));
            }
            self.y[j] = sum / diag;
        }
        for j in 0..k {
            axpy(self.y[j], &self.v[j], x);
        }
        Ok(())
    }
}

impl IterativeSolver for GmresSolver {
    fn solve(
        &mut self,
        a: &dyn LinearOperator,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<SolveSummary, SolverError> {
        validate_system(a, b, x, self.u.len())?;
        if self.restart == 0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "restart".into(),
                value: "0".into(),
                expected: ">= 1".into(),
            }
            .into());
        }
        let start = Instant::now();
        debug!(n = b.len(), restart = self.restart, "gmres: starting solve");

        let mut normr = self.preconditioned_residual(a, b, x);

        self.monitor.set_first();
        while !self.monitor.converged(&self.r, Some(&*x))? {
            if normr == 0.0 {
                break;
            }
            self.v[0].copy_from_slice(&self.r);
            scale(1.0 / normr, &mut self.v[0]);
            self.s.fill(0.0);
            self.s[0] = normr;

            let mut i = 0;
            while i < self.restart && !self.monitor.converged_norm(self.s[i].abs(), Some(&*x))? {
                let extended = self.arnoldi_step(a, i);
                i += 1;
                self.monitor.next();
                if !extended {
                    trace!(iteration = self.monitor.iterations(), "gmres: invariant subspace");
                    break;
                }
            }

            self.update(x, i)?;
            normr = self.preconditioned_residual(a, b, x);
        }

        Ok(finish(Algorithm::Gmres, self.monitor.as_ref(), start))
    }

    solver_accessors!(Algorithm::Gmres);
}
