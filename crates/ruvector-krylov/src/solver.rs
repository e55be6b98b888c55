//! Plumbing shared by the solver implementations.

use std::time::Instant;

use tracing::debug;

use crate::traits::{IterationMonitor, LinearOperator};
use crate::types::{Algorithm, SolveSummary};

/// Implements the accessor half of [`IterativeSolver`] for a solver struct
/// with `preconditioner` and `monitor` fields.
///
/// [`IterativeSolver`]: crate::traits::IterativeSolver
macro_rules! solver_accessors {
    (@monitor $algorithm:expr) => {
        fn set_monitor(&mut self, monitor: Box<dyn $crate::traits::IterationMonitor>) {
            self.monitor = monitor;
        }

        fn monitor(&self) -> &dyn $crate::traits::IterationMonitor {
            self.monitor.as_ref()
        }

        fn monitor_mut(&mut self) -> &mut dyn $crate::traits::IterationMonitor {
            self.monitor.as_mut()
        }

        fn algorithm(&self) -> $crate::types::Algorithm {
            $algorithm
        }
    };
    ($algorithm:expr) => {
        fn set_preconditioner(
            &mut self,
            preconditioner: Box<dyn $crate::traits::Preconditioner>,
        ) {
            self.preconditioner = preconditioner;
        }

        fn preconditioner_mut(&mut self) -> &mut dyn $crate::traits::Preconditioner {
            self.preconditioner.as_mut()
        }

        $crate::solver::solver_accessors!(@monitor $algorithm);
    };
}

pub(crate) use solver_accessors;

/// `r = b - A x`.
#[inline]
pub(crate) fn residual(a: &dyn LinearOperator, b: &[f64], x: &[f64], r: &mut [f64]) {
    r.copy_from_slice(b);
    a.mult_add(-1.0, x, r);
}

/// Build the summary of a converged run and log it.
pub(crate) fn finish(
    algorithm: Algorithm,
    monitor: &dyn IterationMonitor,
    started: Instant,
) -> SolveSummary {
    let summary = SolveSummary {
        algorithm,
        iterations: monitor.iterations(),
        residual_norm: monitor.residual(),
        wall_time: started.elapsed(),
    };
    debug!(
        %algorithm,
        iterations = summary.iterations,
        residual = summary.residual_norm,
        wall_time = ?summary.wall_time,
        "solve converged"
    );
    summary
}
