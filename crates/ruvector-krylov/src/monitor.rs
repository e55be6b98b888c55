//! Iteration monitors.
//!
//! [`DefaultIterationMonitor`] implements the usual relative/absolute/
//! divergence policy. [`CountingIterationMonitor`] simply runs a fixed
//! number of iterations.

use tracing::warn;

use crate::config::MonitorConfig;
use crate::error::{NotConverged, NotConvergedReason};
use crate::reporter::NullReporter;
use crate::traits::{IterationMonitor, IterationReporter};
use crate::vector::NormKind;

/// Lifecycle of a monitor within one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Constructed, `set_first` not yet called.
    Initial,
    /// Iterating.
    Running,
    /// A convergence test passed.
    Converged,
    /// The run ended irrecoverably.
    Failed(NotConvergedReason),
}

/// Monitor with the classic stopping policy.
///
/// The residual seen on the first test becomes `r0`. A later residual `r`
/// is converged when `r <= max(rtol * r0, atol)`, diverged when
/// `r > dtol * r0` or NaN, and exhausted when the iteration count reaches
/// the maximum.
pub struct DefaultIterationMonitor {
    iter: usize,
    initial_residual: f64,
    residual: f64,
    norm: NormKind,
    rtol: f64,
    atol: f64,
    dtol: f64,
    max_iterations: usize,
    state: MonitorState,
    reporter: Box<dyn IterationReporter>,
}

impl std::fmt::Debug for DefaultIterationMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultIterationMonitor")
            .field("iter", &self.iter)
            .field("residual", &self.residual)
            .field("rtol", &self.rtol)
            .field("atol", &self.atol)
            .field("dtol", &self.dtol)
            .field("max_iterations", &self.max_iterations)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for DefaultIterationMonitor {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl DefaultIterationMonitor {
    /// Monitor with explicit tolerances and the two-norm.
    pub fn new(max_iterations: usize, rtol: f64, atol: f64, dtol: f64) -> Self {
        Self::from_config(&MonitorConfig {
            max_iterations,
            relative_tolerance: rtol,
            absolute_tolerance: atol,
            divergence_tolerance: dtol,
            ..MonitorConfig::default()
        })
    }

    /// Monitor built from a [`MonitorConfig`].
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            iter: 0,
            initial_residual: 0.0,
            residual: 0.0,
            norm: config.norm,
            rtol: config.relative_tolerance,
            atol: config.absolute_tolerance,
            dtol: config.divergence_tolerance,
            max_iterations: config.max_iterations,
            state: MonitorState::Initial,
            reporter: Box::new(NullReporter),
        }
    }

    /// Change all three tolerances at once.
    pub fn set_tolerances(&mut self, rtol: f64, atol: f64, dtol: f64) {
        self.rtol = rtol;
        self.atol = atol;
        self.dtol = dtol;
    }

    /// Set the relative tolerance.
    pub fn set_relative_tolerance(&mut self, rtol: f64) {
        self.rtol = rtol;
    }

    /// Set the absolute tolerance.
    pub fn set_absolute_tolerance(&mut self, atol: f64) {
        self.atol = atol;
    }

    /// Set the divergence tolerance.
    pub fn set_divergence_tolerance(&mut self, dtol: f64) {
        self.dtol = dtol;
    }

    /// Set the iteration cap.
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    /// Relative tolerance.
    pub fn relative_tolerance(&self) -> f64 {
        self.rtol
    }

    /// Absolute tolerance.
    pub fn absolute_tolerance(&self) -> f64 {
        self.atol
    }

    /// Divergence tolerance.
    pub fn divergence_tolerance(&self) -> f64 {
        self.dtol
    }

    /// Iteration cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Residual recorded on the first test of the current run.
    pub fn initial_residual(&self) -> f64 {
        self.initial_residual
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    fn fail(&mut self, reason: NotConvergedReason, detail: Option<String>) -> NotConverged {
        self.state = MonitorState::Failed(reason);
        self.reporter.failed(reason, self.iter, self.residual);
        warn!(
            iterations = self.iter,
            residual = self.residual,
            "iteration monitor: {reason}"
        );
        NotConverged {
            reason,
            iterations: self.iter,
            residual: self.residual,
            detail,
        }
    }
}

impl IterationMonitor for DefaultIterationMonitor {
    fn set_first(&mut self) {
        self.iter = 0;
        self.state = MonitorState::Running;
    }

    fn is_first(&self) -> bool {
        self.iter == 0
    }

    fn next(&mut self) {
        self.iter += 1;
    }

    fn iterations(&self) -> usize {
        self.iter
    }

    fn residual(&self) -> f64 {
        self.residual
    }

    fn norm_kind(&self) -> NormKind {
        self.norm
    }

    fn set_norm_kind(&mut self, kind: NormKind) {
        self.norm = kind;
    }

    fn set_reporter(&mut self, reporter: Box<dyn IterationReporter>) {
        self.reporter = reporter;
    }

    fn converged_norm(&mut self, r: f64, x: Option<&[f64]>) -> Result<bool, NotConverged> {
        self.residual = r;
        self.reporter.monitor(r, x, self.iter);

        if self.is_first() {
            self.initial_residual = r;
        }

        if r <= (self.rtol * self.initial_residual).max(self.atol) {
            self.state = MonitorState::Converged;
            self.reporter.converged(self.iter, r);
            return Ok(true);
        }

        if r.is_nan() {
            return Err(self.fail(
                NotConvergedReason::Divergence,
                Some("residual is NaN".into()),
            ));
        }
        if r > self.dtol * self.initial_residual {
            return Err(self.fail(
                NotConvergedReason::Divergence,
                Some(format!(
                    "residual {r:.3e} exceeds {:.1e} x initial {:.3e}",
                    self.dtol, self.initial_residual
                )),
            ));
        }
        if self.iter >= self.max_iterations {
            return Err(self.fail(NotConvergedReason::Iterations, None));
        }

        Ok(false)
    }

    fn not_converged(&mut self, reason: NotConvergedReason, detail: &str) -> NotConverged {
        self.fail(reason, Some(detail.to_owned()))
    }
}

/// Monitor that converges once a fixed number of iterations has run.
///
/// Useful for fixed-sweep smoothing and for timing a known amount of work.
/// It never reports a failure from a convergence test.
pub struct CountingIterationMonitor {
    iter: usize,
    max_iterations: usize,
    residual: f64,
    norm: NormKind,
    reporter: Box<dyn IterationReporter>,
}

impl CountingIterationMonitor {
    /// Monitor that stops after `max_iterations` iterations.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iter: 0,
            max_iterations,
            residual: 0.0,
            norm: NormKind::Two,
            reporter: Box::new(NullReporter),
        }
    }
}

impl IterationMonitor for CountingIterationMonitor {
    fn set_first(&mut self) {
        self.iter = 0;
    }

    fn is_first(&self) -> bool {
        self.iter == 0
    }

    fn next(&mut self) {
        self.iter += 1;
    }

    fn iterations(&self) -> usize {
        self.iter
    }

    fn residual(&self) -> f64 {
        self.residual
    }

    fn norm_kind(&self) -> NormKind {
        self.norm
    }

    fn set_norm_kind(&mut self, kind: NormKind) {
        self.norm = kind;
    }

    fn set_reporter(&mut self, reporter: Box<dyn IterationReporter>) {
        self.reporter = reporter;
    }

    fn converged_norm(&mut self, r: f64, x: Option<&[f64]>) -> Result<bool, NotConverged> {
        self.residual = r;
        self.reporter.monitor(r, x, self.iter);
        let done = self.iter >= self.max_iterations;
        if done {
            self.reporter.converged(self.iter, r);
        }
        Ok(done)
    }

    fn not_converged(&mut self, reason: NotConvergedReason, detail: &str) -> NotConverged {
        self.reporter.failed(reason, self.iter, self.residual);
        NotConverged {
            reason,
            iterations: self.iter,
            residual: self.residual,
            detail: Some(detail.to_owned()),
        }
    }
}
