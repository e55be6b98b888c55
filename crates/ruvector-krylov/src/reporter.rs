//! Progress reporters attached to an iteration monitor.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::NotConvergedReason;
use crate::events::SolverEvent;
use crate::traits::IterationReporter;
use crate::types::ConvergenceInfo;

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl IterationReporter for NullReporter {
    fn monitor(&mut self, _residual: f64, _x: Option<&[f64]>, _iteration: usize) {}
}

/// Forwards residuals to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    label: String,
}

impl TracingReporter {
    /// Reporter whose records carry `label` (typically the solver name).
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl IterationReporter for TracingReporter {
    fn monitor(&mut self, residual: f64, _x: Option<&[f64]>, iteration: usize) {
        trace!(solver = %self.label, iteration, residual, "iteration");
    }

    fn converged(&mut self, iterations: usize, residual: f64) {
        debug!(solver = %self.label, iterations, residual, "converged");
    }

    fn failed(&mut self, reason: NotConvergedReason, iterations: usize, residual: f64) {
        debug!(solver = %self.label, %reason, iterations, residual, "stopped");
    }
}

/// Records the residual history into a shared buffer.
///
/// Cloning yields another handle onto the same buffer, so a caller can keep
/// one clone while the monitor owns the other.
#[derive(Debug, Clone, Default)]
pub struct HistoryReporter {
    history: Arc<Mutex<Vec<ConvergenceInfo>>>,
}

impl HistoryReporter {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded residuals.
    pub fn history(&self) -> Vec<ConvergenceInfo> {
        self.history.lock().clone()
    }

    /// Drop all recorded residuals.
    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl IterationReporter for HistoryReporter {
    fn monitor(&mut self, residual: f64, _x: Option<&[f64]>, iteration: usize) {
        self.history.lock().push(ConvergenceInfo {
            iteration,
            residual_norm: residual,
        });
    }
}

/// Keeps an in-memory log of [`SolverEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventLogReporter {
    events: Arc<Mutex<Vec<SolverEvent>>>,
}

impl EventLogReporter {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the logged events.
    pub fn events(&self) -> Vec<SolverEvent> {
        self.events.lock().clone()
    }
}

impl IterationReporter for EventLogReporter {
    fn monitor(&mut self, residual: f64, _x: Option<&[f64]>, iteration: usize) {
        self.events.lock().push(SolverEvent::IterationCompleted {
            iteration,
            residual,
        });
    }

    fn converged(&mut self, iterations: usize, residual: f64) {
        self.events.lock().push(SolverEvent::Converged {
            iterations,
            residual,
        });
    }

    fn failed(&mut self, reason: NotConvergedReason, iterations: usize, residual: f64) {
        self.events.lock().push(SolverEvent::Failed {
            reason,
            iterations,
            residual,
        });
    }
}
