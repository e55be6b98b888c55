//! Solver events.
//!
//! An [`EventLogReporter`](crate::reporter::EventLogReporter) turns monitor
//! callbacks into [`SolverEvent`]s so a run can be inspected or serialised
//! after the fact.

use serde::{Deserialize, Serialize};

use crate::error::NotConvergedReason;

/// One entry in a solve's event log.
///
/// Internally tagged, so a record reads `{"type":"Converged",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolverEvent {
    /// The monitor tested a residual.
    IterationCompleted { iteration: usize, residual: f64 },

    /// The monitor accepted the residual.
    Converged { iterations: usize, residual: f64 },

    /// The run stopped without converging.
    Failed {
        reason: NotConvergedReason,
        iterations: usize,
        /// Residual at the point of failure.
        residual: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_type_tag() {
        let event = SolverEvent::Failed {
            reason: NotConvergedReason::Breakdown,
            iterations: 4,
            residual: 0.25,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Failed\""), "{json}");
        let back: SolverEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
