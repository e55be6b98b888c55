//! Error types for the solver crate.
//!
//! Two families are kept apart. [`NotConverged`] describes an *expected*
//! stopping outcome of an iterative method (iteration budget exhausted,
//! divergence, breakdown) and is what callers are expected to handle.
//! [`ValidationError`], [`PreconditionerError`] and [`FactorizationError`]
//! describe precondition violations detected eagerly before any numeric work:
//! they are never retried by the library. All errors implement
//! `std::error::Error` via `thiserror`.

use serde::{Deserialize, Serialize};

/// Why an iterative process stopped without converging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum NotConvergedReason {
    /// The iteration count reached the configured maximum.
    #[error("iteration limit reached")]
    Iterations,
    /// The residual grew beyond the divergence bound or became NaN.
    #[error("divergence")]
    Divergence,
    /// A degenerate scalar (zero inner product, zero pivot) made further
    /// progress impossible.
    #[error("breakdown")]
    Breakdown,
}

/// An iterative solver stopped without meeting its tolerance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "{reason} after {iterations} iterations (residual={residual:.2e}){}",
    detail_suffix(.detail)
)]
pub struct NotConverged {
    /// Classification of the failure.
    pub reason: NotConvergedReason,
    /// Iterations completed when the failure was detected.
    pub iterations: usize,
    /// Last residual norm observed by the monitor.
    pub residual: f64,
    /// Optional human-readable detail, e.g. the scalar that broke down.
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Primary error type for solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The iterative process stopped before convergence.
    #[error("solver did not converge: {0}")]
    NotConverged(#[from] NotConverged),

    /// The caller supplied invalid input (dimensions, parameters, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A preconditioner could not be built from the supplied matrix.
    #[error("preconditioner setup failed: {0}")]
    Preconditioner(#[from] PreconditionerError),

    /// A dense factorization failed.
    #[error("factorization failed: {0}")]
    Factorization(#[from] FactorizationError),
}

impl SolverError {
    /// The non-convergence reason, if this error is an iterative failure.
    pub fn reason(&self) -> Option<NotConvergedReason> {
        match self {
            SolverError::NotConverged(nc) => Some(nc.reason),
            _ => None,
        }
    }
}

/// Validation errors for solver inputs.
///
/// These are raised eagerly before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Matrix or vector dimensions are inconsistent.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A square matrix was required.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A column index is out of bounds for the declared number of columns.
    #[error("column index {index} out of bounds for {cols} columns (row {row})")]
    IndexOutOfBounds {
        /// Offending column index.
        index: usize,
        /// Row containing the offending entry.
        row: usize,
        /// Declared column count.
        cols: usize,
    },

    /// The `row_ptr` array is not monotonically non-decreasing.
    #[error("row_ptr is not monotonically non-decreasing at position {position}")]
    NonMonotonicRowPtrs {
        /// Position in `row_ptr` where the violation was detected.
        position: usize,
    },

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },
}

/// Failures while building a preconditioner from a matrix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionerError {
    /// A diagonal entry is exactly zero.
    #[error("zero diagonal entry on row {row}")]
    ZeroDiagonal {
        /// Row with the zero diagonal.
        row: usize,
    },

    /// A row has no stored diagonal entry.
    #[error("missing diagonal entry on row {row}")]
    MissingDiagonal {
        /// Row without a diagonal entry.
        row: usize,
    },

    /// Incomplete factorization met a zero (or, for Cholesky, non-positive)
    /// pivot.
    #[error("zero pivot encountered on row {row} during incomplete factorization")]
    ZeroPivot {
        /// Row whose pivot vanished.
        row: usize,
    },

    /// The matrix has no rows.
    #[error("matrix has zero dimension")]
    EmptyMatrix,
}

/// Dense factorization failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactorizationError {
    /// An exactly zero pivot was found after partial pivoting.
    #[error("matrix is singular (zero pivot in column {pivot})")]
    Singular {
        /// Column where elimination found no usable pivot.
        pivot: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_converged_message_includes_detail() {
        let err = NotConverged {
            reason: NotConvergedReason::Breakdown,
            iterations: 3,
            residual: 0.5,
            detail: Some("rho".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("breakdown"), "{msg}");
        assert!(msg.contains("rho"), "{msg}");
        assert!(msg.contains("3 iterations"), "{msg}");
    }

    #[test]
    fn not_converged_message_without_detail() {
        let err = NotConverged {
            reason: NotConvergedReason::Iterations,
            iterations: 100,
            residual: 0.125,
            detail: None,
        };
        assert_eq!(
            err.to_string(),
            "iteration limit reached after 100 iterations (residual=1.25e-1)"
        );
        assert_eq!(NotConvergedReason::Divergence.to_string(), "divergence");
    }

    #[test]
    fn reason_only_for_iterative_failures() {
        let err: SolverError = NotConverged {
            reason: NotConvergedReason::Iterations,
            iterations: 10,
            residual: 1.0,
            detail: None,
        }
        .into();
        assert_eq!(err.reason(), Some(NotConvergedReason::Iterations));

        let err: SolverError = ValidationError::NotSquare { rows: 2, cols: 3 }.into();
        assert_eq!(err.reason(), None);
    }
}
