//! Argument checks run before a solve or a preconditioner setup starts.
//!
//! Failures come back as [`ValidationError`], which lifts into
//! [`SolverError::InvalidInput`](crate::error::SolverError).

use crate::error::ValidationError;
use crate::traits::{LinearOperator, Matrix};
use crate::types::CsrMatrix;

// ---------------------------------------------------------------------------
// CSR matrix validation
// ---------------------------------------------------------------------------

/// Check that `matrix` is well-formed CSR with finite entries.
///
/// Offsets must start at zero, never decrease and end at the number of
/// stored values. Inside each row, column indices must be in range and
/// strictly increasing.
///
/// ```
/// use ruvector_krylov::types::CsrMatrix;
/// use ruvector_krylov::validation::validate_csr_matrix;
///
/// let m = CsrMatrix::<f64>::from_coo(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)]);
/// assert!(validate_csr_matrix(&m).is_ok());
/// ```
pub fn validate_csr_matrix(matrix: &CsrMatrix<f64>) -> Result<(), ValidationError> {
    let CsrMatrix {
        row_ptr,
        col_indices,
        values,
        rows,
        cols,
    } = matrix;

    if row_ptr.len() != rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "{} row offsets for {rows} rows",
            row_ptr.len()
        )));
    }
    if let Some(position) = (1..row_ptr.len()).find(|&k| row_ptr[k] < row_ptr[k - 1]) {
        return Err(ValidationError::NonMonotonicRowPtrs { position });
    }
    if row_ptr[0] != 0 || row_ptr[*rows] != values.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "row offsets span {}..{} but {} values are stored",
            row_ptr[0],
            row_ptr[*rows],
            values.len()
        )));
    }
    if col_indices.len() != values.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "{} column indices for {} values",
            col_indices.len(),
            values.len()
        )));
    }

    for row in 0..*rows {
        let span = row_ptr[row]..row_ptr[row + 1];
        for k in span.clone() {
            let col = col_indices[k];
            if col >= *cols {
                return Err(ValidationError::IndexOutOfBounds {
                    index: col,
                    row,
                    cols: *cols,
                });
            }
            if !values[k].is_finite() {
                return Err(ValidationError::NonFiniteValue(format!(
                    "a[{row}, {col}] = {}",
                    values[k]
                )));
            }
            if k > span.start && col <= col_indices[k - 1] {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {row} is not sorted by column ({col} after {})",
                    col_indices[k - 1]
                )));
            }
        }
    }

    Ok(())
}

/// CSR copy of a square `a`, checked with [`validate_csr_matrix`].
///
/// Every preconditioner binds through this, so factorizations can rely on
/// sorted rows and finite entries.
pub fn square_csr_snapshot(a: &dyn Matrix) -> Result<CsrMatrix<f64>, ValidationError> {
    if !a.is_square() {
        return Err(ValidationError::NotSquare {
            rows: a.rows(),
            cols: a.cols(),
        });
    }
    let csr = a.to_csr();
    validate_csr_matrix(&csr)?;
    Ok(csr)
}

// ---------------------------------------------------------------------------
// Linear system validation
// ---------------------------------------------------------------------------

/// Shape check for `A x = b` against the length of a solver's work vectors.
pub fn validate_system(
    a: &dyn LinearOperator,
    b: &[f64],
    x: &[f64],
    work_len: usize,
) -> Result<(), ValidationError> {
    if !a.is_square() {
        return Err(ValidationError::NotSquare {
            rows: a.rows(),
            cols: a.cols(),
        });
    }

    if b.len() != a.rows() {
        return Err(ValidationError::DimensionMismatch(format!(
            "b length {} does not match matrix rows {}",
            b.len(),
            a.rows(),
        )));
    }

    if x.len() != a.cols() {
        return Err(ValidationError::DimensionMismatch(format!(
            "x length {} does not match matrix columns {}",
            x.len(),
            a.cols(),
        )));
    }

    if work_len != a.rows() {
        return Err(ValidationError::DimensionMismatch(format!(
            "solver working vectors have length {} but the system has {} rows",
            work_len,
            a.rows(),
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Validate a relaxation factor, which must lie in `[0, 2]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_relaxation(name: &str, omega: f64) -> Result<(), ValidationError> {
    if !(0.0..=2.0).contains(&omega) {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: omega.to_string(),
            expected: "[0, 2]".into(),
        });
    }
    Ok(())
}

/// Validate Chebyshev eigenvalue bounds: `0 < eig_min <= eig_max`, finite.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] naming the bad bound.
pub fn validate_eigenvalue_bounds(eig_min: f64, eig_max: f64) -> Result<(), ValidationError> {
    if !eig_min.is_finite() || eig_min <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "eig_min".into(),
            value: eig_min.to_string(),
            expected: "finite value > 0".into(),
        });
    }
    if !eig_max.is_finite() || eig_max < eig_min {
        return Err(ValidationError::ParameterOutOfRange {
            name: "eig_max".into(),
            value: eig_max.to_string(),
            expected: format!("finite value >= eig_min ({eig_min})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identity() {
        assert!(validate_csr_matrix(&CsrMatrix::<f64>::identity(4)).is_ok());
    }

    #[test]
    fn valid_empty_matrix() {
        let m = CsrMatrix::<f64> {
            row_ptr: vec![0],
            col_indices: vec![],
            values: vec![],
            rows: 0,
            cols: 0,
        };
        assert!(validate_csr_matrix(&m).is_ok());
    }

    #[test]
    fn non_monotonic_row_ptr() {
        let m = CsrMatrix::<f64> {
            row_ptr: vec![0, 2, 1],
            col_indices: vec![0, 1],
            values: vec![1.0, 1.0],
            rows: 2,
            cols: 2,
        };
        assert_eq!(
            validate_csr_matrix(&m),
            Err(ValidationError::NonMonotonicRowPtrs { position: 2 })
        );
    }

    #[test]
    fn col_index_out_of_bounds() {
        let m = CsrMatrix::<f64> {
            row_ptr: vec![0, 1],
            col_indices: vec![3],
            values: vec![1.0],
            rows: 1,
            cols: 2,
        };
        assert!(matches!(
            validate_csr_matrix(&m),
            Err(ValidationError::IndexOutOfBounds { index: 3, row: 0, .. })
        ));
    }

    #[test]
    fn nan_value_rejected() {
        let mut m = CsrMatrix::<f64>::identity(2);
        m.values[1] = f64::NAN;
        assert!(matches!(
            validate_csr_matrix(&m),
            Err(ValidationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn unsorted_columns_rejected() {
        let m = CsrMatrix::<f64> {
            row_ptr: vec![0, 2, 2],
            col_indices: vec![1, 0],
            values: vec![1.0, 1.0],
            rows: 2,
            cols: 2,
        };
        assert!(validate_csr_matrix(&m).is_err());
    }

    #[test]
    fn system_shape_checks() {
        let a = CsrMatrix::<f64>::identity(3);
        assert!(validate_system(&a, &[0.0; 3], &[0.0; 3], 3).is_ok());
        assert!(validate_system(&a, &[0.0; 2], &[0.0; 3], 3).is_err());
        assert!(validate_system(&a, &[0.0; 3], &[0.0; 4], 3).is_err());
        assert!(validate_system(&a, &[0.0; 3], &[0.0; 3], 5).is_err());

        let rect = CsrMatrix::<f64>::from_coo(2, 3, vec![(0, 0, 1.0)]);
        assert_eq!(
            validate_system(&rect, &[0.0; 2], &[0.0; 3], 2),
            Err(ValidationError::NotSquare { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn relaxation_range() {
        assert!(validate_relaxation("omega", 0.0).is_ok());
        assert!(validate_relaxation("omega", 2.0).is_ok());
        assert!(validate_relaxation("omega", 2.5).is_err());
        assert!(validate_relaxation("omega", -0.1).is_err());
        assert!(validate_relaxation("omega", f64::NAN).is_err());
    }

    #[test]
    fn eigenvalue_bounds() {
        assert!(validate_eigenvalue_bounds(0.5, 4.0).is_ok());
        assert!(validate_eigenvalue_bounds(1.0, 1.0).is_ok());
        assert!(validate_eigenvalue_bounds(0.0, 4.0).is_err());
        assert!(validate_eigenvalue_bounds(2.0, 1.0).is_err());
    }

    #[test]
    fn snapshot_rejects_malformed_storage() {
        let unsorted = CsrMatrix::<f64> {
            row_ptr: vec![0, 2, 3],
            col_indices: vec![1, 0, 1],
            values: vec![1.0, 4.0, 4.0],
            rows: 2,
            cols: 2,
        };
        assert!(matches!(
            square_csr_snapshot(&unsorted),
            Err(ValidationError::DimensionMismatch(_))
        ));

        let rect = CsrMatrix::<f64>::from_coo(2, 3, vec![(0, 0, 1.0)]);
        assert_eq!(
            square_csr_snapshot(&rect),
            Err(ValidationError::NotSquare { rows: 2, cols: 3 })
        );

        let ok = CsrMatrix::<f64>::identity(3);
        assert_eq!(square_csr_snapshot(&ok), Ok(ok.clone()));
    }
}
