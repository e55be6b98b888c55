//! Small dense matrices and their LU factorization.
//!
//! Only used where a problem is small enough to densify: the coarsest level
//! of the multigrid hierarchy and test references.

use crate::error::FactorizationError;
use crate::traits::{LinearOperator, Matrix};
use crate::types::CsrMatrix;

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// All-zero `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Densify a CSR matrix.
    pub fn from_csr(a: &CsrMatrix<f64>) -> Self {
        let mut dense = Self::zeros(a.rows, a.cols);
        for i in 0..a.rows {
            for (j, &v) in a.row_entries(i) {
                dense.add(i, j, v);
            }
        }
        dense
    }

    /// Build from row slices. All rows must have the same length.
    ///
    /// # Panics
    ///
    /// Panics on ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n * m);
        for row in rows {
            assert_eq!(row.len(), m, "from_rows: ragged input");
            data.extend_from_slice(row);
        }
        Self {
            rows: n,
            cols: m,
            data,
        }
    }

    /// Entry `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Overwrite entry `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Add `value` to entry `(row, col)`.
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] += value;
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl LinearOperator for DenseMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "mult_add: x length must equal cols");
        assert_eq!(y.len(), self.rows, "mult_add: y length must equal rows");
        for (i, yi) in y.iter_mut().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            *yi += alpha * crate::vector::dot(row, x);
        }
    }

    fn trans_mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.rows, "trans_mult_add: x length must equal rows");
        assert_eq!(y.len(), self.cols, "trans_mult_add: y length must equal cols");
        for (i, &xi) in x.iter().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            crate::vector::axpy(alpha * xi, row, y);
        }
    }
}

impl Matrix for DenseMatrix {
    fn get(&self, row: usize, col: usize) -> f64 {
        DenseMatrix::get(self, row, col)
    }

    fn nnz(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }
}

/// LU factorization with partial pivoting, `P A = L U`.
///
/// `L` is unit lower triangular and shares storage with `U`.
#[derive(Debug, Clone)]
pub struct DenseLu {
    n: usize,
    lu: Vec<f64>,
    /// `perm[i]` is the row of `A` that ended up in position `i`.
    perm: Vec<usize>,
}

impl DenseLu {
    /// Factor a square matrix.
    ///
    /// # Errors
    ///
    /// [`FactorizationError::Singular`] when no nonzero pivot exists in some
    /// column.
    ///
    /// # Panics
    ///
    /// Panics if `a` is not square.
    pub fn factor(a: &DenseMatrix) -> Result<Self, FactorizationError> {
        assert_eq!(a.rows, a.cols, "DenseLu::factor: matrix must be square");
        let n = a.rows;
        let mut lu = a.data.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for col in 0..n {
            let mut max_val = lu[col * n + col].abs();
            let mut max_row = col;
            for row in (col + 1)..n {
                let v = lu[row * n + col].abs();
                if v > max_val {
                    max_val = v;
                    max_row = row;
                }
            }

            if max_val == 0.0 {
                return Err(FactorizationError::Singular { pivot: col });
            }

            if max_row != col {
                for k in 0..n {
                    lu.swap(col * n + k, max_row * n + k);
                }
                perm.swap(col, max_row);
            }

            let pivot = lu[col * n + col];
            for row in (col + 1)..n {
                let factor = lu[row * n + col] / pivot;
                lu[row * n + col] = factor;
                if factor == 0.0 {
                    continue;
                }
                for k in (col + 1)..n {
                    lu[row * n + k] -= factor * lu[col * n + k];
                }
            }
        }

        Ok(Self { n, lu, perm })
    }

    /// Dimension of the factored matrix.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Overwrite `b` with the solution of `A x = b`.
    ///
    /// # Panics
    ///
    /// Panics if `b.len()` differs from the factored dimension.
    pub fn solve(&self, b: &mut [f64]) {
        let n = self.n;
        assert_eq!(b.len(), n, "DenseLu::solve: length mismatch");

        let mut y: Vec<f64> = self.perm.iter().map(|&p| b[p]).collect();

        for i in 0..n {
            let mut sum = y[i];
            for j in 0..i {
                sum -= self.lu[i * n + j] * y[j];
            }
            y[i] = sum;
        }
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= self.lu[i * n + j] * y[j];
            }
            y[i] = sum / self.lu[i * n + i];
        }

        b.copy_from_slice(&y);
    }

    /// Overwrite `b` with the solution of `A^T x = b`.
    ///
    /// # Panics
    ///
    /// Panics if `b.len()` differs from the factored dimension.
    pub fn trans_solve(&self, b: &mut [f64]) {
        let n = self.n;
        assert_eq!(b.len(), n, "DenseLu::trans_solve: length mismatch");

        // U^T z = b
        let mut z = b.to_vec();
        for i in 0..n {
            let mut sum = z[i];
            for j in 0..i {
                sum -= self.lu[j * n + i] * z[j];
            }
            z[i] = sum / self.lu[i * n + i];
        }
        // L^T w = z
        for i in (0..n).rev() {
            let mut sum = z[i];
            for j in (i + 1)..n {
                sum -= self.lu[j * n + i] * z[j];
            }
            z[i] = sum;
        }
        // x = P^T w
        for (i, &p) in self.perm.iter().enumerate() {
            b[p] = z[i];
        }
    }
}
