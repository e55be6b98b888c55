//! Compressed sparse column storage.
//!
//! Multigrid interpolation operators are built column by column (one column
//! per aggregate), which makes CSC their natural home.

use crate::traits::{LinearOperator, Matrix};
use crate::types::CsrMatrix;

/// Compressed Sparse Column matrix.
///
/// Column `j` spans `col_ptr[j]..col_ptr[j+1]` in `row_indices`/`values`,
/// sorted by row.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    /// Column pointers, length `cols + 1`.
    pub col_ptr: Vec<usize>,
    /// Row index of each stored entry.
    pub row_indices: Vec<usize>,
    /// Value of each stored entry.
    pub values: Vec<f64>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl CscMatrix {
    /// Convert from CSR.
    pub fn from_csr(a: &CsrMatrix<f64>) -> Self {
        // The CSR arrays of A^T are exactly the CSC arrays of A.
        let t = a.transpose();
        Self {
            col_ptr: t.row_ptr,
            row_indices: t.col_indices,
            values: t.values,
            rows: a.rows,
            cols: a.cols,
        }
    }

    /// Build from COO triplets; duplicates are summed.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let transposed = CsrMatrix::<f64>::from_coo(
            cols,
            rows,
            entries.into_iter().map(|(r, c, v)| (c, r, v)),
        );
        Self {
            col_ptr: transposed.row_ptr,
            row_indices: transposed.col_indices,
            values: transposed.values,
            rows,
            cols,
        }
    }

    /// Convert to CSR.
    pub fn to_csr_matrix(&self) -> CsrMatrix<f64> {
        CsrMatrix {
            row_ptr: self.col_ptr.clone(),
            col_indices: self.row_indices.clone(),
            values: self.values.clone(),
            rows: self.cols,
            cols: self.rows,
        }
        .transpose()
    }

    /// The transpose, viewed as CSR. No data is reordered.
    pub fn transpose_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix {
            row_ptr: self.col_ptr.clone(),
            col_indices: self.row_indices.clone(),
            values: self.values.clone(),
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Iterate over `(row_index, &value)` pairs of column `col`.
    #[inline]
    pub fn column_entries(&self, col: usize) -> impl Iterator<Item = (usize, &f64)> {
        let start = self.col_ptr[col];
        let end = self.col_ptr[col + 1];
        self.row_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter())
    }
}

impl LinearOperator for CscMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "mult_add: x length must equal cols");
        assert_eq!(y.len(), self.rows, "mult_add: y length must equal rows");
        for j in 0..self.cols {
            let xj = alpha * x[j];
            if xj == 0.0 {
                continue;
            }
            for idx in self.col_ptr[j]..self.col_ptr[j + 1] {
                y[self.row_indices[idx]] += self.values[idx] * xj;
            }
        }
    }

    fn trans_mult_add(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.rows, "trans_mult_add: x length must equal rows");
        assert_eq!(y.len(), self.cols, "trans_mult_add: y length must equal cols");
        for j in 0..self.cols {
            let mut sum = 0.0f64;
            for idx in self.col_ptr[j]..self.col_ptr[j + 1] {
                sum += self.values[idx] * x[self.row_indices[idx]];
            }
            y[j] += alpha * sum;
        }
    }
}

impl Matrix for CscMatrix {
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.col_ptr[col];
        let end = self.col_ptr[col + 1];
        match self.row_indices[start..end].binary_search(&row) {
            Ok(offset) => self.values[start + offset],
            Err(_) => 0.0,
        }
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn to_csr(&self) -> CsrMatrix<f64> {
        self.to_csr_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_csr() -> CsrMatrix<f64> {
        CsrMatrix::<f64>::from_coo(
            3,
            2,
            vec![(0, 0, 1.0), (1, 0, 0.5), (1, 1, 0.5), (2, 1, 1.0)],
        )
    }

    #[test]
    fn csr_round_trip() {
        let csr = sample_csr();
        let csc = CscMatrix::from_csr(&csr);
        assert_eq!(csc.col_ptr, vec![0, 2, 4]);
        assert_eq!(csc.to_csr(), csr);
        assert_eq!(csc.get(1, 1), 0.5);
        assert_eq!(csc.get(2, 0), 0.0);
    }

    #[test]
    fn products_match_csr() {
        let csr = sample_csr();
        let csc = CscMatrix::from_csr(&csr);

        let x = [2.0, -1.0];
        let (mut y1, mut y2) = (vec![0.0; 3], vec![0.0; 3]);
        csr.mult(&x, &mut y1);
        csc.mult(&x, &mut y2);
        assert_eq!(y1, y2);

        let z = [1.0, 2.0, 3.0];
        let (mut w1, mut w2) = (vec![0.0; 2], vec![0.0; 2]);
        csr.trans_mult(&z, &mut w1);
        csc.trans_mult(&z, &mut w2);
        assert_eq!(w1, w2);
    }

    #[test]
    fn from_coo_matches_from_csr() {
        let coo = CscMatrix::from_coo(
            3,
            2,
            vec![(2, 1, 1.0), (0, 0, 1.0), (1, 1, 0.5), (1, 0, 0.5)],
        );
        assert_eq!(coo, CscMatrix::from_csr(&sample_csr()));
    }
}
