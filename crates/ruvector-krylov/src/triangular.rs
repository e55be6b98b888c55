//! Sparse triangular factors and their substitution kernels.
//!
//! Incomplete factorizations store `L` and `U` in one CSR matrix with the
//! diagonal position of every row recorded. [`UnitLowerTriangular`] and
//! [`UpperTriangular`] are borrowed views over that shared storage.

use crate::types::CsrMatrix;

/// Combined `L\U` factor: strictly lower entries belong to a unit lower
/// triangle, the diagonal and everything right of it to the upper triangle.
#[derive(Debug, Clone)]
pub struct LuFactor {
    lu: CsrMatrix<f64>,
    diag_ind: Vec<usize>,
}

impl LuFactor {
    pub(crate) fn new(lu: CsrMatrix<f64>, diag_ind: Vec<usize>) -> Self {
        debug_assert_eq!(lu.rows, diag_ind.len());
        Self { lu, diag_ind }
    }

    /// Backing storage.
    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.lu
    }

    /// Diagonal position of every row.
    pub fn diagonal_indices(&self) -> &[usize] {
        &self.diag_ind
    }

    /// Unit lower triangle.
    pub fn lower(&self) -> UnitLowerTriangular<'_> {
        UnitLowerTriangular {
            lu: &self.lu,
            diag_ind: &self.diag_ind,
        }
    }

    /// Upper triangle including the diagonal.
    pub fn upper(&self) -> UpperTriangular<'_> {
        UpperTriangular {
            lu: &self.lu,
            diag_ind: &self.diag_ind,
        }
    }

    /// `x = (LU)^{-1} b`.
    pub fn solve(&self, b: &[f64], x: &mut [f64]) {
        x.copy_from_slice(b);
        self.lower().solve_in_place(x);
        self.upper().solve_in_place(x);
    }

    /// `x = (LU)^{-T} b`.
    pub fn trans_solve(&self, b: &[f64], x: &mut [f64]) {
        x.copy_from_slice(b);
        self.upper().trans_solve_in_place(x);
        self.lower().trans_solve_in_place(x);
    }
}

/// Unit lower triangular view.
#[derive(Debug, Clone, Copy)]
pub struct UnitLowerTriangular<'a> {
    lu: &'a CsrMatrix<f64>,
    diag_ind: &'a [usize],
}

impl UnitLowerTriangular<'_> {
    /// Forward substitution, `x <- L^{-1} x`.
    pub fn solve_in_place(&self, x: &mut [f64]) {
        assert_eq!(x.len(), self.lu.rows, "lower solve: length mismatch");
        for i in 0..self.lu.rows {
            let mut sum = x[i];
            for idx in self.lu.row_ptr[i]..self.diag_ind[i] {
                sum -= self.lu.values[idx] * x[self.lu.col_indices[idx]];
            }
            x[i] = sum;
        }
    }

    /// Backward substitution with the transpose, `x <- L^{-T} x`.
    pub fn trans_solve_in_place(&self, x: &mut [f64]) {
        assert_eq!(x.len(), self.lu.rows, "lower trans solve: length mismatch");
        for i in (0..self.lu.rows).rev() {
            let xi = x[i];
            for idx in self.lu.row_ptr[i]..self.diag_ind[i] {
                x[self.lu.col_indices[idx]] -= self.lu.values[idx] * xi;
            }
        }
    }
}

/// Upper triangular view including the diagonal.
#[derive(Debug, Clone, Copy)]
pub struct UpperTriangular<'a> {
    lu: &'a CsrMatrix<f64>,
    diag_ind: &'a [usize],
}

impl UpperTriangular<'_> {
    /// Backward substitution, `x <- U^{-1} x`.
    pub fn solve_in_place(&self, x: &mut [f64]) {
        assert_eq!(x.len(), self.lu.rows, "upper solve: length mismatch");
        for i in (0..self.lu.rows).rev() {
            let diag = self.diag_ind[i];
            let mut sum = x[i];
            for idx in (diag + 1)..self.lu.row_ptr[i + 1] {
                sum -= self.lu.values[idx] * x[self.lu.col_indices[idx]];
            }
            x[i] = sum / self.lu.values[diag];
        }
    }

    /// Forward substitution with the transpose, `x <- U^{-T} x`.
    pub fn trans_solve_in_place(&self, x: &mut [f64]) {
        assert_eq!(x.len(), self.lu.rows, "upper trans solve: length mismatch");
        for i in 0..self.lu.rows {
            let diag = self.diag_ind[i];
            let xi = x[i] / self.lu.values[diag];
            x[i] = xi;
            for idx in (diag + 1)..self.lu.row_ptr[i + 1] {
                x[self.lu.col_indices[idx]] -= self.lu.values[idx] * xi;
            }
        }
    }
}
