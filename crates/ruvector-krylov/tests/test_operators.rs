//! Integration tests for the operator abstraction.
//!
//! The same system stored as CSR, CSC and dense must give the same products
//! and the same solver results.

mod helpers;

use approx::assert_relative_eq;
use ruvector_krylov::csc::CscMatrix;
use ruvector_krylov::dense::DenseMatrix;
use ruvector_krylov::gmres::GmresSolver;
use ruvector_krylov::ilu::IluPreconditioner;
use ruvector_krylov::monitor::DefaultIterationMonitor;
use ruvector_krylov::traits::{IterativeSolver, LinearOperator, Matrix, Preconditioner};
use ruvector_krylov::validation::validate_csr_matrix;

use helpers::{random_diag_dominant_csr, random_vector, relative_error, rhs_for};

#[test]
fn test_storage_formats_agree_on_products() {
    let n = 25;
    let csr = random_diag_dominant_csr(n, 0.2, 61);
    let csc = CscMatrix::from_csr(&csr);
    let dense = DenseMatrix::from_csr(&csr);
    let x = random_vector(n, 62);

    let operators: [&dyn LinearOperator; 3] = [&csr, &csc, &dense];
    let mut reference_y = vec![0.0; n];
    let mut reference_yt = vec![0.0; n];
    csr.mult(&x, &mut reference_y);
    csr.trans_mult(&x, &mut reference_yt);

    for op in operators {
        let mut y = vec![1.0; n];
        op.mult(&x, &mut y);
        let mut yt = vec![1.0; n];
        op.trans_mult(&x, &mut yt);
        for i in 0..n {
            assert_relative_eq!(y[i], reference_y[i], epsilon = 1e-12);
            assert_relative_eq!(yt[i], reference_yt[i], epsilon = 1e-12);
        }
    }

    assert_eq!(csc.nnz(), csr.nnz());
    assert_eq!(csc.to_csr(), csr);
    assert!(validate_csr_matrix(&csr).is_ok());
    assert!(validate_csr_matrix(&csc.to_csr()).is_ok());
}

#[test]
fn test_gmres_solves_every_storage_format() {
    let n = 30;
    let csr = random_diag_dominant_csr(n, 0.15, 71);
    let csc = CscMatrix::from_csr(&csr);
    let dense = DenseMatrix::from_csr(&csr);
    let x_true = random_vector(n, 72);
    let rhs = rhs_for(&csr, &x_true);

    assert_gmres_solves("csr", &csr, &rhs, &x_true);
    assert_gmres_solves("csc", &csc, &rhs, &x_true);
    assert_gmres_solves("dense", &dense, &rhs, &x_true);
}

fn assert_gmres_solves<M: Matrix>(name: &str, matrix: &M, rhs: &[f64], x_true: &[f64]) {
    let mut ilu = IluPreconditioner::new();
    ilu.set_matrix(matrix).unwrap();

    let mut solver = GmresSolver::new(rhs);
    solver.set_preconditioner(Box::new(ilu));
    solver.set_monitor(Box::new(DefaultIterationMonitor::new(500, 1e-11, 1e-50, 1e5)));

    let mut x = vec![0.0; rhs.len()];
    solver.solve(matrix, rhs, &mut x).unwrap();
    let err = relative_error(&x, x_true);
    assert!(err < 1e-8, "{name}: relative error {err}");
}
