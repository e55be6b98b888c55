//! Preconditioned Krylov solvers and algebraic multigrid for sparse linear
//! systems.
//!
//! This crate solves `Ax = b` iteratively, where `A` is any
//! [`LinearOperator`](traits::LinearOperator) (typically a CSR matrix).
//! Every solver is driven by an [`IterationMonitor`](traits::IterationMonitor)
//! that decides convergence, divergence and the iteration limit, and is
//! accelerated by a pluggable [`Preconditioner`](traits::Preconditioner).
//!
//! # Available Solvers
//!
//! | Solver | Feature gate | Matrix class |
//! |--------|-------------|--------------|
//! | [`ConjugateGradientSolver`](cg::ConjugateGradientSolver) | `cg` | SPD |
//! | [`BiCgSolver`](bicg::BiCgSolver) | `bicg` | general |
//! | [`BiCgStabSolver`](bicgstab::BiCgStabSolver) | `bicgstab` | general |
//! | [`CgsSolver`](cgs::CgsSolver) | `cgs` | general |
//! | [`GmresSolver`](gmres::GmresSolver) | `gmres` | general |
//! | [`ChebyshevSolver`](chebyshev::ChebyshevSolver) | `chebyshev` | SPD, known spectrum |
//! | [`QmrSolver`](qmr::QmrSolver) | `qmr` | general |
//! | [`IrSolver`](ir::IrSolver) | `ir` | any, with a good preconditioner |
//!
//! # Preconditioners
//!
//! Identity, Jacobi ([`diagonal`]), SSOR ([`ssor`]), ILU(0) ([`ilu`]),
//! ICC(0) ([`icc`]), ILUT ([`ilut`]) and smoothed-aggregation AMG
//! (`amg`, behind the `amg` feature).
//!
//! # Example
//!
//! ```rust
//! use ruvector_krylov::cg::ConjugateGradientSolver;
//! use ruvector_krylov::ssor::SsorPreconditioner;
//! use ruvector_krylov::traits::{IterativeSolver, Preconditioner};
//! use ruvector_krylov::types::CsrMatrix;
//!
//! // 1-D Poisson problem
//! let n = 50;
//! let mut entries = Vec::new();
//! for i in 0..n {
//!     entries.push((i, i, 2.0));
//!     if i > 0 { entries.push((i, i - 1, -1.0)); }
//!     if i + 1 < n { entries.push((i, i + 1, -1.0)); }
//! }
//! let a = CsrMatrix::<f64>::from_coo(n, n, entries);
//! let b = vec![1.0; n];
//! let mut x = vec![0.0; n];
//!
//! let mut ssor = SsorPreconditioner::with_omega(1.2).unwrap();
//! ssor.set_matrix(&a).unwrap();
//!
//! let mut solver = ConjugateGradientSolver::new(&b);
//! solver.set_preconditioner(Box::new(ssor));
//! let summary = solver.solve(&a, &b, &mut x).unwrap();
//! assert!(summary.iterations < n);
//! ```

pub mod config;
pub mod csc;
pub mod dense;
pub mod diagonal;
pub mod error;
pub mod events;
pub mod givens;
pub mod icc;
pub mod ilu;
pub mod ilut;
pub mod monitor;
pub mod reporter;
pub mod ssor;
pub mod traits;
pub mod triangular;
pub mod types;
pub mod validation;
pub mod vector;

mod solver;

#[cfg(feature = "cg")]
pub mod cg;

#[cfg(feature = "bicg")]
pub mod bicg;

#[cfg(feature = "bicgstab")]
pub mod bicgstab;

#[cfg(feature = "cgs")]
pub mod cgs;

#[cfg(feature = "gmres")]
pub mod gmres;

#[cfg(feature = "chebyshev")]
pub mod chebyshev;

#[cfg(feature = "qmr")]
pub mod qmr;

#[cfg(feature = "ir")]
pub mod ir;

#[cfg(feature = "amg")]
pub mod amg;
