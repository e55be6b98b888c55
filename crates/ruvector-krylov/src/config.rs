//! Serializable configuration for monitors, preconditioners and solvers.
//!
//! Every struct implements `Default` with the tuned constants and accepts
//! partial input through `#[serde(default)]`, so a configuration only needs
//! to name what it changes.
//!
//! # Example
//!
//! ```rust
//! use ruvector_krylov::config::{MonitorConfig, PreconditionerKind, SolverConfig};
//! use ruvector_krylov::types::{Algorithm, CsrMatrix};
//!
//! let a = CsrMatrix::<f64>::from_coo(2, 2, vec![
//!     (0, 0, 4.0), (0, 1, 1.0),
//!     (1, 0, 1.0), (1, 1, 3.0),
//! ]);
//! let b = [1.0, 2.0];
//! let mut x = [0.0, 0.0];
//!
//! let config = SolverConfig {
//!     algorithm: Algorithm::Gmres,
//!     preconditioner: PreconditionerKind::Diagonal,
//!     monitor: MonitorConfig {
//!         relative_tolerance: 1e-10,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let mut solver = config.build(&b).unwrap();
//! solver.preconditioner_mut().set_matrix(&a).unwrap();
//! solver.solve(&a, &b, &mut x).unwrap();
//! assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
//! ```

use serde::{Deserialize, Serialize};

use crate::diagonal::{DiagonalPreconditioner, IdentityPreconditioner};
use crate::error::{SolverError, ValidationError};
use crate::icc::IccPreconditioner;
use crate::ilu::IluPreconditioner;
use crate::ilut::IlutPreconditioner;
use crate::monitor::DefaultIterationMonitor;
use crate::ssor::SsorPreconditioner;
use crate::traits::{IterativeSolver, Preconditioner};
use crate::types::Algorithm;
use crate::vector::NormKind;

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Stopping policy of a [`DefaultIterationMonitor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Norm applied to residual vectors.
    ///
    /// Default: [`NormKind::Two`].
    pub norm: NormKind,

    /// Convergence relative to the first observed residual.
    ///
    /// Default: `1e-5`.
    pub relative_tolerance: f64,

    /// Absolute floor of the convergence test.
    ///
    /// Default: `1e-50`.
    pub absolute_tolerance: f64,

    /// Growth factor over the first residual at which the run is declared
    /// divergent.
    ///
    /// Default: `1e5`.
    pub divergence_tolerance: f64,

    /// Iteration cap.
    ///
    /// Default: `100_000`.
    pub max_iterations: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            norm: NormKind::Two,
            relative_tolerance: 1e-5,
            absolute_tolerance: 1e-50,
            divergence_tolerance: 1e5,
            max_iterations: 100_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Preconditioner configs
// ---------------------------------------------------------------------------

/// Relaxation factors of the SSOR preconditioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsorConfig {
    /// Relaxation factor of the forward sweep, in `[0, 2]`.
    pub omega_forward: f64,
    /// Relaxation factor of the backward sweep, in `[0, 2]`.
    pub omega_reverse: f64,
    /// Run the backward sweep. Without it the method is plain SOR.
    pub reverse: bool,
}

impl Default for SsorConfig {
    fn default() -> Self {
        Self {
            omega_forward: 1.0,
            omega_reverse: 1.0,
            reverse: true,
        }
    }
}

/// Dual-threshold parameters of the ILUT preconditioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IlutConfig {
    /// Drop tolerance relative to the two-norm of each row.
    ///
    /// Default: `1e-6`.
    pub tau: f64,
    /// Extra entries allowed per row in each triangle beyond the original
    /// nonzero count.
    ///
    /// Default: `25`.
    pub fill: usize,
}

impl Default for IlutConfig {
    fn default() -> Self {
        Self { tau: 1e-6, fill: 25 }
    }
}

/// Algebraic multigrid parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmgConfig {
    /// Forward relaxation of the pre-smoother.
    pub omega_pre_forward: f64,
    /// Backward relaxation of the pre-smoother.
    pub omega_pre_reverse: f64,
    /// Forward relaxation of the post-smoother.
    pub omega_post_forward: f64,
    /// Backward relaxation of the post-smoother.
    pub omega_post_reverse: f64,
    /// Pre-smoothing sweeps.
    pub nu1: usize,
    /// Post-smoothing sweeps.
    pub nu2: usize,
    /// Recursive calls per level: 1 gives a V-cycle, 2 a W-cycle.
    pub gamma: usize,
    /// Matrices with at most this many rows are solved directly.
    pub min: usize,
    /// Jacobi damping of the interpolation smoother; `0` disables smoothing.
    pub omega: f64,
    /// Strong-coupling threshold on the finest level.
    pub coupling_threshold: f64,
    /// Factor applied to the threshold on each coarser level.
    pub coupling_decay: f64,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            omega_pre_forward: 1.0,
            omega_pre_reverse: 1.85,
            omega_post_forward: 1.85,
            omega_post_reverse: 1.0,
            nu1: 1,
            nu2: 1,
            gamma: 1,
            min: 40,
            omega: 2.0 / 3.0,
            coupling_threshold: 0.08,
            coupling_decay: 0.5,
        }
    }
}

/// Which preconditioner a solver should carry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreconditionerKind {
    /// No preconditioning.
    #[default]
    Identity,
    /// Jacobi.
    Diagonal,
    /// Symmetric successive over-relaxation.
    Ssor(SsorConfig),
    /// Incomplete LU on the pattern of `A`.
    Ilu,
    /// Incomplete Cholesky on the pattern of `A`.
    Icc,
    /// Dual-threshold incomplete LU.
    Ilut(IlutConfig),
    /// Algebraic multigrid.
    Amg(AmgConfig),
}

impl PreconditionerKind {
    /// Construct the (unbound) preconditioner.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for out-of-range parameters or
    /// when AMG support is not compiled in.
    pub fn build(&self) -> Result<Box<dyn Preconditioner>, SolverError> {
        let preconditioner: Box<dyn Preconditioner> = match self {
            PreconditionerKind::Identity => Box::new(IdentityPreconditioner),
            PreconditionerKind::Diagonal => Box::new(DiagonalPreconditioner::new()),
            PreconditionerKind::Ssor(config) => Box::new(SsorPreconditioner::new(config.clone())?),
            PreconditionerKind::Ilu => Box::new(IluPreconditioner::new()),
            PreconditionerKind::Icc => Box::new(IccPreconditioner::new()),
            PreconditionerKind::Ilut(config) => Box::new(IlutPreconditioner::new(config.clone())),
            PreconditionerKind::Amg(config) => {
                #[cfg(feature = "amg")]
                {
                    Box::new(crate::amg::AmgPreconditioner::new(config.clone())?)
                }
                #[cfg(not(feature = "amg"))]
                {
                    let _ = config;
                    return Err(not_compiled("preconditioner", "amg"));
                }
            }
        };
        Ok(preconditioner)
    }
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Complete description of a solver: algorithm, its parameters, monitor and
/// preconditioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Krylov method.
    ///
    /// Default: [`Algorithm::Cg`].
    pub algorithm: Algorithm,

    /// Krylov basis size before GMRES restarts.
    ///
    /// Default: `30`.
    pub restart: usize,

    /// Lower spectral bound for Chebyshev iteration.
    pub eig_min: Option<f64>,

    /// Upper spectral bound for Chebyshev iteration.
    pub eig_max: Option<f64>,

    /// Stopping policy.
    pub monitor: MonitorConfig,

    /// Preconditioner to install.
    pub preconditioner: PreconditionerKind,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Cg,
            restart: 30,
            eig_min: None,
            eig_max: None,
            monitor: MonitorConfig::default(),
            preconditioner: PreconditionerKind::Identity,
        }
    }
}

impl SolverConfig {
    /// Build a solver sized like `template`, with its monitor and
    /// preconditioner installed. The preconditioner still has to be bound to
    /// a matrix with `set_matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for invalid parameters or an
    /// algorithm that is not compiled in.
    pub fn build(&self, template: &[f64]) -> Result<Box<dyn IterativeSolver>, SolverError> {
        let mut solver = self.dispatch(template)?;
        solver.set_preconditioner(self.preconditioner.build()?);
        solver.set_monitor(Box::new(DefaultIterationMonitor::from_config(&self.monitor)));
        Ok(solver)
    }

    fn dispatch(&self, template: &[f64]) -> Result<Box<dyn IterativeSolver>, SolverError> {
        match self.algorithm {
            // ----- Conjugate Gradient --------------------------------------
            Algorithm::Cg => {
                #[cfg(feature = "cg")]
                {
                    Ok(Box::new(crate::cg::ConjugateGradientSolver::new(template)))
                }
                #[cfg(not(feature = "cg"))]
                {
                    Err(not_compiled("algorithm", "cg"))
                }
            }

            // ----- BiCG ----------------------------------------------------
            Algorithm::BiCg => {
                #[cfg(feature = "bicg")]
                {
                    Ok(Box::new(crate::bicg::BiCgSolver::new(template)))
                }
                #[cfg(not(feature = "bicg"))]
                {
                    Err(not_compiled("algorithm", "bicg"))
                }
            }

            // ----- BiCGstab ------------------------------------------------
            Algorithm::BiCgStab => {
                #[cfg(feature = "bicgstab")]
                {
                    Ok(Box::new(crate::bicgstab::BiCgStabSolver::new(template)))
                }
                #[cfg(not(feature = "bicgstab"))]
                {
                    Err(not_compiled("algorithm", "bicgstab"))
                }
            }

            // ----- CGS -----------------------------------------------------
            Algorithm::Cgs => {
                #[cfg(feature = "cgs")]
                {
                    Ok(Box::new(crate::cgs::CgsSolver::new(template)))
                }
                #[cfg(not(feature = "cgs"))]
                {
                    Err(not_compiled("algorithm", "cgs"))
                }
            }

            // ----- GMRES ---------------------------------------------------
            Algorithm::Gmres => {
                #[cfg(feature = "gmres")]
                {
                    if self.restart == 0 {
                        return Err(ValidationError::ParameterOutOfRange {
                            name: "restart".into(),
                            value: "0".into(),
                            expected: ">= 1".into(),
                        }
                        .into());
                    }
                    Ok(Box::new(crate::gmres::GmresSolver::with_restart(
                        template,
                        self.restart,
                    )))
                }
                #[cfg(not(feature = "gmres"))]
                {
                    Err(not_compiled("algorithm", "gmres"))
                }
            }

            // ----- Chebyshev -----------------------------------------------
            Algorithm::Chebyshev => {
                #[cfg(feature = "chebyshev")]
                {
                    let solver = crate::chebyshev::ChebyshevSolver::new(
                        template,
                        self.eig_min.unwrap_or(0.0),
                        self.eig_max.unwrap_or(0.0),
                    )?;
                    Ok(Box::new(solver))
                }
                #[cfg(not(feature = "chebyshev"))]
                {
                    Err(not_compiled("algorithm", "chebyshev"))
                }
            }

            // ----- QMR -----------------------------------------------------
            Algorithm::Qmr => {
                #[cfg(feature = "qmr")]
                {
                    Ok(Box::new(crate::qmr::QmrSolver::new(template)))
                }
                #[cfg(not(feature = "qmr"))]
                {
                    Err(not_compiled("algorithm", "qmr"))
                }
            }

            // ----- Iterative refinement ------------------------------------
            Algorithm::Ir => {
                #[cfg(feature = "ir")]
                {
                    Ok(Box::new(crate::ir::IrSolver::new(template)))
                }
                #[cfg(not(feature = "ir"))]
                {
                    Err(not_compiled("algorithm", "ir"))
                }
            }
        }
    }
}

#[allow(dead_code)]
fn not_compiled(name: &str, feature: &str) -> SolverError {
    ValidationError::ParameterOutOfRange {
        name: name.into(),
        value: feature.into(),
        expected: format!("the `{feature}` feature to be enabled"),
    }
    .into()
}
