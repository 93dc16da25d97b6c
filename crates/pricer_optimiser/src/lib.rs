//! # pricer_optimiser
//!
//! Regularised nonlinear least-squares solvers for Neutryx calibration.
//!
//! Every calibration routine (curve bootstrapping, volatility-surface
//! fitting, cube calibration) reduces to the same inverse problem: find
//! model parameters whose outputs match a set of market quotes. This crate
//! provides the damped Gauss-Newton engine that solves it.
//!
//! ## Architecture Position
//!
//! Layer 2.5 in the **P**ricer layer of the A-I-P-S architecture.
//! Depends on `pricer_core` (L1) for the objective contract and error types.
//!
//! ## Modules
//!
//! - `solvers`: Levenberg-Marquardt core, derivative estimation, worker pools,
//!   optimiser factory and configuration
//! - `calibration`: Box bounds as a change of variables
//!
//! ## Example
//!
//! ```rust
//! use pricer_optimiser::prelude::*;
//!
//! let mut solver = LevenbergMarquardt::builder(|p: &[f64]| vec![p[1], 2.0 * p[0] + p[1]])
//!     .initial_parameters(vec![0.0, 0.0])
//!     .target_values(vec![5.0, 10.0])
//!     .config(LevenbergMarquardtConfig::default())
//!     .build()?;
//!
//! let fit = solver.run()?;
//! assert!(fit.root_mean_squared_error < 1e-10);
//! # Ok::<(), pricer_core::types::SolverError>(())
//! ```

pub mod calibration;
pub mod solvers;

mod error;

pub use error::OptimiserError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::calibration::*;
    pub use crate::solvers::*;
    pub use crate::OptimiserError;
}
