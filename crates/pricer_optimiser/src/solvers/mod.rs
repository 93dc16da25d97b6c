//! Least-squares solvers for calibration.
//!
//! - [`LevenbergMarquardt`]: Damped Gauss-Newton with dynamic regularisation
//! - [`DerivativeEstimator`]: Analytic or parallel finite-difference Jacobians
//! - [`WorkerPool`]: Where finite-difference evaluations run
//! - [`OptimizerFactory`]: Backend-agnostic construction from an [`OptimizerRequest`]
//! - [`LevenbergMarquardtConfig`]: Settings with TOML and environment loading

pub mod config;
pub mod derivative;
pub mod factory;
pub mod levenberg_marquardt;
mod linalg;
pub mod regularisation;
pub mod worker_pool;

pub use config::LevenbergMarquardtConfig;
pub use derivative::{default_step, DerivativeEstimator};
pub use factory::{LevenbergMarquardtFactory, Optimizer, OptimizerFactory, OptimizerRequest};
pub use levenberg_marquardt::{
    BestFit, IterationReport, LevenbergMarquardt, LevenbergMarquardtBuilder, SolverStatus,
};
pub use regularisation::RegularisationMethod;
pub use worker_pool::WorkerPool;
