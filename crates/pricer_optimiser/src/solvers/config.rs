//! Levenberg-Marquardt solver settings.
//!
//! Settings can be built in code, read from a TOML file, or overridden from
//! `PRICER_LM_*` environment variables.
//!
//! # Priority
//!
//! [`LevenbergMarquardtConfig::load`] layers the sources, highest last:
//! 1. Default values
//! 2. Config file (if given)
//! 3. Environment variables
//!
//! # Example
//!
//! ```
//! use pricer_optimiser::solvers::{LevenbergMarquardtConfig, RegularisationMethod};
//!
//! let config: LevenbergMarquardtConfig = toml::from_str(
//!     r#"
//!     regularisation = "levenberg"
//!     max_iterations = 250
//!     "#,
//! ).unwrap();
//!
//! assert_eq!(config.regularisation, RegularisationMethod::Levenberg);
//! assert_eq!(config.max_iterations, 250);
//! assert_eq!(config.initial_lambda, 0.001);
//! ```

use std::path::Path;

use pricer_core::types::SolverError;
use serde::{Deserialize, Serialize};

use super::regularisation::RegularisationMethod;
use crate::OptimiserError;

const ENV_PREFIX: &str = "PRICER_LM_";

/// Tunable settings for [`LevenbergMarquardt`](super::LevenbergMarquardt).
///
/// # Fields
///
/// * `regularisation` - Damping policy for the approximate Hessian
/// * `max_iterations` - Upper bound on outer (accept/reject) iterations
/// * `error_tolerance` - Stop once the RMS error changes by no more than this
/// * `initial_lambda` - Starting damping factor
/// * `lambda_divisor` - λ is divided by this after an accepted step
/// * `lambda_multiplicator` - λ is multiplied by this after a rejected step
/// * `number_of_threads` - Workers for finite-difference Jacobians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevenbergMarquardtConfig {
    /// Damping policy.
    pub regularisation: RegularisationMethod,
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
    /// Tolerance on the change of the root-mean-squared error.
    ///
    /// Zero solves to the numerical limit; a negative value disables the
    /// criterion entirely.
    pub error_tolerance: f64,
    /// Initial damping factor (finite, > 0).
    pub initial_lambda: f64,
    /// Damping divisor on success (> 1).
    pub lambda_divisor: f64,
    /// Damping multiplicator on failure (> 1).
    pub lambda_multiplicator: f64,
    /// Number of worker threads for finite differences (>= 1).
    pub number_of_threads: usize,
}

impl Default for LevenbergMarquardtConfig {
    fn default() -> Self {
        Self {
            regularisation: RegularisationMethod::LevenbergMarquardt,
            max_iterations: 100,
            error_tolerance: 0.0,
            initial_lambda: 0.001,
            lambda_divisor: 3.0,
            lambda_multiplicator: 2.0,
            number_of_threads: 1,
        }
    }
}

impl LevenbergMarquardtConfig {
    /// Create a configuration with the given tolerance and iteration bound.
    pub fn new(error_tolerance: f64, max_iterations: usize) -> Self {
        Self {
            error_tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Relaxed tolerance and fewer iterations for interactive use.
    pub fn fast() -> Self {
        Self {
            error_tolerance: 1e-8,
            max_iterations: 50,
            ..Default::default()
        }
    }

    /// Solve to the numerical limit with a generous iteration budget.
    pub fn high_precision() -> Self {
        Self {
            error_tolerance: 0.0,
            max_iterations: 500,
            ..Default::default()
        }
    }

    /// Set the regularisation method.
    pub fn with_regularisation(mut self, regularisation: RegularisationMethod) -> Self {
        self.regularisation = regularisation;
        self
    }

    /// Set the maximum iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the error tolerance.
    pub fn with_error_tolerance(mut self, error_tolerance: f64) -> Self {
        self.error_tolerance = error_tolerance;
        self
    }

    /// Set the initial damping factor.
    pub fn with_initial_lambda(mut self, initial_lambda: f64) -> Self {
        self.initial_lambda = initial_lambda;
        self
    }

    /// Set the damping divisor applied after an accepted step.
    pub fn with_lambda_divisor(mut self, lambda_divisor: f64) -> Self {
        self.lambda_divisor = lambda_divisor;
        self
    }

    /// Set the damping multiplicator applied after a rejected step.
    pub fn with_lambda_multiplicator(mut self, lambda_multiplicator: f64) -> Self {
        self.lambda_multiplicator = lambda_multiplicator;
        self
    }

    /// Set the number of finite-difference worker threads.
    pub fn with_number_of_threads(mut self, number_of_threads: usize) -> Self {
        self.number_of_threads = number_of_threads;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !(self.initial_lambda.is_finite() && self.initial_lambda > 0.0) {
            return Err(SolverError::invalid_config(format!(
                "initial_lambda must be finite and > 0, got {}",
                self.initial_lambda
            )));
        }
        if !(self.lambda_divisor.is_finite() && self.lambda_divisor > 1.0) {
            return Err(SolverError::invalid_config(format!(
                "lambda_divisor must be finite and > 1, got {}",
                self.lambda_divisor
            )));
        }
        if !(self.lambda_multiplicator.is_finite() && self.lambda_multiplicator > 1.0) {
            return Err(SolverError::invalid_config(format!(
                "lambda_multiplicator must be finite and > 1, got {}",
                self.lambda_multiplicator
            )));
        }
        if self.error_tolerance.is_nan() {
            return Err(SolverError::invalid_config("error_tolerance must not be NaN"));
        }
        if self.number_of_threads == 0 {
            return Err(SolverError::invalid_config("number_of_threads must be >= 1"));
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OptimiserError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OptimiserError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, OptimiserError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| OptimiserError::config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `PRICER_LM_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, OptimiserError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Build configuration from all sources.
    ///
    /// Starts from the file at `path` (or the defaults) and applies
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, OptimiserError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (`PRICER_LM_MAX_ITERATIONS`, ...).
    ///
    /// Keys absent from the lookup leave the current value untouched.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, OptimiserError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("REGULARISATION") {
            self.regularisation = value.parse()?;
        }
        if let Some(value) = var("MAX_ITERATIONS") {
            self.max_iterations = parse_value("MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = var("ERROR_TOLERANCE") {
            self.error_tolerance = parse_value("ERROR_TOLERANCE", &value)?;
        }
        if let Some(value) = var("INITIAL_LAMBDA") {
            self.initial_lambda = parse_value("INITIAL_LAMBDA", &value)?;
        }
        if let Some(value) = var("LAMBDA_DIVISOR") {
            self.lambda_divisor = parse_value("LAMBDA_DIVISOR", &value)?;
        }
        if let Some(value) = var("LAMBDA_MULTIPLICATOR") {
            self.lambda_multiplicator = parse_value("LAMBDA_MULTIPLICATOR", &value)?;
        }
        if let Some(value) = var("NUMBER_OF_THREADS") {
            self.number_of_threads = parse_value("NUMBER_OF_THREADS", &value)?;
        }

        self.validate()?;
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, OptimiserError> {
    value.trim().parse().map_err(|_| {
        OptimiserError::config(format!(
            "Invalid value for {}{}: '{}'",
            ENV_PREFIX, name, value
        ))
    })
}
