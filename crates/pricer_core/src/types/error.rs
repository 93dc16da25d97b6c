//! Error types for structured error handling.
//!
//! This module provides:
//! - `SolverError`: Errors raised while constructing, configuring or running
//!   a least-squares solver, including failures reported by the objective
//!   function itself.

use thiserror::Error;

/// Least-squares solver errors.
///
/// Provides structured error handling for solver operations with
/// descriptive context for each failure mode.
///
/// Numerical trouble inside an iteration is not an error: a rejected point
/// (NaN values) or a singular normal-equations system is absorbed by the
/// damping strategy, and divergence is reported through the solver status.
/// Only fatal conditions and misuse surface as `SolverError`.
///
/// # Variants
/// - `Objective`: The objective function failed to evaluate (fatal)
/// - `DimensionMismatch`: A vector has the wrong length
/// - `InvalidInput`: Invalid parameters, targets or finite-difference steps
/// - `InvalidConfig`: A configuration knob is out of range
/// - `ConfigurationLocked`: A setter was called after the first `run()`
/// - `SingularMatrix`: The damped normal equations could not be solved
/// - `WorkerPool`: The worker pool for derivative estimation could not be built
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::dimension_mismatch("target values", 3, 2);
/// assert!(format!("{}", err).contains("target values"));
///
/// let err = SolverError::ConfigurationLocked { setting: "max_iterations".to_string() };
/// assert!(err.is_usage_error());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Objective function failed to produce values or derivatives.
    #[error("Objective function failed: {0}")]
    Objective(String),

    /// A vector does not have the length fixed at construction.
    #[error("Dimension mismatch for {quantity}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the offending quantity
        quantity: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value out of its admissible range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Solver configuration mutated after the solver started running.
    #[error("Cannot change {setting} after the solver has been run")]
    ConfigurationLocked {
        /// Name of the setting the caller attempted to change
        setting: String,
    },

    /// The (damped) approximate Hessian is not invertible.
    #[error("Singular matrix: cannot solve normal equations")]
    SingularMatrix,

    /// Worker pool construction failed.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl SolverError {
    /// Create an objective failure error.
    pub fn objective(message: impl Into<String>) -> Self {
        Self::Objective(message.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(quantity: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            quantity: quantity.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a configuration locked error.
    pub fn configuration_locked(setting: impl Into<String>) -> Self {
        Self::ConfigurationLocked {
            setting: setting.into(),
        }
    }

    /// Check if this error was raised by the objective function.
    pub fn is_objective_failure(&self) -> bool {
        matches!(self, Self::Objective(_))
    }

    /// Check if this error reports misuse of the solver API.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationLocked { .. }
                | Self::DimensionMismatch { .. }
                | Self::InvalidInput(_)
                | Self::InvalidConfig(_)
        )
    }
}
