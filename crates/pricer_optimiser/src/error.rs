//! Optimiser-level error type.

use pricer_core::types::SolverError;
use thiserror::Error;

/// Errors surfaced by `pricer_optimiser`.
///
/// Wraps solver errors from the numerical core and adds failures that only
/// occur at the crate boundary, such as loading solver settings.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::OptimiserError;
/// use pricer_core::types::SolverError;
///
/// let err: OptimiserError = SolverError::SingularMatrix.into();
/// assert!(format!("{}", err).contains("Singular"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimiserError {
    /// Error from the least-squares solver.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Solver settings could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OptimiserError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a configuration loading error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
