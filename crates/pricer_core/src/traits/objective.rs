//! Objective-function contract for least-squares calibration.
//!
//! A calibration routine expresses its model as a pure mapping from a
//! parameter vector of fixed length `N` to a value vector of fixed length `M`.
//! The solver compares these values against market targets; it never looks
//! inside the mapping.
//!
//! # Contract
//!
//! - [`ObjectiveFunction::evaluate`] must be deterministic for a given
//!   parameter vector.
//! - A `NaN` in the returned values rejects the point: the solver treats it
//!   as worse than any finite candidate. Use this to fence off inadmissible
//!   regions of parameter space.
//! - An `Err` is fatal and is propagated to the caller of `run()` without
//!   retry. Reserve it for broken market data or model configuration.
//! - Implementations must be `Send + Sync`: finite-difference columns are
//!   evaluated concurrently when the solver is given more than one worker.
//!
//! # Example
//!
//! ```
//! use pricer_core::traits::objective::{ObjectiveFunction, WithJacobian};
//!
//! // Plain closures are objective functions.
//! let linear = |p: &[f64]| vec![p[1], 2.0 * p[0] + p[1]];
//! assert_eq!(linear.evaluate(&[1.0, 2.0]).unwrap(), vec![2.0, 4.0]);
//! assert!(linear.derivatives(&[1.0, 2.0]).is_none());
//!
//! // Attach an analytic Jacobian, indexed [parameter][value].
//! let analytic = WithJacobian::new(
//!     |p: &[f64]| vec![p[1], 2.0 * p[0] + p[1]],
//!     |_p: &[f64]| vec![vec![0.0, 2.0], vec![1.0, 1.0]],
//! );
//! let jacobian = analytic.derivatives(&[1.0, 2.0]).unwrap().unwrap();
//! assert_eq!(jacobian[0], vec![0.0, 2.0]);
//! ```

use crate::types::SolverError;

/// Dense Jacobian indexed `[parameter][value]`.
pub type Jacobian = Vec<Vec<f64>>;

/// A model mapping parameters to values, fitted by least squares.
pub trait ObjectiveFunction: Send + Sync {
    /// Evaluate the model at `parameters`.
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError>;

    /// Analytic Jacobian at `parameters`, indexed `[parameter][value]`.
    ///
    /// Returns `None` when no analytic derivative is available, in which
    /// case the solver falls back to finite differences.
    fn derivatives(&self, _parameters: &[f64]) -> Option<Result<Jacobian, SolverError>> {
        None
    }
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError> {
        Ok(self(parameters))
    }
}

/// Adapter for closures that can fail.
///
/// ```
/// use pricer_core::traits::objective::{ObjectiveFunction, TryObjective};
/// use pricer_core::types::SolverError;
///
/// let quotes = TryObjective(|p: &[f64]| {
///     if p[0] < 0.0 {
///         Err(SolverError::objective("negative volatility"))
///     } else {
///         Ok(vec![p[0] * p[0]])
///     }
/// });
/// assert!(quotes.evaluate(&[-1.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TryObjective<F>(pub F);

impl<F> ObjectiveFunction for TryObjective<F>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, SolverError> + Send + Sync,
{
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError> {
        (self.0)(parameters)
    }
}

/// Pairs a value closure with an analytic Jacobian closure.
#[derive(Debug, Clone, Copy)]
pub struct WithJacobian<F, J> {
    values: F,
    jacobian: J,
}

impl<F, J> WithJacobian<F, J> {
    /// Create an objective with analytic derivatives.
    pub fn new(values: F, jacobian: J) -> Self {
        Self { values, jacobian }
    }
}

impl<F, J> ObjectiveFunction for WithJacobian<F, J>
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
    J: Fn(&[f64]) -> Jacobian + Send + Sync,
{
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError> {
        Ok((self.values)(parameters))
    }

    fn derivatives(&self, parameters: &[f64]) -> Option<Result<Jacobian, SolverError>> {
        Some(Ok((self.jacobian)(parameters)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_objective() {
        let f = |p: &[f64]| vec![p[0] + p[1]];
        assert_eq!(f.evaluate(&[1.0, 2.0]).unwrap(), vec![3.0]);
        assert!(f.derivatives(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_try_objective_propagates_error() {
        let f = TryObjective(|_p: &[f64]| {
            Err::<Vec<f64>, _>(SolverError::objective("stale curve"))
        });
        let err = f.evaluate(&[0.0]).unwrap_err();
        assert!(err.is_objective_failure());
    }

    #[test]
    fn test_with_jacobian() {
        let f = WithJacobian::new(
            |p: &[f64]| vec![p[0] * p[0]],
            |p: &[f64]| vec![vec![2.0 * p[0]]],
        );
        assert_eq!(f.evaluate(&[3.0]).unwrap(), vec![9.0]);
        let jacobian = f.derivatives(&[3.0]).unwrap().unwrap();
        assert_eq!(jacobian, vec![vec![6.0]]);
    }

    #[test]
    fn test_trait_object() {
        let f: Box<dyn ObjectiveFunction> = Box::new(|p: &[f64]| vec![2.0 * p[0]]);
        assert_eq!(f.evaluate(&[1.5]).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_objective_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let f = |p: &[f64]| vec![p[0]];
        assert_send_sync(&f);
        assert_send_sync(&TryObjective(|p: &[f64]| Ok::<_, SolverError>(vec![p[0]])));
    }
}
