//! Jacobian estimation for the damped Gauss-Newton core.
//!
//! Analytic derivatives are used whenever the objective supplies them.
//! Otherwise each column is a forward difference
//!
//! ```text
//! ∂f/∂p_i ≈ (f(p + h_i e_i) - f(p)) / h_i,    h_i = (|p_i| + 1) · 1e-8
//! ```
//!
//! where `f(p)` is the value vector the core already holds, so N extra
//! evaluations are needed. The evaluations are independent and run on the
//! leased worker pool.

use pricer_core::traits::{Jacobian, ObjectiveFunction};
use pricer_core::types::SolverError;

use super::worker_pool::PoolLease;

/// Relative scale of the default finite-difference step.
pub const DEFAULT_STEP_SCALE: f64 = 1e-8;

/// Default forward-difference step for a parameter value.
#[inline]
pub fn default_step(parameter: f64) -> f64 {
    (parameter.abs() + 1.0) * DEFAULT_STEP_SCALE
}

/// Computes `J[i][k] = ∂f_k/∂p_i` at a point.
#[derive(Debug, Clone, Default)]
pub struct DerivativeEstimator {
    steps: Option<Vec<f64>>,
}

impl DerivativeEstimator {
    /// Estimator with caller-supplied steps, or the default steps if `None`.
    pub fn new(steps: Option<Vec<f64>>) -> Self {
        Self { steps }
    }

    /// Step used for parameter `index` at value `parameter`.
    pub fn step(&self, index: usize, parameter: f64) -> f64 {
        self.steps
            .as_ref()
            .and_then(|steps| steps.get(index).copied())
            .unwrap_or_else(|| default_step(parameter))
    }

    /// Jacobian of `objective` at `parameters`.
    ///
    /// `values` must be `objective(parameters)`. Blocks until every column
    /// is complete; the first evaluation failure fails the estimate.
    pub(crate) fn jacobian(
        &self,
        objective: &dyn ObjectiveFunction,
        parameters: &[f64],
        values: &[f64],
        pool: &PoolLease,
    ) -> Result<Jacobian, SolverError> {
        if let Some(analytic) = objective.derivatives(parameters) {
            let jacobian = analytic?;
            validate_shape(&jacobian, parameters.len(), values.len())?;
            return Ok(jacobian);
        }

        pool.map_indexed(parameters.len(), |i| {
            self.column(objective, parameters, values, i)
        })
    }

    fn column(
        &self,
        objective: &dyn ObjectiveFunction,
        parameters: &[f64],
        values: &[f64],
        index: usize,
    ) -> Result<Vec<f64>, SolverError> {
        let h = self.step(index, parameters[index]);
        let mut shifted = parameters.to_vec();
        shifted[index] += h;

        let bumped = objective.evaluate(&shifted)?;
        if bumped.len() != values.len() {
            return Err(SolverError::dimension_mismatch(
                "objective values",
                values.len(),
                bumped.len(),
            ));
        }

        Ok(bumped
            .iter()
            .zip(values)
            .map(|(up, base)| {
                let partial = (up - base) / h;
                if partial.is_finite() {
                    partial
                } else {
                    0.0
                }
            })
            .collect())
    }
}

fn validate_shape(jacobian: &Jacobian, parameters: usize, values: usize) -> Result<(), SolverError> {
    if jacobian.len() != parameters {
        return Err(SolverError::dimension_mismatch(
            "jacobian rows",
            parameters,
            jacobian.len(),
        ));
    }
    if let Some(row) = jacobian.iter().find(|row| row.len() != values) {
        return Err(SolverError::dimension_mismatch(
            "jacobian columns",
            values,
            row.len(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::WorkerPool;
    use approx::assert_relative_eq;
    use pricer_core::traits::{TryObjective, WithJacobian};

    fn quadratic(p: &[f64]) -> Vec<f64> {
        vec![p[0] * p[0], p[0] * p[1], 3.0 * p[1]]
    }

    #[test]
    fn test_default_step() {
        assert_eq!(default_step(0.0), 1e-8);
        assert_relative_eq!(default_step(-99.0), 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn test_custom_steps_take_precedence() {
        let estimator = DerivativeEstimator::new(Some(vec![0.5, 0.25]));
        assert_eq!(estimator.step(0, 100.0), 0.5);
        assert_eq!(estimator.step(1, 100.0), 0.25);
        assert_eq!(DerivativeEstimator::default().step(0, 100.0), default_step(100.0));
    }

    #[test]
    fn test_forward_difference_jacobian() {
        let p = [2.0, 3.0];
        let values = quadratic(&p);
        let lease = WorkerPool::Inline.lease().unwrap();
        let jacobian = DerivativeEstimator::default()
            .jacobian(&quadratic, &p, &values, &lease)
            .unwrap();

        assert_eq!(jacobian.len(), 2);
        assert_relative_eq!(jacobian[0][0], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[0][1], 3.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[0][2], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[1][0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[1][1], 2.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[1][2], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_non_finite_partials_are_zeroed() {
        let objective = |p: &[f64]| {
            if p[0] > 1.0 {
                vec![f64::NAN, p[1]]
            } else {
                vec![p[0], p[1]]
            }
        };
        let p = [1.0, 0.0];
        let values = objective(&p[..]);
        let lease = WorkerPool::Inline.lease().unwrap();
        let jacobian = DerivativeEstimator::default()
            .jacobian(&objective, &p, &values, &lease)
            .unwrap();

        assert_eq!(jacobian[0][0], 0.0);
        assert!(jacobian.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_thread_count_does_not_change_result() {
        let p = [0.7, -1.3];
        let values = quadratic(&p);
        let estimator = DerivativeEstimator::default();

        let inline = estimator
            .jacobian(&quadratic, &p, &values, &WorkerPool::Inline.lease().unwrap())
            .unwrap();
        let parallel = estimator
            .jacobian(&quadratic, &p, &values, &WorkerPool::Dedicated(4).lease().unwrap())
            .unwrap();

        assert_eq!(inline, parallel);
    }

    #[test]
    fn test_analytic_jacobian_is_used() {
        let objective = WithJacobian::new(
            |p: &[f64]| vec![p[0] + p[1]],
            |_: &[f64]| vec![vec![7.0], vec![11.0]],
        );
        let lease = WorkerPool::Inline.lease().unwrap();
        let jacobian = DerivativeEstimator::default()
            .jacobian(&objective, &[1.0, 1.0], &[2.0], &lease)
            .unwrap();
        assert_eq!(jacobian, vec![vec![7.0], vec![11.0]]);
    }

    #[test]
    fn test_analytic_jacobian_shape_is_validated() {
        let objective = WithJacobian::new(|p: &[f64]| vec![p[0]], |_: &[f64]| vec![vec![1.0]]);
        let lease = WorkerPool::Inline.lease().unwrap();
        let err = DerivativeEstimator::default()
            .jacobian(&objective, &[1.0, 2.0], &[1.0], &lease)
            .unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_evaluation_error_fails_estimate() {
        let objective = TryObjective(|p: &[f64]| {
            if p[1] != 0.0 {
                Err(SolverError::objective("surface lookup failed"))
            } else {
                Ok(vec![p[0]])
            }
        });
        let lease = WorkerPool::Dedicated(2).lease().unwrap();
        let err = DerivativeEstimator::default()
            .jacobian(&objective, &[1.0, 0.0], &[1.0], &lease)
            .unwrap_err();
        assert!(err.is_objective_failure());
    }

    #[test]
    fn test_wrong_output_length_is_rejected() {
        let objective = |p: &[f64]| {
            if p[0] == 0.0 {
                vec![0.0]
            } else {
                vec![0.0, 0.0]
            }
        };
        let lease = WorkerPool::Inline.lease().unwrap();
        let err = DerivativeEstimator::default()
            .jacobian(&objective, &[0.0], &[0.0], &lease)
            .unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { .. }));
    }
}
