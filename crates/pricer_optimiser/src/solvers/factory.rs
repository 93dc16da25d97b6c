//! Backend-agnostic optimiser construction.
//!
//! Calibration routines describe their problem once as an
//! [`OptimizerRequest`] and obtain a ready-to-run [`Optimizer`] from an
//! [`OptimizerFactory`]. Swapping the backend means swapping the factory;
//! the call site stays the same.
//!
//! # Example
//!
//! ```
//! use pricer_core::traits::ParameterBounds;
//! use pricer_optimiser::solvers::{LevenbergMarquardtFactory, OptimizerFactory, OptimizerRequest};
//!
//! // Fit a positive volatility to a variance quote.
//! let request = OptimizerRequest::new(|p: &[f64]| vec![p[0] * p[0]], vec![0.5], vec![0.04])
//!     .with_bounds(vec![ParameterBounds::positive()]);
//!
//! let factory = LevenbergMarquardtFactory::default();
//! let mut optimizer = factory.optimizer(request).unwrap();
//! let fit = optimizer.run().unwrap();
//! assert!((fit.parameters[0] - 0.2).abs() < 1e-8);
//! ```

use std::sync::Arc;

use pricer_core::traits::{ObjectiveFunction, ParameterBounds, ParameterTransformation};
use pricer_core::types::SolverError;

use super::config::LevenbergMarquardtConfig;
use super::levenberg_marquardt::{BestFit, LevenbergMarquardt};
use super::worker_pool::WorkerPool;
use crate::calibration::{BoxTransformation, TransformedObjective};

/// A configured, ready-to-run optimiser.
///
/// Parameters are always reported in model space.
pub trait Optimizer: Send {
    /// Run to completion and return the best fit.
    fn run(&mut self) -> Result<BestFit, SolverError>;

    /// Best-fit parameters found so far.
    fn best_fit_parameters(&self) -> Vec<f64>;

    /// Root-mean-squared error at the best fit.
    fn root_mean_squared_error(&self) -> f64;

    /// Number of iterations performed.
    fn iterations(&self) -> usize;

    /// Whether the optimiser has stopped.
    fn done(&self) -> bool;
}

/// Builds optimisers from a uniform problem description.
pub trait OptimizerFactory: Send + Sync {
    /// Construct an optimiser for `request`.
    fn optimizer(&self, request: OptimizerRequest) -> Result<Box<dyn Optimizer>, SolverError>;
}

/// Problem description handed to an [`OptimizerFactory`].
#[derive(Clone)]
pub struct OptimizerRequest {
    /// Model to fit.
    pub objective: Arc<dyn ObjectiveFunction>,
    /// Initial guess in model space.
    pub initial_parameters: Vec<f64>,
    /// Optional per-parameter box bounds.
    pub bounds: Option<Vec<ParameterBounds>>,
    /// Optional finite-difference steps, in the coordinates the backend iterates on.
    pub parameter_steps: Option<Vec<f64>>,
    /// Targets.
    pub target_values: Vec<f64>,
    /// Optional weights (default all ones).
    pub weights: Option<Vec<f64>>,
}

impl OptimizerRequest {
    /// Request with no bounds, default steps and unit weights.
    pub fn new<O>(objective: O, initial_parameters: Vec<f64>, target_values: Vec<f64>) -> Self
    where
        O: ObjectiveFunction + 'static,
    {
        Self::with_shared_objective(Arc::new(objective), initial_parameters, target_values)
    }

    /// Request for an already shared objective.
    pub fn with_shared_objective(
        objective: Arc<dyn ObjectiveFunction>,
        initial_parameters: Vec<f64>,
        target_values: Vec<f64>,
    ) -> Self {
        Self {
            objective,
            initial_parameters,
            bounds: None,
            parameter_steps: None,
            target_values,
            weights: None,
        }
    }

    /// Set box bounds.
    pub fn with_bounds(mut self, bounds: Vec<ParameterBounds>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set finite-difference steps.
    pub fn with_parameter_steps(mut self, steps: Vec<f64>) -> Self {
        self.parameter_steps = Some(steps);
        self
    }

    /// Set weights.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }
}

impl Optimizer for LevenbergMarquardt {
    fn run(&mut self) -> Result<BestFit, SolverError> {
        LevenbergMarquardt::run(self)
    }

    fn best_fit_parameters(&self) -> Vec<f64> {
        LevenbergMarquardt::best_fit_parameters(self).to_vec()
    }

    fn root_mean_squared_error(&self) -> f64 {
        LevenbergMarquardt::root_mean_squared_error(self)
    }

    fn iterations(&self) -> usize {
        LevenbergMarquardt::iterations(self)
    }

    fn done(&self) -> bool {
        LevenbergMarquardt::done(self)
    }
}

/// Solver iterating in transformed coordinates, reporting in model space.
struct BoundedOptimizer {
    solver: LevenbergMarquardt,
    transformation: Arc<BoxTransformation>,
}

impl Optimizer for BoundedOptimizer {
    fn run(&mut self) -> Result<BestFit, SolverError> {
        let mut fit = self.solver.run()?;
        fit.parameters = self.transformation.to_model(&fit.parameters);
        Ok(fit)
    }

    fn best_fit_parameters(&self) -> Vec<f64> {
        self.transformation
            .to_model(self.solver.best_fit_parameters())
    }

    fn root_mean_squared_error(&self) -> f64 {
        self.solver.root_mean_squared_error()
    }

    fn iterations(&self) -> usize {
        self.solver.iterations()
    }

    fn done(&self) -> bool {
        self.solver.done()
    }
}

/// Factory for [`LevenbergMarquardt`] optimisers.
///
/// Box bounds are handled by a change of variables; the solver itself
/// never sees them.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardtFactory {
    config: LevenbergMarquardtConfig,
    worker_pool: Option<WorkerPool>,
}

impl LevenbergMarquardtFactory {
    /// Factory producing solvers with `config`.
    pub fn new(config: LevenbergMarquardtConfig) -> Self {
        Self {
            config,
            worker_pool: None,
        }
    }

    /// Run finite differences of every produced solver on `pool`.
    pub fn with_worker_pool(mut self, pool: WorkerPool) -> Self {
        self.worker_pool = Some(pool);
        self
    }

    /// Solver settings.
    pub fn config(&self) -> &LevenbergMarquardtConfig {
        &self.config
    }

    fn build(
        &self,
        objective: Arc<dyn ObjectiveFunction>,
        initial_parameters: Vec<f64>,
        request: OptimizerRequest,
    ) -> Result<LevenbergMarquardt, SolverError> {
        let mut builder = LevenbergMarquardt::builder_shared(objective)
            .initial_parameters(initial_parameters)
            .target_values(request.target_values)
            .config(self.config);
        if let Some(weights) = request.weights {
            builder = builder.weights(weights);
        }
        if let Some(steps) = request.parameter_steps {
            builder = builder.parameter_steps(steps);
        }
        if let Some(pool) = &self.worker_pool {
            builder = builder.worker_pool(pool.clone());
        }
        builder.build()
    }
}

impl OptimizerFactory for LevenbergMarquardtFactory {
    fn optimizer(&self, mut request: OptimizerRequest) -> Result<Box<dyn Optimizer>, SolverError> {
        let bounds = match request.bounds.take() {
            Some(bounds) => bounds,
            None => {
                let objective = Arc::clone(&request.objective);
                let initial = std::mem::take(&mut request.initial_parameters);
                return Ok(Box::new(self.build(objective, initial, request)?));
            }
        };

        if bounds.len() != request.initial_parameters.len() {
            return Err(SolverError::dimension_mismatch(
                "parameter bounds",
                request.initial_parameters.len(),
                bounds.len(),
            ));
        }
        let transformation = Arc::new(BoxTransformation::from_bounds(&bounds)?);
        if let Some((i, value)) = request
            .initial_parameters
            .iter()
            .enumerate()
            .find(|(i, value)| !bounds[*i].contains_strictly(**value))
        {
            return Err(SolverError::invalid_input(format!(
                "initial parameter {} = {} lies outside ({}, {})",
                i, value, bounds[i].min, bounds[i].max
            )));
        }

        let initial = transformation.to_solver(&request.initial_parameters);
        let objective: Arc<dyn ObjectiveFunction> = Arc::new(TransformedObjective::new(
            Arc::clone(&request.objective),
            Arc::clone(&transformation) as Arc<dyn ParameterTransformation>,
        ));
        let solver = self.build(objective, initial, request)?;

        Ok(Box::new(BoundedOptimizer {
            solver,
            transformation,
        }))
    }
}
