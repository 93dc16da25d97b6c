//! Damped Gauss-Newton (Levenberg-Marquardt) least-squares solver.
//!
//! Fits a black-box [`ObjectiveFunction`] to a vector of targets by
//! minimising the weighted mean-squared error
//!
//! ```text
//! E(p) = Σ_k w_k (f_k(p) - y_k)² / M
//! ```
//!
//! # Algorithm
//!
//! Each outer iteration evaluates a candidate point and either accepts it
//! (error strictly decreased, λ ← λ / divisor) or rejects it
//! (λ ← λ · multiplicator). The next candidate solves the damped normal
//! equations
//!
//! ```text
//! H_λ Δp = β,    H = JᵀWJ,    β_i = Σ_k w_k (y_k - f_k) J_ik
//! ```
//!
//! where the diagonal of `H` is damped by the configured
//! [`RegularisationMethod`]. If `H_λ` is not positive definite, λ is
//! escalated 16-fold and the system rebuilt without evaluating the objective
//! again.
//!
//! The run stops once the iteration bound is exceeded, the change in RMS
//! error drops to the tolerance, or λ overflows to infinity. None of these
//! is an error; inspect [`LevenbergMarquardt::status`] and the achieved
//! error to judge the fit.
//!
//! # Example
//!
//! ```
//! use pricer_optimiser::solvers::{LevenbergMarquardt, SolverStatus};
//!
//! let mut solver = LevenbergMarquardt::builder(|p: &[f64]| vec![p[1], 2.0 * p[0] + p[1]])
//!     .initial_parameters(vec![0.0, 0.0])
//!     .target_values(vec![5.0, 10.0])
//!     .build()
//!     .unwrap();
//!
//! let fit = solver.run().unwrap();
//! assert!((fit.parameters[0] - 2.5).abs() < 1e-8);
//! assert!((fit.parameters[1] - 5.0).abs() < 1e-8);
//! assert!(solver.done());
//! ```

use std::fmt;
use std::sync::Arc;

use pricer_core::traits::{Jacobian, ObjectiveFunction};
use pricer_core::types::SolverError;
use tracing::{debug, trace, warn};

use super::config::LevenbergMarquardtConfig;
use super::derivative::DerivativeEstimator;
use super::linalg::solve_symmetric;
use super::regularisation::RegularisationMethod;
use super::worker_pool::{PoolLease, WorkerPool};

/// Factor applied to λ when the damped system cannot be solved.
pub const SINGULAR_LAMBDA_ESCALATION: f64 = 16.0;

/// Smallest damping factor. λ must stay positive for the escalation on a
/// singular system to reach infinity.
pub const MIN_LAMBDA: f64 = f64::MIN_POSITIVE;

/// Lifecycle of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Constructed, `run()` not yet called.
    Initialized,
    /// `run()` in progress (or interrupted by an objective failure).
    Iterating,
    /// Error change within tolerance after an accepted step.
    Converged,
    /// Error change within tolerance after a rejected step.
    Stalled,
    /// Iteration bound exceeded.
    MaxIterations,
    /// λ overflowed to infinity.
    Diverged,
}

impl SolverStatus {
    /// Whether the solver has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Converged | Self::Stalled | Self::MaxIterations | Self::Diverged
        )
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Iterating => "iterating",
            Self::Converged => "converged",
            Self::Stalled => "stalled",
            Self::MaxIterations => "max_iterations",
            Self::Diverged => "diverged",
        };
        f.write_str(name)
    }
}

/// Snapshot of the best point found by a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestFit {
    /// Best-fit parameters.
    pub parameters: Vec<f64>,
    /// Root-mean-squared error at `parameters` (infinite if no point was valid).
    pub root_mean_squared_error: f64,
    /// Number of outer iterations performed.
    pub iterations: usize,
    /// Terminal status of the run.
    pub status: SolverStatus,
}

/// One outer iteration of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Iteration number, starting at 1.
    pub iteration: usize,
    /// RMS error of the evaluated candidate (NaN if rejected as invalid).
    pub candidate_error: f64,
    /// RMS error of the current point after the decision.
    pub current_error: f64,
    /// λ after the decision.
    pub lambda: f64,
    /// Whether the candidate replaced the current point.
    pub accepted: bool,
}

/// Mutable state advanced by `run()`.
#[derive(Debug, Clone)]
struct SolverState {
    iteration: usize,
    lambda: f64,
    parameters_current: Vec<f64>,
    values_current: Option<Vec<f64>>,
    error_mean_squared_current: f64,
    error_root_mean_squared_change: f64,
    last_accepted: bool,
    parameters_test: Vec<f64>,
    derivative_current: Option<Jacobian>,
    history: Vec<IterationReport>,
}

impl SolverState {
    fn new(initial_parameters: &[f64], initial_lambda: f64) -> Self {
        Self {
            iteration: 0,
            lambda: initial_lambda,
            parameters_current: initial_parameters.to_vec(),
            values_current: None,
            error_mean_squared_current: f64::INFINITY,
            error_root_mean_squared_change: f64::INFINITY,
            last_accepted: false,
            parameters_test: initial_parameters.to_vec(),
            derivative_current: None,
            history: Vec::new(),
        }
    }
}

/// Builder for [`LevenbergMarquardt`].
pub struct LevenbergMarquardtBuilder {
    objective: Arc<dyn ObjectiveFunction>,
    initial_parameters: Vec<f64>,
    target_values: Vec<f64>,
    weights: Option<Vec<f64>>,
    parameter_steps: Option<Vec<f64>>,
    config: LevenbergMarquardtConfig,
    worker_pool: Option<WorkerPool>,
}

impl LevenbergMarquardtBuilder {
    /// Set the initial guess (length N).
    pub fn initial_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.initial_parameters = parameters;
        self
    }

    /// Set the targets (length M).
    pub fn target_values(mut self, targets: Vec<f64>) -> Self {
        self.target_values = targets;
        self
    }

    /// Set the weights (length M, default all ones).
    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set per-parameter finite-difference steps (length N).
    pub fn parameter_steps(mut self, steps: Vec<f64>) -> Self {
        self.parameter_steps = Some(steps);
        self
    }

    /// Use the given solver settings.
    pub fn config(mut self, config: LevenbergMarquardtConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the regularisation method.
    pub fn regularisation(mut self, regularisation: RegularisationMethod) -> Self {
        self.config.regularisation = regularisation;
        self
    }

    /// Set the maximum number of outer iterations.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the RMS-error change tolerance.
    pub fn error_tolerance(mut self, error_tolerance: f64) -> Self {
        self.config.error_tolerance = error_tolerance;
        self
    }

    /// Evaluate finite differences on a run-owned pool of `n` threads.
    pub fn number_of_threads(mut self, n: usize) -> Self {
        self.config.number_of_threads = n;
        self.worker_pool = None;
        self
    }

    /// Use an explicit worker-pool handle, overriding `number_of_threads`.
    pub fn worker_pool(mut self, pool: WorkerPool) -> Self {
        self.worker_pool = Some(pool);
        self
    }

    /// Validate the inputs and build the solver.
    pub fn build(self) -> Result<LevenbergMarquardt, SolverError> {
        self.config.validate()?;
        validate_parameters(&self.initial_parameters)?;
        validate_targets(&self.target_values)?;

        let weights = match self.weights {
            Some(weights) => {
                validate_weights(&weights, self.target_values.len())?;
                weights
            }
            None => vec![1.0; self.target_values.len()],
        };
        if let Some(steps) = &self.parameter_steps {
            validate_steps(steps, self.initial_parameters.len())?;
        }

        let worker_pool = self
            .worker_pool
            .unwrap_or_else(|| WorkerPool::with_threads(self.config.number_of_threads));
        let state = SolverState::new(&self.initial_parameters, self.config.initial_lambda);

        Ok(LevenbergMarquardt {
            objective: self.objective,
            config: self.config,
            worker_pool,
            estimator: DerivativeEstimator::new(self.parameter_steps),
            initial_parameters: self.initial_parameters,
            target_values: self.target_values,
            weights,
            status: SolverStatus::Initialized,
            state,
        })
    }
}

/// Damped Gauss-Newton least-squares solver.
///
/// Built with [`LevenbergMarquardt::builder`]. The solver is `Send`, so
/// independent calibrations (and warm-restart clones) can run on
/// different threads.
pub struct LevenbergMarquardt {
    objective: Arc<dyn ObjectiveFunction>,
    config: LevenbergMarquardtConfig,
    worker_pool: WorkerPool,
    estimator: DerivativeEstimator,
    initial_parameters: Vec<f64>,
    target_values: Vec<f64>,
    weights: Vec<f64>,
    status: SolverStatus,
    state: SolverState,
}

impl fmt::Debug for LevenbergMarquardt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevenbergMarquardt")
            .field("config", &self.config)
            .field("worker_pool", &self.worker_pool)
            .field("parameters", &self.state.parameters_current)
            .field("iteration", &self.state.iteration)
            .field("lambda", &self.state.lambda)
            .field("status", &self.status)
            .finish()
    }
}

impl LevenbergMarquardt {
    /// Start building a solver for `objective`.
    pub fn builder<O>(objective: O) -> LevenbergMarquardtBuilder
    where
        O: ObjectiveFunction + 'static,
    {
        Self::builder_shared(Arc::new(objective))
    }

    /// Start building a solver for an already shared objective.
    pub fn builder_shared(objective: Arc<dyn ObjectiveFunction>) -> LevenbergMarquardtBuilder {
        LevenbergMarquardtBuilder {
            objective,
            initial_parameters: Vec::new(),
            target_values: Vec::new(),
            weights: None,
            parameter_steps: None,
            config: LevenbergMarquardtConfig::default(),
            worker_pool: None,
        }
    }

    // ========================================
    // Run
    // ========================================

    /// Iterate until one of the stopping conditions holds.
    ///
    /// Blocks the calling thread. A solver that has already stopped returns
    /// its frozen result without evaluating the objective. Objective
    /// failures are fatal and returned as `Err`; divergence is not an error.
    pub fn run(&mut self) -> Result<BestFit, SolverError> {
        if self.status.is_terminal() {
            return Ok(self.best_fit());
        }
        if self.status == SolverStatus::Initialized {
            self.state = SolverState::new(&self.initial_parameters, self.config.initial_lambda);
        }
        self.status = SolverStatus::Iterating;

        let lease = self.worker_pool.lease()?;

        while !self.done() {
            self.state.iteration += 1;

            let parameters_test = self.state.parameters_test.clone();
            let values_test = self.evaluate(&parameters_test)?;
            let error_test = self.mean_squared_error(&values_test);
            let error_current = self.state.error_mean_squared_current;

            // NaN compares false, so invalid points are always rejected.
            let accepted = error_test < error_current;
            if accepted {
                self.state.error_root_mean_squared_change = error_current.sqrt() - error_test.sqrt();
                self.state.parameters_current = parameters_test;
                self.state.values_current = Some(values_test);
                self.state.error_mean_squared_current = error_test;
                self.state.derivative_current = None;
                self.state.lambda = (self.state.lambda / self.config.lambda_divisor).max(MIN_LAMBDA);
            } else {
                self.state.error_root_mean_squared_change = error_test.sqrt() - error_current.sqrt();
                self.state.lambda *= self.config.lambda_multiplicator;
            }
            self.state.last_accepted = accepted;

            let report = IterationReport {
                iteration: self.state.iteration,
                candidate_error: error_test.sqrt(),
                current_error: self.state.error_mean_squared_current.sqrt(),
                lambda: self.state.lambda,
                accepted,
            };
            trace!(
                iteration = report.iteration,
                candidate_error = report.candidate_error,
                current_error = report.current_error,
                lambda = report.lambda,
                accepted,
                "Levenberg-Marquardt iteration"
            );
            self.state.history.push(report);

            if !self.done() {
                self.state.parameters_test = self.next_candidate(&lease)?;
            }
        }

        self.status = self.terminal_status();
        debug!(
            status = %self.status,
            iterations = self.state.iteration,
            error = self.root_mean_squared_error(),
            lambda = self.state.lambda,
            "Levenberg-Marquardt finished"
        );

        Ok(self.best_fit())
    }

    /// Whether a stopping condition holds.
    pub fn done(&self) -> bool {
        // A NaN change never satisfies the tolerance test.
        self.state.iteration > self.config.max_iterations
            || self.state.error_root_mean_squared_change.abs() <= self.config.error_tolerance
            || self.state.lambda.is_infinite()
    }

    fn terminal_status(&self) -> SolverStatus {
        if self.state.iteration > self.config.max_iterations {
            SolverStatus::MaxIterations
        } else if self.state.lambda.is_infinite() {
            SolverStatus::Diverged
        } else if self.state.last_accepted {
            SolverStatus::Converged
        } else {
            SolverStatus::Stalled
        }
    }

    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError> {
        let values = self.objective.evaluate(parameters)?;
        if values.len() != self.target_values.len() {
            return Err(SolverError::dimension_mismatch(
                "objective values",
                self.target_values.len(),
                values.len(),
            ));
        }
        Ok(values)
    }

    fn mean_squared_error(&self, values: &[f64]) -> f64 {
        let sum: f64 = values
            .iter()
            .zip(&self.target_values)
            .zip(&self.weights)
            .map(|((value, target), weight)| {
                let deviation = value - target;
                weight * deviation * deviation
            })
            .sum();
        sum / values.len() as f64
    }

    /// Solve the damped normal equations at the current point.
    fn next_candidate(&mut self, lease: &PoolLease) -> Result<Vec<f64>, SolverError> {
        let values = match &self.state.values_current {
            Some(values) => values.clone(),
            // Nothing accepted yet: stay put and let λ grow.
            None => return Ok(self.state.parameters_current.clone()),
        };

        let jacobian = match self.state.derivative_current.take() {
            Some(jacobian) => jacobian,
            None => {
                debug!(
                    iteration = self.state.iteration,
                    "Recomputing Jacobian at accepted point"
                );
                self.estimator.jacobian(
                    self.objective.as_ref(),
                    &self.state.parameters_current,
                    &values,
                    lease,
                )?
            }
        };

        let (hessian, gradient) = self.normal_equations(&jacobian, &values);
        self.state.derivative_current = Some(jacobian);

        let n = gradient.len();
        loop {
            let mut damped = hessian.clone();
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] = self.config.regularisation.damp(row[i], self.state.lambda);
            }

            match solve_symmetric(&damped, &gradient) {
                Ok(increment) => {
                    return Ok(self
                        .state
                        .parameters_current
                        .iter()
                        .zip(&increment)
                        .map(|(p, dp)| p + dp)
                        .collect());
                }
                Err(SolverError::SingularMatrix) => {
                    self.state.lambda *= SINGULAR_LAMBDA_ESCALATION;
                    debug!(
                        lambda = self.state.lambda,
                        parameters = n,
                        "Damped system not positive definite, escalating lambda"
                    );
                    if self.state.lambda.is_infinite() {
                        return Ok(self.state.parameters_current.clone());
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Undamped `JᵀWJ` and `β` at the current point.
    fn normal_equations(&self, jacobian: &Jacobian, values: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = jacobian.len();
        let mut hessian = vec![vec![0.0; n]; n];
        let mut gradient = vec![0.0; n];

        for i in 0..n {
            for j in 0..=i {
                let sum: f64 = jacobian[i]
                    .iter()
                    .zip(&jacobian[j])
                    .zip(&self.weights)
                    .map(|((a, b), w)| w * a * b)
                    .sum();
                hessian[i][j] = sum;
                hessian[j][i] = sum;
            }

            gradient[i] = values
                .iter()
                .zip(&self.target_values)
                .zip(&self.weights)
                .zip(&jacobian[i])
                .map(|(((value, target), w), d)| w * (target - value) * d)
                .sum();
        }

        (hessian, gradient)
    }

    // ========================================
    // Results
    // ========================================

    /// Best point found so far (the initial guess before any run).
    pub fn best_fit_parameters(&self) -> &[f64] {
        &self.state.parameters_current
    }

    /// Root-mean-squared error at the best point (infinite if none was valid).
    pub fn root_mean_squared_error(&self) -> f64 {
        self.state.error_mean_squared_current.sqrt()
    }

    /// Number of outer iterations performed.
    pub fn iterations(&self) -> usize {
        self.state.iteration
    }

    /// Current damping factor.
    pub fn lambda(&self) -> f64 {
        self.state.lambda
    }

    /// Lifecycle status.
    pub fn status(&self) -> SolverStatus {
        self.status
    }

    /// Per-iteration reports of the current run.
    pub fn history(&self) -> &[IterationReport] {
        &self.state.history
    }

    /// Snapshot of the best fit.
    pub fn best_fit(&self) -> BestFit {
        BestFit {
            parameters: self.state.parameters_current.clone(),
            root_mean_squared_error: self.root_mean_squared_error(),
            iterations: self.state.iteration,
            status: self.status,
        }
    }

    /// Solver settings.
    pub fn config(&self) -> &LevenbergMarquardtConfig {
        &self.config
    }

    /// Worker-pool handle used for finite differences.
    pub fn worker_pool(&self) -> &WorkerPool {
        &self.worker_pool
    }

    /// Initial guess.
    pub fn initial_parameters(&self) -> &[f64] {
        &self.initial_parameters
    }

    /// Targets.
    pub fn target_values(&self) -> &[f64] {
        &self.target_values
    }

    /// Weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    // ========================================
    // Warm restart
    // ========================================

    /// Independent solver with new targets (and optionally new weights).
    ///
    /// The clone shares the objective, settings and worker-pool handle;
    /// iteration count, λ, error state and history start afresh. With
    /// `use_best_parameters`, a finished source seeds the clone with its best
    /// fit. An unfinished source keeps its original initial guess.
    pub fn clone_with_modified_targets(
        &self,
        target_values: Vec<f64>,
        weights: Option<Vec<f64>>,
        use_best_parameters: bool,
    ) -> Result<Self, SolverError> {
        if target_values.len() != self.target_values.len() {
            return Err(SolverError::dimension_mismatch(
                "target values",
                self.target_values.len(),
                target_values.len(),
            ));
        }
        validate_targets(&target_values)?;
        let weights = match weights {
            Some(weights) => {
                validate_weights(&weights, target_values.len())?;
                weights
            }
            None => self.weights.clone(),
        };

        let initial_parameters = if use_best_parameters && self.done() {
            self.state.parameters_current.clone()
        } else {
            if use_best_parameters {
                warn!(
                    status = %self.status,
                    "Warm start requested from an unfinished solver, using original initial parameters"
                );
            }
            self.initial_parameters.clone()
        };

        let state = SolverState::new(&initial_parameters, self.config.initial_lambda);
        Ok(Self {
            objective: Arc::clone(&self.objective),
            config: self.config,
            worker_pool: self.worker_pool.clone(),
            estimator: self.estimator.clone(),
            initial_parameters,
            target_values,
            weights,
            status: SolverStatus::Initialized,
            state,
        })
    }

    // ========================================
    // Mutators (only before the first run)
    // ========================================

    fn ensure_unlocked(&self, setting: &str) -> Result<(), SolverError> {
        if self.status == SolverStatus::Initialized {
            Ok(())
        } else {
            Err(SolverError::configuration_locked(setting))
        }
    }

    fn update_config(
        &mut self,
        setting: &str,
        update: impl FnOnce(&mut LevenbergMarquardtConfig),
    ) -> Result<(), SolverError> {
        self.ensure_unlocked(setting)?;
        let mut config = self.config;
        update(&mut config);
        config.validate()?;
        self.config = config;
        self.state.lambda = config.initial_lambda;
        Ok(())
    }

    /// Replace the initial guess.
    pub fn set_initial_parameters(&mut self, parameters: Vec<f64>) -> Result<(), SolverError> {
        self.ensure_unlocked("initial_parameters")?;
        if parameters.len() != self.initial_parameters.len() {
            return Err(SolverError::dimension_mismatch(
                "initial parameters",
                self.initial_parameters.len(),
                parameters.len(),
            ));
        }
        validate_parameters(&parameters)?;
        self.state = SolverState::new(&parameters, self.config.initial_lambda);
        self.initial_parameters = parameters;
        Ok(())
    }

    /// Replace the targets.
    pub fn set_target_values(&mut self, targets: Vec<f64>) -> Result<(), SolverError> {
        self.ensure_unlocked("target_values")?;
        if targets.len() != self.target_values.len() {
            return Err(SolverError::dimension_mismatch(
                "target values",
                self.target_values.len(),
                targets.len(),
            ));
        }
        validate_targets(&targets)?;
        self.target_values = targets;
        Ok(())
    }

    /// Replace the weights.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), SolverError> {
        self.ensure_unlocked("weights")?;
        validate_weights(&weights, self.target_values.len())?;
        self.weights = weights;
        Ok(())
    }

    /// Replace the finite-difference steps (`None` for the default steps).
    pub fn set_parameter_steps(&mut self, steps: Option<Vec<f64>>) -> Result<(), SolverError> {
        self.ensure_unlocked("parameter_steps")?;
        if let Some(steps) = &steps {
            validate_steps(steps, self.initial_parameters.len())?;
        }
        self.estimator = DerivativeEstimator::new(steps);
        Ok(())
    }

    /// Set the regularisation method.
    pub fn set_regularisation(
        &mut self,
        regularisation: RegularisationMethod,
    ) -> Result<(), SolverError> {
        self.update_config("regularisation", |c| c.regularisation = regularisation)
    }

    /// Set the maximum number of outer iterations.
    pub fn set_max_iterations(&mut self, max_iterations: usize) -> Result<(), SolverError> {
        self.update_config("max_iterations", |c| c.max_iterations = max_iterations)
    }

    /// Set the RMS-error change tolerance.
    pub fn set_error_tolerance(&mut self, error_tolerance: f64) -> Result<(), SolverError> {
        self.update_config("error_tolerance", |c| c.error_tolerance = error_tolerance)
    }

    /// Set the initial damping factor.
    pub fn set_initial_lambda(&mut self, initial_lambda: f64) -> Result<(), SolverError> {
        self.update_config("initial_lambda", |c| c.initial_lambda = initial_lambda)
    }

    /// Set the damping divisor applied after an accepted step.
    pub fn set_lambda_divisor(&mut self, lambda_divisor: f64) -> Result<(), SolverError> {
        self.update_config("lambda_divisor", |c| c.lambda_divisor = lambda_divisor)
    }

    /// Set the damping multiplicator applied after a rejected step.
    pub fn set_lambda_multiplicator(&mut self, lambda_multiplicator: f64) -> Result<(), SolverError> {
        self.update_config("lambda_multiplicator", |c| {
            c.lambda_multiplicator = lambda_multiplicator
        })
    }

    /// Evaluate finite differences on a run-owned pool of `n` threads.
    ///
    /// Replaces any pool injected earlier, including a shared one.
    pub fn set_number_of_threads(&mut self, n: usize) -> Result<(), SolverError> {
        self.update_config("number_of_threads", |c| c.number_of_threads = n)?;
        self.worker_pool = WorkerPool::with_threads(n);
        Ok(())
    }

    /// Use an explicit worker-pool handle.
    pub fn set_worker_pool(&mut self, pool: WorkerPool) -> Result<(), SolverError> {
        self.ensure_unlocked("worker_pool")?;
        self.worker_pool = pool;
        Ok(())
    }
}

fn validate_parameters(parameters: &[f64]) -> Result<(), SolverError> {
    if parameters.is_empty() {
        return Err(SolverError::invalid_input("initial parameters must not be empty"));
    }
    if parameters.iter().any(|p| !p.is_finite()) {
        return Err(SolverError::invalid_input("initial parameters must be finite"));
    }
    Ok(())
}

fn validate_targets(targets: &[f64]) -> Result<(), SolverError> {
    if targets.is_empty() {
        return Err(SolverError::invalid_input("target values must not be empty"));
    }
    if targets.iter().any(|t| !t.is_finite()) {
        return Err(SolverError::invalid_input("target values must be finite"));
    }
    Ok(())
}

fn validate_weights(weights: &[f64], expected: usize) -> Result<(), SolverError> {
    if weights.len() != expected {
        return Err(SolverError::dimension_mismatch("weights", expected, weights.len()));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(SolverError::invalid_input("weights must be finite and non-negative"));
    }
    Ok(())
}

fn validate_steps(steps: &[f64], expected: usize) -> Result<(), SolverError> {
    if steps.len() != expected {
        return Err(SolverError::dimension_mismatch("parameter steps", expected, steps.len()));
    }
    if steps.iter().any(|h| !h.is_finite() || *h == 0.0) {
        return Err(SolverError::invalid_input("parameter steps must be finite and non-zero"));
    }
    Ok(())
}
