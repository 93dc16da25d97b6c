//! Integration tests for least-squares calibration.
//!
//! These tests exercise the public API end to end: curve and smile
//! calibrations through the optimiser factory, warm restarts on bumped
//! quotes, worker-pool ownership and configuration loading.

use std::sync::Arc;

use approx::assert_relative_eq;
use pricer_core::traits::{ObjectiveFunction, ParameterBounds, TryObjective};
use pricer_core::types::SolverError;
use pricer_optimiser::calibration::{BoxTransformation, TransformedObjective};
use pricer_optimiser::prelude::*;
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const MATURITIES: [f64; 10] = [0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0];

/// Nelson-Siegel zero rates for `(β0, β1, β2, τ)`.
fn nelson_siegel(p: &[f64]) -> Vec<f64> {
    let (b0, b1, b2, tau) = (p[0], p[1], p[2], p[3]);
    MATURITIES
        .iter()
        .map(|t| {
            let x = t / tau;
            let decay = (-x).exp();
            let loading = (1.0 - decay) / x;
            b0 + b1 * loading + b2 * (loading - decay)
        })
        .collect()
}

const LOG_MONEYNESS: [f64; 9] = [-0.4, -0.3, -0.2, -0.1, 0.0, 0.1, 0.2, 0.3, 0.4];

/// Raw SVI total variance for `(a, b, ρ, m, σ)`.
fn svi(p: &[f64]) -> Vec<f64> {
    let (a, b, rho, m, sigma) = (p[0], p[1], p[2], p[3], p[4]);
    LOG_MONEYNESS
        .iter()
        .map(|k| a + b * (rho * (k - m) + ((k - m).powi(2) + sigma * sigma).sqrt()))
        .collect()
}

fn nelson_siegel_bounds() -> Vec<ParameterBounds> {
    vec![
        ParameterBounds::unbounded(),
        ParameterBounds::unbounded(),
        ParameterBounds::unbounded(),
        ParameterBounds::positive(),
    ]
}

// ============================================================================
// Calibration through the factory
// ============================================================================

#[test]
fn test_nelson_siegel_curve_calibration() {
    init_tracing();
    let truth = [0.04, -0.02, 0.01, 1.5];
    let request = OptimizerRequest::new(nelson_siegel, vec![0.03, 0.0, 0.0, 1.0], nelson_siegel(&truth))
        .with_bounds(nelson_siegel_bounds());

    let factory = LevenbergMarquardtFactory::new(LevenbergMarquardtConfig::default().with_max_iterations(200));
    let mut optimizer = factory.optimizer(request).unwrap();
    let fit = optimizer.run().unwrap();

    for (fitted, expected) in fit.parameters.iter().zip(truth) {
        assert_relative_eq!(*fitted, expected, epsilon = 1e-8);
    }
    assert!(fit.root_mean_squared_error < 1e-12);
    assert!(fit.iterations < 200);
}

#[test]
fn test_svi_smile_calibration_with_bounds() {
    init_tracing();
    let truth = [0.02, 0.1, -0.4, 0.05, 0.15];
    let request = OptimizerRequest::new(svi, vec![0.01, 0.2, 0.0, 0.0, 0.2], svi(&truth)).with_bounds(vec![
        ParameterBounds::unbounded(),
        ParameterBounds::positive(),
        ParameterBounds::correlation(),
        ParameterBounds::unbounded(),
        ParameterBounds::positive(),
    ]);

    let factory = LevenbergMarquardtFactory::new(LevenbergMarquardtConfig::default().with_max_iterations(500));
    let mut optimizer = factory.optimizer(request).unwrap();
    let fit = optimizer.run().unwrap();

    for (fitted, expected) in fit.parameters.iter().zip(truth) {
        assert_relative_eq!(*fitted, expected, epsilon = 1e-7);
    }
    assert!(fit.parameters[1] > 0.0);
    assert!(fit.parameters[2] > -1.0 && fit.parameters[2] < 1.0);
}

#[test]
fn test_objective_failure_surfaces_from_factory_optimizer() {
    let objective = TryObjective(|p: &[f64]| {
        if p[0] > 0.5 {
            Err(SolverError::objective("volatility surface has no quote at this expiry"))
        } else {
            Ok(vec![p[0]])
        }
    });
    let mut optimizer = LevenbergMarquardtFactory::default()
        .optimizer(OptimizerRequest::new(objective, vec![0.0], vec![1.0]))
        .unwrap();

    let err = optimizer.run().unwrap_err();
    assert!(err.is_objective_failure());
    assert!(!optimizer.done());
}

// ============================================================================
// Warm restart
// ============================================================================

fn bounded_nelson_siegel_solver(targets: Vec<f64>) -> LevenbergMarquardt {
    let transformation = Arc::new(BoxTransformation::from_bounds(&nelson_siegel_bounds()).unwrap());
    let objective: Arc<dyn ObjectiveFunction> = Arc::new(TransformedObjective::new(
        Arc::new(nelson_siegel),
        transformation,
    ));
    LevenbergMarquardt::builder_shared(objective)
        .initial_parameters(vec![0.03, 0.0, 0.0, 0.0])
        .target_values(targets)
        .max_iterations(200)
        .build()
        .unwrap()
}

#[test]
fn test_warm_restart_on_bumped_quotes() {
    init_tracing();
    let quotes = nelson_siegel(&[0.04, -0.02, 0.01, 1.5]);
    let mut base = bounded_nelson_siegel_solver(quotes.clone());
    base.run().unwrap();
    let base_parameters = base.best_fit_parameters().to_vec();
    let base_iterations = base.iterations();

    // Parallel 1bp bump of every zero rate.
    let bumped: Vec<f64> = quotes.iter().map(|y| y + 1e-4).collect();
    let mut warm = base.clone_with_modified_targets(bumped.clone(), None, true).unwrap();
    let warm_fit = warm.run().unwrap();

    let mut cold = bounded_nelson_siegel_solver(bumped);
    let cold_fit = cold.run().unwrap();

    // A parallel shift only moves the level factor.
    assert_relative_eq!(warm_fit.parameters[0], 0.0401, epsilon = 1e-8);
    assert!(warm_fit.root_mean_squared_error < 1e-12);
    assert!(warm_fit.iterations < cold_fit.iterations);

    // The base calibration is untouched.
    assert_eq!(base.best_fit_parameters(), base_parameters.as_slice());
    assert_eq!(base.iterations(), base_iterations);
}

#[test]
fn test_clones_calibrate_concurrently_on_shared_pool() {
    init_tracing();
    let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap());
    let quotes = nelson_siegel(&[0.04, -0.02, 0.01, 1.5]);
    let mut base = bounded_nelson_siegel_solver(quotes.clone());
    base.set_worker_pool(WorkerPool::shared(Arc::clone(&pool))).unwrap();
    base.run().unwrap();

    let handles: Vec<_> = (1..=4)
        .map(|bump| {
            let targets: Vec<f64> = quotes.iter().map(|y| y + bump as f64 * 1e-4).collect();
            let mut clone = base.clone_with_modified_targets(targets, None, true).unwrap();
            std::thread::spawn(move || clone.run().unwrap())
        })
        .collect();

    for (bump, handle) in (1..=4).zip(handles) {
        let fit = handle.join().unwrap();
        assert_relative_eq!(fit.parameters[0], 0.04 + bump as f64 * 1e-4, epsilon = 1e-8);
    }

    // The solver never shuts down a caller's pool.
    assert!(base.worker_pool().is_shared());
    assert_eq!(pool.install(|| 40 + 2), 42);
}

// ============================================================================
// Worker pools
// ============================================================================

#[test]
fn test_thread_count_invariance_for_curve_fit() {
    let truth = [0.04, -0.02, 0.01, 1.5];
    let run_with = |threads: usize| {
        let config = LevenbergMarquardtConfig::default()
            .with_max_iterations(200)
            .with_number_of_threads(threads);
        let request =
            OptimizerRequest::new(nelson_siegel, vec![0.03, 0.0, 0.0, 1.0], nelson_siegel(&truth))
                .with_bounds(nelson_siegel_bounds());
        LevenbergMarquardtFactory::new(config)
            .optimizer(request)
            .unwrap()
            .run()
            .unwrap()
    };

    let single = run_with(1);
    for threads in [2, 4, 8] {
        assert_eq!(run_with(threads), single);
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_factory() {
    let path = std::env::temp_dir().join(format!("pricer_lm_integration_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        regularisation = "levenberg"
        max_iterations = 1
        "#,
    )
    .unwrap();
    let config = LevenbergMarquardtConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.regularisation, RegularisationMethod::Levenberg);
    let mut optimizer = LevenbergMarquardtFactory::new(config)
        .optimizer(OptimizerRequest::new(nelson_siegel, vec![0.03, 0.0, 0.0, 1.0], vec![0.04; 10]))
        .unwrap();
    let fit = optimizer.run().unwrap();
    assert_eq!(fit.status, SolverStatus::MaxIterations);
}

#[test]
fn test_config_load_without_file() {
    // No PRICER_LM_* variables are set by the test harness.
    let config = LevenbergMarquardtConfig::load(None).unwrap();
    assert!(config.validate().is_ok());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_diagonally_dominant_linear_systems_are_recovered(
        diagonal in prop::collection::vec(1.0f64..10.0, 3),
        off_diagonal in prop::collection::vec(-0.5f64..0.5, 6),
        solution in prop::collection::vec(-5.0f64..5.0, 3),
    ) {
        let mut a = [[0.0; 3]; 3];
        let mut next = off_diagonal.iter();
        for (i, row) in a.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = if i == j { diagonal[i] } else { *next.next().unwrap() };
            }
        }
        let model = move |p: &[f64]| -> Vec<f64> {
            a.iter().map(|row| row.iter().zip(p).map(|(x, y)| x * y).sum()).collect()
        };
        let targets = model(solution.as_slice());

        let mut solver = LevenbergMarquardt::builder(model)
            .initial_parameters(vec![0.0; 3])
            .target_values(targets)
            .build()
            .unwrap();
        let fit = solver.run().unwrap();

        for (fitted, expected) in fit.parameters.iter().zip(&solution) {
            prop_assert!((fitted - expected).abs() < 1e-6);
        }
        for pair in solver.history().windows(2) {
            prop_assert!(pair[1].current_error <= pair[0].current_error);
        }
    }
}
