//! Change-of-variables transformations for box-bounded calibration.
//!
//! The damped Gauss-Newton core works on the whole real line. To calibrate
//! a parameter with box bounds, the solver moves an unconstrained
//! coordinate `s` and the model receives `m = T(s)`:
//!
//! | Bounds        | `T(s)`                         | `T⁻¹(m)`                  |
//! |---------------|--------------------------------|---------------------------|
//! | none          | `s`                            | `m`                       |
//! | `[lo, ∞)`     | `lo + eˢ`                      | `ln(m − lo)`              |
//! | `(−∞, hi]`    | `hi − eˢ`                      | `ln(hi − m)`              |
//! | `[lo, hi]`    | `lo + (hi − lo) / (1 + e⁻ˢ)`   | `ln((m − lo) / (hi − m))` |
//!
//! Every map is strictly monotone, so a local optimum in solver space is a
//! local optimum in model space.

use std::sync::Arc;

use pricer_core::traits::{Jacobian, ObjectiveFunction, ParameterBounds, ParameterTransformation};
use pricer_core::types::SolverError;

/// Transformation of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Unbounded parameter.
    Identity,
    /// Parameter bounded below.
    Lower(f64),
    /// Parameter bounded above.
    Upper(f64),
    /// Parameter bounded on both sides.
    Interval {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
}

impl Transform {
    /// Pick the transformation matching `bounds`.
    pub fn from_bounds(bounds: &ParameterBounds) -> Result<Self, SolverError> {
        if !bounds.is_valid() {
            return Err(SolverError::invalid_input(format!(
                "invalid parameter bounds [{}, {}]",
                bounds.min, bounds.max
            )));
        }
        Ok(match (bounds.has_lower(), bounds.has_upper()) {
            (false, false) => Self::Identity,
            (true, false) => Self::Lower(bounds.min),
            (false, true) => Self::Upper(bounds.max),
            (true, true) => Self::Interval {
                lower: bounds.min,
                upper: bounds.max,
            },
        })
    }

    /// Solver coordinate to model value.
    #[inline]
    pub fn to_model(&self, s: f64) -> f64 {
        match *self {
            Self::Identity => s,
            Self::Lower(lower) => lower + s.exp(),
            Self::Upper(upper) => upper - s.exp(),
            Self::Interval { lower, upper } => lower + (upper - lower) * logistic(s),
        }
    }

    /// Model value to solver coordinate.
    ///
    /// Values on or outside a finite bound have no preimage and map to a
    /// non-finite coordinate.
    #[inline]
    pub fn to_solver(&self, m: f64) -> f64 {
        match *self {
            Self::Identity => m,
            Self::Lower(lower) => (m - lower).ln(),
            Self::Upper(upper) => (upper - m).ln(),
            Self::Interval { lower, upper } => ((m - lower) / (upper - m)).ln(),
        }
    }

    /// `dm/ds` at solver coordinate `s`.
    #[inline]
    pub fn derivative(&self, s: f64) -> f64 {
        match *self {
            Self::Identity => 1.0,
            Self::Lower(_) => s.exp(),
            Self::Upper(_) => -s.exp(),
            Self::Interval { lower, upper } => {
                let sigma = logistic(s);
                (upper - lower) * sigma * (1.0 - sigma)
            }
        }
    }
}

/// Overflow-free `1 / (1 + e^(-s))`.
#[inline]
fn logistic(s: f64) -> f64 {
    if s >= 0.0 {
        1.0 / (1.0 + (-s).exp())
    } else {
        let e = s.exp();
        e / (1.0 + e)
    }
}

/// Elementwise box-bound transformation.
///
/// # Example
///
/// ```
/// use pricer_core::traits::{ParameterBounds, ParameterTransformation};
/// use pricer_optimiser::calibration::BoxTransformation;
///
/// let t = BoxTransformation::from_bounds(&[
///     ParameterBounds::positive(),
///     ParameterBounds::correlation(),
/// ]).unwrap();
///
/// let model = t.to_model(&[0.0, 0.0]);
/// assert_eq!(model, vec![1.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoxTransformation {
    transforms: Vec<Transform>,
}

impl BoxTransformation {
    /// One transformation per parameter bound.
    pub fn from_bounds(bounds: &[ParameterBounds]) -> Result<Self, SolverError> {
        let transforms = bounds
            .iter()
            .map(Transform::from_bounds)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { transforms })
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl ParameterTransformation for BoxTransformation {
    fn to_model(&self, solver: &[f64]) -> Vec<f64> {
        self.transforms
            .iter()
            .zip(solver)
            .map(|(t, s)| t.to_model(*s))
            .collect()
    }

    fn to_solver(&self, model: &[f64]) -> Vec<f64> {
        self.transforms
            .iter()
            .zip(model)
            .map(|(t, m)| t.to_solver(*m))
            .collect()
    }

    fn model_derivative(&self, solver: &[f64]) -> Vec<f64> {
        self.transforms
            .iter()
            .zip(solver)
            .map(|(t, s)| t.derivative(*s))
            .collect()
    }
}

/// Objective seen through a parameter transformation.
///
/// Evaluates the wrapped model at `to_model(s)`. Analytic Jacobians are
/// chained: `∂f_k/∂s_i = ∂f_k/∂m_i · dm_i/ds_i`.
#[derive(Clone)]
pub struct TransformedObjective {
    inner: Arc<dyn ObjectiveFunction>,
    transformation: Arc<dyn ParameterTransformation>,
}

impl TransformedObjective {
    /// Wrap `inner` so that it accepts solver-space parameters.
    pub fn new(
        inner: Arc<dyn ObjectiveFunction>,
        transformation: Arc<dyn ParameterTransformation>,
    ) -> Self {
        Self {
            inner,
            transformation,
        }
    }
}

impl ObjectiveFunction for TransformedObjective {
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, SolverError> {
        self.inner.evaluate(&self.transformation.to_model(parameters))
    }

    fn derivatives(&self, parameters: &[f64]) -> Option<Result<Jacobian, SolverError>> {
        let model = self.transformation.to_model(parameters);
        let jacobian = self.inner.derivatives(&model)?;
        let scale = self.transformation.model_derivative(parameters);
        Some(jacobian.map(|rows| {
            rows.into_iter()
                .zip(scale)
                .map(|(row, d)| row.into_iter().map(|v| v * d).collect())
                .collect()
        }))
    }
}
