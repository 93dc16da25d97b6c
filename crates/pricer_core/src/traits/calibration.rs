//! Calibration bounds and parameter-space transformations.
//!
//! This module defines the abstractions calibration routines use to keep
//! model parameters admissible while the solver works in an unconstrained
//! space:
//! - [`ParameterBounds`]: Box bounds for a single parameter
//! - [`ParameterTransformation`]: Monotone map between solver space and model space
//!
//! The least-squares core never sees bounds. A caller that needs, say, a
//! strictly positive volatility wraps its objective in a transformation so
//! that every solver-space vector maps to an admissible model-space vector.
//!
//! # Example
//!
//! ```
//! use pricer_core::traits::calibration::{ParameterBounds, ParameterTransformation};
//!
//! // Model space is (0, inf), solver space is the real line.
//! struct LogPositive;
//!
//! impl ParameterTransformation for LogPositive {
//!     fn to_model(&self, solver: &[f64]) -> Vec<f64> {
//!         solver.iter().map(|s| s.exp()).collect()
//!     }
//!     fn to_solver(&self, model: &[f64]) -> Vec<f64> {
//!         model.iter().map(|m| m.ln()).collect()
//!     }
//!     fn model_derivative(&self, solver: &[f64]) -> Vec<f64> {
//!         solver.iter().map(|s| s.exp()).collect()
//!     }
//! }
//!
//! let t = LogPositive;
//! let model = t.to_model(&[0.0]);
//! assert!((model[0] - 1.0).abs() < 1e-15);
//! assert!(ParameterBounds::positive().contains(model[0]));
//! ```

/// Bounds for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl ParameterBounds {
    /// Create new bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create bounds for a strictly positive parameter.
    pub fn positive() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Create bounds for a parameter in [0, 1].
    pub fn unit_interval() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    /// Create bounds for a correlation in [-1, 1].
    pub fn correlation() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
        }
    }

    /// Create unbounded.
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Whether the lower bound is finite.
    pub fn has_lower(&self) -> bool {
        self.min.is_finite()
    }

    /// Whether the upper bound is finite.
    pub fn has_upper(&self) -> bool {
        self.max.is_finite()
    }

    /// Bounds are well formed: no NaN and `min < max`.
    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min < self.max
    }

    /// Check if a value is within bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if a value lies strictly inside the bounds.
    ///
    /// Change-of-variables transformations only reach the open interval,
    /// so an initial guess on a finite bound has no solver-space preimage.
    pub fn contains_strictly(&self, value: f64) -> bool {
        let above = !self.has_lower() || value > self.min;
        let below = !self.has_upper() || value < self.max;
        !value.is_nan() && above && below
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Monotone, elementwise map between solver space and model space.
///
/// Implementations must satisfy `to_solver(to_model(s)) == s` up to
/// floating-point error, and `to_model` must map every finite solver-space
/// vector into the admissible model region.
pub trait ParameterTransformation: Send + Sync {
    /// Map unconstrained solver coordinates to model parameters.
    fn to_model(&self, solver: &[f64]) -> Vec<f64>;

    /// Map model parameters to unconstrained solver coordinates.
    fn to_solver(&self, model: &[f64]) -> Vec<f64>;

    /// Elementwise derivative `d model_i / d solver_i` at `solver`.
    ///
    /// Used to chain analytic Jacobians through the transformation.
    fn model_derivative(&self, solver: &[f64]) -> Vec<f64>;
}
