//! Damping policies for the approximate Hessian.

use std::fmt;
use std::str::FromStr;

use pricer_core::types::SolverError;
use serde::{Deserialize, Serialize};

/// How the damping factor λ enters the diagonal of `JᵀWJ`.
///
/// # Variants
///
/// - `Levenberg`: Additive damping, `H_ii + λ`. Preferred when parameters
///   are already on a common scale.
/// - `LevenbergMarquardt`: Multiplicative damping, `H_ii·(1 + λ)` (default).
///   Equalises step sizes across parameters of very different magnitude.
///   A zero diagonal entry (a parameter with no local sensitivity) is
///   replaced by `λ` so the system never becomes structurally singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularisationMethod {
    /// Constant λ added to the diagonal.
    Levenberg,
    /// Diagonal scaled by (1 + λ).
    #[default]
    LevenbergMarquardt,
}

impl RegularisationMethod {
    /// Apply the damping to one diagonal entry of `JᵀWJ`.
    #[inline]
    pub fn damp(self, diagonal: f64, lambda: f64) -> f64 {
        match self {
            Self::Levenberg => diagonal + lambda,
            Self::LevenbergMarquardt => {
                if diagonal == 0.0 {
                    lambda
                } else {
                    diagonal * (1.0 + lambda)
                }
            }
        }
    }

    /// Configuration name of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Levenberg => "levenberg",
            Self::LevenbergMarquardt => "levenberg_marquardt",
        }
    }
}

impl FromStr for RegularisationMethod {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "levenberg" => Ok(Self::Levenberg),
            "levenberg_marquardt" => Ok(Self::LevenbergMarquardt),
            other => Err(SolverError::invalid_config(format!(
                "unknown regularisation method '{}'. Must be one of: levenberg, levenberg_marquardt",
                other
            ))),
        }
    }
}

impl fmt::Display for RegularisationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
