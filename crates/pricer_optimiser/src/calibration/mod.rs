//! Calibration helpers around the least-squares solvers.
//!
//! - `transform`: Box bounds as a change of variables between solver space
//!   and model space

pub mod transform;

pub use transform::{BoxTransformation, Transform, TransformedObjective};
