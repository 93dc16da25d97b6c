//! Core traits for least-squares calibration.
//!
//! This module defines the seams between calibration routines and the
//! numerical solvers that drive them:
//! - Objective functions (`ObjectiveFunction` trait)
//! - Parameter bounds and solver/model space maps (`ParameterTransformation` trait)
//!
//! Solvers hold objectives as `Arc<dyn ObjectiveFunction>` so that a
//! calibration can be cloned for a perturbed market snapshot without
//! duplicating the model.

pub mod calibration;
pub mod objective;

pub use calibration::{ParameterBounds, ParameterTransformation};
pub use objective::{Jacobian, ObjectiveFunction, TryObjective, WithJacobian};
