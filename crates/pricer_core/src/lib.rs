//! # pricer_core: Foundation for Least-Squares Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core serves as the bottom layer of the calibration stack, providing:
//! - The objective-function contract consumed by every solver (`traits::objective`)
//! - Parameter bounds and solver/model space transformations (`traits::calibration`)
//! - Error types: `SolverError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::traits::ObjectiveFunction;
//! use pricer_core::types::SolverError;
//!
//! // A two-quote model: par rate and forward
//! let model = |p: &[f64]| vec![p[1], 2.0 * p[0] + p[1]];
//!
//! let values: Result<Vec<f64>, SolverError> = model.evaluate(&[2.5, 5.0]);
//! assert_eq!(values.unwrap(), vec![5.0, 10.0]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for `SolverError` and `ParameterBounds`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod traits;
pub mod types;
