//! Core value and error types.
//!
//! This module provides:
//! - `error`: Structured error types for least-squares solver operations
//!
//! # Re-exports
//!
//! For convenience, [`SolverError`] is re-exported at this module level.

pub mod error;

pub use error::SolverError;
