//! Levenberg-Marquardt algorithm implementation.
//!
//! A damped Gauss-Newton solver for nonlinear least squares with forward
//! difference Jacobians, Marquardt diagonal scaling and an optional projected
//! mode for box-bounded parameters.

pub mod algorithm;
pub mod config;
pub mod convergence;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig, SolverMethod};
pub use convergence::ConvergenceStatus;
