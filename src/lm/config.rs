//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the solver methods, convergence tolerances, damping
//! schedule and linear-solve strategy used by [`super::LevenbergMarquardt`].

use crate::error::McorrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How bounded parameters are handed to the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Levenberg-Marquardt on the parameters themselves, with every trial
    /// point projected back onto the bounds.
    #[default]
    #[serde(rename = "least_squares")]
    LeastSquares,

    /// Levenberg-Marquardt on Minuit-transformed internal coordinates.
    #[serde(rename = "leastsq")]
    LeastSq,
}

impl SolverMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SolverMethod::LeastSquares => "least_squares",
            SolverMethod::LeastSq => "leastsq",
        }
    }
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverMethod {
    type Err = McorrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "least_squares" => Ok(SolverMethod::LeastSquares),
            "leastsq" => Ok(SolverMethod::LeastSq),
            other => Err(McorrError::UnknownMethod(other.to_string())),
        }
    }
}

/// Method for solving the linear system in the Levenberg-Marquardt step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecompositionMethod {
    /// Cholesky factorization of the damped normal equations (fastest, needs
    /// a positive definite matrix)
    Cholesky,

    /// Householder QR of the augmented system `[J; sqrt(λD)]` (more stable)
    QR,

    /// Cholesky, falling back to QR when the factorization breaks down
    #[default]
    Auto,
}

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Budget of residual evaluations, Jacobian columns included. Default: 1_000_000
    pub max_evaluations: usize,

    /// Relative reduction of the cost below which an accepted step ends the fit. Default: 1e-10
    pub ftol: f64,

    /// Relative step length below which the fit ends. Default: 1e-10
    pub xtol: f64,

    /// Largest (projected) gradient component accepted as stationary. Default: 1e-12
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda after a rejected step. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda after an accepted step. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Lambda beyond which the fit gives up. Default: 1e16
    pub max_lambda: f64,

    /// Method to use for solving the linear system. Default: Auto
    pub decomposition_method: DecompositionMethod,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 1_000_000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e16,
            decomposition_method: DecompositionMethod::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!("least_squares".parse::<SolverMethod>().unwrap(), SolverMethod::LeastSquares);
        assert_eq!("leastsq".parse::<SolverMethod>().unwrap(), SolverMethod::LeastSq);
        assert_eq!(SolverMethod::LeastSq.to_string(), "leastsq");

        match "nelder".parse::<SolverMethod>() {
            Err(McorrError::UnknownMethod(name)) => assert_eq!(name, "nelder"),
            other => panic!("expected UnknownMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_method_serde_uses_cli_names() {
        let json = serde_json::to_string(&SolverMethod::LeastSquares).unwrap();
        assert_eq!(json, "\"least_squares\"");
        let method: SolverMethod = serde_json::from_str("\"leastsq\"").unwrap();
        assert_eq!(method, SolverMethod::LeastSq);
    }
}
