//! Termination states of the Levenberg-Marquardt loop.

use std::fmt;

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The relative reduction of the cost fell below `ftol`.
    FunctionValueConvergence,

    /// The step became shorter than `xtol` relative to the parameters.
    ParameterConvergence,

    /// The (projected) gradient vanished.
    GradientConvergence,

    /// A perfect fit: the cost is exactly zero.
    ZeroResidual,

    /// The evaluation budget ran out.
    MaxEvaluationsReached,

    /// Damping grew past `max_lambda` without finding a better point.
    LambdaOverflow,

    /// The starting point already produced non-finite residuals.
    NonFiniteStart,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::GradientConvergence
                | ConvergenceStatus::ZeroResidual
        )
    }

    /// Human readable termination message, reported in fit summaries.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::FunctionValueConvergence => {
                "The relative reduction in the sum of squares is at most ftol"
            }
            ConvergenceStatus::ParameterConvergence => {
                "The relative error between two consecutive iterates is at most xtol"
            }
            ConvergenceStatus::GradientConvergence => "The gradient norm is below gtol",
            ConvergenceStatus::ZeroResidual => "The sum of squares is exactly zero",
            ConvergenceStatus::MaxEvaluationsReached => {
                "The maximum number of function evaluations is exceeded"
            }
            ConvergenceStatus::LambdaOverflow => {
                "Failed to decrease the sum of squares before the damping reached its maximum"
            }
            ConvergenceStatus::NonFiniteStart => "The initial residuals are not finite",
        }
    }
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convergence_status_methods() {
        assert!(ConvergenceStatus::ParameterConvergence.is_converged());
        assert!(ConvergenceStatus::FunctionValueConvergence.is_converged());
        assert!(ConvergenceStatus::GradientConvergence.is_converged());
        assert!(ConvergenceStatus::ZeroResidual.is_converged());
        assert!(!ConvergenceStatus::MaxEvaluationsReached.is_converged());
        assert!(!ConvergenceStatus::LambdaOverflow.is_converged());
        assert!(!ConvergenceStatus::NonFiniteStart.is_converged());

        assert!(ConvergenceStatus::MaxEvaluationsReached
            .to_string()
            .contains("function evaluations"));
    }
}
