//! Finite difference methods for numerical differentiation.
//!
//! The correlation models have no convenient analytic derivatives, so the solver
//! builds its Jacobian from forward differences of the residual vector.

use crate::error::{McorrError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Relative step for forward differences, about `sqrt(f64::EPSILON)`.
pub const DEFAULT_EPSILON: f64 = 1.49e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j]. `residuals`
/// must be the residuals already evaluated at `params`, so the cost is one
/// evaluation per parameter.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `residuals` - The residuals at `params`
/// * `epsilon` - The relative step size (optional)
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    jacobian_within(problem, params, residuals, epsilon, None)
}

/// Forward-difference Jacobian that never steps across an upper bound.
///
/// When `params[j] + h` would leave the box the difference is taken backwards
/// instead, so the model is only ever evaluated at feasible points.
pub fn jacobian_within<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    epsilon: Option<f64>,
    upper: Option<&[f64]>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    if residuals.len() != n_residuals {
        return Err(McorrError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }
    if let Some(upper) = upper {
        if upper.len() != n_params {
            return Err(McorrError::DimensionMismatch(format!(
                "Expected {} upper bounds, got {}",
                n_params,
                upper.len()
            )));
        }
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let param_j = params[j];
        let mut h = if param_j.abs() > eps { param_j.abs() * eps } else { eps };
        if let Some(upper) = upper {
            if param_j + h > upper[j] {
                h = -h;
            }
        }

        let mut params_perturbed = params.clone();
        params_perturbed[j] += h;
        let residuals_perturbed = problem.eval(&params_perturbed)?;

        for i in 0..n_residuals {
            let slope = (residuals_perturbed[i] - residuals[i]) / h;
            // a singular neighbour contributes no slope
            jac[[i, j]] = if slope.is_finite() { slope } else { 0.0 };
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // r1 = x^2 - 1, r2 = x*y - 2
    struct TestProblem;

    impl Problem for TestProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let x = params[0];
            let y = params[1];
            Ok(array![x.powi(2) - 1.0, x * y - 2.0])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_jacobian() {
        let params = array![2.0, 3.0];
        let residuals = TestProblem.eval(&params).unwrap();
        let jac = jacobian(&TestProblem, &params, &residuals, None).unwrap();

        assert_eq!(jac.shape(), &[2, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 0]], 3.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_backward_at_upper_bound() {
        let params = array![2.0, 3.0];
        let residuals = TestProblem.eval(&params).unwrap();
        let upper = [2.0, 3.0];
        let jac = jacobian_within(&TestProblem, &params, &residuals, None, Some(&upper)).unwrap();

        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_rejects_wrong_residual_length() {
        let params = array![2.0, 3.0];
        let residuals = array![1.0];
        assert!(jacobian(&TestProblem, &params, &residuals, None).is_err());
    }
}
