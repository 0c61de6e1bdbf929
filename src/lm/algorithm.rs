//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core damped Gauss-Newton loop, in an unbounded
//! form and in a projected form that keeps every iterate inside box bounds.

use faer::{Col, Mat};
use log::debug;
use ndarray::Array1;
use std::fmt;

use crate::error::{McorrError, Result};
use crate::parameters::Bounds;
use crate::problem::Problem;
use crate::utils::finite_difference::jacobian_within;
use crate::utils::matrix_convert::{
    faer_vec_to_ndarray, gram, ndarray_to_faer, ndarray_vec_to_faer, transpose_times,
};

use super::config::{DecompositionMethod, LmConfig};
use super::convergence::ConvergenceStatus;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// Why the loop stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
///
/// Damping follows Marquardt: the normal matrix `J^T J` is augmented with
/// `λ·diag(J^T J)`, λ shrinks after an accepted step and grows after a
/// rejected one. Trial points whose residuals are not finite count as rejected.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the budget of residual evaluations.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.config.max_evaluations = max_evaluations;
        self
    }

    /// Set the initial damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the method used to solve the damped normal equations.
    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.config.decomposition_method = method;
        self
    }

    /// Minimize the sum of squared residuals of an unconstrained problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        self.run(problem, initial_params, None)
    }

    /// Minimize with every parameter kept inside its bounds.
    ///
    /// Each trial point is projected into the interior of the box (see
    /// [`Bounds::make_strictly_feasible`]), the Jacobian is differentiated
    /// without leaving it and the gradient test ignores components that push
    /// against an active bound.
    pub fn minimize_bounded<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmResult> {
        if bounds.len() != initial_params.len() {
            return Err(McorrError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                initial_params.len(),
                bounds.len()
            )));
        }
        self.run(problem, initial_params, Some(bounds))
    }

    fn run<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
        bounds: Option<&[Bounds]>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(McorrError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let project = |x: Array1<f64>| -> Array1<f64> {
            match bounds {
                Some(b) => Array1::from_shape_fn(x.len(), |k| b[k].make_strictly_feasible(x[k])),
                None => x,
            }
        };
        let upper: Option<Vec<f64>> = bounds.map(|b| b.iter().map(|b| b.max).collect());

        let mut params = project(initial_params);
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;

        if residuals.len() != problem.residual_count() {
            return Err(McorrError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                problem.residual_count(),
                residuals.len()
            )));
        }

        let mut cost = sum_of_squares(&residuals);
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let status = 'outer: loop {
            if !cost.is_finite() {
                break ConvergenceStatus::NonFiniteStart;
            }
            if cost == 0.0 {
                break ConvergenceStatus::ZeroResidual;
            }
            if func_evals >= self.config.max_evaluations {
                break ConvergenceStatus::MaxEvaluationsReached;
            }

            let jacobian = match &upper {
                Some(upper) if !problem.has_custom_jacobian() => {
                    func_evals += n_params;
                    jacobian_within(problem, &params, &residuals, None, Some(upper.as_slice()))?
                }
                _ => {
                    if !problem.has_custom_jacobian() {
                        func_evals += n_params;
                    }
                    problem.jacobian(&params, &residuals)?
                }
            };

            let j = ndarray_to_faer(&jacobian);
            let r = ndarray_vec_to_faer(&residuals);
            let jtj = gram(&j);
            let g = transpose_times(&j, &r)?;

            let gradient_max = (0..n_params)
                .map(|k| {
                    let pinned = bounds.map_or(false, |b| {
                        (b[k].at_lower(params[k]) && g[k] > 0.0) || (b[k].at_upper(params[k]) && g[k] < 0.0)
                    });
                    if pinned {
                        0.0
                    } else {
                        g[k].abs()
                    }
                })
                .fold(0.0, f64::max);
            if gradient_max < self.config.gtol {
                break ConvergenceStatus::GradientConvergence;
            }

            loop {
                let step = match self.calculate_step(&j, &jtj, &g, lambda) {
                    Some(step) => faer_vec_to_ndarray(&step),
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            break 'outer ConvergenceStatus::LambdaOverflow;
                        }
                        continue;
                    }
                };

                let trial = project(&params + &step);
                let step_norm = norm(&(&trial - &params));
                let small_step = step_norm <= self.config.xtol * (norm(&params) + self.config.xtol);

                let trial_residuals = problem.eval(&trial)?;
                func_evals += 1;
                let trial_cost = if trial_residuals.iter().all(|r| r.is_finite()) {
                    sum_of_squares(&trial_residuals)
                } else {
                    f64::INFINITY
                };

                if trial_cost < cost {
                    let reduction = (cost - trial_cost) / cost;

                    params = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    iterations += 1;

                    if cost == 0.0 {
                        break 'outer ConvergenceStatus::ZeroResidual;
                    }
                    if reduction < self.config.ftol {
                        break 'outer ConvergenceStatus::FunctionValueConvergence;
                    }
                    if small_step {
                        break 'outer ConvergenceStatus::ParameterConvergence;
                    }
                    continue 'outer;
                }

                lambda *= self.config.lambda_up_factor;
                if small_step {
                    break 'outer ConvergenceStatus::ParameterConvergence;
                }
                if lambda > self.config.max_lambda {
                    break 'outer ConvergenceStatus::LambdaOverflow;
                }
                if func_evals >= self.config.max_evaluations {
                    break 'outer ConvergenceStatus::MaxEvaluationsReached;
                }
            }
        };

        debug!(
            "LM terminated after {} iterations / {} evaluations: {} (cost {:.6e})",
            iterations, func_evals, status, cost
        );

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message: status.description().to_string(),
        })
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// Solves `(J^T J + λD) δ = -J^T r` with `D = diag(J^T J)`; a column of
    /// zeros in `J` is damped with unit scale. Returns `None` if the system
    /// is numerically singular.
    fn calculate_step(&self, j: &Mat<f64>, jtj: &Mat<f64>, g: &Col<f64>, lambda: f64) -> Option<Col<f64>> {
        let n = jtj.nrows();
        let scale: Vec<f64> = (0..n)
            .map(|k| if jtj[(k, k)] > 0.0 { jtj[(k, k)] } else { 1.0 })
            .collect();

        match self.config.decomposition_method {
            DecompositionMethod::Cholesky => solve_cholesky(jtj, g, lambda, &scale),
            DecompositionMethod::QR => solve_qr(j, g, lambda, &scale),
            DecompositionMethod::Auto => {
                solve_cholesky(jtj, g, lambda, &scale).or_else(|| solve_qr(j, g, lambda, &scale))
            }
        }
    }
}

/// Cholesky solve of the damped normal equations.
fn solve_cholesky(jtj: &Mat<f64>, g: &Col<f64>, lambda: f64, scale: &[f64]) -> Option<Col<f64>> {
    let n = jtj.nrows();
    let a = Mat::from_fn(n, n, |i, k| {
        if i == k {
            jtj[(i, k)] + lambda * scale[i]
        } else {
            jtj[(i, k)]
        }
    });

    let mut l = Mat::<f64>::zeros(n, n);
    for col in 0..n {
        let mut diag = a[(col, col)];
        for k in 0..col {
            diag -= l[(col, k)] * l[(col, k)];
        }
        if !(diag > 0.0) || !diag.is_finite() {
            return None;
        }
        let diag = diag.sqrt();
        l[(col, col)] = diag;
        for row in (col + 1)..n {
            let mut sum = a[(row, col)];
            for k in 0..col {
                sum -= l[(row, k)] * l[(col, k)];
            }
            l[(row, col)] = sum / diag;
        }
    }

    // L y = -g
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = -g[i];
        for k in 0..i {
            sum -= l[(i, k)] * y[k];
        }
        y[i] = sum / l[(i, i)];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[(k, i)] * x[k];
        }
        x[i] = sum / l[(i, i)];
    }

    finite_col(&x)
}

/// Householder QR of the augmented matrix `[J; sqrt(λD)]`.
///
/// `AᵀA = RᵀR = JᵀJ + λD`, so the damped system is solved as `Rᵀ(Rδ) = -g`
/// without ever forming or factoring the normal matrix itself.
fn solve_qr(j: &Mat<f64>, g: &Col<f64>, lambda: f64, scale: &[f64]) -> Option<Col<f64>> {
    let m = j.nrows();
    let n = j.ncols();
    let rows = m + n;

    let mut a = Mat::from_fn(rows, n, |i, k| {
        if i < m {
            j[(i, k)]
        } else if i - m == k {
            (lambda * scale[k]).sqrt()
        } else {
            0.0
        }
    });

    for k in 0..n {
        let norm = (k..rows).map(|i| a[(i, k)] * a[(i, k)]).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        let alpha = if a[(k, k)] > 0.0 { -norm } else { norm };

        let mut v: Vec<f64> = (k..rows).map(|i| a[(i, k)]).collect();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|x| x * x).sum();
        if v_norm2 == 0.0 {
            continue;
        }

        for col in k..n {
            let dot: f64 = (k..rows).map(|i| v[i - k] * a[(i, col)]).sum();
            let factor = 2.0 * dot / v_norm2;
            for i in k..rows {
                a[(i, col)] -= factor * v[i - k];
            }
        }
    }

    // Rᵀ y = -g
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = -g[i];
        for k in 0..i {
            sum -= a[(k, i)] * y[k];
        }
        if a[(i, i)] == 0.0 {
            return None;
        }
        y[i] = sum / a[(i, i)];
    }

    // R δ = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= a[(i, k)] * x[k];
        }
        x[i] = sum / a[(i, i)];
    }

    finite_col(&x)
}

fn finite_col(x: &[f64]) -> Option<Col<f64>> {
    if x.iter().all(|v| v.is_finite()) {
        Some(Col::from_fn(x.len(), |i| x[i]))
    } else {
        None
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn norm(x: &Array1<f64>) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// y = a * x + b
    struct LinearModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for LinearModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let a = params[0];
            let b = params[1];
            Ok(Array1::from_shape_fn(self.x_data.len(), |i| {
                a * self.x_data[i] + b - self.y_data[i]
            }))
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    /// y = a * exp(-b * x)
    struct DecayModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl DecayModel {
        fn exact(a: f64, b: f64) -> Self {
            let x_data = Array1::linspace(0.0, 10.0, 21);
            let y_data = x_data.mapv(|x| a * (-b * x).exp());
            Self { x_data, y_data }
        }
    }

    impl Problem for DecayModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let (a, b) = (params[0], params[1]);
            Ok(Array1::from_shape_fn(self.x_data.len(), |i| {
                a * (-b * self.x_data[i]).exp() - self.y_data[i]
            }))
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    /// Two observations of a constant; sqrt(p) makes p < 0 non-finite.
    struct RootModel {
        target: f64,
    }

    impl Problem for RootModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let p = params[0].sqrt();
            Ok(array![p - self.target, p - self.target])
        }

        fn parameter_count(&self) -> usize {
            1
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_linear_fit() {
        let model = LinearModel {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![5.1, 7.0, 8.9, 11.2, 13.0],
        };

        let lm = LevenbergMarquardt::new();
        let result = lm.minimize(&model, array![1.0, 1.0]).unwrap();

        assert!(result.success, "{}", result.message);
        assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 0.2);
        assert!(result.cost < 0.1);
        assert_relative_eq!(result.cost, sum_of_squares(&result.residuals), epsilon = 1e-12);
    }

    #[test]
    fn test_decay_fit_with_each_decomposition() {
        let model = DecayModel::exact(2.0, 0.5);

        for method in [
            DecompositionMethod::Auto,
            DecompositionMethod::Cholesky,
            DecompositionMethod::QR,
        ] {
            let lm = LevenbergMarquardt::new().with_decomposition_method(method);
            let result = lm.minimize(&model, array![1.0, 0.2]).unwrap();

            assert!(result.success, "{:?}: {}", method, result.message);
            assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-5);
            assert_relative_eq!(result.params[1], 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bounded_fit_stops_at_active_bound() {
        let model = LinearModel {
            x_data: array![0.0, 0.0],
            y_data: array![5.0, 5.0],
        };
        // the slope has no effect here; fix its range to a point
        let bounds = [Bounds::new(0.0, 0.0).unwrap(), Bounds::new(0.0, 3.0).unwrap()];

        let lm = LevenbergMarquardt::new();
        let result = lm.minimize_bounded(&model, array![0.0, 1.0], &bounds).unwrap();

        assert!(result.success, "{}", result.message);
        assert!(result.params[1] < 3.0);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 1e-8);
        assert_relative_eq!(result.cost, 8.0, epsilon = 1e-8);
    }

    #[test]
    fn test_bounded_iterates_stay_inside() {
        // the unconstrained optimum a = -1 lies past the bound a >= 0
        let model = LinearModel {
            x_data: array![1.0, 1.0, 1.0],
            y_data: array![-1.0, -1.0, -1.0],
        };
        let bounds = [Bounds::min_only(0.0), Bounds::new(0.0, 0.0).unwrap()];

        let lm = LevenbergMarquardt::new();
        let result = lm.minimize_bounded(&model, array![0.5, 0.0], &bounds).unwrap();

        assert!(result.success, "{}", result.message);
        assert!(result.params[0] > 0.0);
        assert!((1.0 / result.params[0]).is_finite());
        assert_relative_eq!(result.params[0], 0.0, epsilon = 1e-8);
        assert_relative_eq!(result.cost, 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_initial_point_is_projected() {
        let model = LinearModel {
            x_data: array![1.0, 2.0],
            y_data: array![1.0, 2.0],
        };
        let bounds = [Bounds::min_only(0.0), Bounds::min_only(0.0)];

        let lm = LevenbergMarquardt::new();
        let result = lm.minimize_bounded(&model, array![-4.0, -4.0], &bounds).unwrap();

        assert!(result.params.iter().all(|&p| p >= 0.0));
        assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_evaluation_budget() {
        let model = DecayModel::exact(2.0, 0.5);

        let lm = LevenbergMarquardt::new().with_max_evaluations(3);
        let result = lm.minimize(&model, array![1.0, 0.2]).unwrap();

        assert!(!result.success);
        assert_eq!(result.status, ConvergenceStatus::MaxEvaluationsReached);
        assert!(result.message.contains("function evaluations"));
    }

    #[test]
    fn test_non_finite_start() {
        let lm = LevenbergMarquardt::new();
        let result = lm.minimize(&RootModel { target: 2.0 }, array![-1.0]).unwrap();

        assert!(!result.success);
        assert_eq!(result.status, ConvergenceStatus::NonFiniteStart);
        assert_eq!(result.func_evals, 1);
    }

    #[test]
    fn test_non_finite_trial_points_are_rejected() {
        // an undamped step from p = 0.01 overshoots to negative p
        let lm = LevenbergMarquardt::new().with_lambda(1e-12);
        let result = lm.minimize(&RootModel { target: 0.0 }, array![0.01]).unwrap();

        assert!(result.params[0] >= 0.0);
        assert!(result.cost.is_finite());
        assert!(result.cost < 0.02);
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = DecayModel::exact(2.0, 0.5);
        let lm = LevenbergMarquardt::new();

        assert!(lm.minimize(&model, array![1.0]).is_err());
        assert!(lm
            .minimize_bounded(&model, array![1.0, 0.2], &[Bounds::unbounded()])
            .is_err());
    }
}
