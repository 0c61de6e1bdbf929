//! Model trait and basic model implementations.
//!
//! This module defines the Model trait, which provides a common interface for
//! fitting models to data, the adapter that turns a model plus data into a
//! [`Problem`] for the optimizer, and the lmfit-style statistics reported after
//! a fit.

use crate::error::{McorrError, Result};
use crate::lm::{LevenbergMarquardt, SolverMethod};
use crate::parameters::Parameters;
use crate::problem::Problem;
use ndarray::Array1;

/// A trait representing a model that can be fit to data.
///
/// Models evaluate a function of the independent variable using a set of
/// named [`Parameters`]. Evaluation takes the parameter set explicitly so the
/// optimizer can evaluate trial points without mutating the model.
pub trait Model {
    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &Parameters;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Evaluates the model at `x` using the given parameter values.
    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluates the model at `x` using the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(self.parameters(), x)
    }

    /// Calculates the residuals (y_pred - y_obs) using the current parameter values.
    fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        residuals_with(self, self.parameters(), x, y)
    }

    /// Returns the number of varying parameters in the model.
    fn varying_parameter_count(&self) -> usize {
        self.parameters().varying_count()
    }

    /// Returns the names of all parameters in the model.
    fn parameter_names(&self) -> Vec<String> {
        self.parameters().iter().map(|p| p.name().to_string()).collect()
    }

    /// Returns the names of varying parameters in the model.
    fn varying_parameter_names(&self) -> Vec<String> {
        self.parameters()
            .varying()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect()
    }
}

fn residuals_with<M: Model + ?Sized>(
    model: &M,
    params: &Parameters,
    x: &Array1<f64>,
    y: &Array1<f64>,
) -> Result<Array1<f64>> {
    let y_pred = model.eval_with(params, x)?;

    if y.len() != y_pred.len() {
        return Err(McorrError::DimensionMismatch(format!(
            "Expected {} observed values, got {}",
            y_pred.len(),
            y.len()
        )));
    }

    Ok(y_pred - y)
}

/// The coordinates in which a [`ModelProblem`] exposes the varying parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinates {
    /// Parameter values as they are; the solver must respect the bounds.
    External,

    /// Minuit-transformed values; any real vector maps inside the bounds.
    Internal,
}

impl From<SolverMethod> for Coordinates {
    fn from(method: SolverMethod) -> Self {
        match method {
            SolverMethod::LeastSquares => Coordinates::External,
            SolverMethod::LeastSq => Coordinates::Internal,
        }
    }
}

/// An adapter that implements [`Problem`] for Model implementations.
///
/// The optimizer's vector holds the varying parameters in insertion order;
/// fixed parameters are read from the model's own collection.
pub struct ModelProblem<'a, M: Model> {
    /// The model being adapted
    model: &'a M,
    /// The x data for the fit
    x_data: Array1<f64>,
    /// The y data for the fit
    y_data: Array1<f64>,
    coordinates: Coordinates,
}

impl<'a, M: Model> ModelProblem<'a, M> {
    /// Create a new ModelProblem adapter for a Model implementation
    pub fn new(
        model: &'a M,
        x_data: Array1<f64>,
        y_data: Array1<f64>,
        coordinates: Coordinates,
    ) -> Result<Self> {
        if x_data.len() != y_data.len() {
            return Err(McorrError::DimensionMismatch(format!(
                "Expected x and y data to have the same length, got {} and {}",
                x_data.len(),
                y_data.len()
            )));
        }
        Ok(Self {
            model,
            x_data,
            y_data,
            coordinates,
        })
    }

    /// Get a reference to the x data
    pub fn x_data(&self) -> &Array1<f64> {
        &self.x_data
    }

    /// Get a reference to the y data
    pub fn y_data(&self) -> &Array1<f64> {
        &self.y_data
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.x_data.len()
    }

    /// Get the number of varying parameters
    pub fn nvarys(&self) -> usize {
        self.model.varying_parameter_count()
    }

    /// The model's current varying parameters as a solver vector.
    pub fn initial_vector(&self) -> Result<Array1<f64>> {
        let params = self.model.parameters();
        let values = match self.coordinates {
            Coordinates::External => params.varying_values(),
            Coordinates::Internal => params.varying_internal_values()?,
        };
        Ok(Array1::from_vec(values))
    }

    /// The model's parameters with the varying ones replaced by `values`.
    pub fn parameters_at(&self, values: &Array1<f64>) -> Result<Parameters> {
        let mut params = self.model.parameters().clone();
        let values = values.to_vec();
        match self.coordinates {
            Coordinates::External => params.update_from_external(&values)?,
            Coordinates::Internal => params.update_from_internal(&values)?,
        }
        Ok(params)
    }
}

impl<'a, M: Model> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let parameters = self.parameters_at(params)?;
        residuals_with(self.model, &parameters, &self.x_data, &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        self.nvarys()
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

/// A model defined by a closure over its parameters.
///
/// ```
/// use mcorr_fit::model::{BaseModel, Model};
/// use mcorr_fit::parameters::Parameters;
/// use ndarray::array;
///
/// let mut params = Parameters::new();
/// params.add_param("level", 0.5).unwrap();
///
/// let model = BaseModel::new(params, |p, x| {
///     let level = p.value("level")?;
///     Ok(x.mapv(|_| level))
/// });
/// assert_eq!(model.eval(&array![1.0, 2.0]).unwrap(), array![0.5, 0.5]);
/// ```
pub struct BaseModel {
    /// The parameters for the model
    parameters: Parameters,
    /// The function to evaluate the model
    eval_func: Box<dyn Fn(&Parameters, &Array1<f64>) -> Result<Array1<f64>> + Send + Sync>,
}

impl BaseModel {
    /// Create a new BaseModel with the given parameters and evaluation function
    pub fn new<F>(parameters: Parameters, eval_func: F) -> Self
    where
        F: Fn(&Parameters, &Array1<f64>) -> Result<Array1<f64>> + Send + Sync + 'static,
    {
        Self {
            parameters,
            eval_func: Box::new(eval_func),
        }
    }
}

impl Model for BaseModel {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        (self.eval_func)(params, x)
    }
}

/// Goodness-of-fit statistics computed the way lmfit reports them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitStatistics {
    /// Number of data points
    pub ndata: usize,
    /// Number of varying parameters
    pub nvarys: usize,
    /// Degrees of freedom, `ndata - nvarys`
    pub nfree: i64,
    /// Sum of squared residuals
    pub chisqr: f64,
    /// `chisqr / max(1, nfree)`
    pub redchi: f64,
    /// `ndata * ln(max(chisqr, 1e-250) / ndata) + 2 * nvarys`
    pub aic: f64,
}

impl FitStatistics {
    pub fn from_residuals(residuals: &Array1<f64>, nvarys: usize) -> Self {
        let ndata = residuals.len();
        let chisqr: f64 = residuals.iter().map(|r| r * r).sum();
        let nfree = ndata as i64 - nvarys as i64;
        let redchi = chisqr / nfree.max(1) as f64;
        let n = ndata as f64;
        // f64::max would turn a NaN chi-square into the floor
        let floored = if chisqr.is_nan() { chisqr } else { chisqr.max(1e-250) };
        let aic = n * (floored / n).ln() + 2.0 * nvarys as f64;

        Self {
            ndata,
            nvarys,
            nfree,
            chisqr,
            redchi,
            aic,
        }
    }
}

/// Result of fitting a model to data
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Whether the fit converged
    pub success: bool,

    /// Residuals (predicted - observed) at the solution
    pub residuals: Array1<f64>,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// A message describing the result
    pub message: String,

    /// Varying parameter values before the fit, in insertion order
    pub init_values: Vec<(String, f64)>,

    /// The fitted parameter set, fixed parameters included
    pub params: Parameters,

    pub statistics: FitStatistics,
}

/// Fit a model to data
///
/// The varying parameters are handed to `optimizer` in the coordinates that
/// `method` selects and the model's parameters are updated with the final
/// iterate, whether or not the fit converged.
pub fn fit<M: Model>(
    model: &mut M,
    x_data: Array1<f64>,
    y_data: Array1<f64>,
    method: SolverMethod,
    optimizer: &LevenbergMarquardt,
) -> Result<FitResult> {
    if x_data.is_empty() {
        return Err(McorrError::InvalidInput("no data points to fit".to_string()));
    }

    let init_values: Vec<(String, f64)> = model
        .parameters()
        .varying()
        .into_iter()
        .map(|p| (p.name().to_string(), p.value()))
        .collect();

    let (result, params) = {
        let problem = ModelProblem::new(&*model, x_data, y_data, method.into())?;
        let initial = problem.initial_vector()?;

        let result = match method {
            SolverMethod::LeastSquares => {
                let bounds = model.parameters().varying_bounds();
                optimizer.minimize_bounded(&problem, initial, &bounds)?
            }
            SolverMethod::LeastSq => optimizer.minimize(&problem, initial)?,
        };
        let params = problem.parameters_at(&result.params)?;
        (result, params)
    };

    *model.parameters_mut() = params.clone();
    let statistics = FitStatistics::from_residuals(&result.residuals, params.varying_count());

    Ok(FitResult {
        success: result.success,
        residuals: result.residuals,
        iterations: result.iterations,
        func_evals: result.func_evals,
        message: result.message,
        init_values,
        params,
        statistics,
    })
}
