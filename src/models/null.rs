//! Zero-recombination (clonal) correlation model.

use crate::error::Result;
use crate::model::{BaseModel, Model};
use crate::parameters::Parameters;
use ndarray::Array1;

use super::p2::calc_p2_clonal;

/// Flat correlation profile `2θ / (1 + 2θa)` with a single free `thetaS >= 0`.
///
/// The closed-form solver in [`crate::fit::null_model`] is what model
/// comparison uses; this model fits the same hypothesis iteratively.
pub struct ZeroRecombinationModel {
    model: BaseModel,
}

impl ZeroRecombinationModel {
    pub fn new(ds: f64, theta_s: f64, a: f64) -> Result<Self> {
        let mut parameters = Parameters::new();
        parameters.add_fixed("ds", ds)?;
        parameters.add_param_with_bounds("thetaS", theta_s, 0.0, f64::INFINITY)?;
        parameters.add_fixed("a", a)?;

        let model = BaseModel::new(parameters, |params, x| {
            let theta_s = params.value("thetaS")?;
            let a = params.value("a")?;
            Ok(Array1::from_elem(x.len(), calc_p2_clonal(theta_s, a)))
        });

        Ok(Self { model })
    }

    /// `thetaS / (1 + a*thetaS)` at the current values.
    pub fn d_clonal(&self) -> Result<f64> {
        let theta_s = self.parameters().value("thetaS")?;
        let a = self.parameters().value("a")?;
        Ok(theta_s / (1.0 + a * theta_s))
    }
}

impl Model for ZeroRecombinationModel {
    fn parameters(&self) -> &Parameters {
        self.model.parameters()
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        self.model.parameters_mut()
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.model.eval_with(params, x)
    }
}
