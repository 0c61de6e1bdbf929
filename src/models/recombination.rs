//! The coalescent correlation model with recombination.

use crate::error::{McorrError, Result};
use crate::model::Model;
use crate::parameters::Parameters;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::derived::{theta_p_denominator, DerivedParameters};
use super::kernels::FragmentKernel;
use super::p2::calc_p2;
use super::ModelConstants;

/// Starting values of the free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialGuess {
    pub theta_s: f64,
    /// Mean fragment size; ignored when the fragment size is fixed
    pub fragment: f64,
    pub phi_s: f64,
}

impl Default for InitialGuess {
    fn default() -> Self {
        Self {
            theta_s: 1e-5,
            fragment: 1000.0,
            phi_s: 5e-5,
        }
    }
}

/// Smallest admissible mean fragment size.
pub const MIN_FRAGMENT: f64 = 3.0;

/// Predicts `P2(lag) / ds` from `thetaS`, `phiS` and the fragment size `f`.
///
/// Parameters, in order: `ds` (fixed), `thetaS >= 0`, `f` in `[3, genome_length]`
/// (or fixed at `genome_length`), `phiS >= 0`, `w` and `a` (fixed).
#[derive(Debug, Clone)]
pub struct RecombinationModel {
    parameters: Parameters,
    kernel: FragmentKernel,
}

impl RecombinationModel {
    pub fn new(
        kernel: FragmentKernel,
        ds: f64,
        genome_length: f64,
        constants: ModelConstants,
        initial: &InitialGuess,
        fixed_fragment: bool,
    ) -> Result<Self> {
        if !(genome_length >= MIN_FRAGMENT) {
            return Err(McorrError::InvalidInput(format!(
                "genome length {} is shorter than the minimum fragment size {}",
                genome_length, MIN_FRAGMENT
            )));
        }

        let mut parameters = Parameters::new();
        parameters.add_fixed("ds", ds)?;
        parameters.add_param_with_bounds("thetaS", initial.theta_s, 0.0, f64::INFINITY)?;
        if fixed_fragment {
            parameters.add_fixed("f", genome_length)?;
        } else {
            parameters.add_param_with_bounds("f", initial.fragment, MIN_FRAGMENT, genome_length)?;
        }
        parameters.add_param_with_bounds("phiS", initial.phi_s, 0.0, f64::INFINITY)?;
        parameters.add_fixed("w", constants.w)?;
        parameters.add_fixed("a", constants.a)?;

        Ok(Self { parameters, kernel })
    }

    pub fn kernel(&self) -> FragmentKernel {
        self.kernel
    }

    /// Derived parameters at the current values.
    pub fn derived(&self) -> Result<DerivedParameters> {
        derived_from(&self.parameters)
    }
}

/// Derived parameters of a recombination-model parameter set.
pub fn derived_from(params: &Parameters) -> Result<DerivedParameters> {
    Ok(DerivedParameters::compute(
        params.value("thetaS")?,
        params.value("phiS")?,
        params.value("f")?,
        params.value("ds")?,
        params.value("w")?,
        params.value("a")?,
    ))
}

impl Model for RecombinationModel {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let ds = params.value("ds")?;
        let theta_s = params.value("thetaS")?;
        let f = params.value("f")?;
        let phi_s = params.value("phiS")?;
        let w = params.value("w")?;
        let a = params.value("a")?;

        if theta_p_denominator(theta_s, phi_s, f, ds, w, a) == 0.0 {
            return Ok(Array1::from_elem(x.len(), f64::NAN));
        }

        Ok(x.mapv(|lag| {
            let r1 = self.kernel.r1(lag, f, phi_s, w);
            let r2 = phi_s * w * f - r1;
            calc_p2(theta_s, r1, r2, ds, a) / ds
        }))
    }
}
