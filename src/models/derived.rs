//! Pool-level quantities derived from the fitted sample parameters.

use crate::error::{McorrError, Result};
use serde::Serialize;

/// Derived parameters of the recombination model.
///
/// These are pure functions of `thetaS`, `phiS`, `f`, `ds`, `w` and `a`; they
/// are recomputed on every evaluation and never optimized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedParameters {
    /// Pool mutational divergence
    pub theta_p: f64,
    /// Pool recombinational divergence
    pub phi_p: f64,
    /// Recombination coverage
    pub c: f64,
    /// Pool diversity
    pub d_pool: f64,
    /// Clonal diversity
    pub d_clonal: f64,
}

/// Denominator of `thetaP`; it vanishes on a singular surface of the
/// parameter space.
pub fn theta_p_denominator(theta_s: f64, phi_s: f64, f: f64, ds: f64, w: f64, a: f64) -> f64 {
    (1.0 - a * ds) * (phi_s * w * f + a * theta_s) - a * ds
}

impl DerivedParameters {
    /// Compute all derived values. Nothing is checked; see [`Self::check_finite`].
    pub fn compute(theta_s: f64, phi_s: f64, f: f64, ds: f64, w: f64, a: f64) -> Self {
        let theta_p = (ds * (1.0 + phi_s * w * f + a * theta_s) - theta_s)
            / theta_p_denominator(theta_s, phi_s, f, ds, w, a);
        let phi_p = phi_s * theta_p / theta_s;
        let c = w * phi_s * f / (1.0 + w * phi_s * f + theta_s * a);
        let d_pool = theta_p / (1.0 + a * theta_p);
        let d_clonal = theta_s / (1.0 + a * theta_s);

        Self {
            theta_p,
            phi_p,
            c,
            d_pool,
            d_clonal,
        }
    }

    /// `phiP / thetaP`, the recombination-to-mutation rate ratio (γ/μ).
    pub fn ratio(&self) -> f64 {
        self.phi_p / self.theta_p
    }

    /// Fails with [`McorrError::NumericSingularity`] naming the first
    /// non-finite value.
    pub fn check_finite(&self) -> Result<()> {
        let values = [
            ("thetaP", self.theta_p),
            ("phiP", self.phi_p),
            ("c", self.c),
            ("dPool", self.d_pool),
            ("dClonal", self.d_clonal),
            ("ratio", self.ratio()),
        ];
        match values.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(McorrError::NumericSingularity(format!(
                "{} evaluated to {}",
                name, value
            ))),
            None => Ok(()),
        }
    }
}
