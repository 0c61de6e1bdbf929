//! Rows of the fit-results table.

use crate::error::Result;
use crate::fit::{FitOutcome, PairOutcome};

/// Columns of the fit-results table.
pub const FIT_COLUMNS: [&str; 11] = [
    "group",
    "d_sample",
    "theta_pool",
    "phi_pool",
    "ratio",
    "fbar",
    "c",
    "d_pool",
    "d_clonal",
    "theta_s",
    "phi_s",
];

/// Extra columns written for pair fits.
pub const PAIR_COLUMNS: [&str; 3] = ["aic", "z_aic", "z_theta_s"];

/// One group's reportable values; `None` is written as `NA`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitRecord {
    pub group: String,
    pub d_sample: Option<f64>,
    pub theta_pool: Option<f64>,
    pub phi_pool: Option<f64>,
    pub ratio: Option<f64>,
    pub fbar: Option<f64>,
    pub c: Option<f64>,
    pub d_pool: Option<f64>,
    pub d_clonal: Option<f64>,
    pub theta_s: Option<f64>,
    pub phi_s: Option<f64>,
    pub aic: Option<f64>,
    pub z_aic: Option<f64>,
    pub z_theta_s: Option<f64>,
}

impl FitRecord {
    /// Extract the reportable values of a fit.
    ///
    /// Fails with a `NumericSingularity` when any of them is not finite.
    pub fn from_outcome(outcome: &FitOutcome) -> Result<Self> {
        outcome.check_reportable()?;
        Ok(Self {
            group: outcome.group.clone(),
            d_sample: Some(outcome.d_sample),
            theta_pool: outcome.theta_p,
            phi_pool: outcome.phi_p,
            ratio: outcome.ratio(),
            fbar: outcome.fragment,
            c: outcome.c,
            d_pool: outcome.d_pool,
            d_clonal: Some(outcome.d_clonal),
            theta_s: Some(outcome.theta_s),
            phi_s: outcome.phi_s,
            aic: None,
            z_aic: None,
            z_theta_s: None,
        })
    }

    /// The recombination fit's values plus the AICs and the null `thetaS`.
    pub fn from_pair(pair: &PairOutcome) -> Result<Self> {
        let mut record = Self::from_outcome(&pair.model)?;
        record.aic = Some(pair.model.aic);
        record.z_aic = Some(pair.null.aic);
        record.z_theta_s = Some(pair.null.theta_s);
        Ok(record)
    }

    /// Value of a numeric column by name; `None` for `NA` or an unknown name.
    pub fn get(&self, column: &str) -> Option<f64> {
        match column {
            "d_sample" => self.d_sample,
            "theta_pool" => self.theta_pool,
            "phi_pool" => self.phi_pool,
            "ratio" => self.ratio,
            "fbar" => self.fbar,
            "c" => self.c,
            "d_pool" => self.d_pool,
            "d_clonal" => self.d_clonal,
            "theta_s" => self.theta_s,
            "phi_s" => self.phi_s,
            "aic" => self.aic,
            "z_aic" => self.z_aic,
            "z_theta_s" => self.z_theta_s,
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, column: &str, value: Option<f64>) -> bool {
        let slot = match column {
            "d_sample" => &mut self.d_sample,
            "theta_pool" => &mut self.theta_pool,
            "phi_pool" => &mut self.phi_pool,
            "ratio" => &mut self.ratio,
            "fbar" => &mut self.fbar,
            "c" => &mut self.c,
            "d_pool" => &mut self.d_pool,
            "d_clonal" => &mut self.d_clonal,
            "theta_s" => &mut self.theta_s,
            "phi_s" => &mut self.phi_s,
            "aic" => &mut self.aic,
            "z_aic" => &mut self.z_aic,
            "z_theta_s" => &mut self.z_theta_s,
            _ => return false,
        };
        *slot = value;
        true
    }
}
