//! Fitting a correlation series with each model variant.

use crate::data::FittingSeries;
use crate::error::{McorrError, Result};
use crate::lm::LevenbergMarquardt;
use crate::model::{fit, FitResult, Model};
use crate::models::{RecombinationModel, ZeroRecombinationModel};
use log::debug;
use serde::Serialize;
use std::fmt;

use super::config::FitConfig;
use super::null_model::{solve_null, NullOutcome};

/// The competing hypotheses fitted to a correlation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelVariant {
    /// Recombination with the mean fragment size fitted in `[3, genome_length]`
    FragmentIncorporation,
    /// Recombination with the fragment size fixed at the genome length
    TemplateSwitching,
    /// No recombination, solved exactly
    ZeroRecombination,
}

impl ModelVariant {
    /// Tag used in output file names.
    pub fn label(&self) -> &'static str {
        match self {
            ModelVariant::FragmentIncorporation => "frag-incorp",
            ModelVariant::TemplateSwitching => "template-switch",
            ModelVariant::ZeroRecombination => "zero-recombo",
        }
    }

    /// The recombination variant selected by the fixed-fragment flag.
    pub fn recombination(fixed_fragment: bool) -> Self {
        if fixed_fragment {
            ModelVariant::TemplateSwitching
        } else {
            ModelVariant::FragmentIncorporation
        }
    }

    pub fn is_recombination(&self) -> bool {
        !matches!(self, ModelVariant::ZeroRecombination)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelVariant::FragmentIncorporation => "recombo (frag-incorp)",
            ModelVariant::TemplateSwitching => "recombo (template-switch)",
            ModelVariant::ZeroRecombination => "zero recombo",
        };
        f.write_str(name)
    }
}

/// Starting values of the varying parameters; `None` where a parameter is
/// fixed or absent from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InitialValues {
    pub theta_s: Option<f64>,
    pub fragment: Option<f64>,
    pub phi_s: Option<f64>,
}

/// The result of fitting one model variant to one group.
///
/// The layout is the same for every variant; `None` marks an attribute that
/// does not apply (the fragment size of the null model, the evaluation count
/// of the closed-form solver, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitOutcome {
    pub group: String,
    pub variant: ModelVariant,
    pub success: bool,
    pub ndata: usize,
    pub nvarys: usize,
    pub func_evals: Option<usize>,
    pub message: Option<String>,
    pub init: InitialValues,
    /// Predicted minus observed, in lag order
    pub residuals: Vec<f64>,
    pub d_sample: f64,
    pub theta_s: f64,
    pub fragment: Option<f64>,
    pub phi_s: Option<f64>,
    pub theta_p: Option<f64>,
    pub phi_p: Option<f64>,
    pub c: Option<f64>,
    pub d_pool: Option<f64>,
    pub d_clonal: f64,
    pub chi_square: f64,
    pub reduced_chi_square: Option<f64>,
    pub aic: f64,
}

impl FitOutcome {
    /// `phiP / thetaP`
    pub fn ratio(&self) -> Option<f64> {
        Some(self.phi_p? / self.theta_p?)
    }

    /// Check that every reportable value is finite.
    ///
    /// Fails with [`McorrError::NumericSingularity`] naming the first value
    /// that is not, as happens when the fit ends at `thetaS = 0`.
    pub fn check_reportable(&self) -> Result<()> {
        let values = [
            ("theta_s", Some(self.theta_s)),
            ("fbar", self.fragment),
            ("phi_s", self.phi_s),
            ("theta_pool", self.theta_p),
            ("phi_pool", self.phi_p),
            ("ratio", self.ratio()),
            ("c", self.c),
            ("d_pool", self.d_pool),
            ("d_clonal", Some(self.d_clonal)),
        ];
        for (name, value) in values {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(McorrError::NumericSingularity(format!(
                        "{} of group '{}' evaluated to {}",
                        name, self.group, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Wrap a closed-form null solution.
    pub fn from_null(group: &str, d_sample: f64, null: NullOutcome) -> Self {
        Self {
            group: group.to_string(),
            variant: ModelVariant::ZeroRecombination,
            success: true,
            ndata: null.ndata,
            nvarys: 1,
            func_evals: None,
            message: None,
            init: InitialValues::default(),
            residuals: null.residuals.to_vec(),
            d_sample,
            theta_s: null.theta_s,
            fragment: None,
            phi_s: None,
            theta_p: None,
            phi_p: None,
            c: None,
            d_pool: None,
            d_clonal: null.d_clonal,
            chi_square: null.chi_square,
            reduced_chi_square: null.reduced_chi_square,
            aic: null.aic,
        }
    }
}

/// Fits correlation series with the configured kernel, solver and constants.
#[derive(Debug, Clone)]
pub struct Fitter {
    config: FitConfig,
    optimizer: LevenbergMarquardt,
}

impl Fitter {
    pub fn new(config: FitConfig) -> Self {
        let optimizer = config.optimizer();
        Self { config, optimizer }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fit `series` with one model variant.
    ///
    /// A series with no lags in the fit range is a [`McorrError::DataError`].
    /// A fit that does not converge is still `Ok`, with `success == false`
    /// and the last iterate.
    pub fn fit(&self, series: &FittingSeries, variant: ModelVariant) -> Result<FitOutcome> {
        match variant {
            ModelVariant::FragmentIncorporation => self.fit_recombination(series, false),
            ModelVariant::TemplateSwitching => self.fit_recombination(series, true),
            ModelVariant::ZeroRecombination => self.solve_null(series),
        }
    }

    /// The closed-form null model as a [`FitOutcome`].
    pub fn solve_null(&self, series: &FittingSeries) -> Result<FitOutcome> {
        let null = solve_null(series, self.config.constants.a)?;
        Ok(FitOutcome::from_null(&series.group, series.sample_divergence, null))
    }

    /// Fit the null model iteratively over `thetaS >= 0`.
    pub fn fit_null(&self, series: &FittingSeries) -> Result<FitOutcome> {
        ensure_points(series)?;

        let mut model = ZeroRecombinationModel::new(
            series.sample_divergence,
            self.config.initial.theta_s,
            self.config.constants.a,
        )?;
        let result = fit(
            &mut model,
            series.lags.clone(),
            series.correlations.clone(),
            self.config.method,
            &self.optimizer,
        )?;
        debug!(
            "group {}: zero-recombination fit ended after {} evaluations ({})",
            series.group, result.func_evals, result.message
        );

        let theta_s = result.params.value("thetaS")?;
        let mut outcome = base_outcome(series, ModelVariant::ZeroRecombination, &result);
        outcome.theta_s = theta_s;
        outcome.d_clonal = model.d_clonal()?;
        Ok(outcome)
    }

    fn fit_recombination(&self, series: &FittingSeries, fixed_fragment: bool) -> Result<FitOutcome> {
        ensure_points(series)?;

        let variant = ModelVariant::recombination(fixed_fragment);
        let mut model = RecombinationModel::new(
            self.config.kernel,
            series.sample_divergence,
            self.config.genome_length,
            self.config.constants,
            &self.config.initial,
            fixed_fragment,
        )?;
        let result = fit(
            &mut model,
            series.lags.clone(),
            series.correlations.clone(),
            self.config.method,
            &self.optimizer,
        )?;
        debug!(
            "group {}: {} fit ended after {} evaluations ({})",
            series.group, variant, result.func_evals, result.message
        );

        let derived = model.derived()?;
        let params = &result.params;
        let mut outcome = base_outcome(series, variant, &result);
        outcome.theta_s = params.value("thetaS")?;
        outcome.fragment = Some(params.value("f")?);
        outcome.phi_s = Some(params.value("phiS")?);
        outcome.theta_p = Some(derived.theta_p);
        outcome.phi_p = Some(derived.phi_p);
        outcome.c = Some(derived.c);
        outcome.d_pool = Some(derived.d_pool);
        outcome.d_clonal = derived.d_clonal;
        Ok(outcome)
    }
}

fn ensure_points(series: &FittingSeries) -> Result<()> {
    if series.is_empty() {
        return Err(McorrError::data(&series.group, "no correlations in the fit range"));
    }
    Ok(())
}

fn base_outcome(series: &FittingSeries, variant: ModelVariant, result: &FitResult) -> FitOutcome {
    let init_value = |name: &str| {
        result
            .init_values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    };
    let stats = &result.statistics;

    FitOutcome {
        group: series.group.clone(),
        variant,
        success: result.success,
        ndata: stats.ndata,
        nvarys: stats.nvarys,
        func_evals: Some(result.func_evals),
        message: Some(result.message.clone()),
        init: InitialValues {
            theta_s: init_value("thetaS"),
            fragment: init_value("f"),
            phi_s: init_value("phiS"),
        },
        residuals: result.residuals.to_vec(),
        d_sample: series.sample_divergence,
        theta_s: f64::NAN,
        fragment: None,
        phi_s: None,
        theta_p: None,
        phi_p: None,
        c: None,
        d_pool: None,
        d_clonal: f64::NAN,
        chi_square: stats.chisqr,
        reduced_chi_square: Some(stats.redchi),
        aic: stats.aic,
    }
}
