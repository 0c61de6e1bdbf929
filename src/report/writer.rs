//! Tabular and text outputs of the fitting workflows.

use crate::error::Result;
use crate::fit::{FitOutcome, ModelComparison};
use serde::Serialize;
use std::io::Write;

use super::record::{FitRecord, FIT_COLUMNS, PAIR_COLUMNS};
use super::summary::summarize;

/// Marker written for an attribute that does not apply.
pub const NA: &str = "NA";

/// Marker used in the comparison summary for values a model does not have.
pub const NOT_APPLICABLE: &str = "n/a";

fn na_or(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

fn na_or_nan(value: Option<f64>) -> String {
    value.map_or_else(|| "nan".to_string(), |v| v.to_string())
}

/// Write the fit-results table, with the pair columns when `pairs` is set.
pub fn write_fit_results<W: Write>(writer: W, records: &[FitRecord], pairs: bool) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = FIT_COLUMNS.to_vec();
    if pairs {
        header.extend(PAIR_COLUMNS);
    }
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![record.group.clone()];
        row.extend(header[1..].iter().map(|column| na_or(record.get(column))));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `lag,residual` rows in lag order.
pub fn write_residuals<W: Write>(writer: W, lags: &[f64], residuals: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["lag", "residual"])?;
    for (lag, residual) in lags.iter().zip(residuals) {
        wtr.write_record([lag.to_string(), residual.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the bootstrap summary of [`summarize`], one section per attribute.
pub fn write_fit_report<W: Write>(mut writer: W, records: &[FitRecord]) -> Result<()> {
    for summary in summarize(records) {
        writeln!(writer, "{}", summary)?;
    }
    Ok(())
}

/// Side-by-side summary of the models fitted to the pooled profile.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub models: Vec<FitOutcome>,
    /// Akaike weights, when more than one model was compared
    pub comparison: Option<ModelComparison>,
}

impl ComparisonSummary {
    pub fn new(models: Vec<FitOutcome>) -> Result<Self> {
        let comparison = if models.len() > 2 {
            let aics: Vec<f64> = models.iter().map(|m| m.aic).collect();
            Some(ModelComparison::from_aics(&aics)?)
        } else {
            None
        };
        Ok(Self { models, comparison })
    }

    /// Write the summary as CSV: a block of fit diagnostics, an empty row,
    /// then one row of fitted values per model.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

        let mut header = vec![String::new()];
        header.extend(self.models.iter().map(|m| m.variant.to_string()));
        wtr.write_record(&header)?;

        let na = |v: Option<String>| v.unwrap_or_else(|| NOT_APPLICABLE.to_string());
        self.write_row(&mut wtr, "fit_success", |m| {
            na(m.func_evals.map(|_| capitalized_bool(m.success)))
        })?;
        self.write_row(&mut wtr, "function_evals", |m| na(m.func_evals.map(|n| n.to_string())))?;
        self.write_row(&mut wtr, "data_points", |m| m.ndata.to_string())?;
        self.write_row(&mut wtr, "variables", |m| m.nvarys.to_string())?;
        self.write_row(&mut wtr, "message", |m| na(m.message.clone()))?;
        self.write_row(&mut wtr, "thetaS (init)", |m| na(m.init.theta_s.map(|v| v.to_string())))?;
        self.write_row(&mut wtr, "f (init)", |m| init_or_zero(m, m.init.fragment, m.fragment))?;
        self.write_row(&mut wtr, "phiS (init)", |m| init_or_zero(m, m.init.phi_s, m.phi_s))?;
        wtr.write_record([""])?;

        let mut columns = vec![
            "recombination",
            "d_s",
            "theta_s",
            "f",
            "phi_s",
            "theta_p",
            "phi_p",
            "c",
            "d_theta_p",
            "d_theta_s",
            "chisq",
            "red-chisq",
            "AIC",
        ];
        if self.comparison.is_some() {
            columns.push("akaike_weight");
        }
        wtr.write_record(&columns)?;

        for (i, m) in self.models.iter().enumerate() {
            let mut row = vec![
                row_label(m),
                m.d_sample.to_string(),
                m.theta_s.to_string(),
                na_or_nan(m.fragment),
                na_or_nan(m.phi_s),
                na_or_nan(m.theta_p),
                na_or_nan(m.phi_p),
                na_or_nan(m.c),
                na_or_nan(m.d_pool),
                m.d_clonal.to_string(),
                m.chi_square.to_string(),
                na_or_nan(m.reduced_chi_square),
                m.aic.to_string(),
            ];
            if let Some(cmp) = &self.comparison {
                row.push(cmp.weights[i].to_string());
            }
            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_row<W, F>(&self, wtr: &mut csv::Writer<W>, name: &str, value: F) -> Result<()>
    where
        W: Write,
        F: Fn(&FitOutcome) -> String,
    {
        let mut row = vec![name.to_string()];
        row.extend(self.models.iter().map(value));
        wtr.write_record(&row)?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn capitalized_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Initial value of a varying parameter, the fixed value of a fixed one,
/// 0 for a parameter the model does not have.
fn init_or_zero(model: &FitOutcome, init: Option<f64>, fitted: Option<f64>) -> String {
    match (init, fitted) {
        (Some(v), _) => v.to_string(),
        (None, Some(v)) => v.to_string(),
        (None, None) if model.variant.is_recombination() => NOT_APPLICABLE.to_string(),
        (None, None) => "0".to_string(),
    }
}

fn row_label(model: &FitOutcome) -> String {
    use crate::fit::ModelVariant::*;
    match model.variant {
        FragmentIncorporation => "recombo (vary f)",
        TemplateSwitching => "recombo (fixed f)",
        ZeroRecombination => "zero_recombo",
    }
    .to_string()
}
