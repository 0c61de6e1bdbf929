//! End-to-end fitting workflows behind the binaries.

use crate::data::{CorrelationDataset, FittingDataPreparer, FittingSeries, POOLED_GROUP};
use crate::error::Result;
use crate::fit::{BatchResult, BatchRunner, FitConfig, FitOutcome, Fitter, ModelVariant, PairOutcome};
use crate::report::{write_fit_report, write_fit_results, write_residuals, ComparisonSummary, FitRecord};
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Output files named `<prefix><suffix>`.
#[derive(Debug, Clone)]
pub struct OutputPrefix {
    prefix: String,
}

impl OutputPrefix {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn path(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix, suffix))
    }

    fn create(&self, suffix: &str) -> Result<BufWriter<File>> {
        let path = self.path(suffix);
        info!("writing {}", path.display());
        Ok(BufWriter::new(File::create(path)?))
    }
}

/// What a comparison run produced.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub summary: ComparisonSummary,
    pub batch: BatchResult<FitOutcome>,
}

/// What a pair-fit run produced.
#[derive(Debug, Clone)]
pub struct PairRun {
    pub summary: ComparisonSummary,
    pub batch: BatchResult<PairOutcome>,
}

/// Compare the three models on the `all` group, then fit every group with
/// the selected recombination variant.
///
/// Writes `_config.json`, `_comparemodels.csv` (and `.json`), the residuals
/// of the null model and of the selected variant, and the variant's
/// `_fit_results.csv` and `_fit_report.txt`.
pub fn run_comparison(
    dataset: &CorrelationDataset,
    config: &FitConfig,
    output: &OutputPrefix,
    show_progress: bool,
) -> Result<ComparisonRun> {
    config.save_json(output.path("_config.json"))?;

    let preparer = FittingDataPreparer::new(config.lag_range()?);
    let pooled = preparer.prepare_group(dataset, POOLED_GROUP)?;
    let fitter = Fitter::new(config.clone());
    let selected = ModelVariant::recombination(config.fixed_fragment);

    let models = vec![
        fitter.fit(&pooled, ModelVariant::FragmentIncorporation)?,
        fitter.fit(&pooled, ModelVariant::TemplateSwitching)?,
        fitter.fit(&pooled, ModelVariant::ZeroRecombination)?,
    ];
    let summary = ComparisonSummary::new(models)?;
    if let Some(cmp) = &summary.comparison {
        info!(
            "Akaike weights: frag-incorp {:.4}, template-switch {:.4}, zero-recombo {:.4}",
            cmp.weights[0], cmp.weights[1], cmp.weights[2]
        );
    }
    write_summary(&summary, output)?;

    for model in &summary.models {
        if model.variant == ModelVariant::ZeroRecombination || model.variant == selected {
            write_model_residuals(&pooled, model, model.variant.label(), output)?;
        }
    }

    let runner = BatchRunner::new(fitter)?.with_progress(show_progress);
    let batch = runner.run_batch(dataset, selected);
    let records = batch
        .outcomes
        .iter()
        .map(FitRecord::from_outcome)
        .collect::<Result<Vec<_>>>()?;

    let label = selected.label();
    write_fit_results(output.create(&format!("_{}_fit_results.csv", label))?, &records, false)?;
    write_fit_report(output.create(&format!("_{}_fit_report.txt", label))?, &records)?;

    Ok(ComparisonRun { summary, batch })
}

/// Fit the pair-averaged profile and every pair with the selected
/// recombination variant and the null model.
///
/// Writes `_config.json`, `_comparemodels.csv` (and `.json`), residuals of
/// both models on the averaged profile, and `_fit_results.csv` with the
/// `aic,z_aic,z_theta_s` columns.
pub fn run_pairs(
    dataset: &CorrelationDataset,
    config: &FitConfig,
    output: &OutputPrefix,
    show_progress: bool,
) -> Result<PairRun> {
    config.save_json(output.path("_config.json"))?;

    let dataset = dataset.pooled_average()?;
    let preparer = FittingDataPreparer::new(config.lag_range()?);
    let pooled = preparer.prepare_group(&dataset, POOLED_GROUP)?;
    let fitter = Fitter::new(config.clone());
    let selected = ModelVariant::recombination(config.fixed_fragment);

    let models = vec![
        fitter.fit(&pooled, selected)?,
        fitter.fit(&pooled, ModelVariant::ZeroRecombination)?,
    ];
    let summary = ComparisonSummary::new(models)?;
    write_summary(&summary, output)?;

    write_model_residuals(&pooled, &summary.models[0], "recombo", output)?;
    write_model_residuals(&pooled, &summary.models[1], "zero-recombo", output)?;

    let runner = BatchRunner::new(fitter)?.with_progress(show_progress);
    let batch = runner.run_pairs(&dataset, selected);
    let records = batch
        .outcomes
        .iter()
        .map(FitRecord::from_pair)
        .collect::<Result<Vec<_>>>()?;
    write_fit_results(output.create("_fit_results.csv")?, &records, true)?;

    Ok(PairRun { summary, batch })
}

fn write_summary(summary: &ComparisonSummary, output: &OutputPrefix) -> Result<()> {
    summary.write_csv(output.create("_comparemodels.csv")?)?;
    summary.write_json(output.create("_comparemodels.json")?)?;
    Ok(())
}

/// Residuals of a converged fit; a failed fit is only logged.
fn write_model_residuals(
    series: &FittingSeries,
    model: &FitOutcome,
    label: &str,
    output: &OutputPrefix,
) -> Result<()> {
    if !model.success {
        warn!("fitting group {} with the {} model failed", series.group, model.variant);
        return Ok(());
    }
    write_residuals(
        output.create(&format!("_{}_residuals.csv", label))?,
        &series.lags.to_vec(),
        &model.residuals,
    )
}
