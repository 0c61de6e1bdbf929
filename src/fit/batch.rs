//! Fitting every group of a dataset.

use crate::data::{CorrelationDataset, FittingDataPreparer, FittingSeries};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use super::fitter::{FitOutcome, Fitter, ModelVariant};

/// A group left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedGroup {
    pub group: String,
    pub reason: String,
}

/// Per-group results in the order the groups first appear in the input.
#[derive(Debug, Clone)]
pub struct BatchResult<T> {
    pub outcomes: Vec<T>,
    pub skipped: Vec<SkippedGroup>,
}

impl<T> BatchResult<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// A recombination fit and the exact null fit of the same group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairOutcome {
    pub model: FitOutcome,
    pub null: FitOutcome,
}

/// Applies a [`Fitter`] to each group of a dataset.
///
/// A group that cannot be prepared or fitted, or whose fitted values are
/// not finite, is logged and skipped; the rest of the batch carries on.
/// Non-converged fits are kept with `success == false`.
pub struct BatchRunner {
    fitter: Fitter,
    preparer: FittingDataPreparer,
    parallel: bool,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(fitter: Fitter) -> Result<Self> {
        let preparer = FittingDataPreparer::new(fitter.config().lag_range()?);
        let parallel = fitter.config().parallel;
        Ok(Self {
            fitter,
            preparer,
            parallel,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn fitter(&self) -> &Fitter {
        &self.fitter
    }

    /// Fit every group with `variant`.
    pub fn run_batch(&self, dataset: &CorrelationDataset, variant: ModelVariant) -> BatchResult<FitOutcome> {
        info!("fitting {} groups with the {} model", dataset.groups().len(), variant);
        self.run(dataset, |series| {
            let outcome = self.fitter.fit(series, variant)?;
            outcome.check_reportable()?;
            Ok(outcome)
        })
    }

    /// Fit every group with `variant` and with the exact null model.
    pub fn run_pairs(&self, dataset: &CorrelationDataset, variant: ModelVariant) -> BatchResult<PairOutcome> {
        info!(
            "fitting {} groups with the {} and zero-recombination models",
            dataset.groups().len(),
            variant
        );
        self.run(dataset, |series| {
            let model = self.fitter.fit(series, variant)?;
            model.check_reportable()?;
            let null = self.fitter.solve_null(series)?;
            Ok(PairOutcome { model, null })
        })
    }

    fn run<T, F>(&self, dataset: &CorrelationDataset, fit_one: F) -> BatchResult<T>
    where
        T: Send,
        F: Fn(&FittingSeries) -> Result<T> + Sync,
    {
        let groups = dataset.groups();
        let progress = self.progress_bar(groups.len());

        let process = |group: &String| -> Result<T> {
            let result = self
                .preparer
                .prepare_group(dataset, group)
                .and_then(|series| fit_one(&series));
            progress.inc(1);
            result
        };

        let mut results: Vec<(usize, &String, Result<T>)> = if self.parallel {
            groups
                .par_iter()
                .enumerate()
                .map(|(index, group)| (index, group, process(group)))
                .collect()
        } else {
            groups
                .iter()
                .enumerate()
                .map(|(index, group)| (index, group, process(group)))
                .collect()
        };
        results.sort_by_key(|(index, _, _)| *index);
        progress.finish_and_clear();

        let mut outcomes = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (_, group, result) in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!("skipping group {}: {}", group, err);
                    skipped.push(SkippedGroup {
                        group: group.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!("fitted {} groups, skipped {}", outcomes.len(), skipped.len());
        BatchResult { outcomes, skipped }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} groups ({eta})",
        ) {
            pb.set_style(style);
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitConfig;

    const INPUT: &str = "\
0,0.05,0,10,Ks,all
3,0.020,0,10,P2,all
4,0.018,0,10,P2,all
5,0.016,0,10,P2,all
0,0.05,0,10,Ks,boot1
1,0.020,0,10,P2,boot1
0,0.04,0,10,Ks,boot2
3,0.021,0,10,P2,boot2
4,0.019,0,10,P2,boot2
5,0.016,0,10,P2,boot2
";

    fn runner() -> BatchRunner {
        let _ = env_logger::builder().is_test(true).try_init();
        BatchRunner::new(Fitter::new(FitConfig::default())).unwrap()
    }

    #[test]
    fn test_skips_group_without_points() {
        let dataset = CorrelationDataset::from_reader(INPUT.as_bytes()).unwrap();
        let result = runner().run_batch(&dataset, ModelVariant::ZeroRecombination);

        let groups: Vec<&str> = result.outcomes.iter().map(|o| o.group.as_str()).collect();
        assert_eq!(groups, vec!["all", "boot2"]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].group, "boot1");
    }

    #[test]
    fn test_template_switching_keeps_pooled_group() {
        let dataset = CorrelationDataset::from_reader(INPUT.as_bytes()).unwrap();
        let result = runner().run_batch(&dataset, ModelVariant::TemplateSwitching);

        let groups: Vec<&str> = result.outcomes.iter().map(|o| o.group.as_str()).collect();
        assert_eq!(groups, vec!["all", "boot2"]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].group, "boot1");

        let all = &result.outcomes[0];
        assert!(all.theta_s > 0.0);
        assert!(all.phi_p.unwrap().is_finite());
        assert!(all.ratio().unwrap().is_finite());
    }

    #[test]
    fn test_skips_singular_fit() {
        let input = format!(
            "{}0,NaN,0,10,Ks,bad\n3,0.020,0,10,P2,bad\n4,0.018,0,10,P2,bad\n5,0.016,0,10,P2,bad\n\
             0,0.05,0,10,Ks,boot3\n3,0.020,0,10,P2,boot3\n4,0.018,0,10,P2,boot3\n5,0.016,0,10,P2,boot3\n",
            INPUT
        );
        let dataset = CorrelationDataset::from_reader(input.as_bytes()).unwrap();

        for parallel in [false, true] {
            let result = runner()
                .with_parallel(parallel)
                .run_batch(&dataset, ModelVariant::TemplateSwitching);

            let groups: Vec<&str> = result.outcomes.iter().map(|o| o.group.as_str()).collect();
            assert_eq!(groups, vec!["all", "boot2", "boot3"]);
            let skipped: Vec<&str> = result.skipped.iter().map(|s| s.group.as_str()).collect();
            assert_eq!(skipped, vec!["boot1", "bad"]);
            assert!(result.skipped[1].reason.starts_with("Numeric singularity"));
            assert!(result.skipped[1].reason.contains("'bad'"));
        }
    }

    #[test]
    fn test_parallel_keeps_order() {
        let dataset = CorrelationDataset::from_reader(INPUT.as_bytes()).unwrap();
        let sequential = runner().run_pairs(&dataset, ModelVariant::TemplateSwitching);
        let parallel = runner()
            .with_parallel(true)
            .run_pairs(&dataset, ModelVariant::TemplateSwitching);

        let names = |r: &BatchResult<PairOutcome>| -> Vec<String> {
            r.outcomes.iter().map(|p| p.model.group.clone()).collect()
        };
        assert_eq!(names(&sequential), names(&parallel));
        assert_eq!(sequential.skipped, parallel.skipped);
        for pair in &parallel.outcomes {
            assert_eq!(pair.model.group, pair.null.group);
            assert_eq!(pair.null.variant, ModelVariant::ZeroRecombination);
        }
    }
}
