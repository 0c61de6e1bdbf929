//! Projection of a group's observations onto fitting arrays.

use crate::error::{McorrError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::dataset::{CorrelationDataset, CorrelationKind, CorrelationObservation};

/// Inclusive lag window used for fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagRange {
    pub fit_start: f64,
    pub fit_end: f64,
}

impl Default for LagRange {
    fn default() -> Self {
        Self {
            fit_start: 3.0,
            fit_end: 300.0,
        }
    }
}

impl LagRange {
    pub fn new(fit_start: f64, fit_end: f64) -> Result<Self> {
        if !(fit_start <= fit_end) {
            return Err(McorrError::InvalidInput(format!(
                "fit range start {} is past its end {}",
                fit_start, fit_end
            )));
        }
        Ok(Self { fit_start, fit_end })
    }

    pub fn contains(&self, lag: f64) -> bool {
        lag >= self.fit_start && lag <= self.fit_end
    }
}

/// The `P2` profile of one group inside the fit range.
///
/// Lags are strictly ascending and `correlations[i]` belongs to `lags[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittingSeries {
    pub group: String,
    pub lags: Array1<f64>,
    pub correlations: Array1<f64>,
    /// Mean pairwise divergence `ds`, 0 when the group has no `Ks` record
    pub sample_divergence: f64,
}

impl FittingSeries {
    /// Build a series, sorting by lag.
    pub fn new(
        group: &str,
        lags: Vec<f64>,
        correlations: Vec<f64>,
        sample_divergence: f64,
    ) -> Result<Self> {
        if lags.len() != correlations.len() {
            return Err(McorrError::data(
                group,
                format!(
                    "{} lags but {} correlations",
                    lags.len(),
                    correlations.len()
                ),
            ));
        }

        let mut points: Vec<(f64, f64)> = lags.into_iter().zip(correlations).collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = points.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(McorrError::data(
                group,
                format!("duplicate P2 observation at lag {}", pair[0].0),
            ));
        }

        Ok(Self {
            group: group.to_string(),
            lags: points.iter().map(|p| p.0).collect(),
            correlations: points.iter().map(|p| p.1).collect(),
            sample_divergence,
        })
    }

    pub fn len(&self) -> usize {
        self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }
}

/// Builds [`FittingSeries`] for a fixed lag window.
#[derive(Debug, Clone, Copy, Default)]
pub struct FittingDataPreparer {
    range: LagRange,
}

impl FittingDataPreparer {
    pub fn new(range: LagRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> LagRange {
        self.range
    }

    /// Keep the `P2` rows inside the window; the `Ks` row gives `ds`.
    ///
    /// An empty result is not an error here; the fitter rejects it.
    pub fn prepare(&self, group: &str, observations: &[&CorrelationObservation]) -> Result<FittingSeries> {
        let mut lags = Vec::new();
        let mut correlations = Vec::new();
        let mut divergence = 0.0;

        for obs in observations {
            match obs.kind {
                CorrelationKind::P2 if self.range.contains(obs.lag) => {
                    lags.push(obs.lag);
                    correlations.push(obs.value);
                }
                CorrelationKind::P2 => {}
                CorrelationKind::Ks => divergence = obs.value,
            }
        }

        FittingSeries::new(group, lags, correlations, divergence)
    }

    /// Prepare a named group of `dataset`.
    pub fn prepare_group(&self, dataset: &CorrelationDataset, group: &str) -> Result<FittingSeries> {
        let observations = dataset.group(group)?;
        self.prepare(group, &observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dataset(input: &str) -> CorrelationDataset {
        CorrelationDataset::from_reader(input.as_bytes()).unwrap()
    }

    #[test]
    fn test_window_and_divergence() {
        let data = dataset(
            "0,0.04,0,9,Ks,g\n1,0.5,0,9,P2,g\n5,0.01,0,9,P2,g\n3,0.03,0,9,P2,g\n301,0.001,0,9,P2,g\n300,0.002,0,9,P2,g\n",
        );
        let series = FittingDataPreparer::default().prepare_group(&data, "g").unwrap();

        assert_eq!(series.lags.to_vec(), vec![3.0, 5.0, 300.0]);
        assert_eq!(series.correlations.to_vec(), vec![0.03, 0.01, 0.002]);
        assert_relative_eq!(series.sample_divergence, 0.04);
    }

    #[test]
    fn test_missing_divergence_defaults_to_zero() {
        let data = dataset("3,0.03,0,9,P2,g\n");
        let series = FittingDataPreparer::default().prepare_group(&data, "g").unwrap();
        assert_eq!(series.sample_divergence, 0.0);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_empty_window() {
        let data = dataset("0,0.04,0,9,Ks,g\n1,0.5,0,9,P2,g\n");
        let preparer = FittingDataPreparer::new(LagRange::new(3.0, 10.0).unwrap());
        let series = preparer.prepare_group(&data, "g").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_duplicate_lag() {
        let data = dataset("3,0.03,0,9,P2,g\n3,0.02,0,9,P2,g\n");
        match FittingDataPreparer::default().prepare_group(&data, "g") {
            Err(McorrError::DataError { group, message }) => {
                assert_eq!(group, "g");
                assert!(message.contains("duplicate"));
            }
            other => panic!("expected DataError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_range() {
        assert!(LagRange::new(10.0, 3.0).is_err());
        assert!(LagRange::new(3.0, 3.0).unwrap().contains(3.0));
    }
}
