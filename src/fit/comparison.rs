//! Akaike-weight model comparison.

use crate::error::{McorrError, Result};
use serde::Serialize;

/// Normalized Akaike weights of a set of candidate models.
///
/// With `Δi = AICi - min AIC`, each candidate gets `Li = exp(-Δi / 2)` (exactly
/// 1 for the minimum) and the weights are `Li / ΣL`. Candidates with a NaN AIC
/// are not comparable and get weight 0. When one or more AICs are `-inf`
/// (a perfect fit) those candidates share the whole weight equally.
///
/// ```
/// use mcorr_fit::fit::akaike_weights;
///
/// let w = akaike_weights(&[10.0, 10.0, f64::NEG_INFINITY]).unwrap();
/// assert_eq!(w, vec![0.0, 0.0, 1.0]);
/// ```
pub fn akaike_weights(aics: &[f64]) -> Result<Vec<f64>> {
    if aics.is_empty() {
        return Err(McorrError::InvalidInput(
            "no candidate models to compare".to_string(),
        ));
    }

    let perfect = aics.iter().filter(|&&aic| aic == f64::NEG_INFINITY).count();
    if perfect > 0 {
        let share = 1.0 / perfect as f64;
        return Ok(aics
            .iter()
            .map(|&aic| if aic == f64::NEG_INFINITY { share } else { 0.0 })
            .collect());
    }

    let min = aics
        .iter()
        .copied()
        .filter(|aic| !aic.is_nan())
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return Err(McorrError::NumericSingularity(
            "no candidate model has a finite AIC".to_string(),
        ));
    }

    let likelihoods: Vec<f64> = aics
        .iter()
        .map(|&aic| {
            if aic.is_nan() {
                0.0
            } else if aic == min {
                1.0
            } else {
                (-(aic - min) / 2.0).exp()
            }
        })
        .collect();
    let total: f64 = likelihoods.iter().sum();

    Ok(likelihoods.into_iter().map(|l| l / total).collect())
}

/// AICs, weights and evidence ratios of competing models fitted to one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub aics: Vec<f64>,
    pub weights: Vec<f64>,
    /// `w_best / w_i`; 1 for the best model, infinite for a model with no weight
    pub evidence_ratios: Vec<f64>,
    /// Index of the best model
    pub best: usize,
}

impl ModelComparison {
    pub fn from_aics(aics: &[f64]) -> Result<Self> {
        let weights = akaike_weights(aics)?;

        let best = weights
            .iter()
            .enumerate()
            .fold(0, |best, (i, w)| if *w > weights[best] { i } else { best });
        let best_weight = weights[best];
        let evidence_ratios = weights.iter().map(|w| best_weight / w).collect();

        Ok(Self {
            aics: aics.to_vec(),
            weights,
            evidence_ratios,
            best,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_sum_to_one() {
        let cases: [&[f64]; 4] = [
            &[-120.0, -118.0, -90.0],
            &[5.0, 5.0, 5.0],
            &[-3.5, 100.0],
            &[-1e3, -1e3 + 1e-9, 2e3],
        ];
        for aics in cases {
            let w = akaike_weights(aics).unwrap();
            assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            assert!(w.iter().all(|w| (0.0..=1.0).contains(w)));
        }
    }

    #[test]
    fn test_weight_values() {
        let w = akaike_weights(&[0.0, 2.0, 4.0]).unwrap();
        let l = [1.0, (-1.0f64).exp(), (-2.0f64).exp()];
        let total: f64 = l.iter().sum();
        for i in 0..3 {
            assert_relative_eq!(w[i], l[i] / total, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_negative_infinity_is_one_hot() {
        let w = akaike_weights(&[-50.0, f64::NEG_INFINITY, -60.0]).unwrap();
        assert_eq!(w, vec![0.0, 1.0, 0.0]);

        let w = akaike_weights(&[f64::NEG_INFINITY, 1.0, f64::NEG_INFINITY]).unwrap();
        assert_eq!(w, vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_nan_aic_gets_no_weight() {
        let w = akaike_weights(&[f64::NAN, -10.0, -12.0]).unwrap();
        assert_eq!(w[0], 0.0);
        assert_relative_eq!(w[1] + w[2], 1.0, epsilon = 1e-15);

        assert!(akaike_weights(&[f64::NAN, f64::NAN]).is_err());
        assert!(akaike_weights(&[]).is_err());
    }

    #[test]
    fn test_comparison() {
        let cmp = ModelComparison::from_aics(&[-100.0, -104.0, -80.0]).unwrap();
        assert_eq!(cmp.best, 1);
        assert_relative_eq!(cmp.evidence_ratios[1], 1.0);
        assert_relative_eq!(cmp.evidence_ratios[0], 2.0f64.exp(), max_relative = 1e-12);
        assert_relative_eq!(cmp.evidence_ratios[2], 12.0f64.exp(), max_relative = 1e-9);
    }
}
