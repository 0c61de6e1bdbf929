//! Exact solution of the zero-recombination model.
//!
//! Without recombination the predicted profile is flat, so the least-squares
//! prediction is the mean of the observed correlations and no solver is
//! needed.

use crate::data::FittingSeries;
use crate::error::{McorrError, Result};
use ndarray::Array1;

/// The closed-form null fit of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct NullOutcome {
    pub ndata: usize,
    /// Mean prediction minus observed, one per lag
    pub residuals: Array1<f64>,
    pub chi_square: f64,
    /// `None` for a single point, where the statistic is undefined
    pub reduced_chi_square: Option<f64>,
    /// `n ln(χ²/n) + 2`, or `-inf` for a perfect fit
    pub aic: f64,
    /// `ds / (1 - a ds)`
    pub theta_s: f64,
    pub d_clonal: f64,
}

/// Solve the null model for `series` with Jukes-Cantor constant `a`.
pub fn solve_null(series: &FittingSeries, a: f64) -> Result<NullOutcome> {
    let ndata = series.len();
    let mean = series.correlations.mean().ok_or_else(|| {
        McorrError::data(&series.group, "no correlations in the fit range")
    })?;

    let residuals = series.correlations.mapv(|y| mean - y);
    let chi_square: f64 = residuals.iter().map(|r| r * r).sum();
    let n = ndata as f64;

    let reduced_chi_square = if ndata > 1 {
        Some(chi_square / (n - 1.0))
    } else {
        None
    };
    let aic = if chi_square == 0.0 {
        f64::NEG_INFINITY
    } else {
        n * (chi_square / n).ln() + 2.0
    };

    let ds = series.sample_divergence;
    let theta_s = ds / (1.0 - a * ds);
    let d_clonal = theta_s / (1.0 + a * theta_s);

    Ok(NullOutcome {
        ndata,
        residuals,
        chi_square,
        reduced_chi_square,
        aic,
        theta_s,
        d_clonal,
    })
}
