//! Bootstrap summary of fitted attributes.

use serde::Serialize;
use std::fmt;

use super::record::FitRecord;
use crate::data::POOLED_GROUP;

/// Attributes summarized in the fit report.
pub const SUMMARY_ATTRIBUTES: [&str; 6] = ["d_sample", "theta_pool", "phi_pool", "ratio", "fbar", "c"];

/// Fewest bootstrap replicates for which statistics are reported.
pub const MIN_REPLICATES: usize = 10;

/// Distribution of an attribute over the bootstrap replicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapStatistics {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub size: usize,
    pub median: f64,
    /// 2.5th percentile
    pub lower: f64,
    /// 97.5th percentile
    pub upper: f64,
}

impl BootstrapStatistics {
    /// Statistics of `values`; `None` for fewer than [`MIN_REPLICATES`].
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < MIN_REPLICATES {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            mean,
            std: var.sqrt(),
            size: values.len(),
            median: percentile(&sorted, 50.0),
            lower: percentile(&sorted, 2.5),
            upper: percentile(&sorted, 97.5),
        })
    }
}

/// Percentile of sorted data with linear interpolation between ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// One section of the fit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSummary {
    pub attribute: String,
    pub label: String,
    /// Value in the `all` group
    pub value: Option<f64>,
    pub bootstrap: Option<BootstrapStatistics>,
}

impl AttributeSummary {
    pub fn from_records(records: &[FitRecord], attribute: &str) -> Self {
        let mut value = None;
        let mut replicates = Vec::new();
        for record in records {
            if let Some(v) = record.get(attribute) {
                if record.group == POOLED_GROUP {
                    value = Some(v);
                } else {
                    replicates.push(v);
                }
            }
        }

        let label = match attribute {
            "ratio" => "gamma/mu",
            other => other,
        };

        Self {
            attribute: attribute.to_string(),
            label: label.to_string(),
            value,
            bootstrap: BootstrapStatistics::from_values(&replicates),
        }
    }
}

impl fmt::Display for AttributeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.label)?;
        if let Some(value) = self.value {
            writeln!(f, "value = {}", format_g(value))?;
        }
        if let Some(stats) = &self.bootstrap {
            writeln!(f, "bootstrapping mean = {}", format_g(stats.mean))?;
            writeln!(f, "bootstrapping standard deviation = {}", format_g(stats.std))?;
            writeln!(f, "bootstrapping size = {}", stats.size)?;
            writeln!(f, "bootstrapping median = {}", format_g(stats.median))?;
            writeln!(f, "bootstrapping lower bound (2.5%) = {}", format_g(stats.lower))?;
            writeln!(f, "bootstrapping upper bound (97.5%) = {}", format_g(stats.upper))?;
        }
        Ok(())
    }
}

/// Summaries of every [`SUMMARY_ATTRIBUTES`] entry.
pub fn summarize(records: &[FitRecord]) -> Vec<AttributeSummary> {
    SUMMARY_ATTRIBUTES
        .iter()
        .map(|attribute| AttributeSummary::from_records(records, attribute))
        .collect()
}

/// `printf("%g")`: six significant digits, trailing zeros dropped.
pub fn format_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:.5e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
