//! Parsing and grouping of correlation observations.

use crate::error::{McorrError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Name of the group holding the point estimate.
pub const POOLED_GROUP: &str = "all";

/// The kind of a correlation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrelationKind {
    /// Pairwise correlation at a given lag
    P2,
    /// Mean pairwise divergence of the group
    Ks,
}

impl fmt::Display for CorrelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationKind::P2 => f.write_str("P2"),
            CorrelationKind::Ks => f.write_str("Ks"),
        }
    }
}

impl FromStr for CorrelationKind {
    type Err = McorrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P2" => Ok(CorrelationKind::P2),
            "Ks" => Ok(CorrelationKind::Ks),
            other => Err(McorrError::InvalidInput(format!(
                "unknown correlation kind '{}'",
                other
            ))),
        }
    }
}

/// One row of the correlation input.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationObservation {
    pub lag: f64,
    pub value: f64,
    pub variance: f64,
    pub sample_size: f64,
    pub kind: CorrelationKind,
    pub group: String,
}

/// Correlation observations with their groups in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CorrelationDataset {
    observations: Vec<CorrelationObservation>,
    groups: Vec<String>,
}

impl CorrelationDataset {
    /// Build a dataset from already parsed observations.
    pub fn from_observations(observations: Vec<CorrelationObservation>) -> Self {
        let mut groups: Vec<String> = Vec::new();
        for obs in &observations {
            if !groups.iter().any(|g| g == &obs.group) {
                groups.push(obs.group.clone());
            }
        }
        Self {
            observations,
            groups,
        }
    }

    /// Read `lag,value,variance,sampleSize,kind,group` records.
    ///
    /// Lines starting with `#` are comments. A first record whose lag field
    /// is not a number is taken as a header and skipped; any later malformed
    /// record fails the whole read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut observations = Vec::new();
        for (index, record) in rdr.records().enumerate() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if index == 0 && record.get(0).map_or(false, |f| f.parse::<f64>().is_err()) {
                continue;
            }
            observations.push(parse_record(&record, line)?);
        }

        Ok(Self::from_observations(observations))
    }

    /// Read a correlation file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn observations(&self) -> &[CorrelationObservation] {
        &self.observations
    }

    /// Group names in the order they first appear in the input.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    /// All observations of one group, in input order.
    pub fn group(&self, name: &str) -> Result<Vec<&CorrelationObservation>> {
        if !self.has_group(name) {
            return Err(McorrError::GroupNotFound(name.to_string()));
        }
        Ok(self.observations.iter().filter(|o| o.group == name).collect())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Replace the `all` group with the average profile over every other group.
    ///
    /// `P2` rows are averaged per lag and the `Ks` rows into a single
    /// divergence record. The pooled group is appended after the others.
    pub fn pooled_average(&self) -> Result<Self> {
        let members: Vec<CorrelationObservation> = self
            .observations
            .iter()
            .filter(|o| o.group != POOLED_GROUP)
            .cloned()
            .collect();
        if members.is_empty() {
            return Err(McorrError::data(
                POOLED_GROUP,
                "no groups to average into a pooled profile",
            ));
        }

        let mut divergence = Accumulator::default();
        let mut by_lag: BTreeMap<OrderedLag, Accumulator> = BTreeMap::new();
        for obs in &members {
            match obs.kind {
                CorrelationKind::Ks => divergence.push(obs),
                CorrelationKind::P2 => by_lag.entry(OrderedLag(obs.lag)).or_default().push(obs),
            }
        }

        let mut pooled = Vec::with_capacity(by_lag.len() + 1);
        pooled.extend(divergence.mean(0.0, CorrelationKind::Ks));
        pooled.extend(
            by_lag
                .iter()
                .filter_map(|(lag, acc)| acc.mean(lag.0, CorrelationKind::P2)),
        );

        let mut observations = members;
        observations.extend(pooled);
        Ok(Self::from_observations(observations))
    }
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<CorrelationObservation> {
    if record.len() < 6 {
        return Err(McorrError::InvalidInput(format!(
            "line {}: expected 6 fields, found {}",
            line,
            record.len()
        )));
    }

    let number = |index: usize, name: &str| -> Result<f64> {
        record[index].parse::<f64>().map_err(|_| {
            McorrError::InvalidInput(format!(
                "line {}: {} '{}' is not a number",
                line, name, &record[index]
            ))
        })
    };

    let lag = number(0, "lag")?;
    if !(lag >= 0.0) {
        return Err(McorrError::InvalidInput(format!(
            "line {}: lag must be non-negative, got {}",
            line, lag
        )));
    }
    let kind = record[4].parse::<CorrelationKind>().map_err(|_| {
        McorrError::InvalidInput(format!(
            "line {}: unknown correlation kind '{}'",
            line, &record[4]
        ))
    })?;

    Ok(CorrelationObservation {
        lag,
        value: number(1, "value")?,
        variance: number(2, "variance")?,
        sample_size: number(3, "sample size")?,
        kind,
        group: record[5].to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
struct OrderedLag(f64);

impl PartialEq for OrderedLag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for OrderedLag {}

impl PartialOrd for OrderedLag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedLag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    value: f64,
    variance: f64,
    sample_size: f64,
}

impl Accumulator {
    fn push(&mut self, obs: &CorrelationObservation) {
        self.count += 1;
        self.value += obs.value;
        self.variance += obs.variance;
        self.sample_size += obs.sample_size;
    }

    fn mean(&self, lag: f64, kind: CorrelationKind) -> Option<CorrelationObservation> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(CorrelationObservation {
            lag,
            value: self.value / n,
            variance: self.variance / n,
            sample_size: self.sample_size / n,
            kind,
            group: POOLED_GROUP.to_string(),
        })
    }
}
