//! Correlation input data.
//!
//! [`CorrelationDataset`] holds the parsed `lag,value,variance,sampleSize,kind,group`
//! records; [`FittingDataPreparer`] turns one group into the aligned arrays the
//! fitter consumes.

pub mod dataset;
pub mod series;

pub use dataset::{CorrelationDataset, CorrelationKind, CorrelationObservation, POOLED_GROUP};
pub use series::{FittingDataPreparer, FittingSeries, LagRange};
