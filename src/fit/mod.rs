//! Model fitting, model selection and batch processing.
//!
//! A [`Fitter`] fits one [`FittingSeries`](crate::data::FittingSeries) with a
//! [`ModelVariant`]; [`ModelComparison`] ranks the variants by Akaike weight;
//! [`BatchRunner`] applies a fitter to every group of a dataset.

pub mod batch;
pub mod comparison;
pub mod config;
pub mod fitter;
pub mod null_model;

pub use batch::{BatchResult, BatchRunner, PairOutcome, SkippedGroup};
pub use comparison::{akaike_weights, ModelComparison};
pub use config::FitConfig;
pub use fitter::{FitOutcome, Fitter, InitialValues, ModelVariant};
pub use null_model::{solve_null, NullOutcome};
