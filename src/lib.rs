//! # mcorr-fit
//!
//! `mcorr-fit` infers recombination rates in viral populations from pairwise
//! sequence-correlation profiles. A coalescent model of the correlation
//! `P2(lag)`, with and without recombination, is fitted to measured profiles
//! by bounded Levenberg-Marquardt least squares, and the competing models are
//! ranked by Akaike weight.
//!
//! The library provides:
//! - A parameter system with bounds and Minuit-style internal coordinates
//! - A Levenberg-Marquardt solver with projected and transformed bound handling
//! - The recombination and zero-recombination correlation models
//! - Batch fitting of bootstrap replicates or sequence pairs, and the reports
//!   written from them
//!
//! ## Basic Usage
//!
//! ```
//! use mcorr_fit::data::FittingSeries;
//! use mcorr_fit::fit::{FitConfig, Fitter, ModelComparison, ModelVariant};
//!
//! let series = FittingSeries::new(
//!     "all",
//!     vec![3.0, 4.0, 5.0],
//!     vec![0.020, 0.018, 0.016],
//!     0.05,
//! )
//! .unwrap();
//!
//! let fitter = Fitter::new(FitConfig::default());
//! let aics: Vec<f64> = [
//!     ModelVariant::FragmentIncorporation,
//!     ModelVariant::TemplateSwitching,
//!     ModelVariant::ZeroRecombination,
//! ]
//! .iter()
//! .map(|&variant| fitter.fit(&series, variant).unwrap().aic)
//! .collect();
//!
//! let comparison = ModelComparison::from_aics(&aics).unwrap();
//! let total: f64 = comparison.weights.iter().sum();
//! assert!((total - 1.0).abs() < 1e-12);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

pub mod utils;

pub mod problem;

pub mod lm;

pub mod model;

pub mod models;

pub mod data;

pub mod fit;

pub mod report;

pub mod cli;

pub mod pipeline;

// Re-exports for convenience
pub use error::{McorrError, Result};

pub use lm::LevenbergMarquardt;

pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
