//! Reporting of fit results.
//!
//! Fit outcomes are reduced to [`FitRecord`] rows, written as the
//! `group,d_sample,...` table and summarized over bootstrap replicates.

pub mod reader;
pub mod record;
pub mod summary;
pub mod writer;

pub use reader::read_fit_results;
pub use record::{FitRecord, FIT_COLUMNS, PAIR_COLUMNS};
pub use summary::{summarize, AttributeSummary, BootstrapStatistics};
pub use writer::{write_fit_report, write_fit_results, write_residuals, ComparisonSummary, NA};
