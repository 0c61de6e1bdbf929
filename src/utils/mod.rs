//! Utility functions and helpers for the mcorr-fit library.

pub mod finite_difference;
pub mod matrix_convert;

// Re-export commonly used utilities
pub use finite_difference::{jacobian, jacobian_within};
pub use matrix_convert::{faer_vec_to_ndarray, gram, ndarray_to_faer, ndarray_vec_to_faer, transpose_times};
