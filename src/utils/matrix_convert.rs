//! Matrix conversion utilities.
//!
//! Problems and results speak `ndarray`; the normal equations inside the solver
//! are assembled and factored as `faer` matrices.

use crate::error::{McorrError, Result};
use faer::{Col, Mat};
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a faer Mat.
pub fn ndarray_to_faer(arr: &Array2<f64>) -> Mat<f64> {
    Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert an ndarray Array1 to a faer Col (column vector).
pub fn ndarray_vec_to_faer(arr: &Array1<f64>) -> Col<f64> {
    Col::from_fn(arr.len(), |i| arr[i])
}

/// Convert a faer Col (column vector) to an ndarray Array1.
pub fn faer_vec_to_ndarray(col: &Col<f64>) -> Array1<f64> {
    Array1::from_shape_fn(col.nrows(), |i| col[i])
}

/// `J^T J` for a residual Jacobian.
pub fn gram(j: &Mat<f64>) -> Mat<f64> {
    let n = j.ncols();
    Mat::from_fn(n, n, |a, b| (0..j.nrows()).map(|i| j[(i, a)] * j[(i, b)]).sum())
}

/// `J^T r` for a residual Jacobian and residual vector.
pub fn transpose_times(j: &Mat<f64>, r: &Col<f64>) -> Result<Col<f64>> {
    if j.nrows() != r.nrows() {
        return Err(McorrError::ConversionError(format!(
            "Jacobian has {} rows but residual vector has {} entries",
            j.nrows(),
            r.nrows()
        )));
    }
    Ok(Col::from_fn(j.ncols(), |a| {
        (0..j.nrows()).map(|i| j[(i, a)] * r[i]).sum()
    }))
}
