//! Sparse helpers for assembling and checking the conic program.

use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    if rows.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    let mut coo = CooMatrix::new(nrows, ncols);
    for ((row, col), val) in rows.into_iter().zip(cols).zip(vals) {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// `A' z`, used to check stationarity of a dual answer.
pub fn csc_transpose_mul(a: &CscMatrix<f64>, z: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.ncols()];
    for (row, col, val) in a.triplet_iter() {
        out[col] += val * z[row];
    }
    out
}
