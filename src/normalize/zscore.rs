//! Column-wise standardization and the log1p transform for concentration blocks.

use crate::error::{CcaError, Result};
use nalgebra::{DMatrix, DVector};

/// Subtract each column's mean, returning the centered copy and the means.
pub fn center_columns(data: &DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let (n_samples, n_features) = data.shape();
    let means = if n_samples == 0 {
        DVector::zeros(n_features)
    } else {
        DVector::from_iterator(
            n_features,
            (0..n_features).map(|j| data.column(j).sum() / n_samples as f64),
        )
    };

    let mut centered = data.clone();
    for j in 0..n_features {
        for i in 0..n_samples {
            centered[(i, j)] -= means[j];
        }
    }
    (centered, means)
}

/// Z-score every column of an n × p matrix.
///
/// Each column has its mean subtracted and is divided by its population
/// standard deviation (denominator n). A constant column becomes exactly
/// zero; a column whose standard deviation still rounds to 0 is divided by 1
/// instead, so it never turns into NaN.
///
/// The input is not modified.
pub fn zscore(data: &DMatrix<f64>) -> DMatrix<f64> {
    let (n_samples, n_features) = data.shape();
    let mut out = data.clone();
    if n_samples == 0 {
        return out;
    }

    let n = n_samples as f64;
    for j in 0..n_features {
        // The rounded mean of a constant column need not equal its value
        let first = data[(0, j)];
        if data.column(j).iter().all(|&x| x == first) {
            out.column_mut(j).fill(0.0);
            continue;
        }

        let mean = data.column(j).sum() / n;
        let variance = data.column(j).iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        let scale = if std == 0.0 { 1.0 } else { std };

        for i in 0..n_samples {
            out[(i, j)] = (data[(i, j)] - mean) / scale;
        }
    }
    out
}

/// Apply `ln(1 + x)` element-wise.
///
/// Used for nonnegative concentration-like measurements before
/// standardization. Entries at or below -1 have no logarithm and are rejected.
pub fn log1p_block(data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (n_samples, n_features) = data.shape();
    for i in 0..n_samples {
        for j in 0..n_features {
            let val = data[(i, j)];
            if val.is_nan() || val <= -1.0 {
                return Err(CcaError::Numerical(format!(
                    "log1p requires values above -1; found {} at ({}, {})",
                    val, i, j
                )));
            }
        }
    }
    Ok(data.map(|x| x.ln_1p()))
}
