//! Inverse square root of symmetric positive semi-definite matrices.
//!
//! Whitening a block by `S^{-1/2}` turns its covariance `S` into the identity.
//! Covariance estimates from few samples or collinear columns are singular, so
//! eigenvalues are clipped to a floor before inversion. The result is always
//! finite and positive definite.

use crate::error::{CcaError, Result};
use nalgebra::{DMatrix, SymmetricEigen};

/// Default floor eigenvalues are clipped to before inversion.
pub const DEFAULT_EIGENVALUE_FLOOR: f64 = 1e-8;

/// Compute `A^{-1/2}` for a symmetric PSD matrix.
///
/// The input is symmetrized as `(A + Aᵀ) / 2` to absorb floating-point
/// asymmetry, eigendecomposed as `V diag(w) Vᵀ`, and each eigenvalue is
/// clipped to `max(w, floor)`. Returns `V diag(1 / sqrt(w')) Vᵀ`.
///
/// When every true eigenvalue of `A` is at least `floor`, `W A W ≈ I`.
///
/// # Errors
/// - `Dimension` if `A` is not square or is empty
/// - `Configuration` if `floor` is not a positive finite number
/// - `Numerical` if the eigendecomposition fails to converge
pub fn inv_sqrt_spd(a: &DMatrix<f64>, floor: f64) -> Result<DMatrix<f64>> {
    let (nrows, ncols) = a.shape();
    if nrows != ncols {
        return Err(CcaError::Dimension(format!(
            "Matrix must be square, got {} x {}",
            nrows, ncols
        )));
    }
    if nrows == 0 {
        return Err(CcaError::Dimension("Matrix must not be empty".to_string()));
    }
    if !floor.is_finite() || floor <= 0.0 {
        return Err(CcaError::Configuration(format!(
            "Eigenvalue floor must be positive, got {}",
            floor
        )));
    }

    let sym = (a + a.transpose()) * 0.5;
    let eigen = SymmetricEigen::try_new(sym, f64::EPSILON, 0).ok_or_else(|| {
        CcaError::Numerical("Symmetric eigendecomposition did not converge".to_string())
    })?;

    let inv_sqrt = eigen.eigenvalues.map(|w| 1.0 / w.max(floor).sqrt());
    let v = &eigen.eigenvectors;
    let w = v * DMatrix::from_diagonal(&inv_sqrt) * v.transpose();

    // Re-symmetrize to remove rounding drift from the triple product
    Ok((&w + w.transpose()) * 0.5)
}
