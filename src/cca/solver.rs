//! Regularized canonical correlation analysis via whitening and SVD.

use crate::error::{CcaError, Result};
use crate::linalg::{inv_sqrt_spd, DEFAULT_EIGENVALUE_FLOOR};
use crate::normalize::center_columns;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default ridge added to the diagonal of each within-block covariance.
pub const DEFAULT_REGULARIZATION: f64 = 1e-3;

/// Correlations above `1 + CORRELATION_TOLERANCE` are logged.
const CORRELATION_TOLERANCE: f64 = 1e-6;

/// Tuning constants for [`fit_cca`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcaConfig {
    /// Ridge strength added to `Sxx` and `Syy` (not to `Sxy`).
    pub regularization: f64,
    /// Floor eigenvalues are clipped to when whitening.
    pub eigenvalue_floor: f64,
}

impl Default for CcaConfig {
    fn default() -> Self {
        Self {
            regularization: DEFAULT_REGULARIZATION,
            eigenvalue_floor: DEFAULT_EIGENVALUE_FLOOR,
        }
    }
}

impl CcaConfig {
    /// Set the regularization strength.
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Set the eigenvalue floor.
    pub fn with_eigenvalue_floor(mut self, floor: f64) -> Self {
        self.eigenvalue_floor = floor;
        self
    }

    /// Check that both constants are in range.
    pub fn validate(&self) -> Result<()> {
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(CcaError::Configuration(format!(
                "Regularization must be finite and non-negative, got {}",
                self.regularization
            )));
        }
        if !self.eigenvalue_floor.is_finite() || self.eigenvalue_floor <= 0.0 {
            return Err(CcaError::Configuration(format!(
                "Eigenvalue floor must be positive, got {}",
                self.eigenvalue_floor
            )));
        }
        Ok(())
    }
}

/// A fitted canonical correlation model.
///
/// Column `i` of `x_weights` and column `i` of `y_weights` form the `i`-th
/// canonical pair, with strength `correlations[i]`. Each pair is only defined
/// up to a joint sign flip: negating both columns describes the same pair.
#[derive(Debug, Clone)]
pub struct CcaFit {
    /// X-block weights (p × k).
    pub x_weights: DMatrix<f64>,
    /// Y-block weights (q × k).
    pub y_weights: DMatrix<f64>,
    /// Canonical correlations, descending (length k = min(p, q)).
    pub correlations: DVector<f64>,
    /// Column means of the X block used for centering.
    pub x_means: DVector<f64>,
    /// Column means of the Y block used for centering.
    pub y_means: DVector<f64>,
    /// Number of samples the model was fitted on.
    pub n_samples: usize,
    /// Configuration used for the fit.
    pub config: CcaConfig,
}

impl CcaFit {
    /// Number of canonical pairs.
    pub fn n_components(&self) -> usize {
        self.correlations.len()
    }

    /// Number of X-block features.
    pub fn n_x_features(&self) -> usize {
        self.x_weights.nrows()
    }

    /// Number of Y-block features.
    pub fn n_y_features(&self) -> usize {
        self.y_weights.nrows()
    }

    /// Canonical correlations as a plain vector.
    pub fn correlations_vec(&self) -> Vec<f64> {
        self.correlations.iter().cloned().collect()
    }

    /// Project X-block samples onto the canonical axes (n × k).
    ///
    /// The samples are centered by their own column means before projection,
    /// so any paired table (including a small one the model was not fitted
    /// on) can be placed on the same axes.
    pub fn transform_x(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        project(x, &self.x_weights)
    }

    /// Project Y-block samples onto the canonical axes (n × k).
    pub fn transform_y(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        project(y, &self.y_weights)
    }

    /// Project X-block samples after centering by the training means.
    ///
    /// Unlike [`transform_x`](Self::transform_x), a shift of the new samples
    /// relative to the training data is kept in the variates.
    pub fn transform_x_with_training_means(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        project_with_means(x, &self.x_weights, &self.x_means)
    }

    /// Project Y-block samples after centering by the training means.
    pub fn transform_y_with_training_means(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        project_with_means(y, &self.y_weights, &self.y_means)
    }

    /// Canonical variates of a single component for both blocks.
    pub fn variates(
        &self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        component: usize,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        if component >= self.n_components() {
            return Err(CcaError::Dimension(format!(
                "Component {} out of bounds (n_components = {})",
                component,
                self.n_components()
            )));
        }
        if x.nrows() != y.nrows() {
            return Err(row_mismatch(x.nrows(), y.nrows()));
        }
        let u = self.transform_x(x)?;
        let v = self.transform_y(y)?;
        Ok((
            u.column(component).iter().cloned().collect(),
            v.column(component).iter().cloned().collect(),
        ))
    }
}

/// Center `data` by its column means and multiply by `weights`.
pub fn project(data: &DMatrix<f64>, weights: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if data.ncols() != weights.nrows() {
        return Err(CcaError::Dimension(format!(
            "Block has {} features but weights expect {}",
            data.ncols(),
            weights.nrows()
        )));
    }
    let (centered, _) = center_columns(data);
    Ok(centered * weights)
}

fn project_with_means(
    data: &DMatrix<f64>,
    weights: &DMatrix<f64>,
    means: &DVector<f64>,
) -> Result<DMatrix<f64>> {
    if data.ncols() != weights.nrows() {
        return Err(CcaError::Dimension(format!(
            "Block has {} features but weights expect {}",
            data.ncols(),
            weights.nrows()
        )));
    }
    let centered = DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| data[(i, j)] - means[j]);
    Ok(centered * weights)
}

/// Fit canonical correlation analysis between paired blocks.
///
/// # Algorithm
/// 1. Center both blocks column-wise
/// 2. `Sxx = XcᵀXc/(n-1) + reg·I`, `Syy = YcᵀYc/(n-1) + reg·I`, `Sxy = XcᵀYc/(n-1)`
/// 3. Whiten: `Wx = Sxx^{-1/2}`, `Wy = Syy^{-1/2}` (eigenvalues floored)
/// 4. Thin SVD of `M = Wx·Sxy·Wy = U·S·Vᵀ`, sorted by descending singular value
/// 5. `A = Wx·U`, `B = Wy·V`, correlations = `S`
///
/// # Arguments
/// * `x` - X block (n samples × p features)
/// * `y` - Y block (n samples × q features), rows paired with `x`
/// * `config` - Regularization and eigenvalue floor
///
/// # Errors
/// - `Dimension` if the blocks have different row counts, fewer than 2 rows,
///   or zero columns
/// - `Configuration` if the config is out of range
/// - `Numerical` if a decomposition fails to converge
///
/// Correlations may slightly exceed 1 with few samples and weak
/// regularization; they are returned as computed.
pub fn fit_cca(x: &DMatrix<f64>, y: &DMatrix<f64>, config: &CcaConfig) -> Result<CcaFit> {
    let (n_samples, p) = x.shape();
    let q = y.ncols();

    if y.nrows() != n_samples {
        return Err(row_mismatch(n_samples, y.nrows()));
    }
    if n_samples < 2 {
        return Err(CcaError::Dimension(format!(
            "CCA requires at least 2 samples, got {}",
            n_samples
        )));
    }
    if p == 0 || q == 0 {
        return Err(CcaError::Dimension(format!(
            "CCA requires non-empty blocks, got {} and {} features",
            p, q
        )));
    }
    config.validate()?;

    let (xc, x_means) = center_columns(x);
    let (yc, y_means) = center_columns(y);

    let denom = (n_samples - 1) as f64;
    let reg = config.regularization;
    let sxx = xc.transpose() * &xc / denom + DMatrix::identity(p, p) * reg;
    let syy = yc.transpose() * &yc / denom + DMatrix::identity(q, q) * reg;
    let sxy = xc.transpose() * &yc / denom;

    let wx = inv_sqrt_spd(&sxx, config.eigenvalue_floor)?;
    let wy = inv_sqrt_spd(&syy, config.eigenvalue_floor)?;

    let m = &wx * sxy * &wy;
    let svd = m
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or_else(|| CcaError::Numerical("SVD did not converge".to_string()))?;
    let u = svd
        .u
        .ok_or_else(|| CcaError::Numerical("SVD returned no left singular vectors".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| CcaError::Numerical("SVD returned no right singular vectors".to_string()))?;
    let singular_values = svd.singular_values;

    let k = singular_values.len();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));

    let correlations = DVector::from_iterator(k, order.iter().map(|&i| singular_values[i]));
    let u_sorted = DMatrix::from_fn(p, k, |r, c| u[(r, order[c])]);
    let v_sorted = DMatrix::from_fn(q, k, |r, c| v_t[(order[c], r)]);

    let x_weights = &wx * u_sorted;
    let y_weights = &wy * v_sorted;

    if let Some(max) = correlations.iter().cloned().reduce(f64::max) {
        if max > 1.0 + CORRELATION_TOLERANCE {
            warn!(
                max_correlation = max,
                n_samples,
                "canonical correlation exceeds 1; consider more samples or stronger regularization"
            );
        }
    }
    debug!(n_samples, p, q, k, regularization = reg, "fitted CCA");

    Ok(CcaFit {
        x_weights,
        y_weights,
        correlations,
        x_means,
        y_means,
        n_samples,
        config: *config,
    })
}

fn row_mismatch(expected: usize, actual: usize) -> CcaError {
    CcaError::Dimension(format!(
        "Paired blocks must have the same number of rows: {} vs {}",
        expected, actual
    ))
}
