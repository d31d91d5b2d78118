//! Additive Log-Ratio (ALR) transformation for compositional data.
//!
//! ALR maps a strictly positive composition (summing to 1) onto unconstrained
//! real coordinates by taking the log-ratio of each component relative to a
//! reference component. The inverse maps any real vector back onto the
//! simplex, so noise added in ALR space can never produce an invalid
//! composition.
//!
//! | Property | Composition | ALR |
//! |----------|-------------|-----|
//! | Length | p | p-1 |
//! | Constraint | positive, sums to 1 | none |
//! | Reference | n/a | one component, excluded from output |
//!
//! Matrices are handled row-wise: each row is one sample.

use crate::error::{CcaError, Result};
use nalgebra::DMatrix;

/// Apply the ALR transform to a single composition.
///
/// # Formula
/// ALR(x)_i = ln((x_i + pc) / (x_ref + pc)) for every i != ref
///
/// Component order is preserved with the reference removed, so the output has
/// one fewer element than the input.
///
/// # Errors
/// - `Dimension` if the composition has fewer than 2 components or the
///   reference index is out of range
/// - `Configuration` if the pseudocount is negative or not finite
/// - `InvalidComposition` if any shifted component `x_i + pc` is not positive
pub fn alr_forward(composition: &[f64], reference: usize, pseudocount: f64) -> Result<Vec<f64>> {
    let p = composition.len();

    if p < 2 {
        return Err(CcaError::Dimension(format!(
            "ALR requires at least 2 components, got {}",
            p
        )));
    }
    if reference >= p {
        return Err(CcaError::Dimension(format!(
            "Reference index {} out of bounds (n_components = {})",
            reference, p
        )));
    }
    check_pseudocount(pseudocount)?;

    for (index, &value) in composition.iter().enumerate() {
        let shifted = value + pseudocount;
        if shifted.is_nan() || shifted <= 0.0 {
            return Err(CcaError::InvalidComposition { index, value });
        }
    }

    let log_ref = (composition[reference] + pseudocount).ln();

    Ok(composition
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != reference)
        .map(|(_, &x)| (x + pseudocount).ln() - log_ref)
        .collect())
}

/// Invert the ALR transform back onto the simplex.
///
/// The reference share is `1 / (1 + sum(exp(r)))`, every other share is
/// `exp(r_i)` times the reference share, and the reference share is
/// reinserted at `reference`. The result sums to 1.
///
/// Exponents are shifted by `m = max(0, max r)` before evaluation, so large
/// log-ratios cannot overflow. Shares far below the largest one may underflow
/// to 0.
///
/// `reference` may range over `0..=log_ratios.len()`.
///
/// # Errors
/// - `Dimension` if the reference index is out of range
/// - `Numerical` if a log-ratio is NaN or infinite
pub fn alr_inverse(log_ratios: &[f64], reference: usize) -> Result<Vec<f64>> {
    if reference > log_ratios.len() {
        return Err(CcaError::Dimension(format!(
            "Reference index {} out of bounds (n_components = {})",
            reference,
            log_ratios.len() + 1
        )));
    }
    if let Some((i, r)) = log_ratios.iter().enumerate().find(|(_, r)| !r.is_finite()) {
        return Err(CcaError::Numerical(format!(
            "Log-ratio {} is not finite: {}",
            i, r
        )));
    }

    let shift = log_ratios.iter().cloned().fold(0.0, f64::max);
    let ref_weight = (-shift).exp();
    let weights: Vec<f64> = log_ratios.iter().map(|r| (r - shift).exp()).collect();
    let total = ref_weight + weights.iter().sum::<f64>();

    let mut composition: Vec<f64> = weights.iter().map(|w| w / total).collect();
    composition.insert(reference, ref_weight / total);

    Ok(composition)
}

/// Apply [`alr_forward`] to every row of an n × p matrix, giving n × (p-1).
pub fn alr_forward_rows(
    data: &DMatrix<f64>,
    reference: usize,
    pseudocount: f64,
) -> Result<DMatrix<f64>> {
    let (n_samples, n_components) = data.shape();
    if n_components < 2 {
        return Err(CcaError::Dimension(format!(
            "ALR requires at least 2 components, got {}",
            n_components
        )));
    }

    let mut out = DMatrix::zeros(n_samples, n_components - 1);
    for i in 0..n_samples {
        let row: Vec<f64> = data.row(i).iter().cloned().collect();
        let ratios = alr_forward(&row, reference, pseudocount)?;
        for (j, r) in ratios.into_iter().enumerate() {
            out[(i, j)] = r;
        }
    }
    Ok(out)
}

/// Apply [`alr_inverse`] to every row of an n × (p-1) matrix, giving n × p.
pub fn alr_inverse_rows(log_ratios: &DMatrix<f64>, reference: usize) -> Result<DMatrix<f64>> {
    let (n_samples, n_ratios) = log_ratios.shape();

    let mut out = DMatrix::zeros(n_samples, n_ratios + 1);
    for i in 0..n_samples {
        let row: Vec<f64> = log_ratios.row(i).iter().cloned().collect();
        let composition = alr_inverse(&row, reference)?;
        for (j, x) in composition.into_iter().enumerate() {
            out[(i, j)] = x;
        }
    }
    Ok(out)
}

fn check_pseudocount(pseudocount: f64) -> Result<()> {
    if !pseudocount.is_finite() || pseudocount < 0.0 {
        return Err(CcaError::Configuration(format!(
            "Pseudocount must be finite and non-negative, got {}",
            pseudocount
        )));
    }
    Ok(())
}
