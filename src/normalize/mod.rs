//! Per-block transforms applied before canonical correlation analysis.
//!
//! - **ALR**: additive log-ratio for compositional blocks, with its inverse
//! - **Z-score**: column-wise standardization (population standard deviation)
//! - **log1p**: variance stabilization for nonnegative concentrations

pub mod alr;
pub mod zscore;

pub use alr::{alr_forward, alr_forward_rows, alr_inverse, alr_inverse_rows};
pub use zscore::{center_columns, log1p_block, zscore};
