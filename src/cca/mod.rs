//! Canonical correlation analysis between paired measurement blocks.
//!
//! CCA finds paired linear projections of two blocks that are maximally
//! correlated. It describes association, not direction or causality.

mod solver;

pub use solver::{fit_cca, project, CcaConfig, CcaFit, DEFAULT_REGULARIZATION};
