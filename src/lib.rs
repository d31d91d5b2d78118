//! Composable Canonical Correlation Analysis (CCA) Library
//!
//! This library finds shared linear structure between two paired measurement
//! blocks, such as microbiome composition and metabolite concentrations
//! measured on the same subjects.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Paired sample table and block layout
//! - **normalize**: ALR transform (and inverse), z-score, log1p
//! - **linalg**: Inverse square root of symmetric PSD matrices (whitening)
//! - **cca**: Regularized CCA via whitening and SVD
//! - **simulate**: Synthetic expansion of small paired tables
//! - **pipeline**: End-to-end integration and reporting
//!
//! # Example
//!
//! ```no_run
//! use composable_cca::prelude::*;
//!
//! let layout = BlockLayout::default();
//! let table = SampleTable::from_csv_with_layout("toy_multiomics.csv", &layout).unwrap();
//!
//! let config = IntegrationConfig::default()
//!     .with_layout(layout)
//!     .with_simulation(SimulationConfig::new(300).with_seed(0));
//! let report = run_integration(&table, &config).unwrap();
//! println!("{}", report.to_text());
//! ```
//!
//! # Sign convention
//!
//! Each canonical pair is defined only up to a joint sign flip of its X and Y
//! weight columns. Compare fits with sign-invariant checks.

pub mod cca;
pub mod data;
pub mod error;
pub mod linalg;
pub mod normalize;
pub mod pipeline;
pub mod simulate;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cca::{fit_cca, project, CcaConfig, CcaFit, DEFAULT_REGULARIZATION};
    pub use crate::data::{BlockLayout, NamedBlock, SampleTable};
    pub use crate::error::{CcaError, Result};
    pub use crate::linalg::{inv_sqrt_spd, DEFAULT_EIGENVALUE_FLOOR};
    pub use crate::normalize::{
        alr_forward, alr_forward_rows, alr_inverse, alr_inverse_rows, center_columns,
        log1p_block, zscore,
    };
    pub use crate::pipeline::{
        prepare_blocks, run_integration, BlockWeights, CcaReport, IntegrationConfig,
        ProjectedSample,
    };
    pub use crate::simulate::{simulate, simulate_with_rng, SimulationConfig};
}
