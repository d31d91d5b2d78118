//! End-to-end integration of paired blocks.

mod report;
mod runner;

pub use report::{BlockWeights, CcaReport, ProjectedSample};
pub use runner::{prepare_blocks, run_integration, IntegrationConfig};
