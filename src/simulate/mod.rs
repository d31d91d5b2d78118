//! Synthetic expansion of small paired datasets.

mod generate;

pub use generate::{simulate, simulate_with_rng, SimulationConfig};
