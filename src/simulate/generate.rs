//! Expand a small paired table into a larger one by noisy resampling.
//!
//! Rows are drawn with replacement and perturbed in a space where the noise
//! cannot break the physical constraints of each block:
//!
//! - compositions get Gaussian noise in ALR coordinates and are mapped back
//!   onto the simplex, so they stay positive and sum to 1
//! - concentrations get Gaussian noise in `log1p` space, are mapped back with
//!   `expm1`, and negatives are clipped to zero
//!
//! The expansion only exists to give CCA enough samples to be numerically
//! stable; it adds no information beyond the base table.

use crate::data::{BlockLayout, SampleTable};
use crate::error::{CcaError, Result};
use crate::normalize::{alr_forward, alr_inverse, log1p_block};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for synthetic expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of samples to generate.
    pub n_samples: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Standard deviation of the noise added in ALR space.
    pub composition_noise_sd: f64,
    /// Standard deviation of the noise added in log1p space.
    pub concentration_noise_sd: f64,
    /// Pseudocount used for the ALR transform.
    pub pseudocount: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_samples: 300,
            seed: 0,
            composition_noise_sd: 0.15,
            concentration_noise_sd: 0.10,
            pseudocount: 1e-6,
        }
    }
}

impl SimulationConfig {
    /// Create a config for `n_samples` samples with default noise levels.
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Default::default()
        }
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set noise standard deviations for the composition and concentration blocks.
    pub fn with_noise(mut self, composition_sd: f64, concentration_sd: f64) -> Self {
        self.composition_noise_sd = composition_sd;
        self.concentration_noise_sd = concentration_sd;
        self
    }

    /// Set the ALR pseudocount.
    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    /// Check that sample count and noise levels are usable.
    pub fn validate(&self) -> Result<()> {
        if self.n_samples == 0 {
            return Err(CcaError::Dimension(
                "Simulation needs at least 1 output sample".to_string(),
            ));
        }
        for (name, sd) in [
            ("composition_noise_sd", self.composition_noise_sd),
            ("concentration_noise_sd", self.concentration_noise_sd),
        ] {
            if !sd.is_finite() || sd < 0.0 {
                return Err(CcaError::Configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, sd
                )));
            }
        }
        if !self.pseudocount.is_finite() || self.pseudocount < 0.0 {
            return Err(CcaError::Configuration(format!(
                "pseudocount must be finite and non-negative, got {}",
                self.pseudocount
            )));
        }
        Ok(())
    }
}

/// Generate `config.n_samples` synthetic samples from `base`.
///
/// Uses a `ChaCha8Rng` seeded with `config.seed`, so the same seed always
/// yields the same table on every platform.
pub fn simulate(
    base: &SampleTable,
    layout: &BlockLayout,
    config: &SimulationConfig,
) -> Result<SampleTable> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    simulate_with_rng(base, layout, config, &mut rng)
}

/// Generate synthetic samples drawing from a caller-supplied random source.
///
/// Draws are consumed in this order:
/// 1. `n` row indices, uniform over the base rows, with replacement
/// 2. composition noise, row by row, one draw per ALR coordinate
/// 3. concentration noise, row by row, one draw per concentration column
///
/// Group labels follow their source rows; ids are `S1..Sn`. The output holds
/// the composition columns then the concentration columns, in layout order.
/// `config.seed` is ignored here.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    base: &SampleTable,
    layout: &BlockLayout,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SampleTable> {
    config.validate()?;
    layout.validate()?;

    let n_base = base.n_samples();
    if n_base == 0 {
        return Err(CcaError::Dimension("Base table has no samples".to_string()));
    }

    let reference = layout.reference_index()?;
    let composition = base.block(&layout.composition_columns)?;
    let concentration = base.block(&layout.concentration_columns)?;
    let log_concentration = log1p_block(&concentration)?;

    let n = config.n_samples;
    let p = composition.ncols();
    let q = concentration.ncols();

    let composition_noise = Normal::new(0.0, config.composition_noise_sd)
        .map_err(|e| CcaError::Configuration(e.to_string()))?;
    let concentration_noise = Normal::new(0.0, config.concentration_noise_sd)
        .map_err(|e| CcaError::Configuration(e.to_string()))?;

    // 1. Row selection
    let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n_base)).collect();

    let mut out = DMatrix::zeros(n, p + q);

    // 2. Composition block in ALR space
    for (i, &row) in rows.iter().enumerate() {
        let values: Vec<f64> = composition.row(row).iter().cloned().collect();
        let mut ratios = alr_forward(&values, reference, config.pseudocount)?;
        for r in ratios.iter_mut() {
            *r += composition_noise.sample(rng);
        }
        let noisy = alr_inverse(&ratios, reference)?;
        for (j, x) in noisy.into_iter().enumerate() {
            out[(i, j)] = x;
        }
    }

    // 3. Concentration block in log1p space
    for (i, &row) in rows.iter().enumerate() {
        for j in 0..q {
            let noisy = log_concentration[(row, j)] + concentration_noise.sample(rng);
            out[(i, p + j)] = noisy.exp_m1().max(0.0);
        }
    }

    let sample_ids: Vec<String> = (1..=n).map(|i| format!("S{}", i)).collect();
    let groups: Vec<String> = rows.iter().map(|&r| base.groups()[r].clone()).collect();

    debug!(
        n_base,
        n_samples = n,
        reference = %layout.reference_column,
        "simulated paired samples"
    );

    SampleTable::new(
        base.id_column(),
        base.group_column(),
        sample_ids,
        groups,
        layout.feature_columns(),
        out,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy_base() -> SampleTable {
        let csv = "\
Patient,Group,BugA,BugB,BugC,BugD,Met1,Met2,Met3
P1,0,0.40,0.30,0.20,0.10,1.2,0.0,3.4
P2,0,0.35,0.35,0.15,0.15,1.0,0.1,3.0
P3,1,0.10,0.20,0.30,0.40,4.5,2.2,0.5
P4,1,0.05,0.25,0.30,0.40,5.0,2.0,0.4
";
        SampleTable::from_reader(csv.as_bytes(), "Patient", "Group").unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.n_samples, 300);
        assert_eq!(config.seed, 0);
        assert_relative_eq!(config.composition_noise_sd, 0.15);
        assert_relative_eq!(config.concentration_noise_sd, 0.10);
    }

    #[test]
    fn test_simulate_shape_and_ids() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let out = simulate(&base, &layout, &SimulationConfig::new(50).with_seed(7)).unwrap();

        assert_eq!(out.n_samples(), 50);
        assert_eq!(out.feature_names(), layout.feature_columns().as_slice());
        assert_eq!(out.sample_ids()[0], "S1");
        assert_eq!(out.sample_ids()[49], "S50");
        assert_eq!(out.id_column(), "Patient");
        assert!(out.groups().iter().all(|g| g == "0" || g == "1"));
    }

    #[test]
    fn test_compositions_stay_on_simplex() {
        let base = toy_base();
        let layout = BlockLayout::default();
        // Large noise still cannot leave the simplex
        let config = SimulationConfig::new(200).with_seed(1).with_noise(3.0, 0.1);
        let out = simulate(&base, &layout, &config).unwrap();
        let comp = out.block(&layout.composition_columns).unwrap();

        for i in 0..comp.nrows() {
            assert!(comp.row(i).iter().all(|&x| x > 0.0));
            assert_relative_eq!(comp.row(i).sum(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_extreme_composition_noise_stays_valid() {
        let base = toy_base();
        let layout = BlockLayout::default();
        // ALR coordinates reach several hundred, well past exp overflow
        let config = SimulationConfig::new(50).with_seed(3).with_noise(500.0, 0.1);
        let out = simulate(&base, &layout, &config).unwrap();
        let comp = out.block(&layout.composition_columns).unwrap();

        for i in 0..comp.nrows() {
            assert!(comp.row(i).iter().all(|&x| x.is_finite() && x >= 0.0));
            assert_relative_eq!(comp.row(i).sum(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_concentrations_nonnegative() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let config = SimulationConfig::new(200).with_seed(2).with_noise(0.15, 2.0);
        let out = simulate(&base, &layout, &config).unwrap();
        let conc = out.block(&layout.concentration_columns).unwrap();
        assert!(conc.iter().all(|&x| x >= 0.0));
        // Heavy noise on a zero concentration must hit the clip
        assert!(conc.iter().any(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_noise_reproduces_base_rows() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let config = SimulationConfig::new(30)
            .with_seed(9)
            .with_noise(0.0, 0.0)
            .with_pseudocount(0.0);
        let out = simulate(&base, &layout, &config).unwrap();

        let base_conc = base.block(&layout.concentration_columns).unwrap();
        let out_conc = out.block(&layout.concentration_columns).unwrap();
        let out_comp = out.block(&layout.composition_columns).unwrap();

        for i in 0..out.n_samples() {
            // Each output row matches some base row exactly up to rounding
            let matched = (0..base.n_samples()).any(|b| {
                (0..3).all(|j| (out_conc[(i, j)] - base_conc[(b, j)]).abs() < 1e-12)
                    && base.groups()[b] == out.groups()[i]
            });
            assert!(matched, "row {} has no source", i);
            assert_relative_eq!(out_comp.row(i).sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_same_seed_identical() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let config = SimulationConfig::new(50).with_seed(7);
        let a = simulate(&base, &layout, &config).unwrap();
        let b = simulate(&base, &layout, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_csv_string().unwrap(), b.to_csv_string().unwrap());
    }

    #[test]
    fn test_different_seed_differs() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let a = simulate(&base, &layout, &SimulationConfig::new(50).with_seed(7)).unwrap();
        let b = simulate(&base, &layout, &SimulationConfig::new(50).with_seed(8)).unwrap();
        assert_ne!(a.data(), b.data());
        assert_eq!(a.data().shape(), b.data().shape());
        assert_eq!(a.feature_names(), b.feature_names());
    }

    #[test]
    fn test_injected_rng_matches_seeded() {
        let base = toy_base();
        let layout = BlockLayout::default();
        let config = SimulationConfig::new(20).with_seed(42);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let a = simulate_with_rng(&base, &layout, &config, &mut rng).unwrap();
        let b = simulate(&base, &layout, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_configs() {
        let base = toy_base();
        let layout = BlockLayout::default();

        let err = simulate(&base, &layout, &SimulationConfig::new(0)).unwrap_err();
        assert!(matches!(err, CcaError::Dimension(_)));

        let config = SimulationConfig::new(10).with_noise(-0.1, 0.1);
        let err = simulate(&base, &layout, &config).unwrap_err();
        assert!(matches!(err, CcaError::Configuration(_)));
    }

    #[test]
    fn test_zero_component_without_pseudocount() {
        let csv = "\
Patient,Group,BugA,BugB,BugC,BugD,Met1,Met2,Met3
P1,0,0.0,0.5,0.25,0.25,1.0,1.0,1.0
";
        let base = SampleTable::from_reader(csv.as_bytes(), "Patient", "Group").unwrap();
        let config = SimulationConfig::new(5).with_pseudocount(0.0);
        let err = simulate(&base, &BlockLayout::default(), &config).unwrap_err();
        assert!(matches!(err, CcaError::InvalidComposition { index: 0, .. }));
    }

    #[test]
    fn test_missing_block_column() {
        let csv = "Patient,Group,BugA,BugB\nP1,0,0.5,0.5\n";
        let base = SampleTable::from_reader(csv.as_bytes(), "Patient", "Group").unwrap();
        let err = simulate(&base, &BlockLayout::default(), &SimulationConfig::new(5)).unwrap_err();
        assert!(matches!(err, CcaError::MissingColumn(_)));
    }
}
