//! Integration tests for the paired-block CCA workflow.

use composable_cca::prelude::*;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn toy_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("toy_multiomics_4patients.csv")
}

fn toy_table() -> SampleTable {
    SampleTable::from_csv_with_layout(toy_path(), &BlockLayout::default()).unwrap()
}

fn random_block(rng: &mut ChaCha8Rng, n: usize, p: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, p, |_, _| StandardNormal.sample(&mut *rng))
}

fn assert_descending(values: &[f64]) {
    for w in values.windows(2) {
        assert!(w[0] >= w[1], "not descending: {:?}", values);
    }
}

#[test]
fn test_toy_table_loads_all_blocks() {
    let table = toy_table();
    let layout = BlockLayout::default();
    assert_eq!(table.n_samples(), 4);
    assert_eq!(table.n_features(), 10);

    let shapes = table.block_shapes(&layout).unwrap();
    assert_eq!(
        shapes,
        vec![
            ("microbiome".to_string(), 4, 4),
            ("metabolomics".to_string(), 4, 3),
            ("transcriptomics".to_string(), 4, 3),
        ]
    );
}

#[test]
fn test_whitening_identity_on_sample_covariance() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let x = random_block(&mut rng, 40, 4);
    let (xc, _) = center_columns(&x);
    let cov = xc.transpose() * &xc / 39.0;

    let w = inv_sqrt_spd(&cov, DEFAULT_EIGENVALUE_FLOOR).unwrap();
    let identity = &w * &cov * &w;
    for i in 0..4 {
        for j in 0..4 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((identity[(i, j)] - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn test_identical_blocks_scenario() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let x = zscore(&random_block(&mut rng, 10, 2));
    let fit = fit_cca(&x, &x, &CcaConfig::default().with_regularization(1e-3)).unwrap();

    let corr = fit.correlations_vec();
    assert_eq!(corr.len(), 2);
    assert_descending(&corr);
    for c in corr {
        assert!(c > 0.95 && c <= 1.0 + 1e-9, "correlation {}", c);
    }
}

#[test]
fn test_independent_blocks_scenario() {
    let mut rng = ChaCha8Rng::seed_from_u64(500);
    let x = random_block(&mut rng, 500, 3);
    let y = random_block(&mut rng, 500, 3);
    let fit = fit_cca(&x, &y, &CcaConfig::default()).unwrap();

    let corr = fit.correlations_vec();
    assert_descending(&corr);
    assert!(corr.iter().all(|&c| c < 0.5 && c >= -1e-9));
}

#[test]
fn test_fit_is_sign_invariant_reproducible() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let x = random_block(&mut rng, 80, 3);
    let y = random_block(&mut rng, 80, 4);

    let a = fit_cca(&x, &y, &CcaConfig::default()).unwrap();
    let b = fit_cca(&x, &y, &CcaConfig::default()).unwrap();
    assert_eq!(a.correlations, b.correlations);

    for i in 0..a.n_components() {
        let sign = a.x_weights.column(i).dot(&b.x_weights.column(i)).signum();
        let dx = a.x_weights.column(i) - b.x_weights.column(i) * sign;
        let dy = a.y_weights.column(i) - b.y_weights.column(i) * sign;
        assert!(dx.amax() < 1e-10);
        assert!(dy.amax() < 1e-10);
    }
}

#[test]
fn test_simulation_scenario_same_seed() {
    let base = toy_table();
    let layout = BlockLayout::default();
    let config = SimulationConfig::new(50).with_seed(7);

    let a = simulate(&base, &layout, &config).unwrap();
    let b = simulate(&base, &layout, &config).unwrap();
    assert_eq!(a.to_csv_string().unwrap(), b.to_csv_string().unwrap());

    let c = simulate(&base, &layout, &SimulationConfig::new(50).with_seed(8)).unwrap();
    assert_ne!(a.to_csv_string().unwrap(), c.to_csv_string().unwrap());
    assert_eq!(c.n_samples(), 50);
    assert_eq!(c.feature_names(), a.feature_names());

    let comp = c.block(&layout.composition_columns).unwrap();
    for i in 0..comp.nrows() {
        assert!((comp.row(i).sum() - 1.0).abs() < 1e-10);
    }
}

#[test]
fn test_composition_round_trip_scenario() {
    let x = [0.7, 0.2, 0.1];
    let r = alr_forward(&x, 2, 1e-6).unwrap();
    assert_eq!(r.len(), 2);
    let back = alr_inverse(&r, 2).unwrap();
    for (a, b) in x.iter().zip(back.iter()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_simulated_csv_written_and_reloaded() {
    let base = toy_table();
    let layout = BlockLayout::default();
    let expanded = simulate(&base, &layout, &SimulationConfig::new(25).with_seed(4)).unwrap();

    let file = NamedTempFile::new().unwrap();
    expanded.to_csv(file.path()).unwrap();
    let reloaded = SampleTable::from_csv_with_layout(file.path(), &layout).unwrap();

    assert_eq!(reloaded, expanded);
    assert_eq!(reloaded.sample_ids()[24], "S25");
}

#[test]
fn test_run_integration_from_yaml_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "name: yaml-run").unwrap();
    writeln!(file, "simulation:").unwrap();
    writeln!(file, "  n_samples: 200").unwrap();
    writeln!(file, "  seed: 0").unwrap();
    writeln!(file, "cca:").unwrap();
    writeln!(file, "  regularization: 0.001").unwrap();
    file.flush().unwrap();

    let yaml = std::fs::read_to_string(file.path()).unwrap();
    let config = IntegrationConfig::from_yaml(&yaml).unwrap();
    assert_eq!(config.simulation.as_ref().unwrap().n_samples, 200);
    assert!((config.simulation.as_ref().unwrap().composition_noise_sd - 0.15).abs() < 1e-12);

    let report = run_integration(&toy_table(), &config).unwrap();
    assert_eq!(report.name, "yaml-run");
    assert_eq!(report.n_training_samples, 200);
    assert_eq!(report.correlations.len(), 3);
    assert_descending(&report.correlations);
    assert!(report.correlations.iter().all(|&c| c <= 1.0 + 1e-6));

    let proj = &report.projections;
    assert_eq!(proj.len(), 4);
    assert!(proj.iter().all(|p| p.x_variate.is_finite() && p.y_variate.is_finite()));

    let json = report.to_json().unwrap();
    assert!(json.contains("\"projections\""));
    assert!(report.to_text().contains("CCA1_microbiome"));
}

#[test]
fn test_projection_matches_manual_variates() {
    let base = toy_table();
    let layout = BlockLayout::default();
    let training = simulate(&base, &layout, &SimulationConfig::new(150).with_seed(2)).unwrap();

    let (x, y) = prepare_blocks(&training, &layout, 1e-6).unwrap();
    let fit = fit_cca(&x, &y, &CcaConfig::default()).unwrap();

    let (xb, yb) = prepare_blocks(&base, &layout, 1e-6).unwrap();
    let u = fit.transform_x(&xb).unwrap();
    let (u0, _) = fit.variates(&xb, &yb, 0).unwrap();

    // xb is z-scored, so centering is a no-op and u = xb * A
    let manual = &xb * fit.x_weights.column(0);
    for i in 0..base.n_samples() {
        assert!((u[(i, 0)] - u0[i]).abs() < 1e-12);
        assert!((manual[i] - u0[i]).abs() < 1e-10);
    }
}

#[test]
fn test_errors_surface_without_partial_results() {
    let x = DMatrix::from_element(3, 2, 1.0);
    let y = DMatrix::from_element(4, 2, 1.0);
    assert!(matches!(
        fit_cca(&x, &y, &CcaConfig::default()),
        Err(CcaError::Dimension(_))
    ));

    assert!(matches!(
        alr_forward(&[0.0, 1.0], 1, 0.0),
        Err(CcaError::InvalidComposition { .. })
    ));

    assert!(matches!(
        inv_sqrt_spd(&DMatrix::identity(2, 2), -1e-8),
        Err(CcaError::Configuration(_))
    ));
}
