//! End-to-end integration run: expand, transform, fit, project.

use crate::cca::{fit_cca, CcaConfig, CcaFit};
use crate::data::{BlockLayout, SampleTable};
use crate::error::{CcaError, Result};
use crate::normalize::{alr_forward_rows, log1p_block, zscore};
use crate::pipeline::report::{BlockWeights, CcaReport, ProjectedSample};
use crate::simulate::{simulate, SimulationConfig};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration of an integration run, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Run name.
    pub name: String,
    /// Which table columns form each block.
    pub layout: BlockLayout,
    /// Pseudocount for the ALR transform of the composition block.
    pub pseudocount: f64,
    /// Synthetic expansion before fitting; `None` fits on the table as given.
    pub simulation: Option<SimulationConfig>,
    /// CCA tuning constants.
    pub cca: CcaConfig,
    /// Canonical component the base samples are projected onto.
    pub component: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            name: "microbiome-metabolomics-cca".to_string(),
            layout: BlockLayout::default(),
            pseudocount: 1e-6,
            simulation: Some(SimulationConfig::default()),
            cca: CcaConfig::default(),
            component: 0,
        }
    }
}

impl IntegrationConfig {
    /// Load from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(CcaError::from)
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(CcaError::from)
    }

    /// Set the run name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the block layout.
    pub fn with_layout(mut self, layout: BlockLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or replace synthetic expansion.
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Fit directly on the input table.
    pub fn without_simulation(mut self) -> Self {
        self.simulation = None;
        self
    }

    /// Set the CCA configuration.
    pub fn with_cca(mut self, cca: CcaConfig) -> Self {
        self.cca = cca;
        self
    }

    /// Set the projected component.
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = component;
        self
    }
}

/// Transform a table into standardized CCA inputs.
///
/// Returns `(X, Y)` where `X = zscore(ALR(composition))` and
/// `Y = zscore(log1p(concentration))`.
pub fn prepare_blocks(
    table: &SampleTable,
    layout: &BlockLayout,
    pseudocount: f64,
) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let reference = layout.reference_index()?;
    let composition = table.block(&layout.composition_columns)?;
    let concentration = table.block(&layout.concentration_columns)?;

    let x = zscore(&alr_forward_rows(&composition, reference, pseudocount)?);
    let y = zscore(&log1p_block(&concentration)?);
    Ok((x, y))
}

/// Run the full integration on a base table.
///
/// 1. Optionally expand the base table with [`simulate`]
/// 2. Transform and standardize both blocks ([`prepare_blocks`])
/// 3. Fit CCA
/// 4. Transform the base table the same way and project each base sample
///    onto the configured canonical component
pub fn run_integration(base: &SampleTable, config: &IntegrationConfig) -> Result<CcaReport> {
    let layout = &config.layout;
    layout.validate()?;

    let training = match &config.simulation {
        Some(sim) => simulate(base, layout, sim)?,
        None => base.clone(),
    };
    info!(
        name = %config.name,
        n_base = base.n_samples(),
        n_training = training.n_samples(),
        "running CCA integration"
    );

    let (x, y) = prepare_blocks(&training, layout, config.pseudocount)?;
    let fit = fit_cca(&x, &y, &config.cca)?;

    let (x_base, y_base) = prepare_blocks(base, layout, config.pseudocount)?;
    let (u, v) = fit.variates(&x_base, &y_base, config.component)?;
    debug!(component = config.component, "projected base samples");

    let projections = base
        .sample_ids()
        .iter()
        .zip(base.groups())
        .zip(u.into_iter().zip(v))
        .map(|((id, group), (x_variate, y_variate))| ProjectedSample {
            sample_id: id.clone(),
            group: group.clone(),
            x_variate,
            y_variate,
        })
        .collect();

    Ok(build_report(config, &training, &fit, projections))
}

fn build_report(
    config: &IntegrationConfig,
    training: &SampleTable,
    fit: &CcaFit,
    projections: Vec<ProjectedSample>,
) -> CcaReport {
    let layout = &config.layout;
    CcaReport {
        name: config.name.clone(),
        n_training_samples: training.n_samples(),
        simulated: config.simulation.is_some(),
        x_block: layout.composition_name.clone(),
        y_block: layout.concentration_name.clone(),
        correlations: fit.correlations_vec(),
        x_weights: BlockWeights::from_matrix(layout.log_ratio_columns(), &fit.x_weights),
        y_weights: BlockWeights::from_matrix(
            layout.concentration_columns.clone(),
            &fit.y_weights,
        ),
        component: config.component,
        projections,
    }
}
