//! Serializable summary of an integration run.

use crate::error::Result;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Canonical weights of one block with their feature names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockWeights {
    /// Feature names, one per weight row.
    pub features: Vec<String>,
    /// `weights[f][c]` is the weight of feature `f` on component `c`.
    pub weights: Vec<Vec<f64>>,
}

impl BlockWeights {
    /// Convert a (features × components) weight matrix.
    pub fn from_matrix(features: Vec<String>, matrix: &DMatrix<f64>) -> Self {
        let weights = (0..matrix.nrows())
            .map(|i| matrix.row(i).iter().cloned().collect())
            .collect();
        Self { features, weights }
    }

    /// Weights of every feature on one component.
    pub fn component(&self, component: usize) -> Vec<f64> {
        self.weights
            .iter()
            .map(|row| row.get(component).copied().unwrap_or(f64::NAN))
            .collect()
    }
}

/// A base sample placed on a canonical component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSample {
    pub sample_id: String,
    pub group: String,
    /// Canonical variate of the X (composition) block.
    pub x_variate: f64,
    /// Canonical variate of the Y (concentration) block.
    pub y_variate: f64,
}

/// Result of [`run_integration`](crate::pipeline::run_integration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcaReport {
    /// Run name.
    pub name: String,
    /// Number of samples CCA was fitted on.
    pub n_training_samples: usize,
    /// Whether the training samples were synthetically expanded.
    pub simulated: bool,
    /// Name of the X block.
    pub x_block: String,
    /// Name of the Y block.
    pub y_block: String,
    /// Canonical correlations, descending.
    pub correlations: Vec<f64>,
    /// X-block weights (ALR coordinates).
    pub x_weights: BlockWeights,
    /// Y-block weights.
    pub y_weights: BlockWeights,
    /// Component the base samples were projected onto.
    pub component: usize,
    /// Base samples on that component.
    pub projections: Vec<ProjectedSample>,
}

impl CcaReport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text summary for the console (same as the `Display` output).
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CcaReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cc = self.component + 1;

        writeln!(
            f,
            "CCA between {} (ALR log-ratios) and {} (log1p):",
            self.x_block, self.y_block
        )?;
        let kind = if self.simulated { "simulated" } else { "observed" };
        writeln!(f, "- {} samples: {}", kind, self.n_training_samples)?;
        writeln!(f, "- canonical correlations:")?;
        let corr: Vec<String> = self.correlations.iter().map(|c| format!("{:.3}", c)).collect();
        writeln!(f, "  {}", corr.join(", "))?;
        writeln!(f)?;

        writeln!(f, "Weights on CCA{}:", cc)?;
        let x = self
            .x_weights
            .features
            .iter()
            .zip(self.x_weights.component(self.component));
        let y = self
            .y_weights
            .features
            .iter()
            .zip(self.y_weights.component(self.component));
        for (name, w) in x.chain(y) {
            writeln!(f, "  {:<12} {:>9.4}", name, w)?;
        }
        writeln!(f)?;

        writeln!(f, "Base samples on the canonical variate (CCA{}):", cc)?;
        let x_label = format!("CCA{}_{}", cc, self.x_block);
        let y_label = format!("CCA{}_{}", cc, self.y_block);
        writeln!(
            f,
            "  {:<10} {:<8} {:>18} {:>18}",
            "Sample", "Group", x_label, y_label
        )?;
        for p in &self.projections {
            writeln!(
                f,
                "  {:<10} {:<8} {:>18.4} {:>18.4}",
                p.sample_id, p.group, p.x_variate, p.y_variate
            )?;
        }
        Ok(())
    }
}
