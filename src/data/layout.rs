//! Column layout describing which table columns form each measurement block.

use crate::error::{CcaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named group of table columns that is summarized but not analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedBlock {
    pub name: String,
    pub columns: Vec<String>,
}

impl NamedBlock {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }
}

/// Names of the identifier, group, and block columns of a paired table.
///
/// The composition block holds proportions that are log-ratio transformed
/// relative to `reference_column`. The concentration block holds nonnegative
/// measurements that are `log1p` transformed. Extra blocks (e.g. a
/// transcriptomics block) only appear in block summaries; CCA and
/// simulation ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockLayout {
    /// Sample identifier column.
    pub id_column: String,
    /// Group label column.
    pub group_column: String,
    /// Display name of the composition block.
    pub composition_name: String,
    /// Composition (proportion) columns.
    pub composition_columns: Vec<String>,
    /// ALR reference ("denominator") column; must be one of the composition columns.
    pub reference_column: String,
    /// Display name of the concentration block.
    pub concentration_name: String,
    /// Nonnegative concentration columns.
    pub concentration_columns: Vec<String>,
    /// Additional blocks reported by [`blocks`](Self::blocks).
    pub extra_blocks: Vec<NamedBlock>,
}

impl Default for BlockLayout {
    /// Microbiome (BugA-BugD, reference BugD) paired with metabolomics
    /// (Met1-Met3), plus a transcriptomics block (Gene1-Gene3).
    fn default() -> Self {
        Self {
            id_column: "Patient".to_string(),
            group_column: "Group".to_string(),
            composition_name: "microbiome".to_string(),
            composition_columns: ["BugA", "BugB", "BugC", "BugD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reference_column: "BugD".to_string(),
            concentration_name: "metabolomics".to_string(),
            concentration_columns: ["Met1", "Met2", "Met3"].iter().map(|s| s.to_string()).collect(),
            extra_blocks: vec![NamedBlock::new(
                "transcriptomics",
                ["Gene1", "Gene2", "Gene3"].iter().map(|s| s.to_string()).collect(),
            )],
        }
    }
}

impl BlockLayout {
    /// Create a layout from explicit column groups, with no extra blocks.
    pub fn new(
        id_column: &str,
        group_column: &str,
        composition_columns: Vec<String>,
        reference_column: &str,
        concentration_columns: Vec<String>,
    ) -> Self {
        Self {
            id_column: id_column.to_string(),
            group_column: group_column.to_string(),
            composition_columns,
            reference_column: reference_column.to_string(),
            concentration_columns,
            extra_blocks: Vec::new(),
            ..Default::default()
        }
    }

    /// Add a block that is listed in summaries only.
    pub fn with_extra_block(mut self, name: &str, columns: Vec<String>) -> Self {
        self.extra_blocks.push(NamedBlock::new(name, columns));
        self
    }

    /// Set the block display names.
    pub fn with_block_names(mut self, composition: &str, concentration: &str) -> Self {
        self.composition_name = composition.to_string();
        self.concentration_name = concentration.to_string();
        self
    }

    /// Position of the reference column within the composition block.
    pub fn reference_index(&self) -> Result<usize> {
        self.composition_columns
            .iter()
            .position(|c| *c == self.reference_column)
            .ok_or_else(|| {
                CcaError::Configuration(format!(
                    "Reference column '{}' is not a composition column",
                    self.reference_column
                ))
            })
    }

    /// Composition columns other than the reference, in order.
    ///
    /// These name the ALR coordinates.
    pub fn log_ratio_columns(&self) -> Vec<String> {
        self.composition_columns
            .iter()
            .filter(|c| **c != self.reference_column)
            .cloned()
            .collect()
    }

    /// All feature columns: composition block then concentration block.
    pub fn feature_columns(&self) -> Vec<String> {
        self.composition_columns
            .iter()
            .chain(self.concentration_columns.iter())
            .cloned()
            .collect()
    }

    /// Named blocks in order: composition, concentration, then extras.
    pub fn blocks(&self) -> Vec<(&str, &[String])> {
        let mut blocks = vec![
            (self.composition_name.as_str(), self.composition_columns.as_slice()),
            (self.concentration_name.as_str(), self.concentration_columns.as_slice()),
        ];
        blocks.extend(
            self.extra_blocks
                .iter()
                .map(|b| (b.name.as_str(), b.columns.as_slice())),
        );
        blocks
    }

    /// Check that the blocks are usable and disjoint.
    pub fn validate(&self) -> Result<()> {
        if self.composition_columns.len() < 2 {
            return Err(CcaError::Dimension(format!(
                "Composition block needs at least 2 columns, got {}",
                self.composition_columns.len()
            )));
        }
        if self.concentration_columns.is_empty() {
            return Err(CcaError::Dimension(
                "Concentration block needs at least 1 column".to_string(),
            ));
        }
        self.reference_index()?;

        let mut seen = HashSet::new();
        let all = self
            .feature_columns()
            .into_iter()
            .chain(self.extra_blocks.iter().flat_map(|b| b.columns.iter().cloned()))
            .chain([self.id_column.clone(), self.group_column.clone()]);
        for column in all {
            if !seen.insert(column.clone()) {
                return Err(CcaError::Configuration(format!(
                    "Column '{}' appears more than once in the layout",
                    column
                )));
            }
        }
        Ok(())
    }
}
