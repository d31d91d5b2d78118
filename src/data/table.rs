//! Paired sample table: one row per subject, numeric columns spanning blocks.

use crate::data::BlockLayout;
use crate::error::{CcaError, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// A table of paired samples.
///
/// Rows are samples (subjects), columns are named numeric features. Every
/// sample also carries an identifier and a group label. Feature columns from
/// different measurement blocks live side by side; a [`BlockLayout`] says
/// which columns belong to which block.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    /// Name of the identifier column.
    id_column: String,
    /// Name of the group label column.
    group_column: String,
    /// Sample identifiers in row order.
    sample_ids: Vec<String>,
    /// Group label for each sample.
    groups: Vec<String>,
    /// Feature column names in column order.
    feature_names: Vec<String>,
    /// Values (samples × features).
    data: DMatrix<f64>,
}

impl SampleTable {
    /// Create a table from identifiers, labels, feature names and values.
    pub fn new(
        id_column: &str,
        group_column: &str,
        sample_ids: Vec<String>,
        groups: Vec<String>,
        feature_names: Vec<String>,
        data: DMatrix<f64>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if sample_ids.len() != nrows || groups.len() != nrows {
            return Err(CcaError::Dimension(format!(
                "Table has {} rows but {} sample ids and {} group labels",
                nrows,
                sample_ids.len(),
                groups.len()
            )));
        }
        if feature_names.len() != ncols {
            return Err(CcaError::Dimension(format!(
                "Table has {} columns but {} feature names",
                ncols,
                feature_names.len()
            )));
        }
        Ok(Self {
            id_column: id_column.to_string(),
            group_column: group_column.to_string(),
            sample_ids,
            groups,
            feature_names,
            data,
        })
    }

    /// Load a table from a comma-separated file with a header row.
    ///
    /// `id_column` and `group_column` name the identifier and label columns;
    /// every other column must hold a number in every row.
    pub fn from_csv<P: AsRef<Path>>(path: P, id_column: &str, group_column: &str) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, id_column, group_column)
    }

    /// Load a table for the given layout's id and group columns.
    pub fn from_csv_with_layout<P: AsRef<Path>>(path: P, layout: &BlockLayout) -> Result<Self> {
        Self::from_csv(path, &layout.id_column, &layout.group_column)
    }

    /// Parse CSV from any reader.
    pub fn from_reader<R: Read>(reader: R, id_column: &str, group_column: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let header: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();

        let id_idx = header
            .iter()
            .position(|h| h == id_column)
            .ok_or_else(|| CcaError::MissingColumn(id_column.to_string()))?;
        let group_idx = header
            .iter()
            .position(|h| h == group_column)
            .ok_or_else(|| CcaError::MissingColumn(group_column.to_string()))?;

        let feature_cols: Vec<usize> = (0..header.len())
            .filter(|&i| i != id_idx && i != group_idx)
            .collect();
        let feature_names: Vec<String> = feature_cols.iter().map(|&i| header[i].clone()).collect();

        let mut sample_ids = Vec::new();
        let mut groups = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            sample_ids.push(record.get(id_idx).unwrap_or_default().to_string());
            groups.push(record.get(group_idx).unwrap_or_default().to_string());

            for &col in &feature_cols {
                let raw = record.get(col).unwrap_or_default();
                let value: f64 = raw.parse().map_err(|_| CcaError::InvalidValue {
                    value: raw.to_string(),
                    row: row_idx,
                    column: header[col].clone(),
                })?;
                if !value.is_finite() {
                    return Err(CcaError::InvalidValue {
                        value: raw.to_string(),
                        row: row_idx,
                        column: header[col].clone(),
                    });
                }
                values.push(value);
            }
        }

        if sample_ids.is_empty() {
            return Err(CcaError::EmptyData("No samples in table".to_string()));
        }

        let data = DMatrix::from_row_slice(sample_ids.len(), feature_names.len(), &values);
        Self::new(id_column, group_column, sample_ids, groups, feature_names, data)
    }

    /// Write the table as CSV (id, group, then feature columns).
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }

    /// Write the table as CSV to any writer.
    ///
    /// Values use Rust's shortest round-trip formatting, so equal tables
    /// produce identical bytes.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec![self.id_column.clone(), self.group_column.clone()];
        header.extend(self.feature_names.iter().cloned());
        wtr.write_record(&header)?;

        for i in 0..self.n_samples() {
            let mut record = vec![self.sample_ids[i].clone(), self.groups[i].clone()];
            record.extend(self.data.row(i).iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Render the table as a CSV string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| CcaError::Numerical(e.to_string()))
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Name of the identifier column.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Name of the group label column.
    pub fn group_column(&self) -> &str {
        &self.group_column
    }

    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Group labels.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Feature column names.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Underlying values (samples × features).
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Position of a named feature column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CcaError::MissingColumn(name.to_string()))
    }

    /// Values of a named feature column.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let j = self.column_index(name)?;
        Ok(self.data.column(j).iter().cloned().collect())
    }

    /// Extract the named columns as an n × k block, in the order given.
    pub fn block(&self, columns: &[String]) -> Result<DMatrix<f64>> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<usize>>>()?;
        Ok(DMatrix::from_fn(self.n_samples(), indices.len(), |i, j| {
            self.data[(i, indices[j])]
        }))
    }

    /// Shapes (rows, columns) of each block in a layout, labelled by block name.
    pub fn block_shapes(&self, layout: &BlockLayout) -> Result<Vec<(String, usize, usize)>> {
        layout
            .blocks()
            .into_iter()
            .map(|(name, columns)| {
                let block = self.block(columns)?;
                Ok((name.to_string(), block.nrows(), block.ncols()))
            })
            .collect()
    }
}
