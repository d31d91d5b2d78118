//! Error types for the composable-cca library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CcaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dimension error: {0}")]
    Dimension(String),

    #[error("Invalid composition: component {index} is {value}, log-ratio undefined without a pseudocount")]
    InvalidComposition { index: usize, value: f64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid value '{value}' in row {row}, column '{column}'")]
    InvalidValue {
        value: String,
        row: usize,
        column: String,
    },

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, CcaError>;
