//! Error types for the mgtload pipeline.
//!
//! - [`TableError`] - Loading an input table
//! - [`LookupError`] - Building the prefix lookup index
//! - [`ConfigError`] - Job configuration and column layout
//! - [`ExportError`] - Integer coercion and persistence of output tables
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Table Loading Errors
// =============================================================================

/// Errors while loading an input table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook could not be opened or decoded.
    #[error("Failed to open workbook '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// The workbook has no worksheet to read.
    #[error("No worksheet found in '{0}'")]
    NoWorksheet(PathBuf),

    /// Invalid delimited text.
    #[error("Invalid CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors while building the prefix lookup index.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The reference table has data rows but fewer than two columns.
    #[error("Reference table needs a prefix and a value column, found {0} column(s)")]
    TooFewColumns(usize),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in the job configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON or does not match the expected shape.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config failed schema validation.
    #[error("Config validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// Column letter is not a valid spreadsheet column.
    #[error("Invalid column reference: '{0}'")]
    InvalidColumn(String),

    /// Header name is not present in the main table.
    #[error("Column header not found: '{0}'")]
    UnknownHeader(String),

    /// Unsupported output format.
    #[error("Unknown output format: '{0}' (expected 'xlsx' or 'csv')")]
    UnknownFormat(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while exporting grouped values.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A value is not numeric text.
    #[error("Value '{value}' in '{table}' is not numeric")]
    NonNumeric { table: String, value: String },

    /// A value is numeric but cannot be stored as an integer.
    #[error("Value '{value}' in '{table}' is out of integer range")]
    OutOfRange { table: String, value: String },

    /// Failed to create the output directory or file.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook writer error.
    #[error("Failed to write workbook '{path}': {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// A row has more cells than a worksheet column index can address.
    #[error("Cannot write '{path}': row has {columns} cells")]
    TooWide { path: PathBuf, columns: usize },

    /// Delimited writer error.
    #[error("Failed to write CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table could not be loaded.
    #[error("Load error: {0}")]
    Table(#[from] TableError),

    /// Lookup index could not be built.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table loading.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
