//! Job configuration.
//!
//! Settings come from, in increasing priority: built-in defaults, an optional
//! JSON config file (validated against `schemas/job-config.json`), environment
//! variables (`MGT_OUTPUT_DIR`, `MGT_OUTPUT_FORMAT`, `.env` honoured), and
//! finally command-line flags applied by the caller.
//!
//! # Example
//!
//! ```json
//! {
//!   "code_column": "C",
//!   "segment_column": { "header": "Segment" },
//!   "output_dir": "MGT",
//!   "combined_name": "All_Data",
//!   "output_format": "xlsx"
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::models::Table;
use crate::validation::validate_job_config;

pub const ENV_OUTPUT_DIR: &str = "MGT_OUTPUT_DIR";
pub const ENV_OUTPUT_FORMAT: &str = "MGT_OUTPUT_FORMAT";

static COLUMN_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{1,3}$").expect("Invalid column pattern"));

// =============================================================================
// Column references
// =============================================================================

/// A column given by spreadsheet letter (`"C"`) or by header text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Letter(String),
    Header { header: String },
}

impl ColumnRef {
    pub fn letter(letter: &str) -> Self {
        ColumnRef::Letter(letter.to_string())
    }

    /// Resolve to a 0-based column index against the main table.
    pub fn resolve(&self, table: &Table) -> ConfigResult<usize> {
        match self {
            ColumnRef::Letter(letters) => column_index(letters),
            ColumnRef::Header { header } => table
                .find_header(header)
                .ok_or_else(|| ConfigError::UnknownHeader(header.clone())),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Letter(l) => write!(f, "{}", l.to_uppercase()),
            ColumnRef::Header { header } => write!(f, "'{}'", header),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = ConfigError;

    /// Letters become a column letter; `header:Name` selects by header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("header:") {
            Some("") => Err(ConfigError::InvalidColumn(s.to_string())),
            Some(header) => Ok(ColumnRef::Header { header: header.to_string() }),
            None => {
                column_index(s)?;
                Ok(ColumnRef::Letter(s.to_string()))
            }
        }
    }
}

/// Convert a spreadsheet column letter to a 0-based index (`A` -> 0, `AA` -> 26).
pub fn column_index(letters: &str) -> ConfigResult<usize> {
    if !COLUMN_LETTERS.is_match(letters) {
        return Err(ConfigError::InvalidColumn(letters.to_string()));
    }
    let index = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Ok(index - 1)
}

/// Resolved 0-based column positions in the main table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub code: usize,
    pub segment: usize,
}

// =============================================================================
// Output format
// =============================================================================

/// File format of exported tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

// =============================================================================
// Job config
// =============================================================================

/// Settings for one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Column holding the source code
    pub code_column: ColumnRef,
    /// Column holding the segment label, in the unmodified main table
    pub segment_column: ColumnRef,
    /// Directory receiving exported files
    pub output_dir: PathBuf,
    /// File stem of the combined export
    pub combined_name: String,
    pub output_format: OutputFormat,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            code_column: ColumnRef::letter("C"),
            // Four derived columns inserted at D push this column to H.
            segment_column: ColumnRef::letter("D"),
            output_dir: PathBuf::from("MGT"),
            combined_name: "All_Data".to_string(),
            output_format: OutputFormat::Xlsx,
        }
    }
}

impl JobConfig {
    /// Parse and validate a config from JSON text.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_job_config(&value).map_err(ConfigError::Schema)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Defaults, then an optional file, then environment overrides.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.with_env()
    }

    /// Apply `MGT_OUTPUT_DIR` / `MGT_OUTPUT_FORMAT` if set.
    pub fn with_env(self) -> ConfigResult<Self> {
        self.with_overrides(
            std::env::var(ENV_OUTPUT_DIR).ok(),
            std::env::var(ENV_OUTPUT_FORMAT).ok(),
        )
    }

    fn with_overrides(
        mut self,
        output_dir: Option<String>,
        output_format: Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(format) = output_format.filter(|f| !f.trim().is_empty()) {
            self.output_format = format.parse()?;
        }
        Ok(self)
    }

    /// Resolve the column references against the main table.
    pub fn resolve_layout(&self, main: &Table) -> ConfigResult<Layout> {
        Ok(Layout {
            code: self.code_column.resolve(main)?,
            segment: self.segment_column.resolve(main)?,
        })
    }
}
