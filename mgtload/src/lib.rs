//! # mgtload - MGT code derivation and segment export
//!
//! mgtload reads a main spreadsheet and a prefix reference table, derives an
//! MGT code for every row, groups the codes by segment and exports them as
//! integer tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Main table  │────▶│  Transform  │────▶│   Grouper   │────▶│   Export    │
//! │ (xlsx/csv)  │     │ prefix+sfx  │     │ by segment  │     │ ALL / SEG   │
//! └─────────────┘     └──────▲──────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │ LookupIndex │◀── reference table
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mgtload::{run, JobConfig, RunOptions};
//! use std::path::Path;
//!
//! let options = RunOptions::new(JobConfig::default());
//! let report = run(Path::new("main.xlsx"), Path::new("prefixes.xlsx"), &options, || Some("ALL".into()))?;
//! println!("{} values exported", report.values_written);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Cells, tables and derived rows
//! - [`parser`] - Workbook and CSV loading
//! - [`lookup`] - Prefix lookup index
//! - [`transform`] - Row derivation, grouping and pipeline
//! - [`export`] - Integer coercion and output sinks
//! - [`config`] - Job configuration and column layout
//! - [`validation`] - Config schema validation
//! - [`logs`] - Progress log sink

// Core modules
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod lookup;

// Transformation
pub mod transform;

// Output
pub mod export;

// Configuration
pub mod config;
pub mod validation;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExportError,
    LookupError,
    PipelineError,
    TableError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, DerivedRecord, DerivedRow, Table};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{load_table, load_workbook, load_delimited, parse_delimited};

// =============================================================================
// Re-exports - Core pipeline
// =============================================================================

pub use lookup::LookupIndex;

pub use transform::{
    augment,
    segment_key,
    transform,
    transform_table,
    SegmentAggregator,
    SegmentGroup,
};

pub use transform::pipeline::{
    export_groups,
    load_inputs,
    process,
    run,
    ExportOutcome,
    ProcessResult,
    RunOptions,
    RunReport,
    SegmentCount,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    export_combined,
    export_per_segment,
    sink_for,
    to_integer,
    CsvSink,
    ExportSelection,
    ExportSummary,
    OutputTable,
    TableSink,
    XlsxSink,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{ColumnRef, JobConfig, Layout, OutputFormat};
