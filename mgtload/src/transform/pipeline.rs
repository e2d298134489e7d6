//! High-level pipeline: load, build lookup, derive, group, export.
//!
//! # Example
//!
//! ```rust,ignore
//! use mgtload::{run, JobConfig, RunOptions};
//! use std::path::Path;
//!
//! let report = run(
//!     Path::new("main.xlsx"),
//!     Path::new("prefixes.xlsx"),
//!     &RunOptions::new(JobConfig::default()),
//!     || Some("ALL".to_string()),
//! )?;
//! println!("Exported {} values", report.values_written);
//! ```

use chrono::Utc;
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use super::grouper::{SegmentAggregator, SegmentGroup};
use super::row::{augment, transform_table};
use crate::config::{JobConfig, Layout};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{export_combined, export_per_segment, sink_for, write_workbook, ExportSelection};
use crate::logs::{log_error, log_info, log_success, log_warning, LogEntry, RUN_LOG};
use crate::lookup::LookupIndex;
use crate::models::{DerivedRecord, Table};
use crate::parser::load_table;

/// Options for a full run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: JobConfig,
    /// Also write the main table with derived columns inserted.
    pub augmented: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            augmented: None,
        }
    }
}

/// Derived rows and segment groups for one main table.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub records: Vec<DerivedRecord>,
    pub groups: SegmentAggregator,
    /// Data rows seen, header excluded.
    pub processed_rows: usize,
}

/// How the export step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOutcome {
    Combined,
    PerSegment,
    Cancelled,
    Invalid,
}

/// Value count of one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub count: usize,
}

/// Summary of a full run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub processed_rows: usize,
    /// Rows with a segment, i.e. values available for export.
    pub grouped_rows: usize,
    pub segments: Vec<SegmentCount>,
    pub outcome: ExportOutcome,
    pub files: Vec<PathBuf>,
    pub values_written: usize,
    pub generated_at: String,
    /// Lines logged during the run.
    pub log: Vec<LogEntry>,
    /// Log lines lost past the collector backlog.
    #[serde(skip_serializing_if = "is_zero")]
    pub log_dropped: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Derive every row of the main table and group the combined values.
pub fn process(main: &Table, lookup: &LookupIndex, layout: &Layout) -> ProcessResult {
    let records = transform_table(main, lookup, layout);
    let groups = SegmentAggregator::from_records(&records);
    let processed_rows = main.row_count();

    log_success(format!("Processed {} rows.", processed_rows));

    ProcessResult {
        records,
        groups,
        processed_rows,
    }
}

/// Export groups according to the caller's choice.
///
/// Cancelled and unrecognised choices write nothing and are not errors.
pub fn export_groups(
    groups: &[SegmentGroup],
    selection: &ExportSelection,
    config: &JobConfig,
) -> PipelineResult<(ExportOutcome, Vec<PathBuf>, usize)> {
    let mut sink = sink_for(config.output_format, &config.output_dir);

    let (outcome, result) = match selection {
        ExportSelection::Combined => (
            ExportOutcome::Combined,
            stage("exporting all data", export_combined(groups, &config.combined_name, sink.as_mut()))?,
        ),
        ExportSelection::PerSegment => (
            ExportOutcome::PerSegment,
            stage("exporting by segment", export_per_segment(groups, sink.as_mut()))?,
        ),
        ExportSelection::Cancelled => {
            log_warning("Export canceled.");
            return Ok((ExportOutcome::Cancelled, Vec::new(), 0));
        }
        ExportSelection::Invalid(choice) => {
            log_warning(format!(
                "Invalid choice '{}'. Please type 'ALL' or 'BY SEGMENT'.",
                choice
            ));
            return Ok((ExportOutcome::Invalid, Vec::new(), 0));
        }
    };

    Ok((outcome, result.files, result.values_written))
}

/// Run the whole pipeline on two input files.
///
/// `choose` is asked for the export mode once every row has been processed;
/// it is never called when loading or derivation fails.
pub fn run<F>(
    main_path: &Path,
    lookup_path: &Path,
    options: &RunOptions,
    choose: F,
) -> PipelineResult<RunReport>
where
    F: FnOnce() -> Option<String>,
{
    let mut collector = RUN_LOG.collect();
    let (main, lookup) = load_inputs(main_path, lookup_path)?;
    let layout = stage("resolving columns", options.config.resolve_layout(&main))?;
    log_info(format!(
        "Code column {}, segment column {}",
        options.config.code_column, options.config.segment_column
    ));

    let result = process(&main, &lookup, &layout);

    if let Some(ref path) = options.augmented {
        let augmented = augment(&main, &result.records, &layout);
        stage("writing augmented table", write_workbook(&augmented, path))?;
        log_success(format!("Augmented table written to {}", path.display()));
    }

    let groups = result.groups.snapshot();
    let choice = choose();
    let selection = ExportSelection::from_choice(choice.as_deref());
    let (outcome, files, values_written) = export_groups(&groups, &selection, &options.config)?;

    Ok(RunReport {
        processed_rows: result.processed_rows,
        grouped_rows: result.groups.total_values(),
        segments: groups
            .iter()
            .map(|g| SegmentCount {
                segment: g.segment.clone(),
                count: g.values.len(),
            })
            .collect(),
        outcome,
        files,
        values_written,
        generated_at: Utc::now().to_rfc3339(),
        log: collector.drain(),
        log_dropped: collector.dropped(),
    })
}

/// Load the main table and build the lookup index from the reference table.
pub fn load_inputs(main_path: &Path, lookup_path: &Path) -> PipelineResult<(Table, LookupIndex)> {
    log_info(format!("Reading main table: {}", main_path.display()));
    let main = stage("loading main table", load_table(main_path))?;
    log_info(format!("Reading lookup table: {}", lookup_path.display()));
    let reference = stage("loading lookup table", load_table(lookup_path))?;

    let lookup = stage("preparing lookup data", LookupIndex::build(&reference))?;
    log_success(format!("{} prefixes loaded", lookup.len()));
    Ok((main, lookup))
}

/// Log a failed stage before handing the error up.
fn stage<T, E>(name: &str, result: Result<T, E>) -> PipelineResult<T>
where
    E: Into<PipelineError> + Display,
{
    result.map_err(|e| {
        log_error(format!("Error {}: {}", name, e));
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::logs::LogLevel;
    use crate::models::Cell;
    use calamine::{open_workbook_auto, DataType, Reader};
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_main(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["Id", "Name", "Code", "Segment"].iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        let rows: [(&str, &str); 4] = [
            ("AB000000001", "North"),
            ("CD000000002", "South"),
            ("AB000000003", ""),
            ("AB000000004", "North"),
        ];
        for (i, (code, segment)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, r as f64).unwrap();
            sheet.write_string(r, 1, "item").unwrap();
            sheet.write_string(r, 2, *code).unwrap();
            if !segment.is_empty() {
                sheet.write_string(r, 3, *segment).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn write_lookup(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Prefix").unwrap();
        sheet.write_string(0, 1, "MGT").unwrap();
        sheet.write_string(1, 0, "AB").unwrap();
        sheet.write_number(1, 1, 7.0).unwrap();
        sheet.write_string(2, 0, "CD").unwrap();
        sheet.write_number(2, 1, 8.0).unwrap();
        workbook.save(path).unwrap();
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.xlsx");
        let lookup = dir.path().join("prefixes.xlsx");
        write_main(&main);
        write_lookup(&lookup);
        (dir, main, lookup)
    }

    fn options(dir: &Path) -> RunOptions {
        RunOptions::new(JobConfig {
            output_dir: dir.join("MGT"),
            ..JobConfig::default()
        })
    }

    fn read_column(path: &Path) -> Vec<f64> {
        let mut workbook = open_workbook_auto(path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        range.rows().map(|r| r[0].as_f64().unwrap()).collect()
    }

    #[test]
    fn test_process_counts() {
        let main = Table::new(
            vec![Cell::text("A"), Cell::text("B"), Cell::text("Code"), Cell::text("Seg")],
            vec![
                vec![Cell::Empty, Cell::Empty, Cell::text("AB1"), Cell::text("S")],
                vec![Cell::Empty, Cell::Empty, Cell::text("AB2"), Cell::Empty],
            ],
        );
        let result = process(&main, &LookupIndex::new(), &Layout { code: 2, segment: 3 });
        assert_eq!(result.processed_rows, 2);
        assert_eq!(result.groups.total_values(), 1);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_run_combined() {
        let (dir, main, lookup) = setup();
        let report = run(&main, &lookup, &options(dir.path()), || Some("all".into())).unwrap();

        assert_eq!(report.processed_rows, 4);
        assert_eq!(report.grouped_rows, 3);
        assert_eq!(report.outcome, ExportOutcome::Combined);
        assert_eq!(report.values_written, 3);

        let path = dir.path().join("MGT").join("All_Data.xlsx");
        assert_eq!(report.files, vec![path.clone()]);
        assert_eq!(
            read_column(&path),
            vec![7000000001.0, 7000000004.0, 8000000002.0]
        );
    }

    #[test]
    fn test_run_by_segment() {
        let (dir, main, lookup) = setup();
        let report = run(&main, &lookup, &options(dir.path()), || Some("By Segment".into())).unwrap();

        assert_eq!(report.outcome, ExportOutcome::PerSegment);
        assert_eq!(report.files.len(), 2);
        assert_eq!(
            report.segments,
            vec![
                SegmentCount { segment: "North".into(), count: 2 },
                SegmentCount { segment: "South".into(), count: 1 },
            ]
        );

        let out = dir.path().join("MGT");
        assert_eq!(read_column(&out.join("North.xlsx")), vec![7000000001.0, 7000000004.0]);
        assert_eq!(read_column(&out.join("South.xlsx")), vec![8000000002.0]);
    }

    #[test]
    fn test_run_invalid_choice_writes_nothing() {
        let (dir, main, lookup) = setup();
        let report = run(&main, &lookup, &options(dir.path()), || Some("foo".into())).unwrap();

        assert_eq!(report.outcome, ExportOutcome::Invalid);
        assert!(report.files.is_empty());
        assert!(!dir.path().join("MGT").exists());

        let report = run(&main, &lookup, &options(dir.path()), || None).unwrap();
        assert_eq!(report.outcome, ExportOutcome::Cancelled);
    }

    #[test]
    fn test_run_csv_and_augmented() {
        let (dir, main, lookup) = setup();
        let mut opts = options(dir.path());
        opts.config.output_format = OutputFormat::Csv;
        opts.augmented = Some(dir.path().join("augmented.xlsx"));

        run(&main, &lookup, &opts, || Some("ALL".into())).unwrap();

        let csv = std::fs::read_to_string(dir.path().join("MGT").join("All_Data.csv")).unwrap();
        assert_eq!(csv, "7000000001\n7000000004\n8000000002\n");

        let augmented = load_table(dir.path().join("augmented.xlsx")).unwrap();
        assert_eq!(augmented.headers[3], Cell::text("Prefix"));
        assert_eq!(augmented.headers[7], Cell::text("Segment"));
        assert_eq!(augmented.cell(0, 6), &Cell::text("7000000001"));
    }

    #[test]
    fn test_run_missing_input_is_fatal() {
        let (dir, _main, lookup) = setup();
        let mut asked = false;
        let result = run(
            &dir.path().join("absent.xlsx"),
            &lookup,
            &options(dir.path()),
            || {
                asked = true;
                Some("ALL".into())
            },
        );
        assert!(matches!(result, Err(PipelineError::Table(_))));
        assert!(!asked, "export mode asked before inputs loaded");
    }

    #[test]
    fn test_run_asks_for_mode_after_processing() {
        let (dir, main, lookup) = setup();
        let mut collector = RUN_LOG.collect();

        let report = run(&main, &lookup, &options(dir.path()), || {
            let seen: Vec<String> = collector.drain().into_iter().map(|e| e.message).collect();
            assert!(seen.iter().any(|m| m == "Processed 4 rows."));
            Some("ALL".into())
        })
        .unwrap();
        assert_eq!(report.outcome, ExportOutcome::Combined);
    }

    #[test]
    fn test_report_carries_run_log() {
        let (dir, main, lookup) = setup();
        let report = run(&main, &lookup, &options(dir.path()), || Some("foo".into())).unwrap();

        assert!(report.log.iter().any(|e| e.message == "Processed 4 rows."));
        assert!(report
            .log
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("'foo'")));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(json["log"].as_array().is_some_and(|log| !log.is_empty()));
        assert!(json.get("logDropped").is_none());
    }

    #[test]
    fn test_run_non_numeric_is_fatal() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.csv");
        let lookup = dir.path().join("prefixes.csv");
        std::fs::write(&main, "Id,Name,Code,Segment\n1,a,AB000000001,North\n").unwrap();
        std::fs::write(&lookup, "Prefix,MGT\nAB,X\n").unwrap();

        let result = run(&main, &lookup, &options(dir.path()), || Some("ALL".into()));
        assert!(matches!(result, Err(PipelineError::Export(_))));
    }
}
