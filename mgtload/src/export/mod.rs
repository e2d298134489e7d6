//! Export grouped values as integer tables.
//!
//! Every value is coerced the same way: parse as a float, truncate toward
//! zero. A value that is not numeric text aborts the export. Each output
//! table is fully coerced before it reaches the [`TableSink`], so a failure
//! never leaves a half-written table behind (tables persisted earlier in a
//! per-segment export stay on disk).

pub mod sink;

use serde::Serialize;
use std::path::PathBuf;

use crate::error::{ExportError, ExportResult};
use crate::logs::{log_info_indent, log_success, log_warning};
use crate::transform::grouper::SegmentGroup;

pub use sink::{sink_for, write_workbook, CsvSink, TableSink, XlsxSink};

/// Display format applied to every exported cell (whole numbers only).
pub const NUMBER_FORMAT: &str = "0";

/// One exported table: a single column of integers starting at row 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    /// Destination name, without extension.
    pub name: String,
    pub cells: Vec<i64>,
}

impl OutputTable {
    /// Coerce every value, failing on the first non-numeric one.
    pub fn from_values<'a, I>(name: &str, values: I) -> ExportResult<Self>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let cells = values
            .into_iter()
            .map(|v| to_integer(name, v))
            .collect::<ExportResult<Vec<i64>>>()?;
        Ok(Self {
            name: name.to_string(),
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parse `value` as a float and truncate it toward zero.
///
/// `"42"`, `"42.0"` and `"42.9"` all give `42`.
pub fn to_integer(table: &str, value: &str) -> ExportResult<i64> {
    let parsed: f64 = value.trim().parse().map_err(|_| ExportError::NonNumeric {
        table: table.to_string(),
        value: value.to_string(),
    })?;

    let truncated = parsed.trunc();
    if !truncated.is_finite() || truncated < -9.223_372_036_854_776e18 || truncated >= 9.223_372_036_854_776e18 {
        return Err(ExportError::OutOfRange {
            table: table.to_string(),
            value: value.to_string(),
        });
    }
    Ok(truncated as i64)
}

// =============================================================================
// Export mode
// =============================================================================

/// What the caller asked the export step to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    /// One combined table.
    Combined,
    /// One table per segment.
    PerSegment,
    /// No choice was made.
    Cancelled,
    /// A choice was made but not recognised.
    Invalid(String),
}

impl ExportSelection {
    /// Interpret a free-form choice: trimmed, case-insensitive
    /// `ALL` or `BY SEGMENT`. `None` and the empty string cancel.
    pub fn from_choice(choice: Option<&str>) -> Self {
        let raw = match choice {
            None | Some("") => return ExportSelection::Cancelled,
            Some(raw) => raw,
        };
        match raw.trim().to_uppercase().as_str() {
            "ALL" => ExportSelection::Combined,
            "BY SEGMENT" => ExportSelection::PerSegment,
            _ => ExportSelection::Invalid(raw.to_string()),
        }
    }
}

/// Files written by an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub values_written: usize,
}

// =============================================================================
// Exporters
// =============================================================================

/// Write every value of every segment, segment by segment, into one table.
pub fn export_combined(
    groups: &[SegmentGroup],
    name: &str,
    sink: &mut dyn TableSink,
) -> ExportResult<ExportSummary> {
    let table = OutputTable::from_values(name, groups.iter().flat_map(|g| g.values.iter()))?;
    let path = sink.persist(&table)?;

    log_success(format!(
        "Exported {} values to a single file: {}",
        table.len(),
        path.display()
    ));

    Ok(ExportSummary {
        files: vec![path],
        values_written: table.len(),
    })
}

/// Write one table per segment, named after the segment key.
pub fn export_per_segment(
    groups: &[SegmentGroup],
    sink: &mut dyn TableSink,
) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();

    if groups.is_empty() {
        log_warning("No segments to export");
        return Ok(summary);
    }

    for group in groups {
        let table = OutputTable::from_values(&group.segment, &group.values)?;
        let path = sink.persist(&table)?;
        log_info_indent(format!("{}: {} values", path.display(), table.len()), 1);
        summary.values_written += table.len();
        summary.files.push(path);
    }

    log_success(format!(
        "Exported data by segment into {} files",
        summary.files.len()
    ));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Keeps persisted tables in memory.
    #[derive(Default)]
    struct MemorySink {
        tables: Vec<OutputTable>,
    }

    impl TableSink for MemorySink {
        fn persist(&mut self, table: &OutputTable) -> ExportResult<PathBuf> {
            self.tables.push(table.clone());
            Ok(Path::new("mem").join(&table.name))
        }
    }

    fn groups() -> Vec<SegmentGroup> {
        vec![
            SegmentGroup {
                segment: "North".into(),
                values: vec!["100000001".into(), "100000003.0".into()],
            },
            SegmentGroup {
                segment: "South".into(),
                values: vec!["200000002".into()],
            },
        ]
    }

    #[test]
    fn test_to_integer_truncates() {
        assert_eq!(to_integer("t", "42").unwrap(), 42);
        assert_eq!(to_integer("t", "42.0").unwrap(), 42);
        assert_eq!(to_integer("t", "42.9").unwrap(), 42);
        assert_eq!(to_integer("t", "-42.9").unwrap(), -42);
        assert_eq!(to_integer("t", " 7 ").unwrap(), 7);
        assert_eq!(to_integer("t", "1e3").unwrap(), 1000);
    }

    #[test]
    fn test_to_integer_rejects_text() {
        let err = to_integer("All_Data", "abc").unwrap_err();
        assert!(matches!(err, ExportError::NonNumeric { .. }));
        assert!(matches!(to_integer("t", ""), Err(ExportError::NonNumeric { .. })));
        assert!(matches!(to_integer("t", "X000000001"), Err(ExportError::NonNumeric { .. })));
    }

    #[test]
    fn test_to_integer_rejects_non_finite() {
        assert!(matches!(to_integer("t", "inf"), Err(ExportError::OutOfRange { .. })));
        assert!(matches!(to_integer("t", "NaN"), Err(ExportError::OutOfRange { .. })));
        assert!(matches!(to_integer("t", "1e30"), Err(ExportError::OutOfRange { .. })));
    }

    #[test]
    fn test_selection() {
        for choice in ["all", "ALL", " All "] {
            assert_eq!(ExportSelection::from_choice(Some(choice)), ExportSelection::Combined);
        }
        assert_eq!(
            ExportSelection::from_choice(Some("by segment")),
            ExportSelection::PerSegment
        );
        assert_eq!(
            ExportSelection::from_choice(Some("foo")),
            ExportSelection::Invalid("foo".into())
        );
        assert_eq!(ExportSelection::from_choice(None), ExportSelection::Cancelled);
        assert_eq!(ExportSelection::from_choice(Some("")), ExportSelection::Cancelled);
    }

    #[test]
    fn test_export_combined_keeps_segment_then_row_order() {
        let mut sink = MemorySink::default();
        let groups = groups();
        let summary = export_combined(&groups, "All_Data", &mut sink).unwrap();

        let total: usize = groups.iter().map(|g| g.values.len()).sum();
        assert_eq!(summary.values_written, total);
        assert_eq!(sink.tables.len(), 1);
        assert_eq!(sink.tables[0].name, "All_Data");
        assert_eq!(sink.tables[0].cells, vec![100000001, 100000003, 200000002]);
    }

    #[test]
    fn test_export_per_segment_one_table_per_key() {
        let mut sink = MemorySink::default();
        let summary = export_per_segment(&groups(), &mut sink).unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.values_written, 3);
        assert_eq!(sink.tables[0].name, "North");
        assert_eq!(sink.tables[0].cells, vec![100000001, 100000003]);
        assert_eq!(sink.tables[1].name, "South");
        assert_eq!(sink.tables[1].cells, vec![200000002]);
    }

    #[test]
    fn test_non_numeric_aborts_before_persisting() {
        let mut sink = MemorySink::default();
        let mut groups = groups();
        groups[1].values.push("abc".into());

        let result = export_combined(&groups, "All_Data", &mut sink);
        assert!(matches!(result, Err(ExportError::NonNumeric { .. })));
        assert!(sink.tables.is_empty());

        // Per segment: earlier segments are already persisted.
        let result = export_per_segment(&groups, &mut sink);
        assert!(result.is_err());
        assert_eq!(sink.tables.len(), 1);
        assert_eq!(sink.tables[0].name, "North");
    }

    #[test]
    fn test_empty_groups() {
        let mut sink = MemorySink::default();
        let summary = export_per_segment(&[], &mut sink).unwrap();
        assert!(summary.files.is_empty());

        let summary = export_combined(&[], "All_Data", &mut sink).unwrap();
        assert_eq!(summary.values_written, 0);
        assert!(sink.tables[0].is_empty());
    }
}
