//! Persistence of output tables.
//!
//! A sink writes each [`OutputTable`] to `<dir>/<name>.<ext>`, creating the
//! directory if needed. Names are used as given; a name that is not a legal
//! file name surfaces as a write error. Existing files are overwritten.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};

use super::{OutputTable, NUMBER_FORMAT};
use crate::config::OutputFormat;
use crate::error::{ExportError, ExportResult};
use crate::models::{Cell, Table};

/// Destination for exported tables.
pub trait TableSink {
    /// Write one table and return where it went.
    fn persist(&mut self, table: &OutputTable) -> ExportResult<PathBuf>;
}

/// Build the sink for an output format.
pub fn sink_for(format: OutputFormat, dir: impl Into<PathBuf>) -> Box<dyn TableSink> {
    match format {
        OutputFormat::Xlsx => Box::new(XlsxSink::new(dir)),
        OutputFormat::Csv => Box::new(CsvSink::new(dir)),
    }
}

fn prepare(dir: &Path, name: &str, format: OutputFormat) -> ExportResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.join(format!("{}.{}", name, format.extension())))
}

// =============================================================================
// XLSX
// =============================================================================

/// Writes one workbook per table, values in column A with a `"0"` number format.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    dir: PathBuf,
}

impl XlsxSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableSink for XlsxSink {
    fn persist(&mut self, table: &OutputTable) -> ExportResult<PathBuf> {
        let path = prepare(&self.dir, &table.name, OutputFormat::Xlsx)?;
        let xlsx_err = |source: XlsxError| ExportError::Xlsx {
            path: path.clone(),
            source,
        };

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let integer = Format::new().set_num_format(NUMBER_FORMAT);

        for (row, value) in table.cells.iter().enumerate() {
            worksheet
                .write_number_with_format(row as u32, 0, *value as f64, &integer)
                .map_err(xlsx_err)?;
        }

        workbook.save(&path).map_err(xlsx_err)?;
        Ok(path)
    }
}

/// Write a full table (header row first) to a workbook.
pub fn write_workbook(table: &Table, path: &Path) -> ExportResult<()> {
    let xlsx_err = |source: XlsxError| ExportError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let rows = std::iter::once(&table.headers).chain(table.rows.iter());
    for (row, cells) in rows.enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| ExportError::TooWide {
                path: path.to_path_buf(),
                columns: cells.len(),
            })?;
            let row = row as u32;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(row, col, s.as_str()),
                Cell::Int(i) => worksheet.write_number(row, col, *i as f64),
                Cell::Float(f) => worksheet.write_number(row, col, *f),
                Cell::Bool(b) => worksheet.write_boolean(row, col, *b),
            };
            written.map_err(xlsx_err)?;
        }
    }

    workbook.save(path).map_err(xlsx_err)?;
    Ok(())
}

// =============================================================================
// CSV
// =============================================================================

/// Writes one single-column CSV file per table, no header.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableSink for CsvSink {
    fn persist(&mut self, table: &OutputTable) -> ExportResult<PathBuf> {
        let path = prepare(&self.dir, &table.name, OutputFormat::Csv)?;
        let csv_err = |source: csv::Error| ExportError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        for value in &table.cells {
            writer.write_record([value.to_string()]).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
