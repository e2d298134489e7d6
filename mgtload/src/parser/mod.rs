//! Input table loading.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read from their
//! first worksheet. Anything else is treated as delimited text with encoding
//! and delimiter auto-detection. Both produce a [`Table`] whose header is
//! spreadsheet row 1 and whose columns keep their absolute positions.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::models::{Cell, Table};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Load a table from disk, picking the reader from the file extension.
pub fn load_table<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let path = path.as_ref();
    if is_workbook(path) {
        load_workbook(path)
    } else {
        load_delimited(path)
    }
}

/// Whether the path has a spreadsheet workbook extension.
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

// =============================================================================
// Workbooks
// =============================================================================

/// Load the first worksheet of a workbook.
pub fn load_workbook(path: &Path) -> TableResult<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| TableError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::NoWorksheet(path.to_path_buf()))?
        .map_err(|e| TableError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // The range starts at the first used cell, not at A1.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }

    Ok(Table::from_grid(grid))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::text(other.to_string()),
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b';', b',', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load delimited text with encoding and delimiter auto-detection.
pub fn load_delimited(path: &Path) -> TableResult<Table> {
    let bytes = std::fs::read(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_delimited(&bytes).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse delimited bytes into a table. Every cell is text; blank cells are empty.
pub fn parse_delimited(bytes: &[u8]) -> Result<Table, csv::Error> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|v| Cell::text(v.trim())).collect());
    }

    Ok(Table::from_grid(grid))
}
