//! Domain models for the mgtload pipeline.
//!
//! - [`Cell`] - A scalar value read from a spreadsheet cell
//! - [`Table`] - Header row plus data rows, addressed by integer indices
//! - [`DerivedRow`] - The four fields derived from a source code
//! - [`DerivedRecord`] - A derived row tied to its source row and segment

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A scalar cell value.
///
/// Spreadsheets store every number as a float, so [`Cell::Float`] values with
/// no fractional part render as integers (`12.0` -> `"12"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Build a text cell, mapping the empty string to [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Whether this cell counts as "no value" for segment purposes.
    ///
    /// Empty cells, empty text, zero and `false` are all absent.
    pub fn is_falsy(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Bool(b) => !b,
            Cell::Int(i) => *i == 0,
            Cell::Float(f) => *f == 0.0,
            Cell::Text(s) => s.is_empty(),
        }
    }

    /// Canonical text rendering used for slicing and concatenation.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{}", v)
                }
            }
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

// =============================================================================
// Table
// =============================================================================

/// A loaded worksheet: header row plus data rows.
///
/// Rows may be ragged; reading past the end of a row yields [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Spreadsheet row 1.
    pub headers: Vec<Cell>,
    /// Spreadsheet rows 2 and onward.
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

impl Table {
    pub fn new(headers: Vec<Cell>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from a full grid where the first row is the header.
    pub fn from_grid(mut grid: Vec<Vec<Cell>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let headers = grid.remove(0);
        Self { headers, rows: grid }
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, header included.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Cell at a 0-based data row and column.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Find a column by header text (case-insensitive, trimmed).
    pub fn find_header(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.as_text().trim().to_lowercase() == wanted)
    }
}

// =============================================================================
// Derived rows
// =============================================================================

/// Fields derived from one source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRow {
    /// First two characters of the code text.
    pub prefix2: String,
    /// Lookup result for `prefix2`, empty if unmapped.
    pub lookup_value: Cell,
    /// Last nine characters of the code text.
    pub suffix9: String,
    /// `lookup_value` text followed by `suffix9`.
    pub combined: String,
}

/// A derived row with the position and segment of its source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRecord {
    /// Spreadsheet row number (header is row 1).
    pub row: usize,
    /// Segment key, `None` when the segment cell is falsy.
    pub segment: Option<String>,
    #[serde(flatten)]
    pub derived: DerivedRow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_renders_as_integer() {
        assert_eq!(Cell::Float(12.0).as_text(), "12");
        assert_eq!(Cell::Float(1234567890123.0).as_text(), "1234567890123");
        assert_eq!(Cell::Float(1.5).as_text(), "1.5");
    }

    #[test]
    fn test_empty_renders_as_empty_text() {
        assert_eq!(Cell::Empty.as_text(), "");
        assert_eq!(Cell::text("").as_text(), "");
        assert!(Cell::text("").is_empty());
    }

    #[test]
    fn test_falsy_values() {
        assert!(Cell::Empty.is_falsy());
        assert!(Cell::Int(0).is_falsy());
        assert!(Cell::Float(0.0).is_falsy());
        assert!(Cell::Bool(false).is_falsy());
        assert!(!Cell::text("North").is_falsy());
        assert!(!Cell::Int(7).is_falsy());
        assert!(!Cell::text("0").is_falsy());
    }

    #[test]
    fn test_cell_out_of_bounds_is_empty() {
        let table = Table::new(vec![Cell::text("a")], vec![vec![Cell::Int(1)]]);
        assert_eq!(table.cell(0, 0), &Cell::Int(1));
        assert_eq!(table.cell(0, 5), &Cell::Empty);
        assert_eq!(table.cell(9, 0), &Cell::Empty);
    }

    #[test]
    fn test_find_header_case_insensitive() {
        let table = Table::new(
            vec![Cell::text("Name"), Cell::text(" Segment ")],
            vec![],
        );
        assert_eq!(table.find_header("segment"), Some(1));
        assert_eq!(table.find_header("missing"), None);
    }

    #[test]
    fn test_width_accounts_for_ragged_rows() {
        let table = Table::from_grid(vec![
            vec![Cell::text("a")],
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)],
        ]);
        assert_eq!(table.width(), 3);
        assert_eq!(table.row_count(), 1);
    }
}
