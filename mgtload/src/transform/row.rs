//! Per-row derivation of prefix, MGT value, suffix and combined code.
//!
//! The main table is never mutated. Derived fields are collected into
//! [`DerivedRecord`]s, and [`augment`] builds a separate table with the four
//! derived columns inserted right after the code column.

use crate::config::Layout;
use crate::lookup::LookupIndex;
use crate::models::{Cell, DerivedRecord, DerivedRow, Table};

/// Number of leading characters used as the lookup key.
pub const PREFIX_LEN: usize = 2;

/// Number of trailing characters kept from the code.
pub const SUFFIX_LEN: usize = 9;

/// Headers of the derived columns, in insertion order.
pub const DERIVED_HEADERS: [&str; 4] = ["Prefix", "MGT", "Suffix", "Combined"];

/// Derive the four fields from a code cell.
///
/// The code is rendered as text before slicing, so numeric codes and short
/// or empty codes never fail.
pub fn transform(code: &Cell, lookup: &LookupIndex) -> DerivedRow {
    let code_text = code.as_text();
    let prefix2 = first_chars(&code_text, PREFIX_LEN).to_string();
    let suffix9 = last_chars(&code_text, SUFFIX_LEN).to_string();
    let lookup_value = lookup.get(&prefix2).cloned().unwrap_or(Cell::Empty);
    let combined = format!("{}{}", lookup_value.as_text(), suffix9);

    DerivedRow {
        prefix2,
        lookup_value,
        suffix9,
        combined,
    }
}

/// Derive every data row of the main table.
///
/// The segment is read from the configured column of the unmodified table;
/// see [`segment_key`] for which cells count as absent.
pub fn transform_table(table: &Table, lookup: &LookupIndex, layout: &Layout) -> Vec<DerivedRecord> {
    (0..table.row_count())
        .map(|row| {
            let segment = table.cell(row, layout.segment);
            DerivedRecord {
                row: row + 2,
                segment: segment_key(segment),
                derived: transform(table.cell(row, layout.code), lookup),
            }
        })
        .collect()
}

/// Group key of a segment cell, `None` when the row has no segment.
///
/// Falsy cells are absent, and so is text that parses as the number zero:
/// delimited input only carries text, so `"0"` there is the same cell a
/// workbook stores as `0.0`.
pub fn segment_key(cell: &Cell) -> Option<String> {
    let zero_text = match cell {
        Cell::Text(s) => s.trim().parse::<f64>().map_or(false, |f| f == 0.0),
        _ => false,
    };
    if cell.is_falsy() || zero_text {
        return None;
    }
    Some(cell.as_text())
}

/// Copy of the main table with the derived columns inserted after the code column.
pub fn augment(table: &Table, records: &[DerivedRecord], layout: &Layout) -> Table {
    let at = layout.code + 1;

    let headers = insert_at(
        &table.headers,
        at,
        DERIVED_HEADERS.iter().map(|h| Cell::text(*h)).collect(),
    );

    let rows = table
        .rows
        .iter()
        .zip(records)
        .map(|(row, record)| {
            let d = &record.derived;
            insert_at(
                row,
                at,
                vec![
                    Cell::text(d.prefix2.as_str()),
                    d.lookup_value.clone(),
                    Cell::text(d.suffix9.as_str()),
                    Cell::text(d.combined.as_str()),
                ],
            )
        })
        .collect();

    Table::new(headers, rows)
}

fn insert_at(row: &[Cell], at: usize, derived: Vec<Cell>) -> Vec<Cell> {
    let mut out: Vec<Cell> = row.iter().take(at).cloned().collect();
    out.resize(at, Cell::Empty);
    out.extend(derived);
    out.extend(row.iter().skip(at).cloned());
    out
}

fn first_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
