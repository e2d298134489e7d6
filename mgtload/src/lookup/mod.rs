//! Prefix lookup index built from the reference table.
//!
//! The reference table has a header row, then one mapping per row:
//! column A holds the prefix, column B the mapped MGT value. Matching is
//! exact on the prefix text.

use std::collections::HashMap;

use crate::error::LookupError;
use crate::models::{Cell, Table};

/// Exact-match map from prefix text to mapped value.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    positions: HashMap<String, usize>,
    entries: Vec<(String, Cell)>,
}

impl LookupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from a reference table.
    ///
    /// Rows with an empty prefix are skipped. A missing value column yields
    /// an empty value. On duplicate prefixes the last row wins.
    pub fn build(reference: &Table) -> Result<Self, LookupError> {
        if reference.row_count() > 0 && reference.width() < 2 {
            return Err(LookupError::TooFewColumns(reference.width()));
        }

        let mut index = Self::new();
        for row in 0..reference.row_count() {
            let prefix = reference.cell(row, 0);
            if prefix.is_empty() {
                continue;
            }
            index.insert(prefix.as_text(), reference.cell(row, 1).clone());
        }
        Ok(index)
    }

    /// Insert or overwrite a mapping. An overwrite keeps the original position.
    pub fn insert(&mut self, prefix: impl Into<String>, value: Cell) {
        let prefix = prefix.into();
        match self.positions.get(&prefix) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.positions.insert(prefix.clone(), self.entries.len());
                self.entries.push((prefix, value));
            }
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&Cell> {
        self.positions.get(prefix).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.positions.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as a JSON object (prefix -> value).
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::to_value(v).unwrap_or_default()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Cell)> for LookupIndex {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (prefix, value) in iter {
            index.insert(prefix, value);
        }
        index
    }
}
