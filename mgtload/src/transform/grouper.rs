//! Group combined codes by segment.
//!
//! ```text
//! Derived rows                         Segment groups
//! ┌───────────────────────────┐       ┌──────────────────────────┐
//! │ row 2, North, X000000001  │       │ North: [X000000001,      │
//! │ row 3, South, Y000000002  │  →    │         X000000003]      │
//! │ row 4, (none), ...        │       ├──────────────────────────┤
//! │ row 5, North, X000000003  │       │ South: [Y000000002]      │
//! └───────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! Segments keep first-seen order; values keep row order.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::DerivedRecord;

/// Values collected for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentGroup {
    pub segment: String,
    pub values: Vec<String>,
}

/// Ordered accumulator of values per segment key.
///
/// Keys compare by exact, case-sensitive equality. The caller decides which
/// rows have a segment; `add` accepts any key.
#[derive(Debug, Clone, Default)]
pub struct SegmentAggregator {
    positions: HashMap<String, usize>,
    groups: Vec<SegmentGroup>,
}

impl SegmentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group every record that has a segment.
    pub fn from_records(records: &[DerivedRecord]) -> Self {
        let mut aggregator = Self::new();
        for record in records {
            if let Some(ref segment) = record.segment {
                aggregator.add(segment, record.derived.combined.clone());
            }
        }
        aggregator
    }

    /// Append a value to the segment's list, creating the list on first use.
    pub fn add(&mut self, segment: &str, value: impl Into<String>) {
        let pos = match self.positions.get(segment) {
            Some(&pos) => pos,
            None => {
                self.positions.insert(segment.to_string(), self.groups.len());
                self.groups.push(SegmentGroup {
                    segment: segment.to_string(),
                    values: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        self.groups[pos].values.push(value.into());
    }

    pub fn get(&self, segment: &str) -> Option<&[String]> {
        self.positions
            .get(segment)
            .map(|&pos| self.groups[pos].values.as_slice())
    }

    /// Number of distinct segments.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of values across all segments.
    pub fn total_values(&self) -> usize {
        self.groups.iter().map(|g| g.values.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentGroup> {
        self.groups.iter()
    }

    /// Ordered copy of the groups for export.
    pub fn snapshot(&self) -> Vec<SegmentGroup> {
        self.groups.clone()
    }

    pub fn into_groups(self) -> Vec<SegmentGroup> {
        self.groups
    }
}
