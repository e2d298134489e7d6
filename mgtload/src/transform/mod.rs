//! Transformation module.
//!
//! - Row: derive prefix, MGT value, suffix and combined code per row
//! - Grouper: collect combined codes by segment
//! - Pipeline: load, derive, group and export in one call

pub mod grouper;
pub mod pipeline;
pub mod row;

pub use grouper::{SegmentAggregator, SegmentGroup};
pub use pipeline::*;
pub use row::{augment, segment_key, transform, transform_table};
