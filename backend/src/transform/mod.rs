//! Transformation module.
//!
//! Converts a Metabolon sheet into a MAF table:
//! - Classify: role tag for every source row
//! - Split: compound names that encode two compounds
//! - Expand: one source row becomes two rows on a split
//! - Columns: destination layout and per-row field extraction
//! - Pipeline: the whole conversion, in order

pub mod classify;
pub mod columns;
pub mod expand;
pub mod pipeline;
pub mod split;

pub use classify::{annotate, classify, find_role, role_of};
pub use columns::{
    apply_record, collect_sample_columns, extract_row, sample_destination, ColumnLayout,
    ExtractedRow, RowIssue,
};
pub use expand::{apply_in_place, duplicate_row, expand, plan_splits, PlannedSplit};
pub use pipeline::{convert_file, convert_grid, ConversionResult, ConversionStats};
pub use split::split_compound_name;
