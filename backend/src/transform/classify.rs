//! Row classification for Metabolon peak area tables.
//!
//! The first five rows of a Metabolon sheet are annotation rows in a fixed
//! order; everything below them is one compound per row.
//!
//! ```text
//! row 0  CLIENT_IDENTIFIER
//! row 1  PARENT_SAMPLE_ID
//! row 2  SAMPLE_NAME        ← sample identifiers, one per sample column
//! row 3  STARTING_VOLUME
//! row 4  HEADERS            ← column captions for the compound block
//! row 5+ DATA               ← one compound per row
//! ```

use crate::models::{Cell, Grid, RowRole};

/// Column reserved for the role tag.
pub const ROLE_COLUMN: usize = 0;

/// Role of a source row, by absolute position.
pub fn classify(row_index: usize) -> RowRole {
    match row_index {
        0 => RowRole::ClientIdentifier,
        1 => RowRole::ParentSampleId,
        2 => RowRole::SampleName,
        3 => RowRole::StartingVolume,
        4 => RowRole::HeaderNames,
        _ => RowRole::Data,
    }
}

/// Write every row's role tag into [`ROLE_COLUMN`].
///
/// The tag replaces whatever the vendor put in that column, so roles survive
/// later row insertions.
pub fn annotate(grid: &mut Grid) {
    for index in 0..grid.row_count() {
        grid.set(index, ROLE_COLUMN, Cell::text(classify(index).tag()));
    }
}

/// Role of a row as recorded by [`annotate`].
pub fn role_of(row: &[Cell]) -> Option<RowRole> {
    match row.get(ROLE_COLUMN) {
        Some(Cell::Text(tag)) => RowRole::from_tag(tag),
        Some(Cell::Empty | Cell::Number(_) | Cell::Boolean(_) | Cell::Error(_)) | None => None,
    }
}

/// Index of the first row tagged with `role`.
pub fn find_role(grid: &Grid, role: RowRole) -> Option<usize> {
    grid.rows().iter().position(|row| role_of(row) == Some(role))
}
