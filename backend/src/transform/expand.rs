//! Row expansion for co-reported compounds.
//!
//! A data row whose compound name splits becomes two rows with identical
//! cells except for the name: the first split name on the upper row, the
//! second on the lower one.
//!
//! Split decisions are planned against the original row indices before any
//! row moves. [`expand`] then builds the final row sequence in one pass;
//! [`apply_in_place`] performs the same expansion by inserting rows into the
//! grid, offsetting each planned index by the number of rows already
//! inserted above it.

use serde::Serialize;

use super::classify::role_of;
use super::split::split_compound_name;
use crate::models::{Cell, CompoundNameSplit, Grid, Row, RowRole};

/// Source column holding the compound name.
pub const COMPOUND_NAME_COLUMN: usize = 1;

/// A data row that must be duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSplit {
    /// Row index in the grid before any expansion.
    pub row: usize,
    pub first: String,
    pub second: String,
}

/// Compound name of a row, if the name cell holds text.
pub fn compound_name(row: &[Cell]) -> Option<&str> {
    row.get(COMPOUND_NAME_COLUMN)?.as_text()
}

/// Collect every data row whose compound name splits, in row order.
pub fn plan_splits(grid: &Grid) -> Vec<PlannedSplit> {
    grid.rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| role_of(row) == Some(RowRole::Data))
        .filter_map(|(index, row)| {
            let name = compound_name(row)?;
            match split_compound_name(name) {
                CompoundNameSplit::Split(first, second) => Some(PlannedSplit {
                    row: index,
                    first,
                    second,
                }),
                CompoundNameSplit::NoSplit => None,
            }
        })
        .collect()
}

/// Build the expanded grid without mutating the source.
pub fn expand(grid: &Grid, plan: &[PlannedSplit]) -> Grid {
    let mut planned = plan.iter().peekable();
    let mut rows = Vec::with_capacity(grid.row_count() + plan.len());

    for (index, row) in grid.rows().iter().enumerate() {
        match planned.next_if(|p| p.row == index) {
            Some(split) => {
                rows.push(with_compound_name(row, &split.first));
                rows.push(with_compound_name(row, &split.second));
            }
            None => rows.push(row.clone()),
        }
    }

    Grid::from_rows(rows)
}

/// Duplicate the row at `row_index` in place.
///
/// Rows from `row_index` down shift by one; the new row at `row_index` gets
/// `first` as compound name and the shifted original gets `second`. Every
/// other cell is copied unchanged. Out-of-range indices are ignored.
pub fn duplicate_row(grid: &mut Grid, row_index: usize, first: &str, second: &str) {
    let Some(original) = grid.row(row_index).cloned() else {
        return;
    };

    grid.insert_row(row_index, with_compound_name(&original, first));
    grid.set(row_index + 1, COMPOUND_NAME_COLUMN, Cell::text(second));
}

/// Apply a plan by inserting rows into `grid`.
///
/// `plan` must be sorted by row, as [`plan_splits`] returns it.
pub fn apply_in_place(grid: &mut Grid, plan: &[PlannedSplit]) {
    for (inserted, split) in plan.iter().enumerate() {
        duplicate_row(grid, split.row + inserted, &split.first, &split.second);
    }
}

fn with_compound_name(row: &[Cell], name: &str) -> Row {
    let mut copy = row.to_vec();
    if copy.len() <= COMPOUND_NAME_COLUMN {
        copy.resize(COMPOUND_NAME_COLUMN + 1, Cell::Empty);
    }
    copy[COMPOUND_NAME_COLUMN] = Cell::text(name);
    copy
}
