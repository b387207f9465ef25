//! Domain models for the Metabolon to MAF conversion pipeline.
//!
//! - [`Cell`] - A typed spreadsheet cell
//! - [`Grid`] - A mutable 2-D grid of cells
//! - [`RowRole`] - Semantic role of a Metabolon source row
//! - [`CompoundNameSplit`] - Outcome of analysing a compound-name cell
//! - [`MetaboliteRecord`] - A resolved chemical identity

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Spreadsheet error code such as `#N/A` or `#DIV/0!`.
    Error(String),
}

impl Cell {
    /// Shorthand for a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Textual content of a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Empty | Cell::Number(_) | Cell::Boolean(_) | Cell::Error(_) => None,
        }
    }

    /// True for `Empty` and for whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Boolean(_) | Cell::Error(_) => false,
        }
    }

    /// Render the cell the way it is written to delimited output.
    pub fn display_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Boolean(b) => write!(f, "{}", b),
            Cell::Error(code) => f.write_str(code),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// =============================================================================
// Grid
// =============================================================================

/// One grid row. Cells are indexed from 0; missing trailing cells read as empty.
pub type Row = Vec<Cell>;

/// A mutable, row-major grid of cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row, col)`, or `None` when outside the populated area.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Set a cell, growing the grid with empty rows and cells as needed.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let target = &mut self.rows[row];
        if target.len() <= col {
            target.resize(col + 1, Cell::Empty);
        }
        target[col] = cell;
    }

    /// Append a row at the bottom.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Insert a row at `index`, shifting it and every later row down by one.
    /// An index past the end appends.
    pub fn insert_row(&mut self, index: usize, row: Row) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
    }
}

// =============================================================================
// Row Role
// =============================================================================

/// Semantic role of a row in a Metabolon peak area table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowRole {
    ClientIdentifier,
    ParentSampleId,
    SampleName,
    StartingVolume,
    HeaderNames,
    Data,
}

impl RowRole {
    /// Tag written into the reserved leading column of the source row.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ClientIdentifier => "CLIENT_IDENTIFIER",
            Self::ParentSampleId => "PARENT_SAMPLE_ID",
            Self::SampleName => "SAMPLE_NAME",
            Self::StartingVolume => "STARTING_VOLUME",
            Self::HeaderNames => "HEADERS",
            Self::Data => "DATA",
        }
    }

    /// Parse a role back from its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "CLIENT_IDENTIFIER" => Some(Self::ClientIdentifier),
            "PARENT_SAMPLE_ID" => Some(Self::ParentSampleId),
            "SAMPLE_NAME" => Some(Self::SampleName),
            "STARTING_VOLUME" => Some(Self::StartingVolume),
            "HEADERS" => Some(Self::HeaderNames),
            "DATA" => Some(Self::Data),
            _ => None,
        }
    }
}

impl fmt::Display for RowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Compound Name Split
// =============================================================================

/// Whether a compound-name cell names one compound or two co-reported ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompoundNameSplit {
    NoSplit,
    Split(String, String),
}

// =============================================================================
// Metabolite Record
// =============================================================================

/// Chemical identity of a compound as returned by the reference database.
///
/// Absent fields never overwrite populated destination cells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaboliteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical_formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smiles: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inchi: Option<String>,
}

impl MetaboliteRecord {
    /// A record with just an identifier.
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    /// True when the identifier field carries a non-blank value.
    pub fn has_identifier(&self) -> bool {
        self.identifier
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        [&self.identifier, &self.chemical_formula, &self.smiles, &self.inchi]
            .iter()
            .all(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_row_shifts_down() {
        let mut grid = Grid::from_rows(vec![
            vec![Cell::text("a")],
            vec![Cell::text("b")],
            vec![Cell::text("c")],
        ]);
        grid.insert_row(1, vec![Cell::text("new")]);

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.get(1, 0), Some(&Cell::text("new")));
        assert_eq!(grid.get(2, 0), Some(&Cell::text("b")));
        assert_eq!(grid.get(3, 0), Some(&Cell::text("c")));
    }

    #[test]
    fn test_set_widens_grid() {
        let mut grid = Grid::new();
        grid.set(2, 3, Cell::Number(1.5));

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.get(2, 0), Some(&Cell::Empty));
        assert_eq!(grid.get(2, 3), Some(&Cell::Number(1.5)));
    }

    #[test]
    fn test_role_tag_round_trip() {
        for role in [
            RowRole::ClientIdentifier,
            RowRole::ParentSampleId,
            RowRole::SampleName,
            RowRole::StartingVolume,
            RowRole::HeaderNames,
            RowRole::Data,
        ] {
            assert_eq!(RowRole::from_tag(role.tag()), Some(role));
        }
        assert_eq!(RowRole::from_tag("glucose"), None);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Boolean(true).to_string(), "true");
        assert_eq!(Cell::Error("#N/A".into()).to_string(), "#N/A");
    }

    #[test]
    fn test_record_identifier_checks() {
        assert!(!MetaboliteRecord::default().has_identifier());
        assert!(MetaboliteRecord::default().is_empty());
        assert!(MetaboliteRecord::with_identifier("CHEBI:17234").has_identifier());

        let blank = MetaboliteRecord {
            identifier: Some("  ".into()),
            ..Default::default()
        };
        assert!(!blank.has_identifier());
    }
}
