//! Column mapping from the Metabolon layout to the MAF layout.
//!
//! Source columns (0-indexed):
//!
//! | Col  | Content                         |
//! |------|---------------------------------|
//! | 0    | role tag (written by annotate)  |
//! | 1    | compound name                   |
//! | 8    | mass                            |
//! | 11   | KEGG id                         |
//! | 12   | HMDB id                         |
//! | 13+  | per-sample concentration        |
//!
//! Destination columns: identifier, formula, smiles, inchi, compound name,
//! mass-to-charge, then the remaining standard MAF columns, then one column
//! per sample.

use serde::Serialize;

use super::classify::{find_role, ROLE_COLUMN};
use super::expand::COMPOUND_NAME_COLUMN;
use crate::models::{Cell, Grid, MetaboliteRecord, Row, RowRole};

pub const MASS_COLUMN: usize = 8;
pub const KEGG_COLUMN: usize = 11;
pub const HMDB_COLUMN: usize = 12;
pub const FIRST_SAMPLE_COLUMN: usize = 13;

pub const DEST_IDENTIFIER: usize = 0;
pub const DEST_FORMULA: usize = 1;
pub const DEST_SMILES: usize = 2;
pub const DEST_INCHI: usize = 3;
pub const DEST_COMPOUND_NAME: usize = 4;
pub const DEST_MASS_TO_CHARGE: usize = 5;
const FIXED_FIELDS: usize = 6;

/// Value marking a sample cell as not measured.
const MISSING_SAMPLE_MARKER: &str = ".";

/// Hints of this length or shorter are ignored.
const MIN_HINT_LEN: usize = 2;

/// A non-fatal problem with one field of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// Row index in the expanded source sheet.
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl RowIssue {
    pub(crate) fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Header construction
// =============================================================================

/// Sample identifiers from the `SAMPLE_NAME` row, left to right.
///
/// Cells that are blank, one character long, or the `SAMPLE_NAME` tag itself
/// are skipped.
pub fn collect_sample_columns(grid: &Grid) -> Vec<String> {
    let Some(index) = find_role(grid, RowRole::SampleName) else {
        return Vec::new();
    };

    grid.rows()[index]
        .iter()
        .enumerate()
        .filter(|(col, _)| *col != ROLE_COLUMN)
        .filter_map(|(_, cell)| match cell {
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Empty | Cell::Boolean(_) | Cell::Error(_) => None,
        })
        .filter(|name| name.chars().count() > 1 && name != RowRole::SampleName.tag())
        .collect()
}

/// Destination column layout: standard columns followed by sample columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout {
    headers: Vec<String>,
    sample_start: usize,
}

impl ColumnLayout {
    /// Build the layout; element 0 of `standard_headers` is dropped.
    pub fn new(standard_headers: &[String], sample_columns: &[String]) -> Self {
        let mut headers: Vec<String> = standard_headers.iter().skip(1).cloned().collect();
        if headers.len() < FIXED_FIELDS {
            headers.resize(FIXED_FIELDS, String::new());
        }
        let sample_start = headers.len();
        headers.extend(sample_columns.iter().cloned());

        Self {
            headers,
            sample_start,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// First destination column of the sample block.
    pub fn sample_start(&self) -> usize {
        self.sample_start
    }

    /// Header row as text cells.
    pub fn header_row(&self) -> Row {
        self.headers.iter().map(|h| Cell::text(h.as_str())).collect()
    }

    /// A destination row of empty-string placeholders.
    pub fn blank_row(&self) -> Row {
        vec![Cell::Text(String::new()); self.width()]
    }

    /// Destination column for a source sample column.
    pub fn sample_destination(&self, source_column: usize) -> Option<usize> {
        sample_destination(self.sample_start, source_column)
    }
}

/// `(sample_start + source_column) - 13`, or `None` left of the sample block.
pub fn sample_destination(sample_start: usize, source_column: usize) -> Option<usize> {
    if source_column < FIRST_SAMPLE_COLUMN {
        return None;
    }
    Some(sample_start + source_column - FIRST_SAMPLE_COLUMN)
}

// =============================================================================
// Row field extraction
// =============================================================================

/// Fixed fields pulled from one source data row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub cells: Row,
    /// KEGG or HMDB id to seed identifier resolution; HMDB wins.
    pub hint: Option<String>,
    pub compound_name: Option<String>,
    pub issues: Vec<RowIssue>,
}

/// Map one source data row onto a destination row.
pub fn extract_row(row: &[Cell], row_index: usize, layout: &ColumnLayout) -> ExtractedRow {
    let mut cells = layout.blank_row();
    let mut issues = Vec::new();

    let compound_name = match row.get(COMPOUND_NAME_COLUMN) {
        Some(Cell::Text(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Some(Cell::Number(n)) => Some(n.to_string()),
        Some(Cell::Boolean(b)) => Some(b.to_string()),
        Some(Cell::Error(code)) => {
            issues.push(RowIssue::new(row_index, "compound_name", format!("error cell {}", code)));
            None
        }
        Some(Cell::Text(_) | Cell::Empty) | None => {
            issues.push(RowIssue::new(row_index, "compound_name", "missing compound name"));
            None
        }
    };
    if let Some(ref name) = compound_name {
        cells[DEST_COMPOUND_NAME] = Cell::text(name.as_str());
    }

    match row.get(MASS_COLUMN) {
        Some(Cell::Number(mass)) => cells[DEST_MASS_TO_CHARGE] = Cell::Number(*mass),
        Some(Cell::Text(text)) => match parse_number(text) {
            Some(mass) => cells[DEST_MASS_TO_CHARGE] = Cell::Number(mass),
            None if text.trim().is_empty() => {}
            None => issues.push(RowIssue::new(
                row_index,
                "mass_to_charge",
                format!("not a number: '{}'", text),
            )),
        },
        Some(Cell::Boolean(_) | Cell::Error(_)) => issues.push(RowIssue::new(
            row_index,
            "mass_to_charge",
            "non-numeric mass cell",
        )),
        Some(Cell::Empty) | None => {}
    }

    // HMDB is read after KEGG and overrides it
    let mut hint = None;
    for column in [KEGG_COLUMN, HMDB_COLUMN] {
        if let Some(value) = row.get(column).and_then(hint_value) {
            hint = Some(value);
        }
    }
    if let Some(ref id) = hint {
        cells[DEST_IDENTIFIER] = Cell::text(id.as_str());
    }

    for (column, cell) in row.iter().enumerate().skip(FIRST_SAMPLE_COLUMN) {
        let Some(dest) = layout.sample_destination(column) else {
            continue;
        };
        if dest >= cells.len() {
            if !cell.is_blank() {
                issues.push(RowIssue::new(
                    row_index,
                    format!("column {}", column),
                    "sample value has no matching sample name",
                ));
            }
            continue;
        }

        match sample_value(cell) {
            Ok(Some(value)) => cells[dest] = Cell::Number(value),
            Ok(None) => {}
            Err(raw) => issues.push(RowIssue::new(
                row_index,
                layout.headers()[dest].clone(),
                format!("not a number: '{}'", raw),
            )),
        }
    }

    ExtractedRow {
        cells,
        hint,
        compound_name,
        issues,
    }
}

/// Copy populated record fields into the identity columns.
///
/// Absent or blank fields leave the existing cell untouched.
pub fn apply_record(cells: &mut Row, record: &MetaboliteRecord) {
    let fields = [
        (DEST_IDENTIFIER, &record.identifier),
        (DEST_FORMULA, &record.chemical_formula),
        (DEST_SMILES, &record.smiles),
        (DEST_INCHI, &record.inchi),
    ];

    for (column, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            if column < cells.len() {
                cells[column] = Cell::text(value);
            }
        }
    }
}

fn hint_value(cell: &Cell) -> Option<String> {
    let value = match cell {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Empty | Cell::Boolean(_) | Cell::Error(_) => return None,
    };
    (value.chars().count() > MIN_HINT_LEN).then_some(value)
}

/// Numeric value of a sample cell.
///
/// `Ok(None)` leaves the destination blank; `Err` carries unparseable text.
fn sample_value(cell: &Cell) -> Result<Option<f64>, String> {
    match cell {
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Empty | Cell::Boolean(_) | Cell::Error(_) => Ok(Some(0.0)),
        Cell::Text(text) => {
            let trimmed = text.trim();
            if trimmed == MISSING_SAMPLE_MARKER {
                Ok(None)
            } else if trimmed.is_empty() {
                Ok(Some(0.0))
            } else {
                parse_number(trimmed).map(Some).ok_or_else(|| text.clone())
            }
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Vec<String> {
        ["Row label", "id", "formula", "smiles", "inchi", "name", "mz", "charge"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn source_row(cells: &[(usize, Cell)]) -> Row {
        let mut row = vec![Cell::Empty; 16];
        row[0] = Cell::text("DATA");
        for (col, cell) in cells {
            row[*col] = cell.clone();
        }
        row
    }

    #[test]
    fn test_sample_offset_formula() {
        assert_eq!(sample_destination(20, 15), Some(22));
        assert_eq!(sample_destination(20, 13), Some(20));
        assert_eq!(sample_destination(20, 12), None);
    }

    #[test]
    fn test_layout_drops_placeholder_and_appends_samples() {
        let samples = vec!["S1".to_string(), "S2".to_string()];
        let layout = ColumnLayout::new(&standard(), &samples);

        assert_eq!(layout.headers()[0], "id");
        assert_eq!(layout.sample_start(), 7);
        assert_eq!(layout.headers()[7..], ["S1", "S2"]);
        assert_eq!(layout.width(), 9);
    }

    #[test]
    fn test_collect_sample_columns() {
        let mut row = vec![Cell::text("SAMPLE_NAME"), Cell::Empty, Cell::text("X")];
        row.resize(13, Cell::Empty);
        row[12] = Cell::text("SAMPLE_NAME");
        row.extend([Cell::text("S-001"), Cell::text("S-002"), Cell::Number(1003.0)]);
        let grid = Grid::from_rows(vec![
            vec![Cell::text("CLIENT_IDENTIFIER")],
            vec![Cell::text("PARENT_SAMPLE_ID")],
            row,
        ]);

        assert_eq!(collect_sample_columns(&grid), vec!["S-001", "S-002", "1003"]);
    }

    #[test]
    fn test_no_sample_row() {
        assert!(collect_sample_columns(&Grid::new()).is_empty());
    }

    #[test]
    fn test_extract_fixed_fields() {
        let layout = ColumnLayout::new(&standard(), &["S1".into(), "S2".into(), "S3".into()]);
        let row = source_row(&[
            (1, Cell::text("glucose")),
            (8, Cell::text("179.056")),
            (11, Cell::text("C00031")),
            (12, Cell::text("HMDB00122")),
            (13, Cell::Number(1.5)),
            (14, Cell::text("2.25")),
            (15, Cell::text(".")),
        ]);

        let extracted = extract_row(&row, 5, &layout);
        let cells = &extracted.cells;

        assert_eq!(extracted.hint.as_deref(), Some("HMDB00122"));
        assert_eq!(extracted.compound_name.as_deref(), Some("glucose"));
        assert_eq!(cells[DEST_IDENTIFIER], Cell::text("HMDB00122"));
        assert_eq!(cells[DEST_COMPOUND_NAME], Cell::text("glucose"));
        assert_eq!(cells[DEST_MASS_TO_CHARGE], Cell::Number(179.056));
        assert_eq!(cells[DEST_FORMULA], Cell::text(""));
        assert_eq!(cells[7], Cell::Number(1.5));
        assert_eq!(cells[8], Cell::Number(2.25));
        assert_eq!(cells[9], Cell::text(""));
        assert!(extracted.issues.is_empty());
    }

    #[test]
    fn test_kegg_used_when_hmdb_missing() {
        let layout = ColumnLayout::new(&standard(), &[]);
        let row = source_row(&[(1, Cell::text("x")), (11, Cell::text("C00031")), (12, Cell::text("-"))]);

        let extracted = extract_row(&row, 5, &layout);
        assert_eq!(extracted.hint.as_deref(), Some("C00031"));
    }

    #[test]
    fn test_short_hints_ignored() {
        let layout = ColumnLayout::new(&standard(), &[]);
        let row = source_row(&[(1, Cell::text("x")), (11, Cell::text("NA")), (12, Cell::text(" "))]);

        let extracted = extract_row(&row, 5, &layout);
        assert_eq!(extracted.hint, None);
        assert_eq!(extracted.cells[DEST_IDENTIFIER], Cell::text(""));
    }

    #[test]
    fn test_blank_sample_defaults_to_zero() {
        let layout = ColumnLayout::new(&standard(), &["S1".into(), "S2".into(), "S3".into()]);
        let row = source_row(&[(1, Cell::text("x"))]);

        let extracted = extract_row(&row, 5, &layout);
        assert_eq!(extracted.cells[7], Cell::Number(0.0));
        assert_eq!(extracted.cells[9], Cell::Number(0.0));
    }

    #[test]
    fn test_bad_values_recorded_not_fatal() {
        let layout = ColumnLayout::new(&standard(), &["S1".into(), "S2".into(), "S3".into()]);
        let row = source_row(&[
            (1, Cell::text("x")),
            (8, Cell::text("heavy")),
            (13, Cell::text("n/d")),
        ]);

        let extracted = extract_row(&row, 9, &layout);
        assert_eq!(extracted.cells[DEST_MASS_TO_CHARGE], Cell::text(""));
        assert_eq!(extracted.cells[7], Cell::text(""));
        assert_eq!(extracted.issues.len(), 2);
        assert!(extracted.issues.iter().all(|i| i.row == 9));
        assert_eq!(extracted.issues[1].field, "S1");
    }

    #[test]
    fn test_extra_sample_cells_reported() {
        let layout = ColumnLayout::new(&standard(), &["S1".into()]);
        let row = source_row(&[(1, Cell::text("x")), (13, Cell::Number(1.0)), (14, Cell::Number(2.0))]);

        let extracted = extract_row(&row, 5, &layout);
        assert_eq!(extracted.cells.len(), layout.width());
        assert_eq!(extracted.issues.len(), 1);
    }

    #[test]
    fn test_missing_name_recorded() {
        let layout = ColumnLayout::new(&standard(), &[]);
        let extracted = extract_row(&source_row(&[]), 6, &layout);

        assert_eq!(extracted.compound_name, None);
        assert_eq!(extracted.issues[0].field, "compound_name");
    }

    #[test]
    fn test_apply_record_keeps_existing_cells() {
        let layout = ColumnLayout::new(&standard(), &[]);
        let mut cells = layout.blank_row();
        cells[DEST_IDENTIFIER] = Cell::text("HMDB0000122");
        cells[DEST_FORMULA] = Cell::text("C6H12O6");

        let record = MetaboliteRecord {
            identifier: None,
            chemical_formula: Some(String::new()),
            smiles: Some("OCC1OC(O)C(O)C(O)C1O".into()),
            inchi: None,
        };
        apply_record(&mut cells, &record);

        assert_eq!(cells[DEST_IDENTIFIER], Cell::text("HMDB0000122"));
        assert_eq!(cells[DEST_FORMULA], Cell::text("C6H12O6"));
        assert_eq!(cells[DEST_SMILES], Cell::text("OCC1OC(O)C(O)C(O)C1O"));

        apply_record(&mut cells, &MetaboliteRecord::with_identifier("CHEBI:17234"));
        assert_eq!(cells[DEST_IDENTIFIER], Cell::text("CHEBI:17234"));
    }
}
