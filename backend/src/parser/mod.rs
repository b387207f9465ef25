//! Spreadsheet grid I/O.
//!
//! Reads a Metabolon peak area table into a [`Grid`] and writes the finished
//! MAF table back out. Workbooks (`xlsx`, `xls`, `ods`, ...) go through
//! calamine; delimited text goes through encoding and delimiter
//! auto-detection first. Positions are absolute: a sheet whose used range
//! starts below or right of A1 is padded so row 0 is always the first
//! spreadsheet row.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{GridError, GridResult};
use crate::models::{Cell, Grid, Row};

/// Spreadsheet formats understood by [`load_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Workbook,
    Delimited,
}

impl GridFormat {
    /// Pick a format from a file name's extension.
    pub fn from_file_name(name: &str) -> GridResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            _ => Err(GridError::UnsupportedFormat(name.to_string())),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load the first worksheet of a spreadsheet file.
pub fn load_grid<P: AsRef<Path>>(path: P) -> GridResult<Grid> {
    let path = path.as_ref();
    let name = path.to_string_lossy();

    let grid = match GridFormat::from_file_name(&name)? {
        GridFormat::Workbook => {
            let mut workbook =
                open_workbook_auto(path).map_err(|e| GridError::Workbook(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(GridError::NoWorksheet)?
                .map_err(|e| GridError::Workbook(e.to_string()))?;
            grid_from_range(&range)
        }
        GridFormat::Delimited => {
            let bytes = std::fs::read(path)?;
            grid_from_delimited_bytes(&bytes)?
        }
    };

    non_empty(grid)
}

/// Load uploaded spreadsheet content; `file_name` selects the format.
pub fn load_grid_from_bytes(bytes: &[u8], file_name: &str) -> GridResult<Grid> {
    let grid = match GridFormat::from_file_name(file_name)? {
        GridFormat::Workbook => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
                .map_err(|e| GridError::Workbook(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(GridError::NoWorksheet)?
                .map_err(|e| GridError::Workbook(e.to_string()))?;
            grid_from_range(&range)
        }
        GridFormat::Delimited => grid_from_delimited_bytes(bytes)?,
    };

    non_empty(grid)
}

fn non_empty(grid: Grid) -> GridResult<Grid> {
    if grid.is_empty() {
        Err(GridError::Empty)
    } else {
        Ok(grid)
    }
}

/// Convert a calamine range into a grid anchored at A1.
fn grid_from_range(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Row> = vec![Vec::new(); row_offset];
    for source in range.rows() {
        let mut row: Row = vec![Cell::Empty; col_offset];
        row.extend(source.iter().map(cell_from_data));
        rows.push(row);
    }

    Grid::from_rows(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::Error(e) => Cell::Error(e.to_string()),
        // Dates and durations are kept in their displayed form
        other => Cell::Text(other.to_string()),
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding, lossy on failure.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = ['\t', ',', ';', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn grid_from_delimited_bytes(bytes: &[u8]) -> GridResult<Grid> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_delimited(&content, delimiter)
}

/// Spreadsheet error codes, as calamine renders them.
const ERROR_CODES: [&str; 8] = [
    "#DIV/0!",
    "#N/A",
    "#NAME?",
    "#NULL!",
    "#NUM!",
    "#REF!",
    "#VALUE!",
    "#GETTING_DATA",
];

/// Type a delimited field the way [`save_grid`] wrote it.
///
/// A field becomes a `Number` only when it is the canonical rendering of that
/// number, so text such as `007` or `1.50` keeps its exact spelling.
pub fn infer_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        return Cell::Empty;
    }
    if field.eq_ignore_ascii_case("true") {
        return Cell::Boolean(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return Cell::Boolean(false);
    }
    if ERROR_CODES.contains(&field) {
        return Cell::Error(field.to_string());
    }
    match field.parse::<f64>() {
        Ok(n) if n.is_finite() && n.to_string() == field => Cell::Number(n),
        _ => Cell::text(field),
    }
}

/// Parse delimited text into a grid, typing each field with [`infer_cell`].
pub fn parse_delimited(content: &str, delimiter: char) -> GridResult<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut grid = Grid::new();
    for record in reader.records() {
        let record = record?;
        grid.push_row(record.iter().map(infer_cell).collect());
    }

    Ok(grid)
}

// =============================================================================
// Saving
// =============================================================================

/// Write a grid as delimited text: `.csv` uses commas, anything else tabs.
pub fn save_grid<P: AsRef<Path>>(grid: &Grid, path: P) -> GridResult<()> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    };

    let file = std::fs::File::create(path)?;
    write_delimited(grid, file, delimiter)
}

/// Render a grid as tab-separated text.
pub fn grid_to_tsv(grid: &Grid) -> GridResult<String> {
    let mut buffer = Vec::new();
    write_delimited(grid, &mut buffer, b'\t')?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_delimited<W: std::io::Write>(grid: &Grid, writer: W, delimiter: u8) -> GridResult<()> {
    let width = grid.width();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);

    for row in grid.rows() {
        let mut fields: Vec<String> = row.iter().map(Cell::display_value).collect();
        fields.resize(width, String::new());
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_tab_delimited() {
        let content = "a\tb\tc\n1\t\t3";
        let grid = parse_delimited(content, '\t').unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.get(0, 1), Some(&Cell::text("b")));
        assert_eq!(grid.get(1, 1), Some(&Cell::Empty));
        assert_eq!(grid.get(1, 2), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(infer_cell(" 179.056 "), Cell::Number(179.056));
        assert_eq!(infer_cell("-2"), Cell::Number(-2.0));
        assert_eq!(infer_cell("TRUE"), Cell::Boolean(true));
        assert_eq!(infer_cell("#DIV/0!"), Cell::Error("#DIV/0!".into()));
        assert_eq!(infer_cell("."), Cell::text("."));
        assert_eq!(infer_cell("NaN"), Cell::text("NaN"));
        assert_eq!(infer_cell("0012"), Cell::text("0012"));
        assert_eq!(infer_cell("1.50"), Cell::text("1.50"));
        assert_eq!(infer_cell("#1 peak"), Cell::text("#1 peak"));
        assert_eq!(infer_cell("HMDB06029"), Cell::text("HMDB06029"));
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let grid = parse_delimited("a,b\n1,2,3,4\n5", ',').unwrap();
        assert_eq!(grid.row(1).map(Vec::len), Some(4));
        assert_eq!(grid.row(2).map(Vec::len), Some(1));
    }

    #[test]
    fn test_quoted_slash_names_survive() {
        let grid = parse_delimited("x,\"PC(16:0/18:1)\",y", ',').unwrap();
        assert_eq!(grid.get(0, 1), Some(&Cell::text("PC(16:0/18:1)")));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(GridFormat::from_file_name("peaks.XLSX").unwrap(), GridFormat::Workbook);
        assert_eq!(GridFormat::from_file_name("peaks.tsv").unwrap(), GridFormat::Delimited);
        assert!(GridFormat::from_file_name("peaks.pdf").is_err());
    }

    #[test]
    fn test_save_and_reload_tsv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("maf.tsv");

        let grid = Grid::from_rows(vec![
            vec![
                Cell::text("database_identifier"),
                Cell::text("mass_to_charge"),
                Cell::text("flag"),
                Cell::text("S1"),
            ],
            vec![
                Cell::text("CHEBI:17234"),
                Cell::Number(181.07),
                Cell::Boolean(true),
                Cell::Error("#N/A".into()),
            ],
            vec![Cell::text("PC(16:0/18:1)"), Cell::Number(-0.5), Cell::Boolean(false), Cell::Empty],
        ]);
        save_grid(&grid, &path).unwrap();

        assert_eq!(load_grid(&path).unwrap(), grid);
    }

    #[test]
    fn test_empty_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(load_grid(&path), Err(GridError::Empty)));
    }
}
