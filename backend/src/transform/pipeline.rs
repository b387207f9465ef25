//! High-level pipeline API for Metabolon to MAF conversion.
//!
//! Combines every step over one source sheet: row classification, split
//! planning and row expansion, column layout, per-row field extraction and
//! identifier resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! use metabolon2maf::config::MafConfig;
//! use metabolon2maf::lookup::{ChebiClient, IdentifierResolver};
//! use metabolon2maf::transform::pipeline::convert_file;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MafConfig::default();
//!     let resolver = IdentifierResolver::new(ChebiClient::from_env());
//!     let result = convert_file(
//!         Path::new("metabolon.xlsx"),
//!         Path::new("m_study_maf.tsv"),
//!         &config,
//!         &resolver,
//!     ).await?;
//!
//!     println!("Wrote {} rows", result.stats.destination_rows);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::classify::{annotate, find_role, role_of};
use super::columns::{apply_record, collect_sample_columns, extract_row, ColumnLayout, RowIssue};
use super::expand::{expand, plan_splits};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::config::{MafConfig, StandardHeaderProvider};
use crate::error::PipelineResult;
use crate::lookup::{IdentifierResolver, LookupService, LookupStep};
use crate::models::{Grid, RowRole};
use crate::parser::{load_grid, save_grid};

/// Row issues logged individually before the rest are summarised.
const MAX_LOGGED_ISSUES: usize = 5;

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    /// Data rows in the source sheet, before splitting
    pub source_data_rows: usize,
    /// Source rows that named two compounds
    pub split_rows: usize,
    /// Data rows written to the MAF table
    pub destination_rows: usize,
    pub resolved_by_external_id: usize,
    pub resolved_by_name: usize,
    pub unresolved: usize,
}

/// Result of a complete conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Header row followed by one row per (split) compound
    pub table: Grid,
    pub headers: Vec<String>,
    pub sample_columns: Vec<String>,
    pub stats: ConversionStats,
    pub issues: Vec<RowIssue>,
}

/// Convert a Metabolon sheet into a MAF table.
///
/// 1. Tags every source row with its role
/// 2. Plans all compound splits, then expands the rows in one pass
/// 3. Builds the header from the standard headers and the sample names
/// 4. Extracts and resolves each data row, in sheet order
///
/// Row-level problems are collected in [`ConversionResult::issues`]; this
/// function does not fail.
pub async fn convert_grid<S: LookupService + Sync>(
    mut source: Grid,
    standard_headers: &[String],
    resolver: &IdentifierResolver<S>,
) -> ConversionResult {
    log_info("🏷️  Classifying rows...");
    annotate(&mut source);
    let source_data_rows = count_data_rows(&source);
    log_success(format!(
        "{} rows, {} compound rows",
        source.row_count(),
        source_data_rows
    ));

    log_info("✂️  Splitting co-reported compounds...");
    let plan = plan_splits(&source);
    for split in &plan {
        log_info_indent(
            format!("row {}: {} | {}", split.row, split.first, split.second),
            1,
        );
    }
    let expanded = expand(&source, &plan);
    log_success(format!("{} rows split", plan.len()));

    log_info("📋 Building MAF columns...");
    if find_role(&expanded, RowRole::SampleName).is_none() {
        log_warning("No SAMPLE_NAME row, the table will have no sample columns");
    }
    let sample_columns = collect_sample_columns(&expanded);
    let layout = ColumnLayout::new(standard_headers, &sample_columns);
    log_success(format!(
        "{} standard + {} sample columns",
        layout.sample_start(),
        sample_columns.len()
    ));

    log_info("🔎 Resolving identifiers...");
    let mut table = Grid::new();
    table.push_row(layout.header_row());
    let mut stats = ConversionStats {
        source_data_rows,
        split_rows: plan.len(),
        ..Default::default()
    };
    let mut issues = Vec::new();

    for (index, row) in expanded.rows().iter().enumerate() {
        if role_of(row) != Some(RowRole::Data) {
            continue;
        }

        let mut extracted = extract_row(row, index, &layout);
        let resolution = resolver
            .resolve_traced(extracted.hint.as_deref(), extracted.compound_name.as_deref())
            .await;

        match resolution.matched {
            Some(LookupStep::ExternalId(_)) => stats.resolved_by_external_id += 1,
            Some(LookupStep::Name { .. }) => stats.resolved_by_name += 1,
            None => stats.unresolved += 1,
        }

        apply_record(&mut extracted.cells, &resolution.record);
        table.push_row(extracted.cells);
        issues.append(&mut extracted.issues);
    }
    stats.destination_rows = table.row_count() - 1;

    log_success(format!(
        "{} resolved by database id, {} by name, {} unresolved",
        stats.resolved_by_external_id, stats.resolved_by_name, stats.unresolved
    ));
    report_issues(&issues);

    ConversionResult {
        table,
        headers: layout.headers().to_vec(),
        sample_columns,
        stats,
        issues,
    }
}

/// Load a sheet, convert it, and save the MAF table.
pub async fn convert_file<S: LookupService + Sync>(
    input: &Path,
    output: &Path,
    config: &MafConfig,
    resolver: &IdentifierResolver<S>,
) -> PipelineResult<ConversionResult> {
    log_info(format!("📖 Reading {}...", input.display()));
    let source = load_grid(input)?;

    let result = convert_grid(source, &config.standard_headers(), resolver).await;

    save_grid(&result.table, output)?;
    log_success(format!(
        "Wrote {} rows to {}",
        result.stats.destination_rows,
        output.display()
    ));

    Ok(result)
}

fn count_data_rows(grid: &Grid) -> usize {
    grid.rows()
        .iter()
        .filter(|row| role_of(row) == Some(RowRole::Data))
        .count()
}

fn report_issues(issues: &[RowIssue]) {
    if issues.is_empty() {
        return;
    }

    log_warning(format!("{} cells left empty", issues.len()));
    for issue in issues.iter().take(MAX_LOGGED_ISSUES) {
        log_warning_indent(
            format!("row {} [{}]: {}", issue.row, issue.field, issue.message),
            1,
        );
    }
    if issues.len() > MAX_LOGGED_ISSUES {
        log_warning_indent(format!("... +{}", issues.len() - MAX_LOGGED_ISSUES), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupResult;
    use crate::lookup::{OfflineLookup, SearchCategory};
    use crate::models::{Cell, MetaboliteRecord, Row};
    use tempfile::tempdir;

    /// Knows one HMDB accession and one name.
    struct StubLookup;

    impl LookupService for StubLookup {
        async fn lookup_by_external_id(&self, id: &str) -> LookupResult<Option<MetaboliteRecord>> {
            Ok((id == "HMDB0006029").then(|| MetaboliteRecord {
                identifier: Some("CHEBI:17196".into()),
                chemical_formula: Some("C5H10N2O3".into()),
                smiles: None,
                inchi: None,
            }))
        }

        async fn lookup_by_name(
            &self,
            name: &str,
            category: SearchCategory,
        ) -> LookupResult<Option<MetaboliteRecord>> {
            Ok((name == "serine" && category == SearchCategory::AllNames)
                .then(|| MetaboliteRecord::with_identifier("CHEBI:17115")))
        }
    }

    fn standard_headers() -> Vec<String> {
        MafConfig::default().standard_headers()
    }

    /// Five annotation rows with three samples, then the given data rows.
    fn metabolon_sheet(data: Vec<Row>) -> Grid {
        let mut grid = Grid::new();
        for _ in 0..5 {
            grid.push_row(vec![Cell::Empty]);
        }
        grid.set(2, 13, Cell::text("S1"));
        grid.set(2, 14, Cell::text("S2"));
        grid.set(2, 15, Cell::text("S3"));
        for row in data {
            grid.push_row(row);
        }
        grid
    }

    fn data_row(name: Cell, kegg: &str, hmdb: &str, samples: [Cell; 3]) -> Row {
        let mut row = vec![Cell::Empty; 13];
        row[1] = name;
        row[8] = Cell::Number(147.0532);
        row[11] = Cell::text(kegg);
        row[12] = Cell::text(hmdb);
        row.extend(samples);
        row
    }

    #[tokio::test]
    async fn test_split_row_end_to_end() {
        let sheet = metabolon_sheet(vec![data_row(
            Cell::text("A/B(1:2/2:1)"),
            "C00064",
            "HMDB06029",
            [Cell::Number(1.5), Cell::Number(2.5), Cell::Number(3.5)],
        )]);
        let resolver = IdentifierResolver::new(StubLookup);

        let result = convert_grid(sheet, &standard_headers(), &resolver).await;

        assert_eq!(result.sample_columns, vec!["S1", "S2", "S3"]);
        assert_eq!(result.table.row_count(), 3);
        let start = result.headers.len() - 3;
        assert_eq!(&result.headers[start..], &["S1", "S2", "S3"]);

        let rows = &result.table.rows()[1..];
        assert_eq!(rows[0][4], Cell::text("A"));
        assert_eq!(rows[1][4], Cell::text("B(1:2/2:1)"));
        for row in rows {
            assert_eq!(row[0], Cell::text("CHEBI:17196"));
            assert_eq!(row[1], Cell::text("C5H10N2O3"));
            assert_eq!(row[5], Cell::Number(147.0532));
            assert_eq!(
                &row[start..],
                &[Cell::Number(1.5), Cell::Number(2.5), Cell::Number(3.5)]
            );
        }

        assert_eq!(
            result.stats,
            ConversionStats {
                source_data_rows: 1,
                split_rows: 1,
                destination_rows: 2,
                resolved_by_external_id: 2,
                resolved_by_name: 0,
                unresolved: 0,
            }
        );
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_bad_rows_do_not_abort() {
        let sheet = metabolon_sheet(vec![
            data_row(
                Cell::Empty,
                "",
                "",
                [Cell::text("n.d."), Cell::Empty, Cell::text(".")],
            ),
            data_row(
                Cell::text("serine*"),
                "",
                "",
                [Cell::text("4.0"), Cell::Number(5.0), Cell::Boolean(true)],
            ),
        ]);
        let resolver = IdentifierResolver::new(StubLookup);

        let result = convert_grid(sheet, &standard_headers(), &resolver).await;

        assert_eq!(result.stats.destination_rows, 2);
        assert_eq!(result.stats.resolved_by_name, 1);
        assert_eq!(result.stats.unresolved, 1);

        let fields: Vec<_> = result.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["compound_name", "S1"]);

        let rows = &result.table.rows()[1..];
        let start = result.headers.len() - 3;
        assert_eq!(rows[0][4], Cell::text(""));
        assert_eq!(
            &rows[0][start..],
            &[Cell::text(""), Cell::Number(0.0), Cell::text("")]
        );
        assert_eq!(rows[1][0], Cell::text("CHEBI:17115"));
        assert_eq!(rows[1][4], Cell::text("serine*"));
        assert_eq!(
            &rows[1][start..],
            &[Cell::Number(4.0), Cell::Number(5.0), Cell::Number(0.0)]
        );
    }

    #[tokio::test]
    async fn test_unresolved_row_keeps_hint() {
        let sheet = metabolon_sheet(vec![data_row(
            Cell::text("unknownium"),
            "C99999",
            "",
            [Cell::Number(1.0), Cell::Number(1.0), Cell::Number(1.0)],
        )]);
        let resolver = IdentifierResolver::new(OfflineLookup);

        let result = convert_grid(sheet, &standard_headers(), &resolver).await;

        assert_eq!(result.table.rows()[1][0], Cell::text("C99999"));
        assert_eq!(result.stats.unresolved, 1);
    }

    #[tokio::test]
    async fn test_short_sheet_has_no_samples() {
        let sheet = Grid::from_rows(vec![vec![Cell::text("client")], vec![Cell::text("parent")]]);
        let resolver = IdentifierResolver::new(OfflineLookup);

        let result = convert_grid(sheet, &standard_headers(), &resolver).await;

        assert!(result.sample_columns.is_empty());
        assert_eq!(result.table.row_count(), 1);
        assert_eq!(result.headers.len(), standard_headers().len() - 1);
    }

    #[tokio::test]
    async fn test_convert_file_round_trip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("metabolon.tsv");
        let output = dir.path().join("m_maf.tsv");

        let sheet = metabolon_sheet(vec![data_row(
            Cell::text("glucose/fructose"),
            "C00031",
            "",
            [Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)],
        )]);
        save_grid(&sheet, &input).unwrap();

        let config = MafConfig::default();
        let resolver = IdentifierResolver::new(OfflineLookup);
        let result = convert_file(&input, &output, &config, &resolver).await.unwrap();
        assert_eq!(result.stats.destination_rows, 2);

        let written = load_grid(&output).unwrap();
        assert_eq!(written.row_count(), 3);
        assert_eq!(written.get(0, 0), Some(&Cell::text("database_identifier")));
        assert_eq!(written.get(1, 4), Some(&Cell::text("glucose")));
        assert_eq!(written.get(2, 4), Some(&Cell::text("fructose")));
        assert_eq!(written.get(2, 0), Some(&Cell::text("C00031")));
    }
}
