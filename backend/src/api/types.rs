//! REST API types.
//!
//! The conversion response carries the MAF table twice: as JSON rows for
//! display and as TSV text ready to save.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::parser::grid_to_tsv;
use crate::transform::{ConversionResult, ConversionStats, RowIssue};

/// Response sent after a sheet upload and conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready", "warning", "error"
    pub status: String,

    /// Uploaded file name, when the client sent one
    pub file_name: Option<String>,

    /// Destination column names
    pub headers: Vec<String>,

    /// Data rows as display strings, in header order
    pub rows: Vec<Vec<String>>,

    pub stats: ConversionStats,

    /// Cells left empty, with the reason
    pub issues: Vec<RowIssue>,

    /// Whole table as tab-separated text, header included
    pub tsv: String,
}

/// Health check payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// Where identifier lookups go
    pub lookup: String,
}

impl ConvertResponse {
    pub fn from_result(result: ConversionResult, file_name: Option<String>) -> Self {
        // Grid rendering into memory cannot fail
        let tsv = grid_to_tsv(&result.table).unwrap_or_default();

        let rows = result
            .table
            .rows()
            .iter()
            .skip(1)
            .map(|row| row.iter().map(|cell| cell.display_value()).collect())
            .collect();

        let status = if result.issues.is_empty() && result.stats.unresolved == 0 {
            "ready"
        } else {
            "warning"
        };

        ConvertResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            file_name,
            headers: result.headers,
            rows,
            stats: result.stats,
            issues: result.issues,
            tsv,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "headers": [],
        "rows": [],
        "issues": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Grid};

    fn result(unresolved: usize) -> ConversionResult {
        let table = Grid::from_rows(vec![
            vec![Cell::text("database_identifier"), Cell::text("S1")],
            vec![Cell::text("CHEBI:4167"), Cell::Number(1.5)],
        ]);
        ConversionResult {
            table,
            headers: vec!["database_identifier".into(), "S1".into()],
            sample_columns: vec!["S1".into()],
            stats: ConversionStats {
                destination_rows: 1,
                unresolved,
                ..Default::default()
            },
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_response_rows_and_tsv() {
        let response = ConvertResponse::from_result(result(0), Some("study.xlsx".into()));

        assert_eq!(response.status, "ready");
        assert_eq!(response.rows, vec![vec!["CHEBI:4167".to_string(), "1.5".to_string()]]);
        assert!(response.tsv.starts_with("database_identifier\tS1"));
        assert!(response.tsv.contains("CHEBI:4167\t1.5"));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["jobId"].is_string());
        assert_eq!(json["fileName"], "study.xlsx");
        assert_eq!(json["stats"]["destinationRows"], 1);
    }

    #[test]
    fn test_unresolved_rows_are_a_warning() {
        let response = ConvertResponse::from_result(result(1), None);
        assert_eq!(response.status, "warning");
    }

    #[test]
    fn test_error_response_shape() {
        let value = error_response("No file provided");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "No file provided");
        assert!(value["rows"].as_array().unwrap().is_empty());
    }
}
