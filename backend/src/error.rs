//! Error types for the Metabolon to MAF conversion pipeline.
//!
//! - [`GridError`] - Loading or saving a spreadsheet grid
//! - [`ConfigError`] - Configuration loading and schema validation
//! - [`LookupError`] - Identifier lookup transport failures
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! Row-level problems (a missing cell, an unparseable sample value) are not
//! errors: they are collected as [`crate::transform::RowIssue`]s and the run
//! carries on. Lookup failures are absorbed by the resolver as "no match".

use thiserror::Error;

// =============================================================================
// Grid I/O Errors
// =============================================================================

/// Errors while reading or writing a grid.
#[derive(Debug, Error)]
pub enum GridError {
    /// Failed to read or write the file.
    #[error("Grid IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension is not a supported spreadsheet format.
    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    /// The workbook could not be opened or decoded.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// The workbook has no worksheet to read.
    #[error("Workbook has no worksheet")]
    NoWorksheet,

    /// Delimited text could not be parsed.
    #[error("Delimited text error: {0}")]
    Delimited(#[from] csv::Error),

    /// The sheet has no rows at all.
    #[error("Spreadsheet is empty")]
    Empty,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the MAF configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON or does not match the model.
    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration failed schema validation.
    #[error("Invalid configuration: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors from the identifier lookup service.
///
/// The resolver treats every variant as "no match" for the stage that
/// produced it.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("Lookup request failed: {0}")]
    RequestFailed(String),

    /// The service answered with a non-success status.
    #[error("Lookup service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not decode.
    #[error("Invalid lookup response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::InvalidResponse(err.to_string())
        } else {
            LookupError::RequestFailed(err.to_string())
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Only whole-run failures end up here: the source cannot be loaded, the
/// output cannot be written, or the configuration is unusable.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Grid I/O error.
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Lookup cache could not be persisted.
    #[error("Cache error: {0}")]
    Cache(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let grid_err = GridError::Empty;
        let pipeline_err: PipelineError = grid_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let config_err = ConfigError::Invalid {
            errors: vec!["standard_headers too short".into()],
        };
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("standard_headers"));
    }

    #[test]
    fn test_lookup_status_format() {
        let err = LookupError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("unavailable"));
    }
}
