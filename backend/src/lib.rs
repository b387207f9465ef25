//! # metabolon2maf - Metabolon spreadsheets to MetaboLights MAF
//!
//! Converts a Metabolon metabolomics spreadsheet (one compound per row, one
//! sample per column, five annotation rows on top) into a Metabolite
//! Assignment Format table, resolving each compound to a ChEBI identifier.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│  Classify   │────▶│ Split rows  │────▶│   Columns   │────▶│  MAF (TSV)  │
//! │ (xlsx/tsv)  │     │ (row roles) │     │ (co-eluted) │     │ + lookups   │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metabolon2maf::{convert_file, ChebiClient, IdentifierResolver, MafConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = IdentifierResolver::new(ChebiClient::from_env());
//!     let result = convert_file(
//!         Path::new("metabolon.xlsx"),
//!         Path::new("m_maf.tsv"),
//!         &MafConfig::default(),
//!         &resolver,
//!     ).await.unwrap();
//!     println!("Wrote {} rows", result.stats.destination_rows);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, grids, row roles, metabolite records
//! - [`parser`] - Workbook and delimited text I/O
//! - [`config`] - MAF headers and service settings
//! - [`validation`] - Configuration schema validation
//! - [`transform`] - Row classification, splitting, column mapping, pipeline
//! - [`lookup`] - Identifier resolution against ChEBI
//! - [`cache`] - On-disk lookup cache
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Grid I/O
pub mod parser;

// Configuration
pub mod config;
pub mod validation;

// Transformation
pub mod transform;

// Identifier lookup
pub mod lookup;

// Caching
pub mod cache;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, GridError, LookupError, PipelineError, PipelineResult, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, CompoundNameSplit, Grid, MetaboliteRecord, Row, RowRole};

// =============================================================================
// Re-exports - Grid I/O
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, grid_to_tsv, infer_cell, load_grid,
    load_grid_from_bytes, save_grid, GridFormat,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{CacheConfig, ChebiConfig, MafConfig, StandardHeaderProvider};
pub use validation::{is_valid, validate, validate_config};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    annotate, apply_in_place, apply_record, classify, collect_sample_columns, duplicate_row,
    expand, extract_row, plan_splits, sample_destination, split_compound_name, ColumnLayout,
    PlannedSplit, RowIssue,
};

// =============================================================================
// Re-exports - Lookup
// =============================================================================

pub use lookup::{
    ChebiClient, IdentifierResolver, LookupBackend, LookupService, LookupStep, OfflineLookup,
    Resolution, SearchCategory,
};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{CachedEntry, CachedLookup, LookupCache};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{convert_file, convert_grid, ConversionResult, ConversionStats};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ConvertResponse, HealthResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}

pub use server::AppState;
