//! JSON Schema validation for configuration documents.
//!
//! The configuration schema is embedded at compile time from
//! `schemas/maf-config.json` and checked with JSON Schema Draft 7.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use metabolon2maf::validation::validate_config;
//!
//! let too_short = json!({ "standard_headers": ["Row label", "database_identifier"] });
//! assert!(validate_config(&too_short).is_err());
//! ```

use serde_json::Value;

const CONFIG_SCHEMA: &str = include_str!("../../schemas/maf-config.json");

/// Validate a JSON document against a JSON schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick boolean check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a configuration document against the embedded schema.
pub fn validate_config(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value =
        serde_json::from_str(CONFIG_SCHEMA).expect("Invalid embedded config schema");
    validate(&schema, data)
}
