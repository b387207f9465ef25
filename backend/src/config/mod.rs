//! Conversion configuration.
//!
//! The standard MAF column list, the ChEBI endpoint and the lookup cache
//! location. Defaults are embedded from `config/maf-ms.json`; a user file is
//! validated against the embedded schema before use.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::Path;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::validate_config;

const DEFAULT_CONFIG: &str = include_str!("../../config/maf-ms.json");

/// Environment variable overriding the ChEBI base URL.
pub const CHEBI_BASE_URL_ENV: &str = "CHEBI_BASE_URL";

/// Environment variable overriding the lookup cache directory.
pub const CACHE_DIR_ENV: &str = "METABOLON2MAF_CACHE_DIR";

/// Supplies the ordered list of standard output columns.
///
/// Element 0 is a row-label placeholder; it is dropped when the destination
/// header row is built.
pub trait StandardHeaderProvider {
    fn standard_headers(&self) -> Vec<String>;
}

/// Full conversion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MafConfig {
    /// MAF columns, placeholder first.
    pub standard_headers: Vec<String>,

    #[serde(default)]
    pub chebi: ChebiConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// ChEBI web service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChebiConfig {
    #[serde(default = "default_chebi_base_url")]
    pub base_url: String,
}

impl Default for ChebiConfig {
    fn default() -> Self {
        Self {
            base_url: default_chebi_base_url(),
        }
    }
}

fn default_chebi_base_url() -> String {
    "https://www.ebi.ac.uk/chebi/backend/api/public".to_string()
}

/// Lookup cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

impl MafConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a configuration document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        validate_config(&value).map_err(|errors| ConfigError::Invalid { errors })?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load `path` when given, otherwise the embedded defaults, then apply
    /// environment overrides.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides (reads `.env` if present).
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();

        if let Ok(url) = env::var(CHEBI_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.chebi.base_url = url;
            }
        }
        if let Ok(dir) = env::var(CACHE_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.cache.dir = dir;
            }
        }
    }
}

impl Default for MafConfig {
    fn default() -> Self {
        Self::from_json(DEFAULT_CONFIG).expect("Invalid embedded default configuration")
    }
}

impl StandardHeaderProvider for MafConfig {
    fn standard_headers(&self) -> Vec<String> {
        self.standard_headers.clone()
    }
}
