//! Identifier lookup against chemical reference databases.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use metabolon2maf::lookup::{ChebiClient, IdentifierResolver};
//!
//! let resolver = IdentifierResolver::new(ChebiClient::from_env());
//! let record = resolver.resolve(Some("HMDB06029"), Some("Glucose*")).await;
//! ```

pub mod chebi;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::cache::CachedLookup;
use crate::config::MafConfig;
use crate::error::LookupResult;
use crate::models::MetaboliteRecord;

pub use chebi::ChebiClient;
pub use resolver::{clean_compound_name, normalize_hint, IdentifierResolver, LookupStep, Resolution};

/// Name search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchCategory {
    /// The database's preferred name only.
    ExactName,
    /// Preferred names, synonyms and IUPAC names.
    AllNames,
}

impl SearchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactName => "exact_name",
            Self::AllNames => "all_names",
        }
    }
}

/// A chemical reference database.
///
/// Implementations perform a single attempt per call: no retries. `Ok(None)`
/// means the service answered and found nothing.
pub trait LookupService {
    /// Look up a compound by a cross-referenced database identifier.
    fn lookup_by_external_id(
        &self,
        id: &str,
    ) -> impl Future<Output = LookupResult<Option<MetaboliteRecord>>> + Send;

    /// Look up a compound by name within a search category.
    fn lookup_by_name(
        &self,
        name: &str,
        category: SearchCategory,
    ) -> impl Future<Output = LookupResult<Option<MetaboliteRecord>>> + Send;
}

/// A lookup service that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl LookupService for OfflineLookup {
    async fn lookup_by_external_id(&self, _id: &str) -> LookupResult<Option<MetaboliteRecord>> {
        Ok(None)
    }

    async fn lookup_by_name(
        &self,
        _name: &str,
        _category: SearchCategory,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        Ok(None)
    }
}

/// The lookup service selected for a run.
pub enum LookupBackend {
    Offline(OfflineLookup),
    Chebi(ChebiClient),
    Cached(CachedLookup<ChebiClient>),
}

impl LookupBackend {
    /// Pick a backend from configuration and command-line switches.
    pub fn from_config(config: &MafConfig, offline: bool, no_cache: bool) -> Self {
        if offline {
            return Self::Offline(OfflineLookup);
        }
        let client = ChebiClient::from_config(&config.chebi);
        if config.cache.enabled && !no_cache {
            Self::Cached(CachedLookup::with_dir(client, &config.cache.dir))
        } else {
            Self::Chebi(client)
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Offline(_) => "offline (no lookups)".to_string(),
            Self::Chebi(client) => format!("ChEBI at {}", client.base_url()),
            Self::Cached(cached) => format!("ChEBI at {} (cached)", cached.inner().base_url()),
        }
    }

    /// Persist cached answers, if this backend caches.
    pub fn flush(&self) -> std::io::Result<()> {
        match self {
            Self::Cached(cached) => cached.flush(),
            Self::Offline(_) | Self::Chebi(_) => Ok(()),
        }
    }
}

impl LookupService for LookupBackend {
    async fn lookup_by_external_id(&self, id: &str) -> LookupResult<Option<MetaboliteRecord>> {
        match self {
            Self::Offline(s) => s.lookup_by_external_id(id).await,
            Self::Chebi(s) => s.lookup_by_external_id(id).await,
            Self::Cached(s) => s.lookup_by_external_id(id).await,
        }
    }

    async fn lookup_by_name(
        &self,
        name: &str,
        category: SearchCategory,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        match self {
            Self::Offline(s) => s.lookup_by_name(name, category).await,
            Self::Chebi(s) => s.lookup_by_name(name, category).await,
            Self::Cached(s) => s.lookup_by_name(name, category).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_finds_nothing() {
        let service = OfflineLookup;
        assert!(service.lookup_by_external_id("HMDB0000122").await.unwrap().is_none());
        assert!(service
            .lookup_by_name("glucose", SearchCategory::AllNames)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_offline_switch_wins() {
        let backend = LookupBackend::from_config(&MafConfig::default(), true, false);
        assert!(matches!(backend, LookupBackend::Offline(_)));
        assert!(backend.flush().is_ok());
    }

    #[test]
    fn test_no_cache_switch() {
        let backend = LookupBackend::from_config(&MafConfig::default(), false, true);
        assert!(matches!(backend, LookupBackend::Chebi(_)));
    }
}
