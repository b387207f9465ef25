//! ChEBI web service client.
//!
//! Two round trips per lookup: a search that yields lite entities (only the
//! first is used), then an entity fetch for the structure fields.
//!
//! ```text
//! GET {base}/search?term=HMDB0000122&category=DATABASE_LINK_REGISTRY_NUMBER_CITATION&maximumResults=1&stars=ALL
//!   → { "listElement": [ { "chebiId": "CHEBI:4167", ... } ] }
//! GET {base}/entity/CHEBI:4167
//!   → { "chebiId": "CHEBI:4167", "formula": "C6H12O6", "smiles": "...", "inchi": "..." }
//! ```
//!
//! Only an empty `listElement` in a successful search is a miss. Any other
//! search status is a [`LookupError::Status`], so it never reaches the cache.
//! A 404 on the entity fetch means the id was withdrawn and counts as a miss.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{LookupService, SearchCategory};
use crate::api::logs::log_info_indent;
use crate::config::{ChebiConfig, MafConfig};
use crate::error::{LookupError, LookupResult};
use crate::models::MetaboliteRecord;

/// Search category for cross-referenced identifiers (HMDB, KEGG, CAS...).
const DATABASE_LINK_CATEGORY: &str = "DATABASE_LINK_REGISTRY_NUMBER_CITATION";

/// Only the best hit is used.
const MAX_RESULTS: &str = "1";

/// ChEBI REST client.
#[derive(Clone)]
pub struct ChebiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiteEntityList {
    #[serde(default)]
    list_element: Vec<LiteEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiteEntity {
    chebi_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entity {
    chebi_id: String,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    smiles: Option<String>,
    #[serde(default)]
    inchi: Option<String>,
}

impl From<Entity> for MetaboliteRecord {
    fn from(entity: Entity) -> Self {
        MetaboliteRecord {
            identifier: Some(entity.chebi_id),
            chemical_formula: entity.formula,
            smiles: entity.smiles,
            inchi: entity.inchi,
        }
    }
}

/// Wire name of a name-search category.
fn category_param(category: SearchCategory) -> &'static str {
    match category {
        SearchCategory::ExactName => "CHEBI_NAME",
        SearchCategory::AllNames => "ALL_NAMES",
    }
}

impl ChebiClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that sends requests through `http`
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ChebiConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    /// Create a client from the default configuration plus environment overrides
    pub fn from_env() -> Self {
        let mut config = MafConfig::default();
        config.apply_env();
        Self::from_config(&config.chebi)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First ChEBI id matching `term` in `category`.
    async fn search(&self, term: &str, category: &str) -> LookupResult<Option<String>> {
        log_info_indent(format!("ChEBI search [{}] {}", category, term), 1);

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("term", term),
                ("category", category),
                ("maximumResults", MAX_RESULTS),
                ("stars", "ALL"),
            ])
            .send()
            .await?;

        // A missing search route is a misconfiguration, never an empty result
        let response = check_status(response).await?;

        let list: LiteEntityList = response.json().await?;
        Ok(list.list_element.into_iter().next().map(|e| e.chebi_id))
    }

    /// Complete entity for a ChEBI id.
    async fn fetch_entity(&self, chebi_id: &str) -> LookupResult<Option<MetaboliteRecord>> {
        let response = self
            .http
            .get(format!("{}/entity/{}", self.base_url, chebi_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let entity: Entity = response.json().await?;
        Ok(Some(entity.into()))
    }

    async fn search_and_fetch(
        &self,
        term: &str,
        category: &str,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        match self.search(term, category).await? {
            Some(chebi_id) => self.fetch_entity(&chebi_id).await,
            None => Ok(None),
        }
    }
}

async fn check_status(response: reqwest::Response) -> LookupResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(LookupError::Status {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    })
}

impl LookupService for ChebiClient {
    async fn lookup_by_external_id(&self, id: &str) -> LookupResult<Option<MetaboliteRecord>> {
        self.search_and_fetch(id, DATABASE_LINK_CATEGORY).await
    }

    async fn lookup_by_name(
        &self,
        name: &str,
        category: SearchCategory,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        self.search_and_fetch(name, category_param(category)).await
    }
}
