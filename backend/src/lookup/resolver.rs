//! Metabolite identifier resolution.
//!
//! Lookup stages, in order, each tried only when the previous one produced
//! no identifier:
//!
//! 1. The database hint (HMDB or KEGG id) as a cross-reference
//! 2. The cleaned compound name against preferred names
//! 3. The cleaned compound name against all names and synonyms

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{LookupService, SearchCategory};
use crate::api::logs::log_warning_indent;
use crate::error::LookupResult;
use crate::models::MetaboliteRecord;

/// Zero-padded width of the numeric part of a current HMDB accession.
const HMDB_DIGITS: usize = 7;

/// Old-style HMDB accessions with fewer than seven digits.
static SHORT_HMDB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^HMDB(\d{1,5})$").expect("valid HMDB pattern"));

/// Bring a database hint into the form the reference database indexes.
///
/// `HMDB06029` becomes `HMDB0006029`; anything else is only trimmed.
pub fn normalize_hint(hint: &str) -> String {
    let hint = hint.trim();
    match SHORT_HMDB.captures(hint) {
        Some(caps) => format!("HMDB{:0>width$}", &caps[1], width = HMDB_DIGITS),
        None => hint.to_string(),
    }
}

/// Strip Metabolon annotation marks from a compound name.
///
/// Asterisks flag tentative identifications and are never part of the name.
pub fn clean_compound_name(name: &str) -> String {
    name.replace('*', "").trim().to_string()
}

/// One lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "by", content = "query", rename_all = "snake_case")]
pub enum LookupStep {
    ExternalId(String),
    Name {
        name: String,
        category: SearchCategory,
    },
}

/// Outcome of resolving one row.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Resolution {
    pub record: MetaboliteRecord,
    /// The step that produced an identifier, if any did.
    pub matched: Option<LookupStep>,
}

/// Resolves a (hint, name) pair into a metabolite record.
pub struct IdentifierResolver<S> {
    service: S,
}

impl<S: LookupService + Sync> IdentifierResolver<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// The lookups that would be attempted for a row, in order.
    pub fn plan(&self, hint: Option<&str>, compound_name: Option<&str>) -> Vec<LookupStep> {
        let mut steps = Vec::with_capacity(3);

        if let Some(hint) = hint.map(normalize_hint).filter(|h| !h.is_empty()) {
            steps.push(LookupStep::ExternalId(hint));
        }

        if let Some(name) = compound_name
            .map(clean_compound_name)
            .filter(|n| !n.is_empty())
        {
            for category in [SearchCategory::ExactName, SearchCategory::AllNames] {
                steps.push(LookupStep::Name {
                    name: name.clone(),
                    category,
                });
            }
        }

        steps
    }

    /// Resolve a row. Never fails: lookup errors count as "no match".
    pub async fn resolve(&self, hint: Option<&str>, compound_name: Option<&str>) -> MetaboliteRecord {
        self.resolve_traced(hint, compound_name).await.record
    }

    /// Resolve a row and report which step matched.
    ///
    /// When no step yields an identifier, the first partial record (one with
    /// structure fields but no id) is kept.
    pub async fn resolve_traced(
        &self,
        hint: Option<&str>,
        compound_name: Option<&str>,
    ) -> Resolution {
        let mut fallback: Option<MetaboliteRecord> = None;

        for step in self.plan(hint, compound_name) {
            let found = match self.run(&step).await {
                Ok(found) => found,
                Err(e) => {
                    log_warning_indent(format!("Lookup {:?} failed: {}", step, e), 1);
                    None
                }
            };

            match found {
                Some(record) if record.has_identifier() => {
                    return Resolution {
                        record,
                        matched: Some(step),
                    };
                }
                Some(record) if !record.is_empty() && fallback.is_none() => {
                    fallback = Some(record);
                }
                Some(_) | None => {}
            }
        }

        Resolution {
            record: fallback.unwrap_or_default(),
            matched: None,
        }
    }

    async fn run(&self, step: &LookupStep) -> LookupResult<Option<MetaboliteRecord>> {
        match step {
            LookupStep::ExternalId(id) => self.service.lookup_by_external_id(id).await,
            LookupStep::Name { name, category } => {
                self.service.lookup_by_name(name, *category).await
            }
        }
    }
}
