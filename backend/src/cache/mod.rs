//! Lookup Cache - Store and reuse identifier lookup answers
//!
//! Saves lookup answers to disk so repeated conversions of the same study do
//! not hit the reference database again. Negative answers are cached too.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::LookupResult;
use crate::lookup::{LookupService, SearchCategory};
use crate::models::MetaboliteRecord;

/// Directory where lookups are stored (relative to current dir)
pub const DEFAULT_CACHE_DIR: &str = ".metabolon2maf/lookups";

/// File holding every cached answer
const CACHE_FILE: &str = "lookups.json";

/// A stored lookup answer with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    /// Query key, see [`external_id_key`] and [`name_key`]
    pub key: String,
    /// The answer; `None` records a confirmed miss
    pub record: Option<MetaboliteRecord>,
    /// Creation timestamp
    pub cached_at: String,
    /// Last time this answer was served
    pub last_used: Option<String>,
    /// Number of times served from cache
    pub hits: u32,
}

/// Cache key for an external identifier lookup
pub fn external_id_key(id: &str) -> String {
    format!("id:{}", id.trim().to_uppercase())
}

/// Cache key for a name lookup
pub fn name_key(name: &str, category: SearchCategory) -> String {
    format!("{}:{}", category.as_str(), name.trim().to_lowercase())
}

/// On-disk store of lookup answers
pub struct LookupCache {
    /// Directory where the cache file lives
    cache_dir: PathBuf,
    /// Loaded entries (key -> entry)
    entries: HashMap<String, CachedEntry>,
    /// Whether entries changed since the last flush
    dirty: bool,
}

impl LookupCache {
    /// Create a cache in `dir`, loading existing entries from disk
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut cache = Self {
            cache_dir: PathBuf::from(dir.as_ref()),
            entries: HashMap::new(),
            dirty: false,
        };
        cache.load();
        cache
    }

    /// Load entries from the cache file; a missing or corrupt file yields an empty cache
    fn load(&mut self) {
        let Ok(content) = fs::read_to_string(self.file_path()) else {
            return;
        };
        if let Ok(entries) = serde_json::from_str::<Vec<CachedEntry>>(&content) {
            self.entries = entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// All entries, sorted by key
    pub fn list(&self) -> Vec<&CachedEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by key
    pub fn get(&self, key: &str) -> Option<&CachedEntry> {
        self.entries.get(key)
    }

    /// Get the cached answer for `key` and count the hit
    pub fn record_hit(&mut self, key: &str) -> Option<Option<MetaboliteRecord>> {
        let entry = self.entries.get_mut(key)?;
        entry.hits += 1;
        entry.last_used = Some(chrono::Utc::now().to_rfc3339());
        self.dirty = true;
        Some(entry.record.clone())
    }

    /// Store an answer, replacing any previous one for the same key
    pub fn insert(&mut self, key: String, record: Option<MetaboliteRecord>) {
        let entry = CachedEntry {
            key: key.clone(),
            record,
            cached_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            hits: 0,
        };
        self.entries.insert(key, entry);
        self.dirty = true;
    }

    /// Write the cache file if anything changed
    pub fn flush(&mut self) -> Result<(), std::io::Error> {
        if !self.dirty {
            return Ok(());
        }

        fs::create_dir_all(&self.cache_dir)?;
        let content = serde_json::to_string_pretty(&self.list())?;
        fs::write(self.file_path(), content)?;

        self.dirty = false;
        Ok(())
    }

    /// Delete every entry and the cache file. Returns the number of entries removed.
    pub fn clear(&mut self) -> Result<usize, std::io::Error> {
        let removed = self.entries.len();
        self.entries.clear();
        self.dirty = false;

        let path = self.file_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(removed)
    }
}

/// A lookup service that answers from a [`LookupCache`] before asking `inner`.
///
/// Only successful answers are cached; transport errors pass through and are
/// retried on the next run.
pub struct CachedLookup<S> {
    inner: S,
    cache: Mutex<LookupCache>,
}

impl<S> CachedLookup<S> {
    pub fn new(inner: S, cache: LookupCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    pub fn with_dir(inner: S, dir: impl AsRef<Path>) -> Self {
        Self::new(inner, LookupCache::with_dir(dir))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Persist the cache to disk
    pub fn flush(&self) -> Result<(), std::io::Error> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, LookupCache> {
        // Entries are replaced whole, so a poisoned lock is still consistent
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self, key: &str) -> Option<Option<MetaboliteRecord>> {
        self.lock().record_hit(key)
    }

    fn remember(
        &self,
        key: String,
        result: LookupResult<Option<MetaboliteRecord>>,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        if let Ok(record) = &result {
            self.lock().insert(key, record.clone());
        }
        result
    }
}

impl<S: LookupService + Sync> LookupService for CachedLookup<S> {
    async fn lookup_by_external_id(&self, id: &str) -> LookupResult<Option<MetaboliteRecord>> {
        let key = external_id_key(id);
        if let Some(record) = self.cached(&key) {
            return Ok(record);
        }
        let result = self.inner.lookup_by_external_id(id).await;
        self.remember(key, result)
    }

    async fn lookup_by_name(
        &self,
        name: &str,
        category: SearchCategory,
    ) -> LookupResult<Option<MetaboliteRecord>> {
        let key = name_key(name, category);
        if let Some(record) = self.cached(&key) {
            return Ok(record);
        }
        let result = self.inner.lookup_by_name(name, category).await;
        self.remember(key, result)
    }
}
