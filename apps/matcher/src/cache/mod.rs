//! Rubric Cache — content-addressed rubric storage keyed by the job-posting text.
//!
//! The same posting must always be judged against the same rubric, otherwise two candidates
//! for one job are not comparable. The key is the SHA-256 of the exact posting bytes (no
//! whitespace or case normalization), truncated to [`KEY_HEX_LEN`] hex chars.
//!
//! Concurrent writers for the same posting are tolerated: the key is content-derived and
//! last write wins.

pub mod fs;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::truncate_chars;
use crate::models::Rubric;

pub use fs::FsRubricStore;
pub use memory::InMemoryRubricStore;

/// Hex chars of the digest kept as the storage key.
pub const KEY_HEX_LEN: usize = 16;
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache record '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Deterministic storage key for a job posting.
pub fn cache_key(job_posting: &str) -> String {
    let digest = Sha256::digest(job_posting.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(KEY_HEX_LEN);
    key
}

/// What actually sits in the store for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRubric {
    pub key: String,
    pub job_posting_preview: String,
    pub rubric: Rubric,
    /// Generator model that produced the rubric, when known.
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One line of `RubricCache::list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntrySummary {
    pub key: String,
    pub criteria_count: usize,
    pub job_posting_preview: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CachedRubric> for CacheEntrySummary {
    fn from(record: &CachedRubric) -> Self {
        Self {
            key: record.key.clone(),
            criteria_count: record.rubric.len(),
            job_posting_preview: record.job_posting_preview.clone(),
            created_at: record.created_at,
        }
    }
}

/// Key → record storage backend.
pub trait RubricStore: Send + Sync {
    /// `Ok(None)` on a miss.
    fn load(&self, key: &str) -> Result<Option<CachedRubric>>;

    /// Overwrites any existing record under `record.key`.
    fn save(&self, record: &CachedRubric) -> Result<()>;

    fn list(&self) -> Result<Vec<CachedRubric>>;

    /// Removes every record, returning how many were removed.
    fn clear(&self) -> Result<usize>;
}

/// Cache service handed to whatever orchestrates evaluation. No global state:
/// the storage location lives in the store it is built with.
pub struct RubricCache {
    store: Box<dyn RubricStore>,
    enabled: bool,
}

impl RubricCache {
    pub fn new(store: impl RubricStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            enabled: true,
        }
    }

    /// A cache that always misses and never writes.
    pub fn disabled() -> Self {
        Self {
            store: Box::new(InMemoryRubricStore::default()),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, job_posting: &str) -> Result<Option<Rubric>> {
        if !self.enabled {
            return Ok(None);
        }
        let key = cache_key(job_posting);
        let hit = self.store.load(&key)?.map(|record| record.rubric);
        match &hit {
            Some(rubric) => info!("Loaded rubric from cache (key: {key}, {} criteria)", rubric.len()),
            None => debug!("Rubric cache miss (key: {key})"),
        }
        Ok(hit)
    }

    pub fn put(&self, job_posting: &str, rubric: &Rubric) -> Result<()> {
        self.put_with_model(job_posting, rubric, None)
    }

    pub fn put_with_model(
        &self,
        job_posting: &str,
        rubric: &Rubric,
        model: Option<&str>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let record = CachedRubric {
            key: cache_key(job_posting),
            job_posting_preview: truncate_chars(job_posting, PREVIEW_CHARS),
            rubric: rubric.clone(),
            model: model.map(str::to_string),
            created_at: Utc::now(),
        };
        self.store.save(&record)?;
        info!("Saved rubric to cache (key: {})", record.key);
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<CacheEntrySummary>> {
        Ok(self.store.list()?.iter().map(CacheEntrySummary::from).collect())
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self.store.clear()?;
        info!("Cleared {removed} cached rubric(s)");
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Criterion;

    pub(crate) fn sample_rubric() -> Rubric {
        Rubric::normalized(vec![
            Criterion {
                name: "Experience Years".to_string(),
                weight: 40.0,
                description: "5+ years backend".to_string(),
                is_required: true,
            },
            Criterion {
                name: "Technical Skills - Rust".to_string(),
                weight: 60.0,
                description: "Senior level".to_string(),
                is_required: false,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let posting = "Senior Rust Engineer\nRemote, EU timezones.";
        assert_eq!(cache_key(posting), cache_key(posting));
        assert_eq!(cache_key(posting).len(), KEY_HEX_LEN);
    }

    #[test]
    fn test_cache_key_is_literal() {
        let posting = "Senior Rust Engineer";
        assert_ne!(cache_key(posting), cache_key("Senior Rust Engineer "));
        assert_ne!(cache_key(posting), cache_key("senior Rust Engineer"));
        assert_ne!(cache_key(posting), cache_key("Senior Rust EngineeR"));
    }

    #[test]
    fn test_cache_key_matches_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(cache_key("abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_get_put_roundtrip_in_memory() {
        let cache = RubricCache::new(InMemoryRubricStore::default());
        let posting = "Staff Engineer, Payments";
        assert!(cache.get(posting).unwrap().is_none());

        cache.put(posting, &sample_rubric()).unwrap();
        assert_eq!(cache.get(posting).unwrap(), Some(sample_rubric()));
        assert!(cache.get("Staff Engineer, Payments.").unwrap().is_none());
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let cache = RubricCache::disabled();
        cache.put("posting", &sample_rubric()).unwrap();
        assert!(cache.get("posting").unwrap().is_none());
        assert!(!cache.is_enabled());
    }

    #[test]
    fn test_list_and_clear() {
        let cache = RubricCache::new(InMemoryRubricStore::default());
        cache.put("first posting", &sample_rubric()).unwrap();
        cache
            .put_with_model("second posting", &sample_rubric(), Some("test-model"))
            .unwrap();

        let listed = cache.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|e| e.criteria_count == 2));

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.list().unwrap().is_empty());
    }
}
