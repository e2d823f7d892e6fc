//! Persistence collaborator boundary.
//!
//! The governor does not own storage. It appends call records, reads and
//! upserts cached responses, and queries usage aggregates through the narrow
//! [`Store`] trait; whatever sits behind it (a document store in production,
//! [`MemoryStore`] in tests and the CLI) is eventually consistent and
//! external to this crate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::endpoint::Endpoint;

/// Failure inside the persistence collaborator. Never part of the client's
/// public error taxonomy: cache read failures degrade to misses, cache write
/// and telemetry failures are logged and swallowed.
#[derive(Error, Debug)]
#[error("store failure: {0}")]
pub struct StoreError(pub String);

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One attempted upstream call. Immutable once written; exactly one per
/// logical request, cache hits included (marked by `cached`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub owner: String,
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    /// HTTP status of the outcome; 0 when the failure never reached HTTP.
    pub status: u16,
    pub latency_ms: u64,
    /// Response body size in bytes; 0 on failure.
    pub response_size: u64,
    /// Whether the response was served from cache.
    pub cached: bool,
    pub error: Option<String>,
}

/// A cached upstream response for one (owner, cache key) pair.
///
/// Entries are never updated in place; a fresh success overwrites the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub owner: String,
    pub cache_key: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedEntry {
    /// Build an entry expiring `ttl` from now.
    #[must_use]
    pub fn new(owner: &str, cache_key: &str, payload: Value, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            owner: owner.to_string(),
            cache_key: cache_key.to_string(),
            payload,
            created_at: now,
            expires_at: now + chrono::Duration::milliseconds(ttl.as_millis() as i64),
        }
    }

    /// An entry is usable only while the current time is before its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Daily per-owner usage aggregate, maintained on every recorded call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub owner: String,
    pub date: NaiveDate,
    pub total_calls: u64,
    pub by_endpoint: BTreeMap<String, u64>,
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub total_response_size: u64,
}

/// The four operations the governor needs from the profile/record store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Append one immutable call record.
    async fn record_call(&self, record: CallRecord) -> StoreResult<()>;

    /// Most recent non-expired entry for the composite key, if any. Must
    /// never return an expired entry, even one not yet cleaned up.
    async fn cached_response(&self, owner: &str, cache_key: &str)
        -> StoreResult<Option<CachedEntry>>;

    /// Insert or overwrite the entry for its (owner, cache key) pair.
    async fn put_cached_response(&self, entry: CachedEntry) -> StoreResult<()>;

    /// Daily aggregates for `owner` over the inclusive date range, newest
    /// first.
    async fn usage_stats(
        &self,
        owner: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<UsageStats>>;
}

/// Deterministic cache key: logical path plus query parameters sorted by
/// name, so identical logical requests collide regardless of the order the
/// caller supplied the parameters in.
#[must_use]
pub fn cache_key(endpoint: &Endpoint, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.path().into_owned();
    }
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", endpoint.path(), query.join("&"))
}

/// In-process [`Store`] used by tests and the CLI.
///
/// Expired cache entries linger until the next write to their key; reads
/// simply skip them.
#[derive(Default)]
pub struct MemoryStore {
    calls: Mutex<Vec<CallRecord>>,
    cache: Mutex<HashMap<(String, String), CachedEntry>>,
    stats: Mutex<HashMap<(String, NaiveDate), UsageStats>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records appended for `owner`, in insertion order.
    #[must_use]
    pub fn recorded_calls(&self, owner: &str) -> Vec<CallRecord> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect()
    }

    /// Raw cache slot for a key, expired or not. Test hook.
    #[must_use]
    pub fn raw_cache_entry(&self, owner: &str, cache_key: &str) -> Option<CachedEntry> {
        self.cache
            .lock()
            .expect("lock poisoned")
            .get(&(owner.to_string(), cache_key.to_string()))
            .cloned()
    }

    fn fold_into_stats(&self, record: &CallRecord) {
        let date = record.timestamp.date_naive();
        let mut stats = self.stats.lock().expect("lock poisoned");
        let entry = stats
            .entry((record.owner.clone(), date))
            .or_insert_with(|| UsageStats {
                owner: record.owner.clone(),
                date,
                total_calls: 0,
                by_endpoint: BTreeMap::new(),
                errors: 0,
                avg_latency_ms: 0.0,
                total_response_size: 0,
            });

        entry.avg_latency_ms = (entry.avg_latency_ms * entry.total_calls as f64
            + record.latency_ms as f64)
            / (entry.total_calls + 1) as f64;
        entry.total_calls += 1;
        *entry.by_endpoint.entry(record.endpoint.clone()).or_insert(0) += 1;
        entry.total_response_size += record.response_size;
        if record.error.is_some() || record.status >= 400 {
            entry.errors += 1;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn record_call(&self, record: CallRecord) -> StoreResult<()> {
        self.fold_into_stats(&record);
        self.calls.lock().expect("lock poisoned").push(record);
        Ok(())
    }

    async fn cached_response(
        &self,
        owner: &str,
        cache_key: &str,
    ) -> StoreResult<Option<CachedEntry>> {
        let cache = self.cache.lock().expect("lock poisoned");
        Ok(cache
            .get(&(owner.to_string(), cache_key.to_string()))
            .filter(|entry| !entry.is_expired())
            .cloned())
    }

    async fn put_cached_response(&self, entry: CachedEntry) -> StoreResult<()> {
        let key = (entry.owner.clone(), entry.cache_key.clone());
        self.cache.lock().expect("lock poisoned").insert(key, entry);
        Ok(())
    }

    async fn usage_stats(
        &self,
        owner: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<UsageStats>> {
        let stats = self.stats.lock().expect("lock poisoned");
        let mut rows: Vec<UsageStats> = stats
            .values()
            .filter(|s| s.owner == owner && s.date >= from && s.date <= to)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}
