//! Best-effort usage telemetry.
//!
//! Telemetry must never block or fail a user-facing request: writes are
//! spawned off the request path and a failed write is logged, not
//! propagated.

use std::sync::Arc;

use tracing::warn;

use crate::store::{CallRecord, Store};

/// Fire-and-forget appender of [`CallRecord`] entries.
#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn Store>,
}

impl UsageRecorder {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one record. Returns immediately; the write completes (or fails
    /// and is logged) in the background.
    pub fn record(&self, record: CallRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let endpoint = record.endpoint.clone();
            if let Err(e) = store.record_call(record).await {
                warn!(endpoint = %endpoint, error = %e, "Failed to record usage");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use chrono::Utc;

    fn record(endpoint: &str) -> CallRecord {
        CallRecord {
            owner: "alice".into(),
            endpoint: endpoint.into(),
            timestamp: Utc::now(),
            status: 200,
            latency_ms: 5,
            response_size: 10,
            cached: false,
            error: None,
        }
    }

    #[tokio::test]
    async fn record_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let recorder = UsageRecorder::new(store.clone());

        recorder.record(record("leagues"));
        // Let the spawned write land.
        tokio::task::yield_now().await;

        assert_eq!(store.recorded_calls("alice").len(), 1);
    }

    struct FailingStore;

    #[async_trait]
    impl Store for FailingStore {
        async fn record_call(&self, _record: CallRecord) -> StoreResult<()> {
            Err(StoreError("write refused".into()))
        }

        async fn cached_response(
            &self,
            _owner: &str,
            _cache_key: &str,
        ) -> StoreResult<Option<crate::store::CachedEntry>> {
            Ok(None)
        }

        async fn put_cached_response(&self, _entry: crate::store::CachedEntry) -> StoreResult<()> {
            Ok(())
        }

        async fn usage_stats(
            &self,
            _owner: &str,
            _from: chrono::NaiveDate,
            _to: chrono::NaiveDate,
        ) -> StoreResult<Vec<crate::store::UsageStats>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let recorder = UsageRecorder::new(Arc::new(FailingStore));
        // Must not panic or surface the error anywhere.
        recorder.record(record("fixtures"));
        tokio::task::yield_now().await;
    }
}
