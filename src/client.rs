//! The request orchestrator.
//!
//! [`FootballClient`] composes the pipeline behind every logical fetch:
//! cache check, rate-governed dispatch, bounded retry, transport, envelope
//! decode, usage recording, cache population. Each stage is a named function
//! so the pipeline is testable piece by piece.
//!
//! Caller identity is an explicit parameter on every operation: `Some(owner)`
//! partitions cache and telemetry per authenticated user, `None` skips both
//! while still passing through the rate governor.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::filter::{
    FixturesFilter, LeaguesFilter, OddsFilter, PlayersFilter, QueryParams, TeamsFilter,
};
use crate::governor::RateGovernor;
use crate::recorder::UsageRecorder;
use crate::retry::RetryPolicy;
use crate::store::{cache_key, CachedEntry, CallRecord, Store, UsageStats};
use crate::transport::{HttpTransport, RawReply, Transport};
use crate::types::ApiResponse;

/// Governed, cached, usage-tracked client for the football-data upstream.
#[derive(Clone)]
pub struct FootballClient {
    transport: Arc<dyn Transport>,
    governor: RateGovernor,
    retry: RetryPolicy,
    store: Arc<dyn Store>,
    recorder: UsageRecorder,
}

impl FootballClient {
    /// Build a client over the real HTTP transport.
    #[must_use]
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.upstream));
        Self::with_transport(config, store, transport)
    }

    /// Build a client over an injected transport. The seam the tests use.
    #[must_use]
    pub fn with_transport(
        config: &Config,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            governor: RateGovernor::new(config.governor.min_interval()),
            retry: RetryPolicy::from_config(&config.retry),
            store: Arc::clone(&store),
            recorder: UsageRecorder::new(store),
        }
    }

    // --- Typed operations, one per data domain ---

    pub async fn timezone(&self, caller: Option<&str>) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Timezone, Vec::new()).await
    }

    pub async fn countries(&self, caller: Option<&str>) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Countries, Vec::new()).await
    }

    pub async fn leagues(&self, caller: Option<&str>, filter: &LeaguesFilter) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Leagues, filter.params()).await
    }

    pub async fn teams(&self, caller: Option<&str>, filter: &TeamsFilter) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Teams, filter.params()).await
    }

    pub async fn standings(
        &self,
        caller: Option<&str>,
        league: u32,
        season: u32,
    ) -> Result<ApiResponse> {
        let params = vec![
            ("league".to_string(), league.to_string()),
            ("season".to_string(), season.to_string()),
        ];
        self.fetch(caller, Endpoint::Standings, params).await
    }

    pub async fn fixtures(
        &self,
        caller: Option<&str>,
        filter: &FixturesFilter,
    ) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Fixtures, filter.params()).await
    }

    pub async fn players(&self, caller: Option<&str>, filter: &PlayersFilter) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Players, filter.params()).await
    }

    pub async fn top_scorers(
        &self,
        caller: Option<&str>,
        league: u32,
        season: u32,
    ) -> Result<ApiResponse> {
        let params = vec![
            ("league".to_string(), league.to_string()),
            ("season".to_string(), season.to_string()),
        ];
        self.fetch(caller, Endpoint::TopScorers, params).await
    }

    pub async fn statistics(&self, caller: Option<&str>, fixture: u32) -> Result<ApiResponse> {
        let params = vec![("fixture".to_string(), fixture.to_string())];
        self.fetch(caller, Endpoint::Statistics, params).await
    }

    pub async fn predictions(&self, caller: Option<&str>, fixture: u32) -> Result<ApiResponse> {
        let params = vec![("fixture".to_string(), fixture.to_string())];
        self.fetch(caller, Endpoint::Predictions, params).await
    }

    pub async fn odds(&self, caller: Option<&str>, filter: &OddsFilter) -> Result<ApiResponse> {
        self.fetch(caller, Endpoint::Odds, filter.params()).await
    }

    /// Generic passthrough: run the same governed/cached/retried pipeline for
    /// an arbitrary logical endpoint and parameter bag.
    pub async fn request(
        &self,
        caller: Option<&str>,
        endpoint: Endpoint,
        params: Vec<(String, String)>,
    ) -> Result<ApiResponse> {
        self.fetch(caller, endpoint, params).await
    }

    /// Daily usage aggregates for an owner over an inclusive date range.
    pub async fn usage(
        &self,
        owner: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UsageStats>> {
        Ok(self.store.usage_stats(owner, from, to).await?)
    }

    // --- Pipeline stages ---

    /// One logical fetch: cache check, then a governed + retried transport
    /// call, then decode, record, and cache population.
    async fn fetch(
        &self,
        caller: Option<&str>,
        endpoint: Endpoint,
        mut params: Vec<(String, String)>,
    ) -> Result<ApiResponse> {
        params.sort();
        let key = cache_key(&endpoint, &params);
        let started = Instant::now();

        if let Some(owner) = caller {
            if let Some(envelope) = self.check_cache(owner, &endpoint, &key).await {
                let size = serde_json::to_string(&envelope).map_or(0, |s| s.len() as u64);
                self.record_outcome(owner, &endpoint, started, Ok((&envelope, size)), true);
                return Ok(envelope);
            }
        }

        let outcome = self
            .governed_fetch(&endpoint, params)
            .await
            .and_then(|reply| decode(&endpoint, &reply));

        if let Some(owner) = caller {
            let view = match &outcome {
                Ok((envelope, size)) => Ok((envelope, *size)),
                Err(err) => Err(err),
            };
            self.record_outcome(owner, &endpoint, started, view, false);
            if let Ok((envelope, _)) = &outcome {
                self.store_cache(owner, &endpoint, &key, envelope).await;
            }
        }

        outcome.map(|(envelope, _)| envelope)
    }

    /// Cache-check stage. A store failure or an undecodable slot degrades to
    /// a miss.
    async fn check_cache(
        &self,
        owner: &str,
        endpoint: &Endpoint,
        key: &str,
    ) -> Option<ApiResponse> {
        let entry = match self.store.cached_response(owner, key).await {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_value::<ApiResponse>(entry.payload) {
            Ok(envelope) => {
                debug!(endpoint = %endpoint, key = %key, "Cache hit");
                Some(envelope)
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Cached payload undecodable, refetching");
                None
            }
        }
    }

    /// Rate-gate + retry + transport stage. The whole retried call is one
    /// governed unit, so backoff sleeps hold the dispatch slot and the
    /// spacing invariant covers retries too.
    async fn governed_fetch(
        &self,
        endpoint: &Endpoint,
        params: Vec<(String, String)>,
    ) -> Result<RawReply> {
        let transport = Arc::clone(&self.transport);
        let retry = self.retry;
        let endpoint = endpoint.clone();

        self.governor
            .submit(move || async move {
                retry
                    .execute(|| {
                        let transport = Arc::clone(&transport);
                        let endpoint = endpoint.clone();
                        let params = params.clone();
                        async move { transport.get(&endpoint, &params).await }
                    })
                    .await
            })
            .await
    }

    /// Recording stage: exactly one record per logical request, cache hits
    /// included. Best-effort by construction.
    fn record_outcome(
        &self,
        owner: &str,
        endpoint: &Endpoint,
        started: Instant,
        outcome: std::result::Result<(&ApiResponse, u64), &Error>,
        cached: bool,
    ) {
        let latency_ms = started.elapsed().as_millis() as u64;
        let record = match outcome {
            Ok((_envelope, size)) => CallRecord {
                owner: owner.to_string(),
                endpoint: endpoint.name().to_string(),
                timestamp: Utc::now(),
                status: 200,
                latency_ms,
                response_size: size,
                cached,
                error: None,
            },
            Err(err) => CallRecord {
                owner: owner.to_string(),
                endpoint: endpoint.name().to_string(),
                timestamp: Utc::now(),
                status: err.record_status(),
                latency_ms,
                response_size: 0,
                cached: false,
                error: Some(err.to_string()),
            },
        };
        self.recorder.record(record);
    }

    /// Cache-population stage. Write failures are logged; caching is an
    /// optimization, never a reason to fail the request.
    async fn store_cache(&self, owner: &str, endpoint: &Endpoint, key: &str, envelope: &ApiResponse) {
        let payload = match serde_json::to_value(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Envelope unserializable, skipping cache");
                return;
            }
        };
        let entry = CachedEntry::new(owner, key, payload, endpoint.ttl());
        if let Err(e) = self.store.put_cached_response(entry).await {
            warn!(endpoint = %endpoint, error = %e, "Cache write failed");
        } else {
            info!(endpoint = %endpoint, ttl_secs = endpoint.ttl().as_secs(), "Response cached");
        }
    }
}

/// Decode stage: parse the raw body as the API envelope and lift
/// upstream-reported errors. Returns the envelope and the body size.
fn decode(endpoint: &Endpoint, reply: &RawReply) -> Result<(ApiResponse, u64)> {
    let size = reply.body.len() as u64;
    let envelope: ApiResponse =
        serde_json::from_str(&reply.body).map_err(|e| Error::MalformedResponse {
            endpoint: endpoint.name().to_string(),
            detail: e.to_string(),
        })?;

    if let Some(detail) = envelope.error_detail() {
        return Err(Error::Upstream {
            endpoint: endpoint.name().to_string(),
            status: reply.status,
            detail,
        });
    }

    Ok((envelope, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{envelope, ScriptedReply, ScriptedTransport};
    use serde_json::json;

    fn decode_reply(endpoint: &Endpoint, body: &str) -> Result<(ApiResponse, u64)> {
        decode(
            endpoint,
            &RawReply {
                status: 200,
                body: body.to_string(),
            },
        )
    }

    #[test]
    fn decode_accepts_a_clean_envelope() {
        let body = envelope("leagues", json!([{"league": {"id": 39}}]));
        let (parsed, size) = decode_reply(&Endpoint::Leagues, &body).unwrap();
        assert_eq!(parsed.get, "leagues");
        assert_eq!(size, body.len() as u64);
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = decode_reply(&Endpoint::Teams, "<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }), "got: {err:?}");
    }

    #[test]
    fn decode_lifts_upstream_errors() {
        let body = r#"{
            "get": "fixtures",
            "errors": {"token": "Error/Missing application key."},
            "results": 0,
            "response": []
        }"#;
        let err = decode_reply(&Endpoint::Fixtures, body).unwrap_err();
        match err {
            Error::Upstream { status, detail, .. } => {
                assert_eq!(status, 200);
                assert!(detail.contains("application key"), "detail: {detail}");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn anonymous_calls_skip_cache_and_telemetry() {
        let store = Arc::new(crate::store::MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::always(ScriptedReply::Body(envelope(
            "countries",
            json!(["England"]),
        ))));
        let client =
            FootballClient::with_transport(&Config::default(), store.clone(), transport.clone());

        client.countries(None).await.unwrap();
        client.countries(None).await.unwrap();
        tokio::task::yield_now().await;

        // Both calls hit the transport; nothing recorded, nothing cached.
        assert_eq!(transport.call_count(), 2);
        assert!(store.recorded_calls("").is_empty());
        assert!(store.raw_cache_entry("", "/countries").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn parameters_are_normalized_before_dispatch() {
        let store = Arc::new(crate::store::MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::with_replies(Vec::new()));
        let client =
            FootballClient::with_transport(&Config::default(), store, transport.clone());

        client
            .request(
                None,
                Endpoint::Standings,
                vec![
                    ("season".to_string(), "2023".to_string()),
                    ("league".to_string(), "39".to_string()),
                ],
            )
            .await
            .unwrap();

        assert_eq!(transport.calls(), vec!["standings?league=39&season=2023"]);
    }
}
