//! Usage recording completeness and aggregation across mixed outcomes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use pitchside::client::FootballClient;
use pitchside::config::Config;
use pitchside::endpoint::Endpoint;
use pitchside::store::{cache_key, CachedEntry, CallRecord, MemoryStore, Store};
use pitchside::testkit::{envelope, ScriptedReply, ScriptedTransport};

async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

async fn seed_cache(store: &MemoryStore, owner: &str, endpoint: &Endpoint) {
    let entry = CachedEntry::new(
        owner,
        &cache_key(endpoint, &[]),
        json!({"get": endpoint.name(), "errors": [], "response": ["cached"]}),
        Duration::from_secs(600),
    );
    store.put_cached_response(entry).await.unwrap();
}

fn record_for<'a>(records: &'a [CallRecord], endpoint: &str) -> &'a CallRecord {
    records
        .iter()
        .find(|r| r.endpoint == endpoint)
        .unwrap_or_else(|| panic!("no record for {endpoint}"))
}

#[tokio::test(start_paused = true)]
async fn ten_concurrent_requests_produce_exactly_ten_records() {
    let mut config = Config::default();
    config.governor.min_interval_ms = 20;
    // One attempt per call keeps the scripted reply order aligned with the
    // FIFO dispatch order.
    config.retry.max_retries = 0;

    let store = Arc::new(MemoryStore::new());
    for endpoint in [
        Endpoint::Timezone,
        Endpoint::Countries,
        Endpoint::Leagues,
        Endpoint::Predictions,
        Endpoint::Statistics,
    ] {
        seed_cache(&store, "alice", &endpoint).await;
    }

    // Misses dispatch FIFO: teams, standings, fixtures, odds, players.
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        ScriptedReply::Body(envelope("teams", json!([1]))),
        ScriptedReply::Body(envelope("standings", json!([2]))),
        ScriptedReply::Body(envelope("fixtures", json!([3]))),
        ScriptedReply::Status(500, "internal error".into()),
        ScriptedReply::RateLimited(Duration::from_secs(5)),
    ]));
    let client = FootballClient::with_transport(&config, store.clone(), transport.clone());

    let caller = Some("alice");
    let (hit1, hit2, hit3, hit4, hit5, miss1, miss2, miss3, miss4, miss5) = tokio::join!(
        client.request(caller, Endpoint::Timezone, Vec::new()),
        client.request(caller, Endpoint::Countries, Vec::new()),
        client.request(caller, Endpoint::Leagues, Vec::new()),
        client.request(caller, Endpoint::Predictions, Vec::new()),
        client.request(caller, Endpoint::Statistics, Vec::new()),
        client.request(caller, Endpoint::Teams, Vec::new()),
        client.request(caller, Endpoint::Standings, Vec::new()),
        client.request(caller, Endpoint::Fixtures, Vec::new()),
        client.request(caller, Endpoint::Odds, Vec::new()),
        client.request(caller, Endpoint::Players, Vec::new()),
    );
    settle().await;

    for hit in [&hit1, &hit2, &hit3, &hit4, &hit5] {
        assert_eq!(hit.as_ref().unwrap().response, json!(["cached"]));
    }
    assert!(miss1.is_ok() && miss2.is_ok() && miss3.is_ok());
    assert!(miss4.is_err() && miss5.is_err());

    // Only the five misses reached the transport.
    assert_eq!(transport.call_count(), 5);

    let records = store.recorded_calls("alice");
    assert_eq!(records.len(), 10, "exactly one record per logical request");
    assert_eq!(records.iter().filter(|r| r.cached).count(), 5);

    // Each record's status matches its request's actual outcome.
    for endpoint in ["timezone", "countries", "leagues", "predictions", "statistics"] {
        let record = record_for(&records, endpoint);
        assert_eq!(record.status, 200);
        assert!(record.cached);
    }
    assert_eq!(record_for(&records, "teams").status, 200);
    assert_eq!(record_for(&records, "standings").status, 200);
    assert_eq!(record_for(&records, "fixtures").status, 200);
    assert_eq!(record_for(&records, "odds").status, 500);
    assert_eq!(record_for(&records, "players").status, 429);
}

#[tokio::test(start_paused = true)]
async fn daily_aggregates_reflect_recorded_calls() {
    let mut config = Config::default();
    config.governor.min_interval_ms = 10;
    config.retry.max_retries = 0;

    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        ScriptedReply::Body(envelope("leagues", json!([]))),
        ScriptedReply::Body(envelope("leagues", json!([]))),
        ScriptedReply::Status(500, "internal error".into()),
    ]));
    let client = FootballClient::with_transport(&config, store.clone(), transport);

    // Two distinct league queries and one failing fixtures call.
    client
        .request(Some("alice"), Endpoint::Leagues, vec![("season".into(), "2022".into())])
        .await
        .unwrap();
    client
        .request(Some("alice"), Endpoint::Leagues, vec![("season".into(), "2023".into())])
        .await
        .unwrap();
    client
        .request(Some("alice"), Endpoint::Fixtures, Vec::new())
        .await
        .unwrap_err();
    settle().await;

    let today = Utc::now().date_naive();
    let rows = client.usage("alice", today, today).await.unwrap();
    assert_eq!(rows.len(), 1);

    let day = &rows[0];
    assert_eq!(day.total_calls, 3);
    assert_eq!(day.by_endpoint["leagues"], 2);
    assert_eq!(day.by_endpoint["fixtures"], 1);
    assert_eq!(day.errors, 1);
}
