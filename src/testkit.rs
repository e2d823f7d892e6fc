//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::transport::{RawReply, Transport};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A 2xx exchange with this raw body.
    Body(String),
    /// A non-2xx, non-429 status with this body.
    Status(u16, String),
    /// A 429 with this retry hint.
    RateLimited(Duration),
    /// A network-level failure.
    Disconnect,
}

/// A minimal successful envelope with the given `response` payload.
#[must_use]
pub fn envelope(endpoint: &str, response: serde_json::Value) -> String {
    serde_json::json!({
        "get": endpoint,
        "parameters": {},
        "errors": [],
        "results": 1,
        "paging": {"current": 1, "total": 1},
        "response": response,
    })
    .to_string()
}

/// [`Transport`] stub replaying a script of outcomes.
///
/// Replies are consumed front to back; once the script runs dry every further
/// call gets the `fallback` reply. Calls are recorded as
/// `"<endpoint>?<k=v&…>"` strings for assertion.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: ScriptedReply,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Script that answers every call with the same reply.
    #[must_use]
    pub fn always(reply: ScriptedReply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script with an explicit reply sequence; exhaustion falls back to a
    /// plain success envelope.
    #[must_use]
    pub fn with_replies(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: ScriptedReply::Body(envelope("generic", serde_json::json!([]))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of transport calls observed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Observed calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Fabricate a real `reqwest::Error` without touching the network, by
/// building a request against an unparseable URL.
#[must_use]
pub fn fabricated_transport_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("http://")
        .build()
        .expect_err("empty-host URL must fail to build")
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, endpoint: &Endpoint, params: &[(String, String)]) -> Result<RawReply> {
        let rendered = if params.is_empty() {
            endpoint.name().to_string()
        } else {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{}?{}", endpoint.name(), query.join("&"))
        };
        self.calls.lock().unwrap().push(rendered);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            ScriptedReply::Body(body) => Ok(RawReply { status: 200, body }),
            ScriptedReply::Status(status, detail) => Err(Error::Upstream {
                endpoint: endpoint.name().to_string(),
                status,
                detail,
            }),
            ScriptedReply::RateLimited(retry_after) => Err(Error::RateLimited {
                endpoint: endpoint.name().to_string(),
                retry_after,
                attempts: 1,
            }),
            ScriptedReply::Disconnect => Err(Error::Transport {
                endpoint: endpoint.name().to_string(),
                source: fabricated_transport_error(),
            }),
        }
    }
}
