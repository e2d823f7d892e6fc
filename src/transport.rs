//! Upstream HTTP transport.
//!
//! One HTTPS GET per call, credential in the `x-apisports-key` header, fixed
//! hard timeout. The transport classifies the exchange at the wire level
//! (throttled / failed / answered) and hands the raw body upward; envelope
//! parsing belongs to the client pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

/// Header carrying the API credential.
const API_KEY_HEADER: &str = "x-apisports-key";

/// Backoff hint used when a 429 arrives without a `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// A transport-level success: a 2xx status and its raw body.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// One GET against the upstream.
///
/// Implementations report throttling as [`Error::RateLimited`] so the retry
/// layer can classify on the error kind alone.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: &Endpoint, params: &[(String, String)]) -> Result<RawReply>;
}

/// Production transport over [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: UpstreamConfig,
}

impl HttpTransport {
    #[must_use]
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &Endpoint, params: &[(String, String)]) -> Result<RawReply> {
        let name = endpoint.name().to_string();
        let key = self.config.require_api_key()?;

        let url = format!("{}{}", self.config.base_url, endpoint.path());
        debug!(endpoint = %name, url = %url, "Dispatching upstream request");

        let response = self
            .client
            .get(&url)
            .timeout(self.config.timeout())
            .header(API_KEY_HEADER, key)
            .query(params)
            .send()
            .await
            .map_err(|source| Error::Transport { endpoint: name.clone(), source })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = retry_after_hint(
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(Error::RateLimited {
                endpoint: name,
                retry_after,
                attempts: 1,
            });
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                endpoint: name,
                status: status.as_u16(),
                detail: truncate(&detail, 256),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| Error::Transport { endpoint: name, source })?;

        Ok(RawReply {
            status: status.as_u16(),
            body,
        })
    }
}

/// Parse a `Retry-After` header value (delay-seconds form only) into a
/// backoff hint, defaulting when absent or unparseable.
fn retry_after_hint(header: Option<&str>) -> Duration {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_parses_delay_seconds() {
        assert_eq!(retry_after_hint(Some("12")), Duration::from_secs(12));
        assert_eq!(retry_after_hint(Some(" 3 ")), Duration::from_secs(3));
    }

    #[test]
    fn retry_after_defaults_when_absent_or_invalid() {
        assert_eq!(retry_after_hint(None), DEFAULT_RETRY_AFTER);
        assert_eq!(
            retry_after_hint(Some("Wed, 21 Oct 2026 07:28:00 GMT")),
            DEFAULT_RETRY_AFTER
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 256), "short");
        let long = "é".repeat(300);
        let cut = truncate(&long, 256);
        assert!(cut.len() <= 256 + '…'.len_utf8());
        assert!(cut.ends_with('…'));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let transport = HttpTransport::new(&UpstreamConfig::default());
        let err = transport.get(&Endpoint::Leagues, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn empty_api_key_is_a_configuration_error() {
        let transport = HttpTransport::new(&UpstreamConfig {
            api_key: Some(String::new()),
            ..Default::default()
        });
        let err = transport.get(&Endpoint::Leagues, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {err:?}");
    }
}
