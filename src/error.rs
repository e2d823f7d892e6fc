use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors surfaced by the governed client.
///
/// Every variant except [`Error::Config`] carries the logical endpoint name
/// of the call it arose from, so callers can report which data domain failed.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The upstream throttled the call. Produced with `attempts == 1` by the
    /// transport for a single 429, and re-emitted with the total attempt
    /// count once the retry policy gives up.
    #[error("rate limit exceeded on '{endpoint}' after {attempts} attempt(s), retry in {}s", retry_after.as_secs())]
    RateLimited {
        endpoint: String,
        retry_after: Duration,
        attempts: u32,
    },

    /// Network-level failure: connection, DNS, or the fixed request timeout.
    /// Never retried.
    #[error("transport failure on '{endpoint}': {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered at the transport level but reported a
    /// domain-level error (a non-2xx status or a populated `errors` field).
    #[error("upstream error on '{endpoint}' (status {status}): {detail}")]
    Upstream {
        endpoint: String,
        status: u16,
        detail: String,
    },

    /// A 2xx response whose body could not be parsed as the API envelope.
    #[error("malformed response on '{endpoint}': {detail}")]
    MalformedResponse { endpoint: String, detail: String },

    /// The persistence collaborator failed on a direct query (usage stats).
    /// Cache and telemetry failures on the request path never surface here.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is the retryable throttling condition.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// True when the underlying cause was the transport timeout.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self, Error::Transport { source, .. } if source.is_timeout())
    }

    /// Status code to write into the usage record for this failure.
    ///
    /// Transport-level failures have no HTTP status and record 0; a malformed
    /// body arrived over a successful 2xx exchange and records 200.
    #[must_use]
    pub fn record_status(&self) -> u16 {
        match self {
            Error::Config(_) | Error::Transport { .. } | Error::Store(_) => 0,
            Error::RateLimited { .. } => 429,
            Error::Upstream { status, .. } => *status,
            Error::MalformedResponse { .. } => 200,
        }
    }
}
