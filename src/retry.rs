//! Bounded exponential backoff for throttled calls.
//!
//! Only the rate-limited condition is retried; every other failure
//! propagates unchanged after a single attempt. Timeouts are transport
//! failures and are therefore not retried.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Retry policy: at most `max_retries` retries after the initial attempt,
/// sleeping `base_delay * 2^attempt` between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay())
    }

    /// Run `attempt` until it succeeds, fails with a non-throttling error, or
    /// exhausts the retry budget.
    ///
    /// On exhaustion the final [`Error::RateLimited`] is re-emitted with the
    /// total attempt count, so callers can tell "upstream refused repeatedly"
    /// apart from a single refusal.
    pub async fn execute<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut index: u32 = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() && index < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(index);
                    warn!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = index + 1,
                        budget = self.max_retries + 1,
                        "Rate limited, backing off"
                    );
                    sleep(delay).await;
                    index += 1;
                }
                Err(Error::RateLimited {
                    endpoint,
                    retry_after,
                    ..
                }) => {
                    return Err(Error::RateLimited {
                        endpoint,
                        retry_after,
                        attempts: index + 1,
                    });
                }
                Err(other) => return Err(other),
            }
        }
    }
}
