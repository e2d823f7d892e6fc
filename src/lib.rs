//! Pitchside - rate-governed access to the API-Football service.
//!
//! This crate turns a logical football-data request ("standings for league
//! 39, season 2023") into a safe call against a rate-limited, unreliable
//! upstream: calls are serialized with minimum spacing, throttled responses
//! are retried with bounded backoff, successful payloads are cached per user
//! with endpoint-class lifetimes, and every attempt is recorded for usage
//! accounting.
//!
//! # Architecture
//!
//! One logical fetch flows through a fixed pipeline:
//!
//! cache check → rate gate → retry → transport → decode → record → cache.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML with env-var credential override
//! - [`client`] - The request orchestrator, one typed operation per data domain
//! - [`endpoint`] - Logical endpoints, their URL paths, and cache TTL classes
//! - [`filter`] - Typed query filters for the per-domain operations
//! - [`governor`] - FIFO dispatch queue with minimum inter-request spacing
//! - [`retry`] - Bounded exponential backoff for throttled calls
//! - [`transport`] - The HTTPS GET transport and its trait seam
//! - [`store`] - The persistence collaborator boundary (cache, records, stats)
//! - [`recorder`] - Fire-and-forget usage telemetry
//! - [`error`] - Error taxonomy for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pitchside::client::FootballClient;
//! use pitchside::config::Config;
//! use pitchside::store::MemoryStore;
//!
//! # async fn run() -> pitchside::error::Result<()> {
//! let config = Config::load("pitchside.toml")?;
//! let client = FootballClient::new(&config, Arc::new(MemoryStore::new()));
//! let standings = client.standings(Some("user-1"), 39, 2023).await?;
//! println!("{}", standings.response);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod governor;
pub mod recorder;
pub mod retry;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
