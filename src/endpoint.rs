//! Logical football-data endpoints.
//!
//! An [`Endpoint`] names a data domain ("fixtures", "standings") independent
//! of its upstream URL path, and carries the cache lifetime class for
//! responses from that domain.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A logical upstream operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Timezone,
    Countries,
    Leagues,
    Teams,
    Standings,
    Fixtures,
    Players,
    TopScorers,
    Statistics,
    Predictions,
    Odds,
    /// Any endpoint without a dedicated typed operation; routed through the
    /// generic passthrough as `/<name>`.
    Other(String),
}

impl Endpoint {
    /// Resolve a logical name to its endpoint; unknown names become
    /// [`Endpoint::Other`] and route through the generic passthrough.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "timezone" => Endpoint::Timezone,
            "countries" => Endpoint::Countries,
            "leagues" => Endpoint::Leagues,
            "teams" => Endpoint::Teams,
            "standings" => Endpoint::Standings,
            "fixtures" => Endpoint::Fixtures,
            "players" => Endpoint::Players,
            "topscorers" => Endpoint::TopScorers,
            "statistics" => Endpoint::Statistics,
            "predictions" => Endpoint::Predictions,
            "odds" => Endpoint::Odds,
            other => Endpoint::Other(other.to_string()),
        }
    }

    /// Logical name used for cache keys, usage records, and error context.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Endpoint::Timezone => "timezone",
            Endpoint::Countries => "countries",
            Endpoint::Leagues => "leagues",
            Endpoint::Teams => "teams",
            Endpoint::Standings => "standings",
            Endpoint::Fixtures => "fixtures",
            Endpoint::Players => "players",
            Endpoint::TopScorers => "topscorers",
            Endpoint::Statistics => "statistics",
            Endpoint::Predictions => "predictions",
            Endpoint::Odds => "odds",
            Endpoint::Other(name) => name,
        }
    }

    /// Upstream URL path for this endpoint.
    ///
    /// Most endpoints live at `/<name>`; top scorers and fixture statistics
    /// have nested paths.
    #[must_use]
    pub fn path(&self) -> Cow<'static, str> {
        match self {
            Endpoint::TopScorers => Cow::Borrowed("/players/topscorers"),
            Endpoint::Statistics => Cow::Borrowed("/fixtures/statistics"),
            Endpoint::Other(name) => Cow::Owned(format!("/{name}")),
            other => Cow::Owned(format!("/{}", other.name())),
        }
    }

    /// Cache time-to-live for responses from this endpoint.
    ///
    /// Countries and leagues change rarely; teams and standings drift slowly;
    /// fixtures and odds move by the minute.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        match self {
            Endpoint::Countries | Endpoint::Leagues => Duration::from_secs(60 * 60),
            Endpoint::Teams | Endpoint::Standings => Duration::from_secs(30 * 60),
            Endpoint::Fixtures | Endpoint::Odds => Duration::from_secs(5 * 60),
            _ => Duration::from_secs(15 * 60),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Endpoint::from_name(s))
    }
}
