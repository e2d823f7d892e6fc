//! Typed filters for the per-domain operations.
//!
//! Each filter renders to the upstream's query parameters; unset fields are
//! simply omitted. Field sets mirror what the upstream accepts per endpoint.

/// Renders a filter into upstream query parameters.
pub trait QueryParams {
    fn params(&self) -> Vec<(String, String)>;
}

macro_rules! push_param {
    ($out:ident, $name:literal, $value:expr) => {
        if let Some(v) = &$value {
            $out.push(($name.to_string(), v.to_string()));
        }
    };
}

/// Filter for `leagues`.
#[derive(Debug, Clone, Default)]
pub struct LeaguesFilter {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub code: Option<String>,
    pub season: Option<u32>,
    pub team: Option<u32>,
    pub current: Option<bool>,
    pub search: Option<String>,
}

impl QueryParams for LeaguesFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_param!(out, "id", self.id);
        push_param!(out, "name", self.name);
        push_param!(out, "country", self.country);
        push_param!(out, "code", self.code);
        push_param!(out, "season", self.season);
        push_param!(out, "team", self.team);
        push_param!(out, "current", self.current);
        push_param!(out, "search", self.search);
        out
    }
}

/// Filter for `teams`.
#[derive(Debug, Clone, Default)]
pub struct TeamsFilter {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub country: Option<String>,
    pub search: Option<String>,
}

impl QueryParams for TeamsFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_param!(out, "id", self.id);
        push_param!(out, "name", self.name);
        push_param!(out, "league", self.league);
        push_param!(out, "season", self.season);
        push_param!(out, "country", self.country);
        push_param!(out, "search", self.search);
        out
    }
}

/// Filter for `fixtures`.
#[derive(Debug, Clone, Default)]
pub struct FixturesFilter {
    pub id: Option<u32>,
    pub live: Option<String>,
    pub date: Option<String>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub team: Option<u32>,
    pub last: Option<u32>,
    pub next: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<String>,
}

impl QueryParams for FixturesFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_param!(out, "id", self.id);
        push_param!(out, "live", self.live);
        push_param!(out, "date", self.date);
        push_param!(out, "league", self.league);
        push_param!(out, "season", self.season);
        push_param!(out, "team", self.team);
        push_param!(out, "last", self.last);
        push_param!(out, "next", self.next);
        push_param!(out, "from", self.from);
        push_param!(out, "to", self.to);
        push_param!(out, "status", self.status);
        out
    }
}

/// Filter for `players`.
#[derive(Debug, Clone, Default)]
pub struct PlayersFilter {
    pub id: Option<u32>,
    pub team: Option<u32>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl QueryParams for PlayersFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_param!(out, "id", self.id);
        push_param!(out, "team", self.team);
        push_param!(out, "league", self.league);
        push_param!(out, "season", self.season);
        push_param!(out, "search", self.search);
        push_param!(out, "page", self.page);
        out
    }
}

/// Filter for `odds`.
#[derive(Debug, Clone, Default)]
pub struct OddsFilter {
    pub fixture: Option<u32>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub date: Option<String>,
    pub page: Option<u32>,
    pub bookmaker: Option<u32>,
    pub bet: Option<u32>,
}

impl QueryParams for OddsFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        push_param!(out, "fixture", self.fixture);
        push_param!(out, "league", self.league);
        push_param!(out, "season", self.season);
        push_param!(out, "date", self.date);
        push_param!(out, "page", self.page);
        push_param!(out, "bookmaker", self.bookmaker);
        push_param!(out, "bet", self.bet);
        out
    }
}
