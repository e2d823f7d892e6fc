//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pitchside - governed access to the API-Football service.
#[derive(Parser, Debug)]
#[command(name = "pitchside")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "pitchside.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a logical endpoint through the governed pipeline
    ///
    /// The bundled store is in-process, so response caching only spans
    /// requests made within a single invocation.
    Fetch(FetchArgs),

    /// Show daily usage aggregates for a caller
    ///
    /// The bundled store is in-process; this reports calls made in the
    /// current invocation only, so an empty result after a separate `fetch`
    /// run is expected.
    Usage(UsageArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Logical endpoint name (fixtures, standings, leagues, ...)
    pub endpoint: String,

    /// Query parameters as key=value pairs
    #[arg(value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Caller identity for cache and usage partitioning
    #[arg(long)]
    pub caller: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UsageArgs {
    /// Caller identity to report on
    #[arg(long)]
    pub caller: String,

    /// First day of the range (YYYY-MM-DD), default today
    #[arg(long)]
    pub from: Option<chrono::NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), default today
    #[arg(long)]
    pub to: Option<chrono::NaiveDate>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}
