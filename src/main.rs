use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use pitchside::cli::{Cli, Commands, FetchArgs, UsageArgs};
use pitchside::client::FootballClient;
use pitchside::config::Config;
use pitchside::endpoint::Endpoint;
use pitchside::error::Error;
use pitchside::store::MemoryStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();

    if let Err(e) = run(cli, config).await {
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

/// User-facing rendering for a failed command. Throttling and timeouts get
/// actionable messages; everything else falls back to the error chain.
fn failure_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<Error>() {
        Some(Error::RateLimited { retry_after, .. }) => format!(
            "The upstream is rate limiting this key. Slow down and retry in {}s.",
            retry_after.as_secs()
        ),
        Some(err @ Error::Transport { endpoint, .. }) if err.timed_out() => format!(
            "The upstream did not answer '{endpoint}' within the configured timeout."
        ),
        _ => format!("Error: {e:#}"),
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let client = FootballClient::new(&config, Arc::new(MemoryStore::new()));

    match cli.command {
        Commands::Fetch(args) => fetch(&client, args).await,
        Commands::Usage(args) => usage(&client, args).await,
    }
}

async fn fetch(client: &FootballClient, args: FetchArgs) -> anyhow::Result<()> {
    let endpoint = Endpoint::from_name(&args.endpoint);
    info!(endpoint = %endpoint, "Fetching");

    let envelope = client
        .request(args.caller.as_deref(), endpoint, args.params)
        .await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).context("rendering response")?
    );
    Ok(())
}

async fn usage(client: &FootballClient, args: UsageArgs) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let from = args.from.unwrap_or(today);
    let to = args.to.unwrap_or(today);

    let rows = client.usage(&args.caller, from, to).await?;
    if rows.is_empty() {
        println!("No usage recorded for '{}' in {from}..{to}", args.caller);
        return Ok(());
    }

    for day in rows {
        println!(
            "{}  calls={}  errors={}  avg_latency={:.0}ms  bytes={}",
            day.date, day.total_calls, day.errors, day.avg_latency_ms, day.total_response_size
        );
        for (endpoint, count) in &day.by_endpoint {
            println!("    {endpoint}: {count}");
        }
    }
    Ok(())
}
