//! Mindful Minutes CLI
//!
//! Totals mindful session minutes from a health data store.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use mindful_minutes::{
    config::{Config, Scope},
    store::{HealthStore, InMemoryStore, UnavailableStore},
    transparency::create_shared_log_with_persistence,
    BlockingMindfulService, MindfulError, TimeWindow, ACCESS_DECLARATION, VERSION,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mindful-minutes")]
#[command(version = VERSION)]
#[command(about = "Total your mindful session minutes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the total mindful minutes
    Total {
        /// Only count sessions since the start of today
        #[arg(long, conflicts_with_all = ["since", "until"])]
        today: bool,

        /// Only count sessions after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<String>,

        /// Only count sessions before this RFC 3339 timestamp (default: now)
        #[arg(long)]
        until: Option<String>,

        /// Records file to read instead of the configured one
        #[arg(long, short)]
        records: Option<PathBuf>,

        /// Query the configured remote health gateway (requires remote feature)
        #[arg(long)]
        remote: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how often health data has been read
    Stats {
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the access declaration
    Privacy,

    /// Show configuration
    Config,
}

/// JSON shape of a `total` result.
#[derive(Serialize)]
struct MinutesReport {
    scope: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MindfulError>,
    computed_at: DateTime<Utc>,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Total {
            today,
            since,
            until,
            records,
            remote,
            json,
        } => cmd_total(today, since, until, records, remote, json),
        Commands::Stats { json } => cmd_stats(json),
        Commands::Privacy => {
            println!("{ACCESS_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MINDFUL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_total(
    today: bool,
    since: Option<String>,
    until: Option<String>,
    records: Option<PathBuf>,
    remote: bool,
    json: bool,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let tz = config.tz()?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create directories: {e}");
    }

    let (scope, window) = resolve_window(&config, today, since.as_deref(), until.as_deref(), tz)?;
    let store = build_store(&config, records, remote)?;

    let log = create_shared_log_with_persistence(config.access_log_path());
    let service = BlockingMindfulService::new(store)?
        .with_transparency_log(log.clone())
        .with_timezone(tz);

    let result = service.fetch(window);
    if let Err(e) = log.save() {
        tracing::warn!("Could not save access stats: {e}");
    }

    if json {
        let report = MinutesReport {
            scope,
            window,
            total_minutes: result.ok(),
            error: result.err(),
            computed_at: Utc::now(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        if result.is_err() {
            std::process::exit(2);
        }
        return Ok(());
    }

    match result {
        Ok(minutes) => {
            let unit = if minutes == 1 { "minute" } else { "minutes" };
            match scope {
                "today" => println!("{minutes} mindful {unit} today"),
                _ => println!("{minutes} mindful {unit}"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("{}", hint(e));
            std::process::exit(2);
        }
    }
}

/// What the user can do about each failure.
fn hint(error: MindfulError) -> &'static str {
    match error {
        MindfulError::DataUnavailable => {
            "No health data is available. Check that a records file exists or a remote gateway is configured."
        }
        MindfulError::NotAuthorized => {
            "Read access to mindful sessions was denied. Grant it in your health data settings and try again."
        }
        MindfulError::NoSamples => "The health store did not return any results. Try again later.",
        MindfulError::PlatformError => {
            "The health store does not support mindful sessions. It may be too old."
        }
    }
}

fn resolve_window(
    config: &Config,
    today: bool,
    since: Option<&str>,
    until: Option<&str>,
    tz: Option<chrono_tz::Tz>,
) -> Result<(&'static str, Option<TimeWindow>)> {
    if since.is_some() || until.is_some() {
        let start = match since {
            Some(s) => parse_timestamp(s)?,
            // Open lower bound; the remote store omits it from the query.
            None => DateTime::<Utc>::MIN_UTC,
        };
        let end = match until {
            Some(s) => parse_timestamp(s)?,
            None => Utc::now(),
        };
        if start > end {
            bail!("--since must not be later than --until");
        }
        return Ok(("range", Some(TimeWindow::new(start, end))));
    }

    if today || config.default_scope == Scope::Today {
        return Ok(("today", Some(TimeWindow::today(tz))));
    }
    Ok(("all", None))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 timestamp '{s}'"))
}

fn build_store(
    config: &Config,
    records: Option<PathBuf>,
    remote: bool,
) -> Result<Arc<dyn HealthStore>> {
    if remote {
        return build_remote_store(config);
    }

    let path = records.unwrap_or_else(|| config.records_path.clone());
    if !path.exists() {
        tracing::info!("No records file at {}", path.display());
        return Ok(Arc::new(UnavailableStore::new()));
    }

    let store = InMemoryStore::from_json_file(&path)
        .with_context(|| format!("Failed to load records from {}", path.display()))?;
    tracing::debug!(records = store.len(), "loaded records file");
    Ok(Arc::new(store))
}

#[cfg(feature = "remote")]
fn build_remote_store(config: &Config) -> Result<Arc<dyn HealthStore>> {
    use mindful_minutes::store::{RemoteStore, RemoteStoreConfig};

    let settings = config
        .remote
        .as_ref()
        .context("No remote gateway configured (set \"remote\" in the config file)")?;
    let store = RemoteStore::new(RemoteStoreConfig::from(settings))?;
    tracing::debug!(client_id = store.client_id(), "using remote health gateway");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "remote"))]
fn build_remote_store(_config: &Config) -> Result<Arc<dyn HealthStore>> {
    bail!("Remote stores require the `remote` feature. Rebuild with: cargo build --features remote")
}

fn cmd_stats(json: bool) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let log = create_shared_log_with_persistence(config.access_log_path());

    if json {
        println!("{}", serde_json::to_string_pretty(&log.stats())?);
    } else {
        println!("{}", log.summary());
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration file: {}", Config::config_path().display());
    println!();
    println!("  Records file: {}", config.records_path.display());
    println!("  Data path: {}", config.data_path.display());
    println!(
        "  Timezone: {}",
        config.timezone.as_deref().unwrap_or("system local")
    );
    println!(
        "  Default scope: {}",
        match config.default_scope {
            Scope::All => "all",
            Scope::Today => "today",
        }
    );
    match &config.remote {
        Some(remote) => println!("  Remote gateway: {}:{}", remote.host, remote.port),
        None => println!("  Remote gateway: not configured"),
    }
    Ok(())
}
