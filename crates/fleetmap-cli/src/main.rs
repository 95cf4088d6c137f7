//! fleetmap - command-line front end for the fleet-tracking geofence cache.
//!
//! Fetches the account's geofences through the gateway and renders the
//! vehicle marker fragments used by the map view.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleetmap_core::utils::truncate_string;
use fleetmap_core::{icon_html, ApiClient, Config, GeofenceStore, RequestLog};

/// Log file name inside the cache directory
const LOG_FILE: &str = "fleetmap.log";

/// Maximum width of the name column in `geofences` output
const NAME_COLUMN_WIDTH: usize = 40;

const USAGE: &str = "\
Usage: fleetmap [--log-file] <command>

Commands:
  geofences                       List the account's geofences
  geofence <id>                   Print one geofence as JSON ({} if absent)
  icon <name> [color] [--no-names]  Print the marker HTML fragment";

/// Initialize the tracing subscriber for logging.
/// Returns the appender guard, which must live until exit to flush the file.
fn init_tracing(config: &Config, log_to_file: bool) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) if log_to_file => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn build_store(config: &Config) -> Result<(GeofenceStore, Arc<RequestLog>)> {
    let tracker = Arc::new(RequestLog::new());
    let client = ApiClient::from_config(config)?;
    let store = GeofenceStore::with_connector(Arc::new(client), tracker.clone());
    Ok((store, tracker))
}

/// Parse a command-line id: numbers stay numbers, anything else is a string.
fn parse_id(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|v| v.is_number())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

async fn list_geofences(config: &Config) -> Result<()> {
    let (store, tracker) = build_store(config)?;
    let geofences = store.fetch_geofences().await;

    if geofences.is_empty() {
        if let Some(err) = tracker.last_error() {
            bail!("Could not load geofences: {}", err);
        }
    }

    for geofence in &geofences {
        let name = geofence.name().unwrap_or("(unnamed)");
        println!("{:>10}  {}", geofence.display_id(), truncate_string(name, NAME_COLUMN_WIDTH));
    }
    println!("{} geofences (loaded {})", store.len(), store.age_display());
    Ok(())
}

async fn show_geofence(config: &Config, raw_id: &str) -> Result<()> {
    let (store, tracker) = build_store(config)?;
    store.fetch_geofences().await;
    if !store.is_loaded() {
        if let Some(err) = tracker.last_error() {
            bail!("Could not load geofences: {}", err);
        }
    }

    let geofence = store.geofence_by_id(parse_id(raw_id));
    println!("{}", serde_json::to_string_pretty(&geofence)?);
    Ok(())
}

fn print_icon(config: &Config, args: &[String]) -> Result<()> {
    let mut need_names = config.show_names;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--no-names" => need_names = false,
            "--names" => need_names = true,
            _ => positional.push(arg.as_str()),
        }
    }

    let Some(name) = positional.first() else {
        bail!("icon requires a name\n\n{}", USAGE);
    };
    let color = positional.get(1).copied().unwrap_or("");

    println!("{}", icon_html(name, color, need_names));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let log_to_file = match args.iter().position(|a| a == "--log-file") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let mut config = Config::load()?;
    config.apply_env();

    let _guard = init_tracing(&config, log_to_file);
    info!(api = %config.api_base_url, "fleetmap starting");

    match args.first().map(String::as_str) {
        Some("geofences") => list_geofences(&config).await,
        Some("geofence") => match args.get(1) {
            Some(id) => show_geofence(&config, id).await,
            None => bail!("geofence requires an id\n\n{}", USAGE),
        },
        Some("icon") => print_icon(&config, &args[1..]),
        Some("-h") | Some("--help") | None => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}
