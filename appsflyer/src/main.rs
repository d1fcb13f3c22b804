//! appsflyer-send - report one in-app event to AppsFlyer
//!
//! Builds an event from command-line flags and posts it to the
//! server-to-server endpoint of the app registered for the chosen platform.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/appsflyer/config.toml (~/.config/appsflyer/config.toml)
//! - Logs: $XDG_STATE_HOME/appsflyer/appsflyer.log (~/.local/state/appsflyer/appsflyer.log)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use appsflyer_core::{Config, Event, Platform, Tracker};
use chrono::{DateTime, FixedOffset};
use clap::Parser;

#[derive(Parser)]
#[command(name = "appsflyer-send")]
#[command(about = "Send a server-to-server in-app event to AppsFlyer")]
#[command(version)]
struct Args {
    /// Write logs to the state directory
    #[arg(short, long)]
    verbose: bool,

    /// App registry JSON (default: `apps_path` from config.toml)
    #[arg(long)]
    apps: Option<PathBuf>,

    /// Target platform (android or ios)
    #[arg(long)]
    platform: Platform,

    /// AppsFlyer device id
    #[arg(long)]
    appsflyer_id: String,

    /// Event name, e.g. af_start_trial
    #[arg(short, long)]
    name: String,

    /// GAID on Android, IDFA on iOS
    #[arg(long)]
    advertising_id: Option<String>,

    /// Device IP address
    #[arg(long)]
    ip: Option<String>,

    /// Event time as RFC 3339, rendered in its own offset
    #[arg(long, value_parser = parse_event_time)]
    event_time: Option<DateTime<FixedOffset>>,

    /// Revenue amount (af_revenue)
    #[arg(long, requires = "currency")]
    revenue: Option<f64>,

    /// Price amount (af_price)
    #[arg(long, requires = "currency")]
    price: Option<f64>,

    /// ISO 4217 currency code for --revenue / --price
    #[arg(long)]
    currency: Option<String>,

    /// Extra event parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the request body instead of sending it
    #[arg(long)]
    dry_run: bool,
}

fn parse_event_time(raw: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| format!("invalid RFC 3339 timestamp: {}", e))
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn build_event(args: &Args) -> Event {
    let mut event = Event::new(args.appsflyer_id.as_str(), args.platform);
    event.set_name(args.name.as_str());

    if let Some(id) = &args.advertising_id {
        event.set_advertising_id(id.as_str());
    }
    if let Some(ip) = &args.ip {
        event.set_device_ip(ip.as_str());
    }
    if let Some(time) = &args.event_time {
        event.set_event_time(time);
    }
    for (key, value) in &args.params {
        event.set_value(key.as_str(), value.as_str());
    }

    let currency = args.currency.clone().unwrap_or_default();
    if let Some(revenue) = args.revenue {
        event.set_revenue(revenue, currency.as_str());
    }
    if let Some(price) = args.price {
        event.set_price(price, currency.as_str());
    }

    event
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(appsflyer_core::logging::init(&config.logging).context("failed to initialize logging")?)
    } else {
        None
    };

    let mut event = build_event(&args);

    if args.dry_run {
        println!("{}", event.to_json().context("failed to encode event")?);
        return Ok(());
    }

    let apps_path = args
        .apps
        .clone()
        .or(config.apps_path.clone())
        .context("no app registry: pass --apps or set apps_path in config.toml")?;

    let tracker = Tracker::new(&config.transport).context("failed to create tracker")?;
    tracker
        .set_config(&apps_path)
        .with_context(|| format!("failed to load app registry {}", apps_path.display()))?;

    let sent = match args.timeout_secs {
        Some(secs) => {
            tracker
                .send_with_timeout(&mut event, Duration::from_secs(secs))
                .await
        }
        None => tracker.send(&mut event).await,
    };
    sent.with_context(|| format!("failed to send {} event", event.name()))?;

    tracing::info!(
        event_name = %event.name(),
        platform = %event.platform(),
        "Event sent"
    );
    println!("Sent {} ({})", event.name(), event.platform());

    Ok(())
}
