//! LabMet Server
//!
//! Run with: cargo run --bin labmet
//!
//! Listens to the station broker, runs the crop model on every reading and
//! serves the REST API, the WebSocket push channel and (optionally) the
//! dashboard bundle.
//!
//! Configuration is read from `--config`, else the default locations, with
//! `LABMET_*` environment overrides. `RUST_LOG` overrides the log level.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labmet::api::{serve, AppState};
use labmet::config::{Config, LoggingConfig};
use labmet::ingest::MqttListener;
use labmet::notify::{DryAlert, PushNotifier};

#[derive(Parser)]
#[command(name = "labmet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Weather station server with crop productivity estimates")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting LabMet server v{}", env!("CARGO_PKG_VERSION"));

    let alert = build_alert(&config).await?;
    let mut state =
        AppState::from_config(&config, alert).context("invalid [crop] section")?;
    tracing::info!(
        culture = %config.crop.culture,
        latitude = config.crop.latitude,
        temperature_fix = %config.crop.temperature_fix,
        "Crop model ready"
    );

    let listener_handle = if config.mqtt.enabled {
        let listener = MqttListener::new(config.mqtt.clone(), Arc::clone(&state.pipeline));
        state = state.with_mqtt_status(listener.status());
        Some(tokio::spawn(listener.run()))
    } else {
        tracing::info!("MQTT listener disabled, readings only arrive through the API");
        None
    };

    serve(state).await?;

    if let Some(handle) = listener_handle {
        handle.abort();
    }
    tracing::info!("LabMet server stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("labmet={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Dry soil alert, when alerts are on and a notification key is set
async fn build_alert(config: &Config) -> anyhow::Result<Option<Arc<DryAlert>>> {
    if !config.alerts.enabled {
        tracing::info!("Dry soil alerts disabled");
        return Ok(None);
    }

    let notifier = PushNotifier::new(config.notification.clone())?;
    if !notifier.is_enabled() {
        tracing::info!("Dry soil alerts disabled (set NOTIFICATIONKEY to enable)");
        return Ok(None);
    }

    match notifier.test_auth().await {
        Ok(()) => tracing::info!("Push notification key verified"),
        Err(e) => tracing::warn!("Push notifications not available: {}", e),
    }

    Ok(Some(Arc::new(DryAlert::new(
        Arc::new(notifier),
        &config.alerts,
    ))))
}
