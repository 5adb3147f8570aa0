//! melody-ui - guided Melody client
//!
//! Walks the user through one round at a time: choose a data source,
//! authenticate with it, choose a visualization and view the result.
//! The backend owns the stage; this binary only follows it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use melody_common::config::{SettingsOverrides, SettingsResolver};
use melody_common::events::EventBus;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use melody_ui::console::Console;
use melody_ui::plugins::{builtin_registry, ManifestSource};
use melody_ui::services::HttpMelodyBackend;
use melody_ui::{SharedWorkflow, WorkflowController, WorkflowTimeouts};

/// Command-line arguments for melody-ui
#[derive(Parser, Debug)]
#[command(name = "melody-ui")]
#[command(about = "Guided client for the Melody visualization backend")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Display plugin manifest (file path or http(s) URL)
    #[arg(short, long)]
    manifest: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend request timeout in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Display plugin load timeout in seconds
    #[arg(long)]
    plugin_timeout_secs: Option<u64>,

    /// Log filter when RUST_LOG is unset (e.g. "info", "melody_ui=debug")
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = match &args.config {
        Some(path) => SettingsResolver::with_config_file(path.clone()),
        None => SettingsResolver::new(),
    };
    let settings = resolver
        .resolve(&SettingsOverrides {
            backend_url: args.backend_url,
            display_manifest: args.manifest,
            log_level: args.log_level,
            request_timeout_secs: args.request_timeout_secs,
            plugin_load_timeout_secs: args.plugin_timeout_secs,
        })
        .context("Failed to resolve settings")?;

    // Logs go to stderr so they don't interleave with the console screens
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting melody-ui");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", settings.backend_url);

    let backend = HttpMelodyBackend::new(&settings.backend_url, settings.request_timeout)
        .context("Failed to create backend client")?;

    let manifest = ManifestSource::parse(&settings.display_manifest)
        .load(&backend)
        .await
        .context("Failed to load display plugin manifest")?;
    if manifest.is_empty() {
        warn!("Display plugin manifest is empty; no visualizations will be offered");
    }

    let registry = builtin_registry(manifest);
    let event_bus = EventBus::new(100);

    let controller = WorkflowController::new(
        Arc::new(backend),
        registry,
        event_bus.clone(),
        WorkflowTimeouts::from(&settings),
    );
    let workflow = SharedWorkflow::new(controller);

    // A failed first round is reported on screen and retried with `next`
    if let Err(e) = workflow.initialize().await {
        warn!("Initial round failed: {}", e);
    }

    // Subscribed after the first round so its events don't redraw the screen twice
    let events = event_bus.subscribe();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Console::new(workflow)
        .run(stdin, events)
        .await
        .context("Console input failed")?;

    info!("melody-ui exiting");
    Ok(())
}
