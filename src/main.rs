//! Strictly Forecast - command-line client
//!
//! Seeds a forecast controller from a TOML config, applies one command
//! against the backend, and prints the resulting forecasts as JSON.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use strictly_forecast::{ClientConfig, ForecastController, HttpTransport, Outcome, TracingHost};
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let controller = build_controller(&config)?;

    match cli.command {
        Command::List => {}
        Command::Add { line } => settle(controller.add_nodes(line)).await,
        Command::Remove { index } => settle(controller.remove_index(index)).await,
        Command::Play { node } => settle(controller.play_and_save(&node)).await,
        Command::Candidate { line } => {
            let truncated = controller.truncate(&line);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "candidate": controller.is_candidate(&line),
                    "truncated": truncated.key(),
                }))?
            );
            return Ok(());
        }
    }

    if controller.is_loading() {
        warn!("Backend reply not applied; forecasts below are local");
    }
    println!("{}", serde_json::to_string_pretty(&controller.list())?);
    Ok(())
}

#[instrument(skip(config_path), fields(path = %config_path.display()))]
fn load_config(config_path: &std::path::Path) -> Result<ClientConfig> {
    info!("Loading client configuration");
    let config = ClientConfig::from_file(config_path)
        .with_context(|| format!("Cannot load {}", config_path.display()))?;
    Ok(config.with_env_overrides())
}

#[instrument(skip(config), fields(game_id = %config.game_id()))]
fn build_controller(config: &ClientConfig) -> Result<ForecastController> {
    let seed = config.forecast_config()?;
    let transport = HttpTransport::new(config.base_url());
    info!(base_url = %transport.base_url(), "Using HTTP transport");
    Ok(ForecastController::new(
        seed,
        config.save_location(),
        Arc::new(transport),
        Arc::new(TracingHost),
    ))
}

/// Waits for the backend round-trip, reporting ignored commands.
async fn settle(outcome: Outcome) {
    if let Some(reason) = outcome.ignored() {
        warn!(%reason, "Command ignored");
    }
    outcome.wait().await;
}

#[instrument]
fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strictly_forecast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
