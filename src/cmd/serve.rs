//! Board server command: `planboard serve`.

use std::path::Path;

use anyhow::Result;

use planboard::board::server::{ServerConfig, start_server};
use planboard::config::{CliOverrides, PlanboardConfig};
use planboard::logging;

pub async fn cmd_serve(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<()> {
    let config = PlanboardConfig::resolve(config_path, overrides)?;
    // Held until exit so buffered file logs are flushed.
    let _log_guard = logging::init(&config.toml.logging)?;

    match config.source {
        Some(ref source) => tracing::info!(config = %source.display(), "Loaded configuration"),
        None => tracing::info!("No planboard.toml found, using defaults"),
    }

    start_server(ServerConfig::from_config(&config)).await
}
