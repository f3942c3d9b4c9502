//! Client configuration for talking to a forecast backend.

use crate::forecast::{ForecastConfig, ForecastLine, SaveLocation};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding the configured backend URL.
pub const BASE_URL_ENV: &str = "FORECAST_BASE_URL";

/// Configuration for one player's forecasts in one game.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    base_url: String,

    /// Game identifier.
    game_id: String,

    /// Player identifier within the game.
    player_id: String,

    /// Whether the local player moves next.
    #[serde(default)]
    on_my_turn: bool,

    /// Stored forecasts as canonical keys (e.g. `"5:e2e4,6:e7e5,7:g1f3"`).
    #[serde(default)]
    steps: Vec<String>,
}

#[instrument]
fn default_base_url() -> String {
    "http://localhost:9663".to_string()
}

impl ClientConfig {
    /// Creates a configuration without stored forecasts.
    #[instrument(skip(game_id, player_id), fields(game_id = %game_id, player_id = %player_id))]
    pub fn new(game_id: String, player_id: String, on_my_turn: bool) -> Self {
        Self {
            base_url: default_base_url(),
            game_id,
            player_id,
            on_my_turn,
            steps: Vec::new(),
        }
    }

    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ConfigError::new(format!("Failed to parse config: {}", e))
        })?;

        info!(game_id = %config.game_id, "Config loaded successfully");
        Ok(config)
    }

    /// Replaces the backend URL with the one from the environment, if set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            debug!(base_url = %base_url, "Base URL overridden from environment");
            self.base_url = base_url;
        }
        self
    }

    /// Where this player's forecasts are saved.
    pub fn save_location(&self) -> SaveLocation {
        SaveLocation::new(self.game_id.as_str(), self.player_id.as_str())
    }

    /// Builds the controller seed, parsing the stored forecasts.
    #[instrument(skip(self), fields(steps = self.steps.len()))]
    pub fn forecast_config(&self) -> Result<ForecastConfig, ConfigError> {
        let steps = self
            .steps
            .iter()
            .map(|key| {
                key.parse::<ForecastLine>().map_err(|e| {
                    ConfigError::new(format!("Invalid forecast {:?}: {}", key, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ForecastConfig::new(self.on_my_turn, Some(steps)))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
