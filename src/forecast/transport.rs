//! Persistence transport for forecast sets.

use super::node::ForecastLine;
use async_trait::async_trait;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Where a player's forecasts for one game are saved.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_new::new, Serialize, Deserialize)]
pub struct SaveLocation {
    /// Game identifier.
    #[new(into)]
    game_id: String,
    /// Player identifier within the game.
    #[new(into)]
    player_id: String,
}

impl SaveLocation {
    /// Path receiving the full forecast set.
    pub fn save_path(&self) -> String {
        format!("/{}{}/forecasts", self.game_id, self.player_id)
    }

    /// Path receiving the continuations after playing `uci`.
    pub fn play_path(&self, uci: &str) -> String {
        format!("{}/{}", self.save_path(), uci)
    }
}

/// Authoritative reply to a persistence request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// The stored forecasts are stale; the game must be reloaded.
    #[serde(default)]
    pub reload: bool,
    /// The forecasts now stored by the backend.
    #[serde(default)]
    pub steps: Option<Vec<ForecastLine>>,
}

impl ForecastResponse {
    /// A response carrying the stored forecasts.
    pub fn with_steps(steps: Vec<ForecastLine>) -> Self {
        Self {
            reload: false,
            steps: Some(steps),
        }
    }

    /// A response requesting a full reload.
    pub fn reload_required() -> Self {
        Self {
            reload: true,
            steps: None,
        }
    }
}

/// Sends forecast payloads to the authoritative backend.
#[async_trait]
pub trait ForecastTransport: Send + Sync {
    /// Posts `payload` as JSON to `path` and decodes the reply.
    async fn post(
        &self,
        path: &str,
        payload: &[ForecastLine],
    ) -> Result<ForecastResponse, TransportError>;
}

/// JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Creates a transport sending through a preconfigured client.
    pub fn with_client(base_url: impl AsRef<str>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ForecastTransport for HttpTransport {
    #[instrument(skip(self, payload), fields(base_url = %self.base_url, lines = payload.len()))]
    async fn post(
        &self,
        path: &str,
        payload: &[ForecastLine],
    ) -> Result<ForecastResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Posting forecasts");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Forecast save rejected");
            return Err(TransportError::new(format!("HTTP {}: {}", status, body)));
        }

        let reply: ForecastResponse = response.json().await?;
        debug!(
            reload = reply.reload,
            steps = reply.steps.as_ref().map_or(0, Vec::len),
            "Got forecast response"
        );
        Ok(reply)
    }
}

/// Transport error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Transport error: {} at {}:{}", message, file, line)]
pub struct TransportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Request error: {}", err))
    }
}
