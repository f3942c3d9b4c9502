//! Strictly Forecast - conflict-free forecast lines for correspondence games
//!
//! A forecast is a line of moves a player expects to follow the current
//! position: the opponent's reply, the player's answer, and so on. This
//! library keeps a player's forecasts consistent and in sync with the game
//! backend.
//!
//! # Architecture
//!
//! - **Forecast set**: admission, truncation and the consistency pass
//! - **Controller**: local mutations, pending state, backend round-trips
//! - **Transport**: JSON-over-HTTP persistence of the set
//! - **Config**: TOML client configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_forecast::{
//!     ForecastConfig, ForecastController, ForecastLine, HttpTransport, SaveLocation, TracingHost,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let controller = ForecastController::new(
//!     ForecastConfig::new(false, None),
//!     SaveLocation::new("abcd1234", "wxyz"),
//!     Arc::new(HttpTransport::new("http://localhost:9663")),
//!     Arc::new(TracingHost),
//! );
//!
//! let line: ForecastLine = "5:e2e4,6:e7e5".parse()?;
//! controller.add_nodes(line).wait().await;
//! println!("{} forecasts stored", controller.list().len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod forecast;

// Crate-level exports - Configuration
pub use config::{BASE_URL_ENV, ClientConfig, ConfigError};

// Crate-level exports - Forecast lines and sets
pub use forecast::{
    ForecastInvariants, ForecastLine, ForecastSet, Invariant, InvariantSet, InvariantViolation,
    KEY_SEPARATOR, LineParseError, MAX_FORECAST_PLIES, MoveNode, NoCollisionInvariant,
    NoContainmentInvariant, TurnContext, collides,
};

// Crate-level exports - Controller
pub use forecast::{ForecastConfig, ForecastController, Ignored, Outcome};

// Crate-level exports - Persistence and host hooks
pub use forecast::{
    ForecastHost, ForecastResponse, ForecastTransport, HttpTransport, SaveLocation, TracingHost,
    TransportError,
};
