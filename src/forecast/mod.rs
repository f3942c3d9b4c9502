//! Forecast lines and their synchronized, conflict-free set.

mod controller;
mod host;
mod invariants;
mod node;
mod set;
mod transport;
mod turn;

pub use controller::{ForecastConfig, ForecastController, Ignored, Outcome};
pub use host::{ForecastHost, TracingHost};
pub use invariants::{
    ForecastInvariants, Invariant, InvariantSet, InvariantViolation, NoCollisionInvariant,
    NoContainmentInvariant,
};
pub use node::{ForecastLine, KEY_SEPARATOR, LineParseError, MoveNode};
pub use set::{ForecastSet, collides};
pub use transport::{
    ForecastResponse, ForecastTransport, HttpTransport, SaveLocation, TransportError,
};
pub use turn::{MAX_FORECAST_PLIES, TurnContext};
