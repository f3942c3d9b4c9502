//! Capabilities the embedding page provides to the forecast controller.

use tracing::{info, instrument};

/// Rendering and navigation hooks of the embedding page.
pub trait ForecastHost: Send + Sync {
    /// Schedules a redraw of everything showing forecasts.
    fn redraw(&self);

    /// Points the navigation marker at the last ply of the game.
    fn mark_last_ply(&self);

    /// Requests a full reload of the game state.
    fn reload(&self);
}

/// Host that only logs requested effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHost;

impl ForecastHost for TracingHost {
    #[instrument(skip(self))]
    fn redraw(&self) {
        info!("Redraw requested");
    }

    #[instrument(skip(self))]
    fn mark_last_ply(&self) {
        info!("Navigation marker set to last ply");
    }

    #[instrument(skip(self))]
    fn reload(&self) {
        info!("Game reload requested");
    }
}
