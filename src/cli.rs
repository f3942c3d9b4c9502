//! Command-line interface for strictly_forecast.

use clap::{Parser, Subcommand};
use strictly_forecast::{ForecastLine, MoveNode};

/// Strictly Forecast - manage correspondence game forecasts
#[derive(Parser, Debug)]
#[command(name = "strictly_forecast")]
#[command(about = "Manage conditional move forecasts for a correspondence game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the client configuration file
    #[arg(short, long, default_value = "forecast.toml", global = true)]
    pub config: std::path::PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the stored forecasts
    List,

    /// Add a forecast line and save the set
    Add {
        /// Canonical key, e.g. "5:e2e4,6:e7e5,7:g1f3"
        line: ForecastLine,
    },

    /// Remove the forecast at an index and save the set
    Remove {
        /// Zero-based position in the list
        index: usize,
    },

    /// Play a move, keeping the forecasts that continue from it
    Play {
        /// Move node, e.g. "5:e2e4"
        node: MoveNode,
    },

    /// Check whether a line would be stored, without storing it
    Candidate {
        /// Canonical key, e.g. "5:e2e4,6:e7e5,7:g1f3"
        line: ForecastLine,
    },
}
