//! Turn parity rules.
//!
//! Whose move comes next decides where a forecast may end, how short it may
//! be, and at which offsets two forecasts exclude each other.

use serde::{Deserialize, Serialize};

/// Maximum number of plies kept in a forecast line.
pub const MAX_FORECAST_PLIES: usize = 30;

/// Whose move comes next in the position the forecasts start from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnContext {
    /// The local player moves next.
    MyTurn,
    /// The opponent moves next.
    OpponentTurn,
}

impl TurnContext {
    /// Builds the context from the `on_my_turn` flag.
    pub fn from_on_my_turn(on_my_turn: bool) -> Self {
        if on_my_turn {
            Self::MyTurn
        } else {
            Self::OpponentTurn
        }
    }

    /// Returns true when the local player moves next.
    pub fn is_my_turn(self) -> bool {
        matches!(self, Self::MyTurn)
    }

    /// Shortest admissible forecast.
    pub fn min_length(self) -> usize {
        match self {
            Self::MyTurn => 1,
            Self::OpponentTurn => 2,
        }
    }

    /// Returns true when a line of `len` plies must lose its last ply.
    ///
    /// Stored lines end on a move of the local player: odd lengths when the
    /// local player moves first, even lengths otherwise.
    pub fn drops_last(self, len: usize) -> bool {
        let ends_on_own_move = match self {
            Self::MyTurn => len % 2 == 1,
            Self::OpponentTurn => len % 2 == 0,
        };
        len > 0 && !ends_on_own_move
    }

    /// Returns true when two lines first differing at `index` exclude each other.
    ///
    /// | context      | collides when           |
    /// |--------------|-------------------------|
    /// | MyTurn       | index is even and not 0 |
    /// | OpponentTurn | index is odd            |
    pub fn collides_at(self, index: usize) -> bool {
        match self {
            Self::MyTurn => index != 0 && index % 2 == 0,
            Self::OpponentTurn => index % 2 == 1,
        }
    }
}
