//! First-class invariants for forecast sets.
//!
//! These hold after every consistency pass. They are checked in debug
//! builds and tested independently.

use super::set::{ForecastSet, collides};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Invariant violation: {}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariant: no stored line is a prefix of another stored line.
pub struct NoContainmentInvariant;

impl Invariant<ForecastSet> for NoContainmentInvariant {
    fn holds(set: &ForecastSet) -> bool {
        let lines = set.lines();
        lines.iter().enumerate().all(|(i, line)| {
            lines
                .iter()
                .enumerate()
                .all(|(j, other)| i == j || !other.contains(line))
        })
    }

    fn description() -> &'static str {
        "No forecast is contained in another forecast"
    }
}

/// Invariant: no two stored lines exclude each other.
pub struct NoCollisionInvariant;

impl Invariant<ForecastSet> for NoCollisionInvariant {
    fn holds(set: &ForecastSet) -> bool {
        let lines = set.lines();
        lines.iter().enumerate().all(|(i, line)| {
            lines[..i]
                .iter()
                .all(|earlier| !collides(set.turn(), earlier, line))
        })
    }

    fn description() -> &'static str {
        "No two forecasts disagree on a move of the same side"
    }
}

/// All forecast set invariants as a composable set.
pub type ForecastInvariants = (NoContainmentInvariant, NoCollisionInvariant);
