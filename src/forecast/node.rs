//! Move nodes and forecast lines.
//!
//! A forecast line is identified by its canonical key: every node rendered
//! as `ply:uci`, joined with commas. Two lines with the same key are the
//! same line.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// Separator between nodes in a canonical key.
pub const KEY_SEPARATOR: char = ',';

/// One ply of a forecast line.
///
/// Extra fields sent by the analysis board are dropped by serde; only the
/// ply, the move token and the transient variations are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveNode {
    /// Absolute half-move index.
    pub ply: u32,
    /// Move in UCI notation (e.g. `e2e4`, `e7e8q`).
    pub uci: String,
    /// Nested analysis variations. Never stored in a forecast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<Vec<Vec<MoveNode>>>,
}

impl MoveNode {
    /// Creates a node without variations.
    pub fn new(ply: u32, uci: impl Into<String>) -> Self {
        Self {
            ply,
            uci: uci.into(),
            variations: None,
        }
    }

    /// Returns true when both nodes carry the same ply and move.
    pub fn same_move(&self, other: &MoveNode) -> bool {
        self.ply == other.ply && self.uci == other.uci
    }

    /// Drops the transient analysis variations.
    pub fn strip_variations(&mut self) {
        self.variations = None;
    }
}

impl std::fmt::Display for MoveNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ply, self.uci)
    }
}

impl FromStr for MoveNode {
    type Err = LineParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ply, uci) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| LineParseError::MissingSeparator(s.to_string()))?;
        let ply = ply
            .parse::<u32>()
            .map_err(|_| LineParseError::InvalidPly(ply.to_string()))?;
        if uci.is_empty() {
            return Err(LineParseError::EmptyMove(s.to_string()));
        }
        Ok(Self::new(ply, uci))
    }
}

/// An ordered sequence of predicted moves, alternating sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastLine(Vec<MoveNode>);

impl ForecastLine {
    /// Creates a line from its nodes.
    pub fn new(nodes: Vec<MoveNode>) -> Self {
        Self(nodes)
    }

    /// Returns the nodes of the line.
    pub fn nodes(&self) -> &[MoveNode] {
        &self.0
    }

    /// Consumes the line, returning its nodes.
    pub fn into_nodes(self) -> Vec<MoveNode> {
        self.0
    }

    /// Number of plies in the line.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a line without plies.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First ply of the line, if any.
    pub fn first(&self) -> Option<&MoveNode> {
        self.0.first()
    }

    /// Canonical key: `ply:uci` per node, comma separated.
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(|node| node.to_string())
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string())
    }

    /// Returns true when `prefix` is a ply-aligned prefix of this line.
    ///
    /// Equivalent to the canonical key of `self` starting with the key of
    /// `prefix`, compared node by node so that `e7e8` never matches `e7e8q`.
    pub fn contains(&self, prefix: &ForecastLine) -> bool {
        self.len() >= prefix.len()
            && self
                .0
                .iter()
                .zip(prefix.0.iter())
                .all(|(a, b)| a.same_move(b))
    }

    /// Returns true when the line opens with `node`.
    pub fn starts_with(&self, node: &MoveNode) -> bool {
        self.first().is_some_and(|first| first.same_move(node))
    }

    /// Index of the first ply where the two lines play different moves.
    ///
    /// Only the shared length is scanned; `None` means one line is a prefix
    /// of the other.
    pub fn divergence(&self, other: &ForecastLine) -> Option<usize> {
        self.0
            .iter()
            .zip(other.0.iter())
            .position(|(a, b)| a.uci != b.uci)
    }

    /// The line without its leading ply.
    pub fn continuation(&self) -> ForecastLine {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    /// Keeps at most `len` leading plies.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Drops the last ply, if any.
    pub fn pop(&mut self) -> Option<MoveNode> {
        self.0.pop()
    }

    /// Removes analysis variations from every node.
    pub fn strip_variations(&mut self) {
        self.0.iter_mut().for_each(MoveNode::strip_variations);
    }
}

impl std::fmt::Display for ForecastLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ForecastLine {
    type Err = LineParseError;

    /// Parses a canonical key such as `5:e2e4,6:e7e5`.
    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        s.split(KEY_SEPARATOR)
            .map(MoveNode::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Error parsing a canonical key.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum LineParseError {
    /// A node is not of the form `ply:uci`.
    #[display("Node {:?} is not of the form ply:uci", _0)]
    MissingSeparator(String),

    /// The ply is not a non-negative integer.
    #[display("Invalid ply {:?}", _0)]
    InvalidPly(String),

    /// The move token is empty.
    #[display("Node {:?} has an empty move", _0)]
    EmptyMove(String),
}

impl std::error::Error for LineParseError {}
