//! The forecast set and its consistency algorithm.
//!
//! A set never holds a line that another line already covers, nor two lines
//! that pre-commit different replies to the same sequence of opponent
//! moves. [`ForecastSet::fix_all`] is the only operation that restores those
//! properties after an insertion.

use super::invariants::{ForecastInvariants, InvariantSet};
use super::node::{ForecastLine, MoveNode};
use super::turn::{MAX_FORECAST_PLIES, TurnContext};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Returns true when `a` and `b` cannot both be kept.
///
/// Lines that never differ within their shared length collide as well.
pub fn collides(turn: TurnContext, a: &ForecastLine, b: &ForecastLine) -> bool {
    match a.divergence(b) {
        Some(index) => turn.collides_at(index),
        None => true,
    }
}

/// Ordered collection of forecast lines for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastSet {
    turn: TurnContext,
    lines: Vec<ForecastLine>,
}

impl ForecastSet {
    /// Creates a set seeded with `lines`, made consistent.
    #[instrument(skip(lines), fields(seeded = lines.len()))]
    pub fn new(turn: TurnContext, lines: Vec<ForecastLine>) -> Self {
        let mut set = Self::from_lines_unchecked(turn, lines);
        set.fix_all();
        set
    }

    /// Creates a set holding `lines` exactly as given.
    pub(crate) fn from_lines_unchecked(turn: TurnContext, mut lines: Vec<ForecastLine>) -> Self {
        lines.iter_mut().for_each(ForecastLine::strip_variations);
        Self { turn, lines }
    }

    /// Whose move comes next.
    pub fn turn(&self) -> TurnContext {
        self.turn
    }

    /// Stored lines in insertion order.
    pub fn lines(&self) -> &[ForecastLine] {
        &self.lines
    }

    /// Number of stored lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true when no line is stored.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // ─────────────────────────────────────────────────────────────
    //  Admission
    // ─────────────────────────────────────────────────────────────

    /// Cuts a line back to a valid ending ply, then to at most 30 plies.
    pub fn truncate(&self, line: &ForecastLine) -> ForecastLine {
        let mut truncated = line.clone();
        if self.turn.drops_last(truncated.len()) {
            truncated.pop();
        }
        truncated.truncate(MAX_FORECAST_PLIES);
        truncated
    }

    /// Returns true when the line is long enough to be worth storing.
    pub fn is_long_enough(&self, line: &ForecastLine) -> bool {
        line.len() >= self.turn.min_length()
    }

    /// Returns true when the truncated form of `line` would be stored.
    pub fn is_candidate(&self, line: &ForecastLine) -> bool {
        self.admits(&self.truncate(line))
    }

    fn admits(&self, truncated: &ForecastLine) -> bool {
        self.is_long_enough(truncated)
            && !self.lines.iter().any(|stored| stored.contains(truncated))
    }

    // ─────────────────────────────────────────────────────────────
    //  Mutation
    // ─────────────────────────────────────────────────────────────

    /// Stores the truncated form of `line` and restores consistency.
    ///
    /// Returns false, leaving the set untouched, when the line is not a
    /// candidate. The new line may itself be pruned by the consistency pass.
    #[instrument(skip(self, line), fields(line = %line))]
    pub fn add(&mut self, mut line: ForecastLine) -> bool {
        line.strip_variations();
        let truncated = self.truncate(&line);
        if !self.admits(&truncated) {
            debug!(truncated = %truncated, "Line is not a candidate");
            return false;
        }
        self.lines.push(truncated);
        self.fix_all();
        true
    }

    /// Removes the line at `index`.
    #[instrument(skip(self))]
    pub fn remove(&mut self, index: usize) -> Option<ForecastLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    /// Replaces every stored line with `lines`, without merging.
    #[instrument(skip(self, lines), fields(count = lines.len()))]
    pub fn replace(&mut self, lines: Vec<ForecastLine>) {
        *self = Self::from_lines_unchecked(self.turn, lines);
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Every stored line opening with `node`.
    pub fn find_starting_with_node(&self, node: &MoveNode) -> Vec<ForecastLine> {
        self.lines
            .iter()
            .filter(|line| line.starts_with(node))
            .cloned()
            .collect()
    }

    /// What remains of each stored line once `node` is played.
    ///
    /// Lines consisting of `node` alone have nothing left and are skipped.
    pub fn continuations_after(&self, node: &MoveNode) -> Vec<ForecastLine> {
        self.find_starting_with_node(node)
            .iter()
            .filter(|line| line.len() > 1)
            .map(ForecastLine::continuation)
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    //  Consistency
    // ─────────────────────────────────────────────────────────────

    /// Removes contained lines, then colliding lines.
    #[instrument(skip(self), fields(turn = %self.turn, before = self.lines.len()))]
    pub fn fix_all(&mut self) {
        self.prune_contained();
        self.prune_colliding();
        debug!(after = self.lines.len(), "Forecast set consistent");
        debug_assert!(ForecastInvariants::check_all(&*self).is_ok());
    }

    /// Drops every line that another stored line covers.
    ///
    /// Lines sharing a key are one line; its first occurrence survives.
    fn prune_contained(&mut self) {
        let snapshot = std::mem::take(&mut self.lines);
        let mut seen = HashSet::new();
        self.lines = snapshot
            .iter()
            .filter(|line| {
                seen.insert(line.key())
                    && !snapshot
                        .iter()
                        .any(|other| other.len() > line.len() && other.contains(line))
            })
            .cloned()
            .collect();
    }

    /// Drops every line colliding with an earlier line.
    fn prune_colliding(&mut self) {
        let turn = self.turn;
        let snapshot = std::mem::take(&mut self.lines);
        self.lines = snapshot
            .iter()
            .enumerate()
            .filter(|(i, line)| {
                !snapshot[..*i]
                    .iter()
                    .any(|earlier| collides(turn, earlier, line))
            })
            .map(|(_, line)| line.clone())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(key: &str) -> ForecastLine {
        key.parse().expect("valid key")
    }

    fn keys(set: &ForecastSet) -> Vec<String> {
        set.lines().iter().map(ForecastLine::key).collect()
    }

    #[test]
    fn test_collides_fallback_on_prefix() {
        let a = line("5:e2e4,6:e7e5,7:g1f3");
        assert!(collides(TurnContext::MyTurn, &a, &line("5:e2e4")));
        assert!(collides(TurnContext::OpponentTurn, &a, &a));
    }

    #[test]
    fn test_collides_uses_divergence_parity() {
        let a = line("5:e2e4,6:e7e5,7:g1f3,8:b8c6");
        let at_one = line("5:e2e4,6:c7c5,7:g1f3,8:b8c6");
        let at_two = line("5:e2e4,6:e7e5,7:f2f4,8:e5f4");
        assert!(collides(TurnContext::OpponentTurn, &a, &at_one));
        assert!(!collides(TurnContext::MyTurn, &a, &at_one));
        assert!(collides(TurnContext::MyTurn, &a, &at_two));
        assert!(!collides(TurnContext::OpponentTurn, &a, &at_two));
    }

    #[test]
    fn test_truncate_my_turn_drops_even_tail() {
        let set = ForecastSet::new(TurnContext::MyTurn, Vec::new());
        assert_eq!(set.truncate(&line("5:e2e4,6:e7e5,7:g1f3")).len(), 3);
        assert_eq!(set.truncate(&line("5:e2e4,6:e7e5")).len(), 1);
        assert_eq!(set.truncate(&line("5:e2e4")).len(), 1);
        assert_eq!(set.truncate(&ForecastLine::default()).len(), 0);
    }

    #[test]
    fn test_truncate_opponent_turn_drops_odd_tail() {
        let set = ForecastSet::new(TurnContext::OpponentTurn, Vec::new());
        assert_eq!(set.truncate(&line("5:e2e4,6:e7e5,7:g1f3")).len(), 2);
        assert_eq!(set.truncate(&line("5:e2e4,6:e7e5")).len(), 2);
        assert_eq!(set.truncate(&line("5:e2e4")).len(), 0);
        assert_eq!(set.truncate(&ForecastLine::default()).len(), 0);
    }

    #[test]
    fn test_lone_move_is_candidate_on_my_turn() {
        let set = ForecastSet::new(TurnContext::MyTurn, Vec::new());
        assert!(set.is_candidate(&line("5:e2e4")));
    }

    #[test]
    fn test_truncate_caps_length() {
        let set = ForecastSet::new(TurnContext::OpponentTurn, Vec::new());
        let long = ForecastLine::new((0..41).map(|ply| MoveNode::new(ply, "a1a2")).collect());
        let truncated = set.truncate(&long);
        assert_eq!(truncated.len(), MAX_FORECAST_PLIES);
        assert_eq!(truncated.nodes()[0].ply, 0);
    }

    #[test]
    fn test_is_long_enough() {
        let mine = ForecastSet::new(TurnContext::MyTurn, Vec::new());
        let theirs = ForecastSet::new(TurnContext::OpponentTurn, Vec::new());
        assert!(mine.is_long_enough(&line("5:e2e4")));
        assert!(!theirs.is_long_enough(&line("5:e2e4")));
        assert!(theirs.is_long_enough(&line("5:e2e4,6:e7e5")));
    }

    #[test]
    fn test_stored_line_blocks_its_prefixes() {
        let mut set = ForecastSet::new(TurnContext::OpponentTurn, Vec::new());
        assert!(set.add(line("5:e2e4,6:e7e5,7:g1f3,8:b8c6")));
        assert!(!set.is_candidate(&line("5:e2e4,6:e7e5")));
        assert!(!set.is_candidate(&line("5:e2e4,6:e7e5,7:g1f3,8:b8c6")));
        assert!(!set.add(line("5:e2e4,6:e7e5")));
        assert_eq!(set.len(), 1);

        set.remove(0);
        assert!(set.is_candidate(&line("5:e2e4,6:e7e5")));
    }

    #[test]
    fn test_add_replaces_shorter_line() {
        let mut set = ForecastSet::new(TurnContext::OpponentTurn, vec![line("5:e2e4,6:e7e5")]);
        assert!(set.add(line("5:e2e4,6:e7e5,7:g1f3,8:b8c6")));
        assert_eq!(keys(&set), vec!["5:e2e4,6:e7e5,7:g1f3,8:b8c6"]);
    }

    #[test]
    fn test_add_may_prune_new_line() {
        let mut set = ForecastSet::new(TurnContext::OpponentTurn, vec![line("5:e2e4,6:e7e5")]);
        assert!(set.add(line("5:e2e4,6:d7d5")));
        assert_eq!(keys(&set), vec!["5:e2e4,6:e7e5"]);
    }

    #[test]
    fn test_add_strips_variations() {
        let mut set = ForecastSet::new(TurnContext::MyTurn, Vec::new());
        let mut nodes = line("5:e2e4,6:e7e5,7:g1f3").into_nodes();
        nodes[1].variations = Some(vec![vec![MoveNode::new(7, "g1f3")]]);
        assert!(set.add(ForecastLine::new(nodes)));
        assert!(set.lines()[0].nodes().iter().all(|n| n.variations.is_none()));
    }

    #[test]
    fn test_prune_contained_is_idempotent() {
        let mut set = ForecastSet::from_lines_unchecked(
            TurnContext::MyTurn,
            vec![
                line("5:e2e4,6:e7e5"),
                line("5:e2e4,6:e7e5,7:g1f3,8:b8c6"),
                line("5:d2d4,6:d7d5"),
                line("5:d2d4,6:d7d5"),
                line("5:d2d4"),
            ],
        );
        set.prune_contained();
        let once = set.clone();
        set.prune_contained();
        assert_eq!(set, once);
        assert_eq!(keys(&once), vec!["5:e2e4,6:e7e5,7:g1f3,8:b8c6", "5:d2d4,6:d7d5"]);
    }

    #[test]
    fn test_fix_all_keeps_earlier_of_colliding_pair() {
        let mut set = ForecastSet::from_lines_unchecked(
            TurnContext::MyTurn,
            vec![
                line("5:e2e4,6:e7e5,7:g1f3,8:b8c6"),
                line("5:e2e4,6:e7e5,7:f2f4,8:e5f4"),
            ],
        );
        set.fix_all();
        assert_eq!(keys(&set), vec!["5:e2e4,6:e7e5,7:g1f3,8:b8c6"]);
    }

    #[test]
    fn test_fix_all_keeps_branches_on_other_side() {
        let mut set = ForecastSet::from_lines_unchecked(
            TurnContext::MyTurn,
            vec![
                line("5:e2e4,6:e7e5,7:g1f3,8:b8c6"),
                line("5:e2e4,6:c7c5,7:g1f3,8:d7d6"),
                line("5:d2d4,6:d7d5"),
            ],
        );
        set.fix_all();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_fix_all_collision_compares_pruned_snapshot() {
        // The third line only collides with the second, which is itself pruned.
        let mut set = ForecastSet::from_lines_unchecked(
            TurnContext::MyTurn,
            vec![
                line("1:a,2:b,3:c,4:d"),
                line("1:a,2:b,3:x,4:d"),
                line("1:a,2:b,3:c,4:y"),
            ],
        );
        assert!(!collides(TurnContext::MyTurn, &set.lines()[0], &set.lines()[2]));
        set.fix_all();
        assert_eq!(keys(&set), vec!["1:a,2:b,3:c,4:d"]);
    }

    #[test]
    fn test_continuations_after_node() {
        let set = ForecastSet::new(
            TurnContext::MyTurn,
            vec![
                line("5:e2e4,6:e7e5,7:g1f3,8:b8c6"),
                line("5:e2e4,6:c7c5,7:g1f3,8:d7d6"),
                line("5:d2d4,6:d7d5"),
            ],
        );
        let node = MoveNode::new(5, "e2e4");
        assert_eq!(set.find_starting_with_node(&node).len(), 2);
        assert_eq!(
            set.continuations_after(&node),
            vec![line("6:e7e5,7:g1f3,8:b8c6"), line("6:c7c5,7:g1f3,8:d7d6")]
        );
        assert!(set.continuations_after(&MoveNode::new(5, "c2c4")).is_empty());
    }

    #[test]
    fn test_replace_does_not_merge() {
        let mut set = ForecastSet::new(TurnContext::OpponentTurn, vec![line("5:e2e4,6:e7e5,7:g1f3")]);
        let incoming = vec![line("9:a2a3"), line("9:a2a3,10:a7a6,11:h2h3")];
        set.replace(incoming.clone());
        assert_eq!(set.lines(), incoming.as_slice());
    }
}
