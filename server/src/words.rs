//! The shared pool of words awaiting guessing ("the hat") and the
//! per-participant contributions that feed it.

use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Word pool for one game.
///
/// Contributions accumulate while the game collects words; `materialize`
/// freezes them into the shuffled queue exactly once at game start. After
/// that the pool only shrinks: `remaining + consumed == initial` holds for
/// the rest of the game.
#[derive(Debug, Default)]
pub struct WordPool {
    contributions: HashMap<String, Vec<String>>,
    remaining: Vec<String>,
    initial: Option<usize>,
    consumed: usize,
}

impl WordPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a participant's words, replacing any prior contribution from
    /// the same participant. Word content is not validated here.
    pub fn contribute(&mut self, participant_id: &str, words: Vec<String>) {
        self.contributions.insert(participant_id.to_string(), words);
    }

    /// Drops a contribution, used when a participant is evicted before the
    /// pool is materialized.
    pub fn remove_contribution(&mut self, participant_id: &str) {
        self.contributions.remove(participant_id);
    }

    pub fn has_contributed(&self, participant_id: &str) -> bool {
        self.contributions.contains_key(participant_id)
    }

    /// Fills the pool to `roster_len × words_per_participant`, looping a
    /// shuffle over the concatenated contributions when they fall short of
    /// the target, then truncating. Called exactly once at game start.
    /// Returns the realized pool size; an empty contribution set yields an
    /// empty pool.
    pub fn materialize(&mut self, roster_len: usize, words_per_participant: u32) -> usize {
        let target = roster_len * words_per_participant as usize;
        let mut all: Vec<String> = self
            .contributions
            .values()
            .flat_map(|words| words.iter().cloned())
            .collect();

        let mut rng = rand::thread_rng();
        while self.remaining.len() < target && !all.is_empty() {
            all.shuffle(&mut rng);
            self.remaining.extend(all.iter().cloned());
        }
        self.remaining.truncate(target);

        self.initial = Some(self.remaining.len());
        self.remaining.len()
    }

    /// Reshuffles the remaining queue in place. The set of remaining words
    /// is untouched; only their order changes.
    pub fn shuffle_remaining(&mut self) {
        self.remaining.shuffle(&mut rand::thread_rng());
    }

    pub fn peek_next(&self) -> Option<&str> {
        self.remaining.first().map(String::as_str)
    }

    /// Removes and returns the head word. Callers are expected to check
    /// `is_empty` first; `None` means they did not.
    pub fn consume_next(&mut self) -> Option<String> {
        if self.remaining.is_empty() {
            return None;
        }
        self.consumed += 1;
        Some(self.remaining.remove(0))
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Pool size at materialization time, reported to clients as the
    /// initial word count. `None` until the game has started.
    pub fn initial_size(&self) -> Option<usize> {
        self.initial
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_contribution_replaces_prior() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["old"]));
        pool.contribute("p1", words(&["new", "newer"]));

        let size = pool.materialize(1, 2);
        assert_eq!(size, 2);
        assert!(!pool.has_contributed("p2"));
        assert!(pool.has_contributed("p1"));
    }

    #[test]
    fn test_materialize_empty_contributions() {
        let mut pool = WordPool::new();
        let size = pool.materialize(4, 10);

        assert_eq!(size, 0);
        assert!(pool.is_empty());
        assert_eq!(pool.initial_size(), Some(0));
    }

    #[test]
    fn test_materialize_truncates_to_target() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b", "c", "d", "e", "f"]));
        pool.contribute("p2", words(&["g", "h", "i", "j"]));

        let size = pool.materialize(2, 2);
        assert_eq!(size, 4);
        assert_eq!(pool.remaining_len(), 4);
    }

    #[test]
    fn test_materialize_loops_small_contribution_set() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b"]));

        // Target of 6 from only 2 distinct words: each repeats 3 times.
        let size = pool.materialize(3, 2);
        assert_eq!(size, 6);

        let mut counts: HashMap<String, usize> = HashMap::new();
        while let Some(word) = pool.consume_next() {
            *counts.entry(word).or_insert(0) += 1;
        }
        assert_eq!(counts.get("a"), Some(&3));
        assert_eq!(counts.get("b"), Some(&3));
    }

    #[test]
    fn test_shuffle_preserves_remaining_set() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b", "c", "d", "e"]));
        pool.materialize(1, 5);

        let before: HashSet<String> = (0..pool.remaining_len())
            .filter_map(|_| pool.consume_next())
            .collect();

        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b", "c", "d", "e"]));
        pool.materialize(1, 5);
        pool.shuffle_remaining();
        let after: HashSet<String> = (0..pool.remaining_len())
            .filter_map(|_| pool.consume_next())
            .collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_consume_tracks_conservation() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b", "c"]));
        let initial = pool.materialize(1, 3);

        pool.consume_next();
        pool.consume_next();

        assert_eq!(pool.remaining_len() + pool.consumed_count(), initial);
        assert_eq!(pool.consumed_count(), 2);
    }

    #[test]
    fn test_consume_matches_peek() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a", "b", "c"]));
        pool.materialize(1, 3);

        let head = pool.peek_next().map(str::to_string);
        assert_eq!(pool.consume_next(), head);
    }

    #[test]
    fn test_consume_on_empty_pool() {
        let mut pool = WordPool::new();
        pool.materialize(1, 3);

        assert_eq!(pool.consume_next(), None);
        assert_eq!(pool.consumed_count(), 0);
    }

    #[test]
    fn test_removed_contribution_excluded() {
        let mut pool = WordPool::new();
        pool.contribute("p1", words(&["a"]));
        pool.contribute("p2", words(&["b"]));
        pool.remove_contribution("p1");

        let size = pool.materialize(2, 1);
        assert_eq!(size, 2);

        let mut drained = Vec::new();
        while let Some(word) = pool.consume_next() {
            drained.push(word);
        }
        assert_eq!(drained, vec!["b".to_string(), "b".to_string()]);
    }
}
