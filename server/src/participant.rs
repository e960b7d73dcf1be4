//! Participants and their score ledgers.

use crate::connection::ConnectionHandle;
use crate::scheduler::RoundCoordinates;
use shared::ParticipantSnapshot;
use std::collections::HashMap;

pub type ParticipantId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScoreKey {
    epoch: i64,
    circle: i64,
    round: i64,
    is_explain: bool,
}

/// Per-participant credit ledger, keyed by the round coordinates at which
/// each credit was earned. Keys are append/increment-only; repeated credits
/// for the same key accumulate, which keeps replayed rounds from losing
/// score that was already recorded.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    entries: HashMap<ScoreKey, u32>,
}

/// Aggregates over a ledger. The by-epoch and by-circle figures cover
/// completed cycles only: entries stamped with the current epoch or circle
/// are excluded from them and appear in the totals alone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub guessed_by_epoch: u32,
    pub explained_by_epoch: u32,
    pub guessed_by_circle: u32,
    pub explained_by_circle: u32,
    pub guessed_total: u32,
    pub explained_total: u32,
}

impl ScoreLedger {
    pub fn credit(&mut self, coords: RoundCoordinates, is_explain: bool) {
        let key = ScoreKey {
            epoch: coords.epoch,
            circle: coords.circle,
            round: coords.round,
            is_explain,
        };
        *self.entries.entry(key).or_insert(0) += 1;
    }

    /// Sums the ledger against the current round coordinates. Entries with
    /// epoch/circle strictly below the current one count toward the
    /// per-cycle figures; `current == None` (before the first round) leaves
    /// the per-cycle figures at zero.
    pub fn summarize(&self, current: Option<RoundCoordinates>) -> ScoreSummary {
        let mut summary = ScoreSummary::default();

        for (key, value) in &self.entries {
            if let Some(current) = current {
                if key.epoch < current.epoch {
                    if key.is_explain {
                        summary.explained_by_epoch += value;
                    } else {
                        summary.guessed_by_epoch += value;
                    }
                }
                if key.circle < current.circle {
                    if key.is_explain {
                        summary.explained_by_circle += value;
                    } else {
                        summary.guessed_by_circle += value;
                    }
                }
            }
            if key.is_explain {
                summary.explained_total += value;
            } else {
                summary.guessed_total += value;
            }
        }

        summary
    }
}

/// One player (or observer) of one game. Created on first join, mutated in
/// place afterwards; the connection handle is replaced on reconnect and is
/// never owned by the game.
#[derive(Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub is_owner: bool,
    pub is_observer: bool,
    pub contributes_words: bool,
    pub connection: Option<ConnectionHandle>,
    pub scores: ScoreLedger,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            is_owner: false,
            is_observer: false,
            contributes_words: false,
            connection: None,
            scores: ScoreLedger::default(),
        }
    }

    pub fn snapshot(&self, current: Option<RoundCoordinates>) -> ParticipantSnapshot {
        let summary = self.scores.summarize(current);
        ParticipantSnapshot {
            name: self.name.clone(),
            user_id_hash: self.id.clone(),
            owner: self.is_owner,
            observer: self.is_observer,
            put_words_in_hat: self.contributes_words,
            guessed_by_epoch: summary.guessed_by_epoch,
            explained_by_epoch: summary.explained_by_epoch,
            guessed_by_circle: summary.guessed_by_circle,
            explained_by_circle: summary.explained_by_circle,
            guessed_total: summary.guessed_total,
            explained_total: summary.explained_total,
        }
    }
}
