//! The game aggregate: roster, top-level phases, and the round lifecycle.
//!
//! One value of [`Game`] is the single source of truth for one running game.
//! All mutation goes through the methods here, and the per-game worker task
//! calls them sequentially, so the aggregate itself needs no locking.
//!
//! Lifecycle shape: `CollectingWords → Playing → Ended`, monotonic. Within
//! `Playing`, each round passes through a confirmation handshake before the
//! word in flight is handed out:
//! `NotStarted → AwaitingConfirmation → InProgress → AwaitingConfirmation → …`
//! The game ends when a hand-out finds the word pool empty.

use crate::connection::ConnectionHandle;
use crate::dictionary::DictionaryMap;
use crate::error::GameError;
use crate::participant::{Participant, ParticipantId};
use crate::scheduler::{Assignment, RoundCoordinates, TurnScheduler};
use crate::words::WordPool;
use log::{info, warn};
use rand::seq::SliceRandom;
use shared::{
    GameConfig, GameSnapshot, ParticipantSnapshot, PlayerProfile, PlayerUpdate, RotationMode,
    ServerEvent, WordOutcome, WordsMode,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GamePhase {
    CollectingWords,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundPhase {
    NotStarted,
    AwaitingConfirmation,
    InProgress,
}

/// Settings applied when the owner starts the game.
#[derive(Debug, Clone, Default)]
pub struct StartSettings {
    pub seconds_per_round: Option<u32>,
    pub game_mode: Option<RotationMode>,
    pub players_pairs: Option<Vec<[String; 2]>>,
    pub owner_is_observer: Option<bool>,
}

pub struct Game {
    id: String,
    words_per_player: u32,
    words_mode: Option<WordsMode>,
    mode: RotationMode,
    seconds_per_round: Option<u32>,
    owner: ParticipantId,
    dictionaries: Arc<DictionaryMap>,
    participants: HashMap<ParticipantId, Participant>,
    /// Join order while collecting words; the frozen in-play order once the
    /// game starts. The scheduler's indices point into this list.
    roster: Vec<ParticipantId>,
    observers: Vec<ParticipantId>,
    scheduler: Option<TurnScheduler>,
    round_phase: RoundPhase,
    explainer_confirmed: Option<bool>,
    guesser_confirmed: Option<bool>,
    pool: WordPool,
    phase: GamePhase,
}

impl Game {
    pub fn new(
        id: String,
        config: GameConfig,
        owner: ParticipantId,
        dictionaries: Arc<DictionaryMap>,
    ) -> Self {
        Self {
            id,
            words_per_player: config.words_per_player,
            words_mode: config.words_mode,
            mode: config.game_mode.unwrap_or(RotationMode::Circle),
            seconds_per_round: None,
            owner,
            dictionaries,
            participants: HashMap::new(),
            roster: Vec::new(),
            observers: Vec::new(),
            scheduler: None,
            round_phase: RoundPhase::NotStarted,
            explainer_confirmed: None,
            guesser_confirmed: None,
            pool: WordPool::new(),
            phase: GamePhase::CollectingWords,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Adds a participant or reattaches a reconnecting one. New joins are
    /// only accepted while the game collects words; a known participant may
    /// reconnect at any time and, if they are the current explainer of an
    /// in-progress round, gets the word in flight re-sent.
    pub fn join(
        &mut self,
        profile: PlayerProfile,
        connection: ConnectionHandle,
    ) -> Result<(), GameError> {
        let id = connection.user_id_hash().to_string();
        connection.send(
            Some(&self.id),
            &ServerEvent::UserIdHash {
                user_id_hash: id.clone(),
                game_id: self.id.clone(),
            },
        );

        if !self.participants.contains_key(&id) {
            if self.phase != GamePhase::CollectingWords {
                return Err(GameError::GameNotJoinable);
            }
            let mut participant = Participant::new(id.clone(), profile.name);
            if id == self.owner {
                participant.is_owner = true;
            } else if self.words_mode == Some(WordsMode::Dict) {
                // Dictionary games need no typed words from joiners.
                participant.contributes_words = true;
            }
            self.roster.push(id.clone());
            self.participants.insert(id.clone(), participant);
        }
        if let Some(participant) = self.participants.get_mut(&id) {
            participant.connection = Some(connection.clone());
        }

        self.broadcast_players();
        connection.send(
            Some(&self.id),
            &ServerEvent::GameUpdated {
                game: self.snapshot(),
            },
        );

        if self.phase == GamePhase::Playing && self.round_phase == RoundPhase::InProgress {
            let explainer = self
                .current_assignment()
                .and_then(|a| self.roster.get(a.explainer));
            if explainer == Some(&id) {
                self.hand_out_next_word();
            }
        }
        Ok(())
    }

    /// Settings updates on an existing participant (currently the observer
    /// flag). The full roster is echoed to the caller only.
    pub fn update_participant(
        &mut self,
        caller: &ConnectionHandle,
        update: PlayerUpdate,
    ) -> Result<(), GameError> {
        let id = caller.user_id_hash();
        let Some(participant) = self.participants.get_mut(id) else {
            return Err(GameError::UnknownActionTarget(id.to_string()));
        };
        if let Some(observer) = update.observer {
            participant.is_observer = observer;
        }
        caller.send(
            Some(&self.id),
            &ServerEvent::PlayersUpdated {
                players: self.participant_snapshots(),
                players_order: self.roster.clone(),
            },
        );
        Ok(())
    }

    /// Records a participant's word contribution, replacing any prior one.
    /// A dictionary name resolves against the injected dictionary map.
    pub fn contribute_words(
        &mut self,
        caller: &ConnectionHandle,
        words: Vec<String>,
        dictionary: Option<String>,
    ) -> Result<(), GameError> {
        let id = caller.user_id_hash().to_string();
        if !self.participants.contains_key(&id) {
            return Err(GameError::UnknownActionTarget(id));
        }

        let words = match dictionary {
            Some(name) => self
                .dictionaries
                .get(&name)
                .cloned()
                .ok_or(GameError::UnknownDictionary(name))?,
            None => words,
        };
        self.pool.contribute(&id, words);
        if let Some(participant) = self.participants.get_mut(&id) {
            participant.contributes_words = true;
        }

        let coords = self.current_coordinates();
        if let Some(snapshot) = self.participants.get(&id).map(|p| p.snapshot(coords)) {
            self.notify_all(&ServerEvent::PlayersUpdated {
                players: vec![snapshot],
                players_order: self.roster.clone(),
            });
        }
        Ok(())
    }

    /// Applies the start settings, freezes the rosters, materializes the
    /// word pool, and starts round 0. Rejects rosters the chosen rotation
    /// cannot schedule.
    pub fn start(&mut self, settings: StartSettings) -> Result<(), GameError> {
        if self.phase != GamePhase::CollectingWords {
            warn!("game {}: start ignored, game already started", self.id);
            return Ok(());
        }

        self.seconds_per_round = settings.seconds_per_round;
        if let Some(mode) = settings.game_mode {
            self.mode = mode;
        }
        if settings.owner_is_observer == Some(true) {
            if let Some(owner) = self.participants.get_mut(&self.owner) {
                owner.is_observer = true;
            }
        }

        let in_play: Vec<ParticipantId> = self
            .roster
            .iter()
            .filter(|id| self.participants.get(*id).is_some_and(|p| !p.is_observer))
            .cloned()
            .collect();
        let observing: Vec<ParticipantId> = self
            .roster
            .iter()
            .filter(|id| self.participants.get(*id).is_some_and(|p| p.is_observer))
            .cloned()
            .collect();

        let (roster, scheduler) = match self.mode {
            RotationMode::Circle => {
                let mut roster = in_play;
                roster.shuffle(&mut rand::thread_rng());
                let scheduler = TurnScheduler::circle(roster.len())?;
                (roster, scheduler)
            }
            RotationMode::RandomPairs => {
                let mut roster = in_play;
                roster.shuffle(&mut rand::thread_rng());
                let scheduler = TurnScheduler::pairs(roster.len())?;
                (roster, scheduler)
            }
            RotationMode::AssignedPairs => {
                let pairs = settings.players_pairs.as_ref().ok_or_else(|| {
                    GameError::InvalidRotationConfiguration("pair assignment missing".to_string())
                })?;
                let roster: Vec<ParticipantId> =
                    pairs.iter().flat_map(|pair| pair.iter().cloned()).collect();

                let mut seen = HashSet::new();
                for id in &roster {
                    if !seen.insert(id.clone()) {
                        return Err(GameError::InvalidRotationConfiguration(format!(
                            "participant {} appears in more than one pair",
                            id
                        )));
                    }
                }
                let assigned: HashSet<ParticipantId> = roster.iter().cloned().collect();
                let expected: HashSet<ParticipantId> = in_play.iter().cloned().collect();
                if assigned != expected {
                    return Err(GameError::InvalidRotationConfiguration(
                        "pair assignment must cover the in-play roster exactly once each"
                            .to_string(),
                    ));
                }

                let scheduler = TurnScheduler::pairs(roster.len())?;
                (roster, scheduler)
            }
        };

        let initial = self.pool.materialize(roster.len(), self.words_per_player);
        info!(
            "game {} started: {} in play, {} observing, {} words in hat",
            self.id,
            roster.len(),
            observing.len(),
            initial
        );

        self.roster = roster;
        self.observers = observing;
        self.scheduler = Some(scheduler);
        self.phase = GamePhase::Playing;
        self.notify_all(&ServerEvent::GameUpdated {
            game: self.snapshot(),
        });
        self.start_round();
        Ok(())
    }

    /// Advances the rotation, reshuffles the remaining words, and opens the
    /// confirmation handshake for the new round.
    fn start_round(&mut self) {
        if self.scheduler.is_none() {
            return;
        }
        self.pool.shuffle_remaining();
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.step();
        }

        self.explainer_confirmed = Some(false);
        self.guesser_confirmed = Some(false);
        self.round_phase = RoundPhase::AwaitingConfirmation;
        self.notify_all(&ServerEvent::GameUpdated {
            game: self.snapshot(),
        });
    }

    /// One party's round confirmation. A confirmation naming anything but
    /// the current round of an open handshake flips nothing; the caller is
    /// resynced with the current state instead. When both parties have
    /// confirmed, the round enters play and the word is handed out.
    pub fn confirm_round(
        &mut self,
        caller: &ConnectionHandle,
        claimed_round: i64,
    ) -> Result<(), GameError> {
        let current = self.scheduler.as_ref().and_then(|s| s.round());
        let open = self.phase == GamePhase::Playing
            && self.round_phase == RoundPhase::AwaitingConfirmation;
        if !open || current != Some(claimed_round) {
            caller.send(
                Some(&self.id),
                &ServerEvent::GameUpdated {
                    game: self.snapshot(),
                },
            );
            return Err(GameError::StaleRoundReference {
                claimed: claimed_round,
                current,
            });
        }

        let id = caller.user_id_hash().to_string();
        if let Some(assignment) = self.current_assignment() {
            if self.roster.get(assignment.guesser) == Some(&id) {
                self.guesser_confirmed = Some(true);
            }
            if self.roster.get(assignment.explainer) == Some(&id) {
                self.explainer_confirmed = Some(true);
            }
        }

        if self.explainer_confirmed == Some(true) && self.guesser_confirmed == Some(true) {
            self.round_phase = RoundPhase::InProgress;
            self.hand_out_next_word();
        } else {
            caller.send(
                Some(&self.id),
                &ServerEvent::GameUpdated {
                    game: self.snapshot(),
                },
            );
        }
        Ok(())
    }

    /// A word was guessed mid-round: consume it, credit both active roles at
    /// the current round coordinates, and hand out the next word.
    pub fn word_guessed(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing || self.round_phase != RoundPhase::InProgress {
            warn!("game {}: wordGuessed outside an in-progress round", self.id);
            return Ok(());
        }
        self.consume_current_word(true);
        self.hand_out_next_word();
        Ok(())
    }

    /// Settles the word in flight when the round timer ran out, then starts
    /// the next round. `Guessed` scores, `Error` discards the word as
    /// unusable, `NotGuessed` returns it to circulation.
    pub fn complete_round(&mut self, outcome: WordOutcome) -> Result<(), GameError> {
        if self.phase != GamePhase::Playing || self.round_phase != RoundPhase::InProgress {
            warn!(
                "game {}: roundComplete outside an in-progress round",
                self.id
            );
            return Ok(());
        }
        match outcome {
            WordOutcome::Guessed => self.consume_current_word(true),
            WordOutcome::Error => self.consume_current_word(false),
            WordOutcome::NotGuessed => {}
        }
        self.broadcast_players();
        self.start_round();
        Ok(())
    }

    /// Rewinds one round: the exact inverse of one `start_round`, with the
    /// confirmation handshake reopened for the restored round. Refused when
    /// the claimed round is not the current one, and before round 1 (there
    /// is no previous round to rewind to).
    pub fn replay_previous_round(
        &mut self,
        caller: &ConnectionHandle,
        claimed_round: i64,
    ) -> Result<(), GameError> {
        let current = self.scheduler.as_ref().and_then(|s| s.round());
        if self.phase != GamePhase::Playing || current != Some(claimed_round) {
            caller.send(
                Some(&self.id),
                &ServerEvent::GameUpdated {
                    game: self.snapshot(),
                },
            );
            return Err(GameError::StaleRoundReference {
                claimed: claimed_round,
                current,
            });
        }
        if claimed_round == 0 {
            warn!("game {}: replay refused, no round before round 0", self.id);
            caller.send(
                Some(&self.id),
                &ServerEvent::GameUpdated {
                    game: self.snapshot(),
                },
            );
            return Ok(());
        }

        if let Some(scheduler) = &mut self.scheduler {
            scheduler.unstep();
        }
        self.explainer_confirmed = Some(false);
        self.guesser_confirmed = Some(false);
        self.round_phase = RoundPhase::AwaitingConfirmation;
        self.notify_all(&ServerEvent::GameUpdated {
            game: self.snapshot(),
        });
        Ok(())
    }

    /// Evicts a participant from the game and tells them so. The round in
    /// flight is left untouched; correcting the rotation afterwards is the
    /// operator's explicit follow-up.
    pub fn remove_participant(&mut self, target_id: &str) -> Result<(), GameError> {
        let Some(removed) = self.participants.remove(target_id) else {
            return Err(GameError::UnknownActionTarget(target_id.to_string()));
        };
        self.roster.retain(|id| id != target_id);
        self.observers.retain(|id| id != target_id);
        self.pool.remove_contribution(target_id);

        self.broadcast_players();
        if let Some(connection) = &removed.connection {
            connection.send(Some(&self.id), &ServerEvent::PlayerRemoved {});
        }
        Ok(())
    }

    /// Sends the head word to the current explainer and an explicit no-word
    /// to everyone else, the guesser included. An empty pool ends the game
    /// instead.
    fn hand_out_next_word(&mut self) {
        if self.pool.is_empty() {
            self.phase = GamePhase::Ended;
            self.round_phase = RoundPhase::NotStarted;
            info!("game {} ended: hat is empty", self.id);
            self.notify_all(&ServerEvent::GameUpdated {
                game: self.snapshot(),
            });
            self.broadcast_players();
            return;
        }

        let explainer = self
            .current_assignment()
            .and_then(|a| self.roster.get(a.explainer))
            .cloned();
        let word = self.pool.peek_next().map(str::to_string);

        for participant in self.participants.values() {
            let Some(connection) = &participant.connection else {
                continue;
            };
            if Some(&participant.id) == explainer.as_ref() {
                connection.send(Some(&self.id), &ServerEvent::NextWord { word: word.clone() });
            } else {
                connection.send(Some(&self.id), &ServerEvent::NextWord { word: None });
            }
        }
    }

    fn consume_current_word(&mut self, credit: bool) {
        if self.pool.is_empty() {
            return;
        }
        self.pool.consume_next();
        if !credit {
            return;
        }

        let (Some(coords), Some(assignment)) =
            (self.current_coordinates(), self.current_assignment())
        else {
            return;
        };
        let explainer = self.roster.get(assignment.explainer).cloned();
        let guesser = self.roster.get(assignment.guesser).cloned();
        if let Some(participant) = explainer.and_then(|id| self.participants.get_mut(&id)) {
            participant.scores.credit(coords, true);
        }
        if let Some(participant) = guesser.and_then(|id| self.participants.get_mut(&id)) {
            participant.scores.credit(coords, false);
        }
    }

    fn current_assignment(&self) -> Option<Assignment> {
        self.scheduler.as_ref().and_then(|s| s.assignment())
    }

    fn current_coordinates(&self) -> Option<RoundCoordinates> {
        self.scheduler.as_ref().and_then(|s| s.coordinates())
    }

    fn notify_all(&self, event: &ServerEvent) {
        for participant in self.participants.values() {
            if let Some(connection) = &participant.connection {
                connection.send(Some(&self.id), event);
            }
        }
    }

    fn broadcast_players(&self) {
        self.notify_all(&ServerEvent::PlayersUpdated {
            players: self.participant_snapshots(),
            players_order: self.roster.clone(),
        });
    }

    pub fn participant_snapshots(&self) -> Vec<ParticipantSnapshot> {
        let coords = self.current_coordinates();
        self.roster
            .iter()
            .chain(self.observers.iter())
            .filter_map(|id| self.participants.get(id))
            .map(|participant| participant.snapshot(coords))
            .collect()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let coords = self.current_coordinates();
        let assignment = self.current_assignment();
        GameSnapshot {
            words_per_player: self.words_per_player,
            words_mode: self.words_mode,
            owner_user_id_hash: self.owner.clone(),
            game_state_typing_words: self.phase == GamePhase::CollectingWords,
            game_state_playing: self.phase == GamePhase::Playing,
            game_state_ended: self.phase == GamePhase::Ended,
            players_order: self.roster.clone(),
            observers_order: self.observers.clone(),
            explain_player_id: assignment
                .and_then(|a| self.roster.get(a.explainer))
                .cloned(),
            guess_player_id: assignment.and_then(|a| self.roster.get(a.guesser)).cloned(),
            explain_player_confirmed: self.explainer_confirmed,
            guess_player_confirmed: self.guesser_confirmed,
            seconds_per_round: self.seconds_per_round,
            round_state_confirmation: self.phase == GamePhase::Playing
                && self.round_phase == RoundPhase::AwaitingConfirmation,
            round_state_playing: self.phase == GamePhase::Playing
                && self.round_phase == RoundPhase::InProgress,
            round_number: coords.map(|c| c.round),
            circle_number: coords.map(|c| c.circle),
            epoch_number: coords.map(|c| c.epoch),
            initial_words_in_hat: self.pool.initial_size(),
            current_words_in_hat: self.pool.remaining_len(),
        }
    }
}
