//! Maps inbound events onto aggregate operations.
//!
//! This is the error boundary for game actions: whatever a handler returns,
//! the worker logs it with full context and keeps serving the next action,
//! so one failing action never takes a game (or the process) down.

use crate::connection::ConnectionHandle;
use crate::error::GameError;
use crate::game::{Game, StartSettings};
use log::{error, warn};
use shared::ClientEvent;

/// Applies one inbound event to the game it targets. `CreateGame` is
/// handled by the registry before a worker exists; one reaching this point
/// is a protocol violation and does nothing.
pub fn apply(
    game: &mut Game,
    origin: &ConnectionHandle,
    event: ClientEvent,
) -> Result<(), GameError> {
    match event {
        ClientEvent::CreateGame { .. } => {
            warn!("game {}: gameCreated event routed to a live game", game.id());
            Ok(())
        }
        ClientEvent::JoinGame { player, .. } => game.join(player, origin.clone()),
        ClientEvent::UpdatePlayer { player, .. } => game.update_participant(origin, player),
        ClientEvent::PutWordsInHat {
            words, dictionary, ..
        } => game.contribute_words(origin, words, dictionary),
        ClientEvent::StartGame {
            seconds_per_round,
            game_mode,
            players_pairs,
            owner_is_observer,
            ..
        } => game.start(StartSettings {
            seconds_per_round,
            game_mode,
            players_pairs,
            owner_is_observer,
        }),
        ClientEvent::ConfirmRound { round_number, .. } => {
            game.confirm_round(origin, round_number)
        }
        ClientEvent::WordGuessed { .. } => game.word_guessed(),
        ClientEvent::CompleteRound {
            last_word_result, ..
        } => game.complete_round(last_word_result),
        ClientEvent::RemovePlayer {
            player_to_remove_id,
            ..
        } => game.remove_participant(&player_to_remove_id),
        ClientEvent::ReplayPreviousRound { round_number, .. } => {
            game.replay_previous_round(origin, round_number)
        }
    }
}

/// Worker-side wrapper around [`apply`]: logs failures with game id,
/// participant identity, event name, and payload. Stale round references
/// are expected client noise and only warn.
pub fn apply_logged(game: &mut Game, origin: &ConnectionHandle, event: ClientEvent) {
    let name = event.name();
    let payload =
        serde_json::to_string(&event).unwrap_or_else(|_| "<unserializable>".to_string());

    match apply(game, origin, event) {
        Ok(()) => {}
        Err(e @ GameError::StaleRoundReference { .. }) => {
            warn!(
                "gameId:{} userIdHash:{} event:{} ignored: {}",
                game.id(),
                origin.user_id_hash(),
                name,
                e
            );
        }
        Err(e) => {
            error!(
                "gameId:{} userIdHash:{} sessionId:{} event:{} failed: {} payload:{}",
                game.id(),
                origin.user_id_hash(),
                origin.session_id(),
                name,
                e,
                payload
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryMap;
    use shared::{GameConfig, PlayerProfile, RotationMode, ServerEvent, WordOutcome};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    fn handle(id: &str) -> (ConnectionHandle, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ConnectionHandle::new(id.to_string(), "sess".to_string(), tx),
            rx,
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Message::Text(text) = message {
                events.push(serde_json::from_str(&text).unwrap());
            }
        }
        events
    }

    fn join_event(game_id: &str, name: &str) -> ClientEvent {
        ClientEvent::JoinGame {
            game_id: game_id.to_string(),
            player: PlayerProfile {
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn test_event_flow_drives_full_round() {
        let mut game = Game::new(
            "g1".to_string(),
            GameConfig {
                words_per_player: 2,
                words_mode: None,
                game_mode: None,
            },
            "p0".to_string(),
            Arc::new(DictionaryMap::new()),
        );
        let (owner, mut owner_rx) = handle("p0");
        let (guest, mut guest_rx) = handle("p1");

        apply(&mut game, &owner, join_event("g1", "owner")).unwrap();
        apply(&mut game, &guest, join_event("g1", "guest")).unwrap();
        apply(
            &mut game,
            &owner,
            ClientEvent::PutWordsInHat {
                game_id: "g1".to_string(),
                words: vec!["alpha".to_string(), "beta".to_string()],
                dictionary: None,
            },
        )
        .unwrap();
        apply(
            &mut game,
            &guest,
            ClientEvent::PutWordsInHat {
                game_id: "g1".to_string(),
                words: vec!["gamma".to_string(), "delta".to_string()],
                dictionary: None,
            },
        )
        .unwrap();
        apply(
            &mut game,
            &owner,
            ClientEvent::StartGame {
                game_id: "g1".to_string(),
                seconds_per_round: Some(60),
                game_mode: Some(RotationMode::Circle),
                players_pairs: None,
                owner_is_observer: None,
            },
        )
        .unwrap();

        let snapshot = game.snapshot();
        assert!(snapshot.game_state_playing);
        assert_eq!(snapshot.round_number, Some(0));
        assert_eq!(snapshot.seconds_per_round, Some(60));

        apply(
            &mut game,
            &owner,
            ClientEvent::ConfirmRound {
                game_id: "g1".to_string(),
                round_number: 0,
            },
        )
        .unwrap();
        apply(
            &mut game,
            &guest,
            ClientEvent::ConfirmRound {
                game_id: "g1".to_string(),
                round_number: 0,
            },
        )
        .unwrap();
        assert!(game.snapshot().round_state_playing);

        apply(
            &mut game,
            &owner,
            ClientEvent::WordGuessed {
                game_id: "g1".to_string(),
            },
        )
        .unwrap();
        assert_eq!(game.snapshot().current_words_in_hat, 3);

        apply(
            &mut game,
            &owner,
            ClientEvent::CompleteRound {
                game_id: "g1".to_string(),
                last_word_result: WordOutcome::NotGuessed,
            },
        )
        .unwrap();
        assert_eq!(game.snapshot().round_number, Some(1));

        // Both connections saw traffic throughout.
        assert!(!drain(&mut owner_rx).is_empty());
        assert!(!drain(&mut guest_rx).is_empty());
    }

    #[test]
    fn test_apply_logged_swallows_errors() {
        let mut game = Game::new(
            "g1".to_string(),
            GameConfig {
                words_per_player: 2,
                words_mode: None,
                game_mode: None,
            },
            "p0".to_string(),
            Arc::new(DictionaryMap::new()),
        );
        let (stranger, _rx) = handle("nobody");

        // Removing an unknown participant is an error, but the worker
        // wrapper must not panic or poison the game.
        apply_logged(
            &mut game,
            &stranger,
            ClientEvent::RemovePlayer {
                game_id: "g1".to_string(),
                player_to_remove_id: "ghost".to_string(),
            },
        );
        assert!(game.snapshot().game_state_typing_words);
    }
}
