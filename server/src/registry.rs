//! The game registry and its per-game worker tasks.
//!
//! Concurrency model: every game gets one tokio task that exclusively owns
//! the [`Game`] aggregate and applies queued actions in arrival order. That
//! serializes all mutations of one game without any locking inside the
//! aggregate, while actions for different games run fully in parallel.

use crate::connection::ConnectionHandle;
use crate::dictionary::DictionaryMap;
use crate::dispatch;
use crate::error::GameError;
use crate::game::Game;
use log::{error, info};
use shared::{ClientEvent, GameConfig, ServerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// One queued action for a game worker.
pub struct GameAction {
    pub origin: ConnectionHandle,
    pub event: ClientEvent,
}

/// Routes actions to per-game workers. Games live for the process lifetime;
/// there is no durable storage behind this map.
pub struct GameRegistry {
    games: RwLock<HashMap<String, mpsc::UnboundedSender<GameAction>>>,
    dictionaries: Arc<DictionaryMap>,
}

impl GameRegistry {
    pub fn new(dictionaries: Arc<DictionaryMap>) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            dictionaries,
        }
    }

    /// Creates a game owned by the caller, spawns its worker task, and
    /// replies with the fresh game id. The creator joins afterwards through
    /// the regular join event, like everyone else.
    pub async fn create_game(&self, config: GameConfig, origin: &ConnectionHandle) -> String {
        let game_id = Uuid::new_v4().to_string();
        let game = Game::new(
            game_id.clone(),
            config,
            origin.user_id_hash().to_string(),
            Arc::clone(&self.dictionaries),
        );

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_game_worker(game, rx));
        self.games.write().await.insert(game_id.clone(), tx);

        info!(
            "created game {} owned by userIdHash:{}",
            game_id,
            origin.user_id_hash()
        );
        origin.send(
            Some(&game_id),
            &ServerEvent::GameCreated {
                game_id: game_id.clone(),
            },
        );
        game_id
    }

    /// Queues an action for the game it names. An unknown game id is fatal
    /// to this action only: it is logged against the offending caller and
    /// nothing else happens.
    pub async fn route(&self, game_id: &str, action: GameAction) {
        let sender = { self.games.read().await.get(game_id).cloned() };
        match sender {
            Some(sender) => {
                if sender.send(action).is_err() {
                    error!("game {} worker is gone; action dropped", game_id);
                }
            }
            None => {
                error!(
                    "userIdHash:{} event:{}: {}",
                    action.origin.user_id_hash(),
                    action.event.name(),
                    GameError::GameNotFound(game_id.to_string())
                );
            }
        }
    }
}

async fn run_game_worker(mut game: Game, mut actions: mpsc::UnboundedReceiver<GameAction>) {
    while let Some(action) = actions.recv().await {
        dispatch::apply_logged(&mut game, &action.origin, action.event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlayerProfile;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;

    fn handle(id: &str) -> (ConnectionHandle, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ConnectionHandle::new(id.to_string(), "sess".to_string(), tx),
            rx,
        )
    }

    async fn next_event(rx: &mut UnboundedReceiver<Message>) -> ServerEvent {
        let message = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("channel closed");
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            words_per_player: 3,
            words_mode: None,
            game_mode: None,
        }
    }

    #[tokio::test]
    async fn test_create_game_replies_with_id() {
        let registry = GameRegistry::new(Arc::new(DictionaryMap::new()));
        let (owner, mut owner_rx) = handle("owner-hash");

        let game_id = registry.create_game(config(), &owner).await;

        match next_event(&mut owner_rx).await {
            ServerEvent::GameCreated { game_id: replied } => assert_eq!(replied, game_id),
            other => panic!("expected gameCreated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_reaches_game_worker() {
        let registry = GameRegistry::new(Arc::new(DictionaryMap::new()));
        let (owner, mut owner_rx) = handle("owner-hash");
        let game_id = registry.create_game(config(), &owner).await;
        let _ = next_event(&mut owner_rx).await;

        registry
            .route(
                &game_id,
                GameAction {
                    origin: owner.clone(),
                    event: ClientEvent::JoinGame {
                        game_id: game_id.clone(),
                        player: PlayerProfile {
                            name: "ann".to_string(),
                        },
                    },
                },
            )
            .await;

        match next_event(&mut owner_rx).await {
            ServerEvent::UserIdHash { user_id_hash, .. } => {
                assert_eq!(user_id_hash, "owner-hash");
            }
            other => panic!("expected userIdHash, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_to_unknown_game_is_isolated() {
        let registry = GameRegistry::new(Arc::new(DictionaryMap::new()));
        let (caller, mut caller_rx) = handle("caller");

        registry
            .route(
                "no-such-game",
                GameAction {
                    origin: caller.clone(),
                    event: ClientEvent::WordGuessed {
                        game_id: "no-such-game".to_string(),
                    },
                },
            )
            .await;

        // Logged only; the caller receives nothing and nothing crashes.
        assert!(caller_rx.try_recv().is_err());
    }
}
