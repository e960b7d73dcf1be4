use serde::{Deserialize, Serialize};

/// Rotation strategy for assigning explainer/guesser roles, fixed for the
/// lifetime of a game.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    #[serde(rename = "CIRCLE")]
    Circle,
    #[serde(rename = "RANDOM_PAIRS")]
    RandomPairs,
    #[serde(rename = "ASSIGNED_PAIRS")]
    AssignedPairs,
}

/// How the word pool is filled: participants type their own words unless the
/// game references a canned dictionary.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum WordsMode {
    #[serde(rename = "DICT")]
    Dict,
}

/// Fate of the word in flight when a round is settled.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum WordOutcome {
    #[serde(rename = "GUESSED")]
    Guessed,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "NOT_GUESSED")]
    NotGuessed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerProfile {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerUpdate {
    #[serde(default)]
    pub observer: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub words_per_player: u32,
    #[serde(default)]
    pub words_mode: Option<WordsMode>,
    #[serde(default)]
    pub game_mode: Option<RotationMode>,
}

/// Events a client sends to the server. Wire frames look like
/// `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "gameCreated")]
    CreateGame {
        game: GameConfig,
        player: PlayerProfile,
    },
    #[serde(rename = "playerJoined", rename_all = "camelCase")]
    JoinGame {
        game_id: String,
        player: PlayerProfile,
    },
    #[serde(rename = "playerUpdated", rename_all = "camelCase")]
    UpdatePlayer {
        game_id: String,
        player: PlayerUpdate,
    },
    #[serde(rename = "putWordsInHat", rename_all = "camelCase")]
    PutWordsInHat {
        game_id: String,
        #[serde(default)]
        words: Vec<String>,
        #[serde(default)]
        dictionary: Option<String>,
    },
    #[serde(rename = "gameStarted", rename_all = "camelCase")]
    StartGame {
        game_id: String,
        #[serde(default)]
        seconds_per_round: Option<u32>,
        #[serde(default)]
        game_mode: Option<RotationMode>,
        #[serde(default)]
        players_pairs: Option<Vec<[String; 2]>>,
        #[serde(default)]
        owner_is_observer: Option<bool>,
    },
    #[serde(rename = "roundConfirmed", rename_all = "camelCase")]
    ConfirmRound { game_id: String, round_number: i64 },
    #[serde(rename = "wordGuessed", rename_all = "camelCase")]
    WordGuessed { game_id: String },
    #[serde(rename = "roundComplete", rename_all = "camelCase")]
    CompleteRound {
        game_id: String,
        last_word_result: WordOutcome,
    },
    #[serde(rename = "removePlayer", rename_all = "camelCase")]
    RemovePlayer {
        game_id: String,
        player_to_remove_id: String,
    },
    #[serde(rename = "replayPreviousRound", rename_all = "camelCase")]
    ReplayPreviousRound { game_id: String, round_number: i64 },
}

impl ClientEvent {
    /// Target game of the event, if it names one (`gameCreated` does not).
    pub fn game_id(&self) -> Option<&str> {
        match self {
            ClientEvent::CreateGame { .. } => None,
            ClientEvent::JoinGame { game_id, .. }
            | ClientEvent::UpdatePlayer { game_id, .. }
            | ClientEvent::PutWordsInHat { game_id, .. }
            | ClientEvent::StartGame { game_id, .. }
            | ClientEvent::ConfirmRound { game_id, .. }
            | ClientEvent::WordGuessed { game_id }
            | ClientEvent::CompleteRound { game_id, .. }
            | ClientEvent::RemovePlayer { game_id, .. }
            | ClientEvent::ReplayPreviousRound { game_id, .. } => Some(game_id),
        }
    }

    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateGame { .. } => "gameCreated",
            ClientEvent::JoinGame { .. } => "playerJoined",
            ClientEvent::UpdatePlayer { .. } => "playerUpdated",
            ClientEvent::PutWordsInHat { .. } => "putWordsInHat",
            ClientEvent::StartGame { .. } => "gameStarted",
            ClientEvent::ConfirmRound { .. } => "roundConfirmed",
            ClientEvent::WordGuessed { .. } => "wordGuessed",
            ClientEvent::CompleteRound { .. } => "roundComplete",
            ClientEvent::RemovePlayer { .. } => "removePlayer",
            ClientEvent::ReplayPreviousRound { .. } => "replayPreviousRound",
        }
    }
}

/// Events the server sends to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "gameCreated", rename_all = "camelCase")]
    GameCreated { game_id: String },
    #[serde(rename = "userIdHash", rename_all = "camelCase")]
    UserIdHash { user_id_hash: String, game_id: String },
    #[serde(rename = "gameUpdated")]
    GameUpdated { game: GameSnapshot },
    #[serde(rename = "playersUpdated", rename_all = "camelCase")]
    PlayersUpdated {
        players: Vec<ParticipantSnapshot>,
        players_order: Vec<String>,
    },
    #[serde(rename = "nextWord")]
    NextWord { word: Option<String> },
    #[serde(rename = "playerRemoved")]
    PlayerRemoved {},
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GameCreated { .. } => "gameCreated",
            ServerEvent::UserIdHash { .. } => "userIdHash",
            ServerEvent::GameUpdated { .. } => "gameUpdated",
            ServerEvent::PlayersUpdated { .. } => "playersUpdated",
            ServerEvent::NextWord { .. } => "nextWord",
            ServerEvent::PlayerRemoved {} => "playerRemoved",
        }
    }
}

/// Full observable game state, broadcast on every transition. Round counters
/// are absent until the first round has started.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub words_per_player: u32,
    pub words_mode: Option<WordsMode>,
    pub owner_user_id_hash: String,
    pub game_state_typing_words: bool,
    pub game_state_playing: bool,
    pub game_state_ended: bool,
    pub players_order: Vec<String>,
    pub observers_order: Vec<String>,
    pub explain_player_id: Option<String>,
    pub guess_player_id: Option<String>,
    pub explain_player_confirmed: Option<bool>,
    pub guess_player_confirmed: Option<bool>,
    pub seconds_per_round: Option<u32>,
    pub round_state_confirmation: bool,
    pub round_state_playing: bool,
    pub round_number: Option<i64>,
    pub circle_number: Option<i64>,
    pub epoch_number: Option<i64>,
    pub initial_words_in_hat: Option<usize>,
    pub current_words_in_hat: usize,
}

/// Per-participant state and score aggregates as clients see them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    pub name: String,
    pub user_id_hash: String,
    pub owner: bool,
    pub observer: bool,
    pub put_words_in_hat: bool,
    pub guessed_by_epoch: u32,
    pub explained_by_epoch: u32,
    pub guessed_by_circle: u32,
    pub explained_by_circle: u32,
    pub guessed_total: u32,
    pub explained_total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_frame_shape() {
        let event = ClientEvent::ConfirmRound {
            game_id: "g1".to_string(),
            round_number: 4,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "roundConfirmed");
        assert_eq!(json["data"]["gameId"], "g1");
        assert_eq!(json["data"]["roundNumber"], 4);
    }

    #[test]
    fn test_client_event_roundtrip() {
        let events = vec![
            ClientEvent::CreateGame {
                game: GameConfig {
                    words_per_player: 5,
                    words_mode: Some(WordsMode::Dict),
                    game_mode: Some(RotationMode::Circle),
                },
                player: PlayerProfile {
                    name: "ann".to_string(),
                },
            },
            ClientEvent::JoinGame {
                game_id: "g1".to_string(),
                player: PlayerProfile {
                    name: "bob".to_string(),
                },
            },
            ClientEvent::PutWordsInHat {
                game_id: "g1".to_string(),
                words: vec!["cat".to_string(), "dog".to_string()],
                dictionary: None,
            },
            ClientEvent::CompleteRound {
                game_id: "g1".to_string(),
                last_word_result: WordOutcome::NotGuessed,
            },
            ClientEvent::ReplayPreviousRound {
                game_id: "g1".to_string(),
                round_number: 0,
            },
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: ClientEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn test_client_event_optional_fields_default() {
        let json = r#"{"event":"gameStarted","data":{"gameId":"g1","gameMode":"CIRCLE"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::StartGame {
                game_id,
                seconds_per_round,
                game_mode,
                players_pairs,
                owner_is_observer,
            } => {
                assert_eq!(game_id, "g1");
                assert_eq!(seconds_per_round, None);
                assert_eq!(game_mode, Some(RotationMode::Circle));
                assert_eq!(players_pairs, None);
                assert_eq!(owner_is_observer, None);
            }
            _ => panic!("Unexpected event variant"),
        }
    }

    #[test]
    fn test_rotation_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&RotationMode::RandomPairs).unwrap(),
            "\"RANDOM_PAIRS\""
        );
        assert_eq!(
            serde_json::to_string(&RotationMode::AssignedPairs).unwrap(),
            "\"ASSIGNED_PAIRS\""
        );
        assert_eq!(
            serde_json::from_str::<WordOutcome>("\"NOT_GUESSED\"").unwrap(),
            WordOutcome::NotGuessed
        );
    }

    #[test]
    fn test_next_word_explicit_null() {
        let event = ServerEvent::NextWord { word: None };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"nextWord","data":{"word":null}}"#);
    }

    #[test]
    fn test_game_snapshot_roundtrip() {
        let snapshot = GameSnapshot {
            words_per_player: 6,
            words_mode: None,
            owner_user_id_hash: "owner".to_string(),
            game_state_typing_words: false,
            game_state_playing: true,
            game_state_ended: false,
            players_order: vec!["a".to_string(), "b".to_string()],
            observers_order: vec![],
            explain_player_id: Some("a".to_string()),
            guess_player_id: Some("b".to_string()),
            explain_player_confirmed: Some(false),
            guess_player_confirmed: Some(false),
            seconds_per_round: Some(60),
            round_state_confirmation: true,
            round_state_playing: false,
            round_number: Some(0),
            circle_number: Some(0),
            epoch_number: Some(0),
            initial_words_in_hat: Some(12),
            current_words_in_hat: 12,
        };

        let event = ServerEvent::GameUpdated {
            game: snapshot.clone(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "gameUpdated");
        assert_eq!(json["data"]["game"]["roundNumber"], 0);
        assert_eq!(json["data"]["game"]["explainPlayerId"], "a");
        assert_eq!(json["data"]["game"]["currentWordsInHat"], 12);

        let back: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ServerEvent::GameUpdated { game: snapshot });
    }

    #[test]
    fn test_game_id_accessor() {
        let event = ClientEvent::WordGuessed {
            game_id: "g7".to_string(),
        };
        assert_eq!(event.game_id(), Some("g7"));

        let event = ClientEvent::CreateGame {
            game: GameConfig {
                words_per_player: 3,
                words_mode: None,
                game_mode: None,
            },
            player: PlayerProfile {
                name: "ann".to_string(),
            },
        };
        assert_eq!(event.game_id(), None);
        assert_eq!(event.name(), "gameCreated");
    }
}
