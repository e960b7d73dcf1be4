use thiserror::Error;

/// Error taxonomy for game actions. Everything here is scoped to a single
/// action on a single game; the dispatch boundary logs these and moves on,
/// so one game's failure never reaches another game's state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown game id: {0}")]
    GameNotFound(String),

    #[error("game can no longer be joined")]
    GameNotJoinable,

    #[error("round reference {claimed} does not match current round {current:?}")]
    StaleRoundReference {
        claimed: i64,
        current: Option<i64>,
    },

    #[error("invalid rotation configuration: {0}")]
    InvalidRotationConfiguration(String),

    #[error("action targets a participant not in the game: {0}")]
    UnknownActionTarget(String),

    #[error("unknown dictionary: {0}")]
    UnknownDictionary(String),
}
