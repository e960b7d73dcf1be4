//! Outbound channel capability handed to game aggregates.
//!
//! Each connected participant owns one WebSocket; the writer task for that
//! socket drains an unbounded mpsc queue. Game code only ever sees this
//! handle: pushing an event is fire-and-forget, and a closed peer never
//! aborts a broadcast loop or the state mutation that preceded it.

use log::{debug, error, info};
use shared::ServerEvent;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Sender half of one participant connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    user_id_hash: String,
    session_id: String,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(
        user_id_hash: String,
        session_id: String,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            user_id_hash,
            session_id,
            tx,
        }
    }

    /// Stable opaque identity of the participant behind this connection.
    pub fn user_id_hash(&self) -> &str {
        &self.user_id_hash
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Serializes and queues one event frame. Best-effort: serialization
    /// failures are logged, a closed peer is logged at debug level, and
    /// neither is reported to the caller.
    pub fn send(&self, game_id: Option<&str>, event: &ServerEvent) {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                error!(
                    "failed to serialize event {} for {}: {}",
                    event.name(),
                    self.user_id_hash,
                    e
                );
                return;
            }
        };

        info!(
            "sending event:{} gameId:{} userIdHash:{} sessionId:{}",
            event.name(),
            game_id.unwrap_or("-"),
            self.user_id_hash,
            self.session_id
        );

        if self.tx.send(Message::Text(text)).is_err() {
            debug!(
                "connection closed for {}; dropped event {}",
                self.user_id_hash,
                event.name()
            );
        }
    }
}
