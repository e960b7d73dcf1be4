//! WebSocket front end: accepting clients, deriving identities, and pumping
//! frames between sockets and the game registry.
//!
//! Identity comes from the handshake's Cookie header: the client-supplied
//! `userId` secret is hashed (blake3) into the opaque participant id the
//! rest of the server keys on, and the secret itself never travels further
//! than this module. A `sessionId` cookie rides along for log correlation.

use crate::connection::ConnectionHandle;
use crate::registry::{GameAction, GameRegistry};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use shared::ClientEvent;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

/// Identity derived from the handshake cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub user_id_hash: String,
    pub session_id: String,
}

/// One-way hash of the client-supplied secret into the stable opaque
/// participant id. The core treats the result as an opaque key.
pub fn derive_identity(user_id: &str, session_id: Option<&str>) -> ClientIdentity {
    ClientIdentity {
        user_id_hash: blake3::hash(user_id.as_bytes()).to_hex().to_string(),
        session_id: session_id.unwrap_or("-").to_string(),
    }
}

/// Pulls the `userId` and `sessionId` values out of a Cookie header.
pub fn parse_cookies(header: &str) -> (Option<String>, Option<String>) {
    let mut user_id = None;
    let mut session_id = None;
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("userId=") {
            user_id = Some(value.to_string());
        } else if let Some(value) = part.strip_prefix("sessionId=") {
            session_id = Some(value.to_string());
        }
    }
    (user_id, session_id)
}

/// Accept loop: spawns one task per incoming connection.
pub async fn run(listener: TcpListener, registry: Arc<GameRegistry>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, registry).await {
                        info!("connection from {} closed: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("accept failed: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    registry: Arc<GameRegistry>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let mut user_id = None;
    let mut session_id = None;
    let websocket =
        tokio_tungstenite::accept_hdr_async(stream, |request: &Request, response: Response| {
            if let Some(cookie) = request
                .headers()
                .get("cookie")
                .and_then(|value| value.to_str().ok())
            {
                let (uid, sid) = parse_cookies(cookie);
                user_id = uid;
                session_id = sid;
            }
            if user_id.is_none() {
                warn!("rejecting client without a userId cookie");
                let mut rejection = ErrorResponse::new(Some("userId cookie required".to_string()));
                *rejection.status_mut() = StatusCode::BAD_REQUEST;
                return Err(rejection);
            }
            Ok(response)
        })
        .await?;

    let identity = derive_identity(&user_id.unwrap_or_default(), session_id.as_deref());
    info!(
        "client connected userIdHash:{} sessionId:{}",
        identity.user_id_hash, identity.session_id
    );

    let (mut sink, mut source) = websocket.split();
    let (tx, mut outbound) = mpsc::unbounded_channel::<Message>();

    // Writer task: drains the outbound queue until the peer goes away.
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let handle = ConnectionHandle::new(
        identity.user_id_hash.clone(),
        identity.session_id.clone(),
        tx,
    );

    while let Some(message) = source.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                info!("read error for {}: {}", identity.user_id_hash, e);
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let event: ClientEvent = match serde_json::from_str(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(
                            "dropping malformed frame from userIdHash:{}: {}",
                            identity.user_id_hash, e
                        );
                        continue;
                    }
                };
                info!(
                    "received event:{} gameId:{} userIdHash:{} sessionId:{}",
                    event.name(),
                    event.game_id().unwrap_or("-"),
                    identity.user_id_hash,
                    identity.session_id
                );

                if let ClientEvent::CreateGame { game, .. } = &event {
                    registry.create_game(game.clone(), &handle).await;
                } else if let Some(game_id) = event.game_id().map(str::to_string) {
                    registry
                        .route(
                            &game_id,
                            GameAction {
                                origin: handle.clone(),
                                event,
                            },
                        )
                        .await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("client disconnected userIdHash:{}", identity.user_id_hash);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let (user_id, session_id) = parse_cookies("userId=secret-1; sessionId=abc");
        assert_eq!(user_id.as_deref(), Some("secret-1"));
        assert_eq!(session_id.as_deref(), Some("abc"));

        let (user_id, session_id) = parse_cookies("theme=dark; userId=u2");
        assert_eq!(user_id.as_deref(), Some("u2"));
        assert_eq!(session_id, None);

        let (user_id, session_id) = parse_cookies("");
        assert_eq!(user_id, None);
        assert_eq!(session_id, None);
    }

    #[test]
    fn test_identity_is_stable_and_opaque() {
        let first = derive_identity("my-secret", Some("s1"));
        let again = derive_identity("my-secret", Some("s2"));
        let other = derive_identity("other-secret", Some("s1"));

        // Same secret, same id, regardless of session.
        assert_eq!(first.user_id_hash, again.user_id_hash);
        assert_ne!(first.user_id_hash, other.user_id_hash);
        // The secret never appears in the derived id.
        assert!(!first.user_id_hash.contains("my-secret"));
        assert_eq!(first.session_id, "s1");
    }

    #[test]
    fn test_identity_without_session_cookie() {
        let identity = derive_identity("secret", None);
        assert_eq!(identity.session_id, "-");
    }
}
