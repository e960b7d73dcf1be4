//! # Word Game Server Library
//!
//! This library implements the authoritative server for a real-time,
//! many-player word-guessing party game. Players contribute words into a
//! shared pool ("the hat"), then take turns where one player explains the
//! current word while a designated guesser tries to name it. The server is
//! the single source of truth for whose turn it is, what the current word
//! is, how score accrues, and when the game ends.
//!
//! ## Core Responsibilities
//!
//! ### Turn Scheduling
//! The scheduler assigns explainer/guesser roles across rounds under
//! multiple rotation strategies (a cycling ring, random pairs, pre-assigned
//! pairs). The assignment math is bijective: any sequence of rounds can be
//! rewound exactly, which is what the round-replay feature relies on.
//!
//! ### Round Lifecycle
//! Each round is gated behind a two-party confirmation handshake. Once both
//! active players confirm, the head word is handed to the explainer only;
//! every other participant, the guesser included, receives an explicit
//! no-word signal. Guessed words score both active players, and the game
//! ends when a hand-out finds the pool empty.
//!
//! ### Game Isolation
//! Every game runs on its own worker task that exclusively owns the game
//! state and applies actions in arrival order. One game's failure is logged
//! and contained; other games never notice.
//!
//! ## Module Organization
//!
//! - [`scheduler`]: pure rotation state machine with exact reversal
//! - [`words`]: the shared word pool and per-player contributions
//! - [`participant`]: participants and their score ledgers
//! - [`game`]: the aggregate tying roster, lifecycle, pool, and scores
//!   together
//! - [`registry`]: game id to worker-task routing
//! - [`dispatch`]: inbound event to aggregate operation mapping, and the
//!   per-action error boundary
//! - [`connection`]: the best-effort outbound channel per participant
//! - [`network`]: WebSocket accept loop and identity derivation
//! - [`dictionary`]: canned word dictionaries loaded at startup
//! - [`error`]: the error taxonomy shared by all of the above
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{dictionary, network, registry::GameRegistry};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dictionaries = dictionary::load_dir("dicts".as_ref())?;
//!     let registry = Arc::new(GameRegistry::new(Arc::new(dictionaries)));
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     network::run(listener, registry).await;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod dictionary;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod network;
pub mod participant;
pub mod registry;
pub mod scheduler;
pub mod words;
