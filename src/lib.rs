//! Letterlock State Library
//!
//! This crate provides session state management for Letterlock, a
//! turn-based letter-placement game.
//!
//! # Overview
//!
//! - **Grids** - Each player fills a private square grid, one letter per round.
//!
//! - **Game State Machine** - One player announces a letter, everyone places
//!   it, and the round advances once all have placed. The game completes when
//!   every grid is full.
//!
//! - **Lobby Phases** - Waiting room, active game, pause on disconnect, and
//!   scores, with ready-votes and a leader who can start or reset.
//!
//! - **Lobby Workers** - Each lobby is owned by a single tokio task that
//!   applies events in arrival order.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - Invalid commands are rejected
//!    with a typed error and leave state untouched.
//!
//! 2. **One writer per lobby** - Only the lobby's worker task touches its state.
//!
//! 3. **No networking** - Transport, framing and scoring live outside this crate.
//!
//! 4. **Serialization-ready** - Commands and messages map to tagged JSON.
//!
//! # Example
//!
//! ```rust
//! use letterlock_state::config::LobbyConfig;
//! use letterlock_state::session::spawn_lobby;
//! use letterlock_state::state::{Command, GameState, Lobby, Scores};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lobby = Lobby::new("lobby-1", LobbyConfig::default(), |_: &GameState| Scores::new());
//! let (handle, mut outbound, _task) = spawn_lobby(lobby);
//!
//! handle.join("alice").await.unwrap();
//! handle.command("alice", Command::StartGame).await.unwrap();
//!
//! let first = outbound.recv().await.unwrap();
//! assert_eq!(first.message.as_str(), "lobby_phase");
//! # }
//! ```

pub mod config;
pub mod session;
pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
