//! State management module for Letterlock.
//!
//! This module provides the core state types:
//!
//! - `grid` - Per-player letter grids and bounds checking
//! - `game` - Round state machine (announce, place, complete)
//! - `player` - Presence state machine (connected or not)
//! - `lobby` - Lobby phases, roster and command routing
//! - `protocol` - Command and message vocabularies
//! - `scoring` - Boundary to the scoring collaborator
//! - `error` - Error taxonomy
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Lobby                             │
//! │                                                              │
//! │  members: [LobbyMember { name, PlayerState, joined_at }]     │
//! │                                                              │
//! │  phase ─┬─ Lobby                                             │
//! │         ├─ ActiveGame   { GameState }                        │
//! │         ├─ Disconnected { GameState, missing, ready }        │
//! │         └─ Scores       { scores, ready }                    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                      GameState                         │  │
//! │  │  players (turn order) ── current announcer ── status   │  │
//! │  │  grids: name → Grid                                    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!        ▲ (player, LobbyEvent)              │ Vec<Outbound>
//!        │                                   ▼
//! ```
//!
//! # Usage
//!
//! ```rust
//! use letterlock_state::config::LobbyConfig;
//! use letterlock_state::state::{Command, GameState, Lobby, LobbyEvent, Scores};
//!
//! let mut lobby = Lobby::new("lobby-1", LobbyConfig::default(), |_: &GameState| Scores::new());
//! lobby.handle("alice", LobbyEvent::Join).unwrap();
//! lobby.handle("bob", LobbyEvent::Join).unwrap();
//! lobby
//!     .handle("alice", LobbyEvent::Command(Command::StartGame))
//!     .unwrap();
//! assert_eq!(lobby.game().unwrap().current_announcing_player(), "alice");
//! ```

pub mod error;
pub mod game;
pub mod grid;
pub mod lobby;
pub mod player;
pub mod protocol;
pub mod scoring;

// Re-export commonly used types
pub use error::GameError;
pub use game::{GameState, GameStatus};
pub use grid::{Cell, Grid, Position, DEFAULT_GRID_DIMENSION};
pub use lobby::{Lobby, LobbyEvent, LobbyMember, LobbyPhase};
pub use player::{InvalidTransition, PlayerState, Presence, PresenceEvent};
pub use protocol::{Command, Message, Outbound, Recipient, Scores};
pub use scoring::Scorer;
