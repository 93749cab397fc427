//! Commands players issue to a lobby and messages the lobby sends back.
//!
//! Both vocabularies are closed enums tagged by `kind` on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::grid::Position;

/// Final scores keyed by player name.
pub type Scores = BTreeMap<String, f64>;

/// Commands a player can issue within a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Leader only: start the game
    StartGame,
    /// Announce the letter for this round
    Announce { letter: String },
    /// Place the announced letter
    Place { pos: Position },
    /// Ready to leave the scores screen
    ReadyShowScores,
    /// Leader only: return to the waiting room
    ResetLobby,
    /// Ready to carry on without the disconnected players
    ReadyContinuePlayWithoutPlayer,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::Announce { .. } => "announce",
            Self::Place { .. } => "place",
            Self::ReadyShowScores => "ready_show_scores",
            Self::ResetLobby => "reset_lobby",
            Self::ReadyContinuePlayWithoutPlayer => "ready_continue_play_without_player",
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Messages the lobby sends to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Roster of the waiting room
    LobbyPhase { players: Vec<String> },

    /// Game started, resumed, or continued without someone
    EnteringActiveGame { players: Vec<String> },

    EnteringAnnouncementMode {
        #[serde(rename = "announcingPlayer")]
        announcing_player: String,
        grid: Vec<Vec<String>>,
    },

    EnteringPlacementMode {
        letter: String,
        grid: Vec<Vec<String>>,
    },

    PlacementAck,

    GameCompleted { grid: Vec<Vec<String>> },

    /// Game paused on a disconnect
    EnteringDisconnectPhase {
        #[serde(rename = "disconnectedPlayers")]
        disconnected_players: Vec<String>,
    },

    EnteringScoresPhase { scores: Scores },

    EndingLobby,
}

impl Message {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LobbyPhase { .. } => "lobby_phase",
            Self::EnteringActiveGame { .. } => "entering_active_game",
            Self::EnteringAnnouncementMode { .. } => "entering_announcement_mode",
            Self::EnteringPlacementMode { .. } => "entering_placement_mode",
            Self::PlacementAck => "placement_ack",
            Self::GameCompleted { .. } => "game_completed",
            Self::EnteringDisconnectPhase { .. } => "entering_disconnect_phase",
            Self::EnteringScoresPhase { .. } => "entering_scores_phase",
            Self::EndingLobby => "ending_lobby",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"kind": self.as_str()}))
    }
}

/// Who a message is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected lobby member
    All,
    /// A single player
    Player(String),
}

/// A message addressed to its recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: Message,
}

impl Outbound {
    pub fn all(message: Message) -> Self {
        Self {
            to: Recipient::All,
            message,
        }
    }

    pub fn to(player: impl Into<String>, message: Message) -> Self {
        Self {
            to: Recipient::Player(player.into()),
            message,
        }
    }
}
