//! Player presence state machine.
//!
//! Tracks whether a lobby member currently has a live connection and
//! validates transitions.
//!
//! # State Diagram
//!
//! ```text
//! ┌───────────┐   disconnect   ┌──────────────┐
//! │ Connected │───────────────▶│ Disconnected │
//! │           │◀───────────────│   (since)    │
//! └───────────┘    connect     └──────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

use super::error::GameError;

/// Whether a player is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Presence {
    /// Has a live connection
    #[default]
    Connected,

    /// Connection dropped; still a lobby member
    Disconnected { since: DateTime<Utc> },
}

impl Presence {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// When the player dropped, if they have.
    pub fn disconnected_since(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Disconnected { since } => Some(*since),
            Self::Connected => None,
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected { since } => write!(f, "Disconnected({})", since.to_rfc3339()),
        }
    }
}

/// Presence transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    Connect,
    Disconnect,
}

/// Error when a presence transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Presence,
    pub event: PresenceEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

impl From<InvalidTransition> for GameError {
    fn from(err: InvalidTransition) -> Self {
        GameError::game_logic(err.to_string())
    }
}

/// Player presence state machine.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    presence: Presence,
}

impl PlayerState {
    /// Create a new connected player state.
    pub fn new() -> Self {
        Self {
            presence: Presence::Connected,
        }
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Apply an event, returning the new state or an error.
    pub fn apply(&self, event: PresenceEvent) -> Result<Self, InvalidTransition> {
        let presence = self.transition(event)?;
        Ok(Self { presence })
    }

    /// Apply an event in place, returning error if invalid.
    pub fn apply_mut(&mut self, event: PresenceEvent) -> Result<(), InvalidTransition> {
        self.presence = self.transition(event)?;
        Ok(())
    }

    fn transition(&self, event: PresenceEvent) -> Result<Presence, InvalidTransition> {
        use Presence::*;
        use PresenceEvent::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: self.presence.clone(),
            event,
            reason,
        };

        match (&self.presence, event) {
            (Disconnected { .. }, Connect) => Ok(Connected),
            (Connected, Connect) => Err(invalid("Already connected")),

            (Connected, Disconnect) => Ok(Disconnected { since: Utc::now() }),
            (Disconnected { .. }, Disconnect) => Err(invalid("Already disconnected")),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.presence.is_connected()
    }
}
