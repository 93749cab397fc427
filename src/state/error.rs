//! Error taxonomy shared by grids, game state and lobbies.
//!
//! Every error here rejects a single operation. None of them leave state
//! partially modified.

/// Errors raised by the state machines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Malformed construction arguments (shape or arity violations).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A position fell outside a grid's valid range.
    #[error("{context}: bounds check error: {value} not in bounds {lower},{upper}")]
    BoundsCheck {
        context: String,
        lower: usize,
        upper: usize,
        value: usize,
    },

    /// The operation is not valid for the current phase or state.
    #[error("game logic error: {0}")]
    GameLogic(String),

    /// A player name that is not part of the relevant roster.
    #[error("unknown player {0}")]
    UnknownPlayer(String),
}

impl GameError {
    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel(message.into())
    }

    pub fn game_logic(message: impl Into<String>) -> Self {
        Self::GameLogic(message.into())
    }

    pub fn unknown_player(player: impl Into<String>) -> Self {
        Self::UnknownPlayer(player.into())
    }

    /// True for game logic errors, including unknown player references.
    pub fn is_game_logic(&self) -> bool {
        matches!(self, Self::GameLogic(_) | Self::UnknownPlayer(_))
    }

    /// Short machine-readable name for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidModel(_) => "invalid_model",
            Self::BoundsCheck { .. } => "bounds_check",
            Self::GameLogic(_) => "game_logic",
            Self::UnknownPlayer(_) => "unknown_player",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_check_message() {
        let err = GameError::BoundsCheck {
            context: "invalid grid row coordinate 7".to_string(),
            lower: 0,
            upper: 5,
            value: 7,
        };
        assert_eq!(
            err.to_string(),
            "invalid grid row coordinate 7: bounds check error: 7 not in bounds 0,5"
        );
    }

    #[test]
    fn test_unknown_player_is_game_logic() {
        assert!(GameError::unknown_player("p4").is_game_logic());
        assert!(GameError::game_logic("nope").is_game_logic());
        assert!(!GameError::invalid_model("bad").is_game_logic());
        assert_eq!(GameError::unknown_player("p4").kind(), "unknown_player");
    }
}
