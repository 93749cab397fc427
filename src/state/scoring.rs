//! Scoring collaborator.
//!
//! How a finished grid turns into points is decided outside this crate.
//! Lobbies only ask for a score table once a game completes.

use super::game::GameState;
use super::protocol::Scores;

/// Computes final scores for a completed game.
pub trait Scorer: Send + 'static {
    fn score(&self, game: &GameState) -> Scores;
}

impl<F> Scorer for F
where
    F: Fn(&GameState) -> Scores + Send + 'static,
{
    fn score(&self, game: &GameState) -> Scores {
        self(game)
    }
}
