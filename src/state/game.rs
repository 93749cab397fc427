//! Game state management.
//!
//! Tracks one game's players, turn order, round status and per-player grids.
//!
//! # Round Cycle
//!
//! ```text
//!              process_announcement            finish_placement (not full)
//! ┌────────────┐ ───────────────▶ ┌──────────┐ ─────────────────────────┐
//! │ Announcing │                  │ Placing  │                          │
//! └────────────┘ ◀─────────────── └────┬─────┘                          │
//!        ▲                             │ finish_placement (full)        │
//!        │                             ▼                                │
//!        │                       ┌──────────┐                           │
//!        │                       │ Complete │                           │
//!        │                       └──────────┘                           │
//!        └──────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use super::error::GameError;
use super::grid::{single_char, Grid, Position};

/// Round status of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    /// Waiting for the current announcing player to name a letter
    Announcing,
    /// Every player places `letter`; `players_complete` have done so
    Placing {
        letter: char,
        players_complete: HashSet<String>,
    },
    /// Terminal
    Complete,
}

impl GameStatus {
    /// Build a placing status, validating the letter.
    pub fn placing<I>(letter: &str, players_complete: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = String>,
    {
        let letter = single_char(letter).ok_or_else(|| {
            GameError::invalid_model("letter to place may only be a single character")
        })?;
        Ok(Self::Placing {
            letter,
            players_complete: players_complete.into_iter().collect(),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Announcing => "announcing",
            Self::Placing { .. } => "placing",
            Self::Complete => "complete",
        }
    }

    /// Check if game is terminal (cannot change).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// State of a single game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Turn order
    players: Vec<String>,

    current_announcing_player: String,

    status: GameStatus,

    /// One grid per player, keyed by name
    grids: HashMap<String, Grid>,
}

impl GameState {
    /// Create a game state, validating player-set consistency.
    pub fn new(
        players: Vec<String>,
        current_announcing_player: impl Into<String>,
        status: GameStatus,
        grids: HashMap<String, Grid>,
    ) -> Result<Self, GameError> {
        let current_announcing_player = current_announcing_player.into();

        if players.is_empty() {
            return Err(GameError::invalid_model(
                "cannot create game state with no players",
            ));
        }

        let unique: HashSet<&String> = players.iter().collect();
        if unique.len() != players.len() {
            return Err(GameError::invalid_model(
                "player list contained duplicate names",
            ));
        }

        if !players.contains(&current_announcing_player) {
            return Err(GameError::invalid_model(format!(
                "current announcing player {} is not in the player list",
                current_announcing_player
            )));
        }

        if players.len() != grids.len() || players.iter().any(|p| !grids.contains_key(p)) {
            return Err(GameError::invalid_model(
                "provided game state grids did not match players",
            ));
        }

        if let GameStatus::Placing {
            players_complete, ..
        } = &status
        {
            if let Some(stray) = players_complete.iter().find(|p| !players.contains(p)) {
                return Err(GameError::invalid_model(format!(
                    "player {} marked complete is not in the player list",
                    stray
                )));
            }
        }

        Ok(Self {
            players,
            current_announcing_player,
            status,
            grids,
        })
    }

    /// Fresh game: empty grids, first player announcing.
    pub fn initial(players: Vec<String>, dimension: usize) -> Result<Self, GameError> {
        let first = players
            .first()
            .cloned()
            .ok_or_else(|| GameError::invalid_model("cannot create game state with no players"))?;

        let grids = players
            .iter()
            .map(|p| Grid::empty(dimension).map(|g| (p.clone(), g)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Self::new(players, first, GameStatus::Announcing, grids)
    }

    /// Players in turn order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn has_player(&self, player: &str) -> bool {
        self.players.iter().any(|p| p == player)
    }

    pub fn current_announcing_player(&self) -> &str {
        &self.current_announcing_player
    }

    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    /// The player after the current announcer, wrapping round.
    pub fn next_announcing_player(&self) -> &str {
        let idx = self.index_of(&self.current_announcing_player).unwrap_or(0);
        &self.players[(idx + 1) % self.players.len()]
    }

    /// Get a player's grid.
    pub fn grid_for(&self, player: &str) -> Result<&Grid, GameError> {
        if !self.has_player(player) {
            return Err(GameError::unknown_player(player));
        }
        self.grids
            .get(player)
            .ok_or_else(|| GameError::unknown_player(player))
    }

    /// Get a mutable handle to a player's grid.
    pub fn grid_for_mut(&mut self, player: &str) -> Result<&mut Grid, GameError> {
        if !self.has_player(player) {
            return Err(GameError::unknown_player(player));
        }
        self.grids
            .get_mut(player)
            .ok_or_else(|| GameError::unknown_player(player))
    }

    pub fn are_grids_full(&self) -> bool {
        self.grids.values().all(Grid::is_full)
    }

    /// Check whether every player has placed this round.
    pub fn all_placed(&self) -> bool {
        match &self.status {
            GameStatus::Placing {
                players_complete, ..
            } => self.players.iter().all(|p| players_complete.contains(p)),
            _ => false,
        }
    }

    /// Start the placing half of a round with the announced letter.
    pub fn process_announcement(&mut self, letter: &str) -> Result<(), GameError> {
        if self.status != GameStatus::Announcing {
            return Err(GameError::game_logic(format!(
                "attempting to process announcement while in {} state",
                self.status.as_str()
            )));
        }

        self.status = GameStatus::placing(letter, [])
            .map_err(|_| GameError::invalid_model("letter to announce may only be a single character"))?;
        Ok(())
    }

    /// Place this round's letter into `player`'s grid.
    pub fn place_letter(&mut self, player: &str, pos: Position) -> Result<(), GameError> {
        let (letter, already_placed) = match &self.status {
            GameStatus::Placing {
                letter,
                players_complete,
            } => (*letter, players_complete.contains(player)),
            other => {
                return Err(GameError::game_logic(format!(
                    "attempting to place letter for player {} while in {} state",
                    player,
                    other.as_str()
                )))
            }
        };

        if !self.has_player(player) {
            return Err(GameError::unknown_player(player));
        }

        if already_placed {
            return Err(GameError::game_logic(format!(
                "cannot place twice for player {} this round",
                player
            )));
        }

        self.grid_for_mut(player)?.place_char(letter, pos)?;
        if let GameStatus::Placing {
            players_complete, ..
        } = &mut self.status
        {
            players_complete.insert(player.to_string());
        }

        Ok(())
    }

    /// Close the round once everyone has placed.
    ///
    /// Advances the announcer and moves to `Complete` if every grid is
    /// full, otherwise back to `Announcing`.
    pub fn finish_placement(&mut self) -> Result<(), GameError> {
        if !matches!(self.status, GameStatus::Placing { .. }) {
            return Err(GameError::game_logic(format!(
                "cannot finish placement while in {} state",
                self.status.as_str()
            )));
        }

        if !self.all_placed() {
            return Err(GameError::game_logic(
                "cannot finish placement when not all players have placed",
            ));
        }

        self.current_announcing_player = self.next_announcing_player().to_string();

        self.status = if self.are_grids_full() {
            GameStatus::Complete
        } else {
            GameStatus::Announcing
        };

        Ok(())
    }

    /// Drop a player from the game, keeping the round-robin intact.
    ///
    /// A removed announcer hands over to their successor while announcing.
    /// Mid-placement the slot moves to their predecessor so the next round
    /// still starts with the successor.
    pub fn remove_player(&mut self, player: &str) -> Result<(), GameError> {
        let idx = self
            .index_of(player)
            .ok_or_else(|| GameError::unknown_player(player))?;

        if self.status.is_terminal() {
            return Err(GameError::game_logic(format!(
                "cannot remove player {} from a completed game",
                player
            )));
        }

        let count = self.players.len();
        if count == 1 {
            return Err(GameError::game_logic(format!(
                "removing player {} would leave no players",
                player
            )));
        }

        if self.current_announcing_player == player {
            let handover = match self.status {
                GameStatus::Placing { .. } => (idx + count - 1) % count,
                _ => (idx + 1) % count,
            };
            self.current_announcing_player = self.players[handover].clone();
        }

        self.players.remove(idx);
        self.grids.remove(player);
        if let GameStatus::Placing {
            players_complete, ..
        } = &mut self.status
        {
            players_complete.remove(player);
        }

        Ok(())
    }

    fn index_of(&self, player: &str) -> Option<usize> {
        self.players.iter().position(|p| p == player)
    }

    /// Convert to JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "players": self.players,
            "current_announcing_player": self.current_announcing_player,
            "status": self.status.as_str(),
        });
        if let GameStatus::Placing {
            letter,
            players_complete,
        } = &self.status
        {
            let mut complete: Vec<&String> = players_complete.iter().collect();
            complete.sort();
            obj["letter"] = serde_json::json!(letter.to_string());
            obj["players_complete"] = serde_json::json!(complete);
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(players: &[&str]) -> Vec<String> {
        players.iter().map(|p| p.to_string()).collect()
    }

    fn empty_grids(players: &[&str], dimension: usize) -> HashMap<String, Grid> {
        players
            .iter()
            .map(|p| (p.to_string(), Grid::empty(dimension).unwrap()))
            .collect()
    }

    /// 2x2 grid with every cell but (1, 1) already filled.
    fn three_quarter_grid() -> Grid {
        let mut grid = Grid::empty(2).unwrap();
        grid.place_char('x', Position::new(0, 0)).unwrap();
        grid.place_char('y', Position::new(0, 1)).unwrap();
        grid.place_char('z', Position::new(1, 0)).unwrap();
        grid
    }

    #[test]
    fn test_placing_status_validates_letter() {
        assert!(matches!(
            GameStatus::placing("potato", []),
            Err(GameError::InvalidModel(_))
        ));
        assert!(GameStatus::placing("a", []).is_ok());
    }

    #[test]
    fn test_new_requires_players() {
        let result = GameState::new(vec![], "p1", GameStatus::Announcing, HashMap::new());
        assert!(matches!(result, Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_new_requires_known_announcer() {
        let result = GameState::new(
            names(&["p1", "p2", "p3"]),
            "p4",
            GameStatus::Announcing,
            empty_grids(&["p1", "p2", "p3"], 5),
        );
        assert!(matches!(result, Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_new_rejects_extra_grid() {
        let result = GameState::new(
            names(&["p1", "p2", "p3"]),
            "p2",
            GameStatus::Announcing,
            empty_grids(&["p1", "p2", "p3", "p4"], 5),
        );
        assert!(matches!(result, Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_new_rejects_missing_grid() {
        let result = GameState::new(
            names(&["p1", "p2", "p3"]),
            "p2",
            GameStatus::Announcing,
            empty_grids(&["p1", "p2"], 5),
        );
        assert!(matches!(result, Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_players() {
        let result = GameState::new(
            names(&["p1", "p1"]),
            "p1",
            GameStatus::Announcing,
            empty_grids(&["p1", "p2"], 1),
        );
        assert!(matches!(result, Err(GameError::InvalidModel(_))));

        assert!(matches!(
            GameState::initial(names(&["p1", "p2", "p1"]), 3),
            Err(GameError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_new_succeeds() {
        let state = GameState::new(
            names(&["p1", "p2", "p3"]),
            "p2",
            GameStatus::Announcing,
            empty_grids(&["p3", "p1", "p2"], 5),
        )
        .unwrap();
        assert_eq!(state.current_announcing_player(), "p2");
    }

    #[test]
    fn test_initial() {
        assert!(matches!(
            GameState::initial(vec![], 5),
            Err(GameError::InvalidModel(_))
        ));
        assert!(matches!(
            GameState::initial(names(&["p1"]), 0),
            Err(GameError::InvalidModel(_))
        ));

        let state = GameState::initial(names(&["p1", "p2", "p3"]), 5).unwrap();
        assert_eq!(state.players(), names(&["p1", "p2", "p3"]).as_slice());
        assert_eq!(state.current_announcing_player(), "p1");
        assert_eq!(state.status(), &GameStatus::Announcing);
        for p in ["p1", "p2", "p3"] {
            assert!(state.grid_for(p).unwrap().all(|c, _| c.is_none()));
        }
    }

    #[test]
    fn test_next_announcing_player_wraps() {
        let mut state = GameState::initial(names(&["p1", "p2", "p3"]), 5).unwrap();
        assert_eq!(state.next_announcing_player(), "p2");

        state.current_announcing_player = "p3".to_string();
        assert_eq!(state.next_announcing_player(), "p1");
    }

    #[test]
    fn test_grid_for_unknown_player() {
        let mut state = GameState::initial(names(&["p1", "p2", "p3"]), 5).unwrap();
        assert!(matches!(state.grid_for("p4"), Err(GameError::UnknownPlayer(_))));

        state.process_announcement("a").unwrap();
        assert!(matches!(state.grid_for("p4"), Err(GameError::UnknownPlayer(_))));
        assert!(matches!(
            state.grid_for_mut("p4"),
            Err(GameError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_process_announcement() {
        let mut state = GameState::initial(names(&["p1", "p2"]), 3).unwrap();

        assert!(matches!(
            state.process_announcement("ab"),
            Err(GameError::InvalidModel(_))
        ));
        assert_eq!(state.status(), &GameStatus::Announcing);

        state.process_announcement("a").unwrap();
        assert_eq!(state.status(), &GameStatus::placing("a", []).unwrap());

        assert!(matches!(
            state.process_announcement("b"),
            Err(GameError::GameLogic(_))
        ));
    }

    #[test]
    fn test_place_letter_errors() {
        let mut state = GameState::initial(names(&["p1", "p2"]), 3).unwrap();

        // Not placing yet
        assert!(matches!(
            state.place_letter("p1", Position::new(0, 0)),
            Err(GameError::GameLogic(_))
        ));

        state.process_announcement("a").unwrap();
        assert!(matches!(
            state.place_letter("p9", Position::new(0, 0)),
            Err(GameError::UnknownPlayer(_))
        ));
        assert!(matches!(
            state.place_letter("p1", Position::new(3, 0)),
            Err(GameError::BoundsCheck { .. })
        ));

        // Failed placements do not count as placed
        state.place_letter("p1", Position::new(0, 0)).unwrap();
        assert!(matches!(
            state.place_letter("p1", Position::new(1, 1)),
            Err(GameError::GameLogic(_))
        ));
    }

    #[test]
    fn test_finish_placement_requires_everyone() {
        let mut state = GameState::initial(names(&["p1", "p2"]), 3).unwrap();
        assert!(matches!(state.finish_placement(), Err(GameError::GameLogic(_))));

        state.process_announcement("a").unwrap();
        state.place_letter("p1", Position::new(0, 0)).unwrap();
        assert!(!state.all_placed());
        assert!(matches!(state.finish_placement(), Err(GameError::GameLogic(_))));
    }

    #[test]
    fn test_two_player_round() {
        let mut state = GameState::new(
            names(&["p1", "p2"]),
            "p1",
            GameStatus::placing("a", []).unwrap(),
            empty_grids(&["p1", "p2"], 2),
        )
        .unwrap();

        state.place_letter("p1", Position::new(0, 0)).unwrap();
        assert!(matches!(
            state.place_letter("p1", Position::new(1, 1)),
            Err(GameError::GameLogic(_))
        ));
        state.place_letter("p2", Position::new(0, 0)).unwrap();

        state.finish_placement().unwrap();
        assert_eq!(state.status(), &GameStatus::Announcing);
        assert_eq!(state.current_announcing_player(), "p2");
        assert_eq!(state.grid_for("p2").unwrap().get(Position::new(0, 0)).unwrap(), Some('a'));
    }

    #[test]
    fn test_final_round_completes() {
        let grids: HashMap<String, Grid> = [
            ("p1".to_string(), three_quarter_grid()),
            ("p2".to_string(), three_quarter_grid()),
        ]
        .into_iter()
        .collect();
        let mut state = GameState::new(
            names(&["p1", "p2"]),
            "p1",
            GameStatus::placing("a", []).unwrap(),
            grids,
        )
        .unwrap();

        state.place_letter("p1", Position::new(1, 1)).unwrap();
        state.place_letter("p2", Position::new(1, 1)).unwrap();
        state.finish_placement().unwrap();

        assert_eq!(state.status(), &GameStatus::Complete);
        assert!(state.are_grids_full());
        assert!(matches!(
            state.process_announcement("b"),
            Err(GameError::GameLogic(_))
        ));
    }

    #[test]
    fn test_remove_player_while_announcing() {
        let mut state = GameState::initial(names(&["p1", "p2", "p3"]), 3).unwrap();
        state.remove_player("p1").unwrap();

        assert_eq!(state.players(), names(&["p2", "p3"]).as_slice());
        assert_eq!(state.current_announcing_player(), "p2");
        assert!(matches!(state.grid_for("p1"), Err(GameError::UnknownPlayer(_))));
    }

    #[test]
    fn test_remove_announcer_mid_placement() {
        let mut state = GameState::initial(names(&["p1", "p2", "p3"]), 3).unwrap();
        state.process_announcement("a").unwrap();
        state.place_letter("p1", Position::new(0, 0)).unwrap();
        state.place_letter("p3", Position::new(0, 0)).unwrap();

        state.remove_player("p1").unwrap();
        assert!(!state.all_placed());

        state.place_letter("p2", Position::new(0, 0)).unwrap();
        state.finish_placement().unwrap();

        // p2 was next after p1
        assert_eq!(state.current_announcing_player(), "p2");
    }

    #[test]
    fn test_remove_last_player_fails() {
        let mut state = GameState::initial(names(&["p1"]), 3).unwrap();
        assert!(matches!(state.remove_player("p1"), Err(GameError::GameLogic(_))));
        assert!(matches!(state.remove_player("p2"), Err(GameError::UnknownPlayer(_))));
        assert_eq!(state.players(), names(&["p1"]).as_slice());
    }

    #[test]
    fn test_to_json() {
        let mut state = GameState::initial(names(&["p1", "p2"]), 3).unwrap();
        state.process_announcement("q").unwrap();
        state.place_letter("p2", Position::new(2, 2)).unwrap();

        let json = state.to_json();
        assert_eq!(json["status"], "placing");
        assert_eq!(json["letter"], "q");
        assert_eq!(json["players_complete"], serde_json::json!(["p2"]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn initial_state_starts_with_first_player(count in 1usize..6, dimension in 1usize..6) {
                let players: Vec<String> = (0..count).map(|i| format!("p{}", i)).collect();
                let state = GameState::initial(players.clone(), dimension).unwrap();
                prop_assert_eq!(state.current_announcing_player(), players[0].as_str());
                prop_assert_eq!(state.status(), &GameStatus::Announcing);
            }

            #[test]
            fn full_round_advances_announcer(count in 1usize..5, dimension in 1usize..4, rounds in 1usize..8) {
                let players: Vec<String> = (0..count).map(|i| format!("p{}", i)).collect();
                let mut state = GameState::initial(players.clone(), dimension).unwrap();
                let cells = dimension * dimension;

                for round in 0..rounds.min(cells) {
                    let expected_next = state.next_announcing_player().to_string();
                    state.process_announcement("a").unwrap();
                    let pos = Position::new(round / dimension, round % dimension);
                    for p in &players {
                        state.place_letter(p, pos).unwrap();
                        prop_assert!(state.place_letter(p, pos).unwrap_err().is_game_logic());
                    }
                    state.finish_placement().unwrap();

                    prop_assert_eq!(state.current_announcing_player(), expected_next.as_str());
                    if round + 1 == cells {
                        prop_assert_eq!(state.status(), &GameStatus::Complete);
                    } else {
                        prop_assert_eq!(state.status(), &GameStatus::Announcing);
                    }
                }
            }
        }
    }
}
