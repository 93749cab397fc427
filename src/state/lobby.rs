//! Lobby state management.
//!
//! A lobby owns one session's roster and its outer phase. It routes game
//! commands into the embedded [`GameState`] and reconciles players dropping
//! and returning.
//!
//! # Phases
//!
//! ```text
//!              start_game                 disconnect
//! ┌───────┐ ─────────────▶ ┌────────────┐ ──────────▶ ┌──────────────┐
//! │ Lobby │                │ ActiveGame │             │ Disconnected │
//! └───────┘ ◀──┐           └─────┬──────┘ ◀────────── └──────────────┘
//!              │                 │ complete   reconnect / continue
//!              │ all ready /     ▼
//!              │ reset      ┌────────┐
//!              └─────────── │ Scores │
//!                           └────────┘
//! ```
//!
//! `reset_lobby` from the leader returns to `Lobby` from any phase.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};

use super::error::GameError;
use super::game::{GameState, GameStatus};
use super::grid::Position;
use super::player::{PlayerState, PresenceEvent};
use super::protocol::{Command, Message, Outbound, Scores};
use super::scoring::Scorer;
use crate::config::LobbyConfig;

/// A player's membership in a lobby.
#[derive(Debug, Clone)]
pub struct LobbyMember {
    /// Display name, unique within the lobby
    pub name: String,

    state: PlayerState,

    /// When player joined this lobby
    pub joined_at: DateTime<Utc>,
}

impl LobbyMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: PlayerState::new(),
            joined_at: Utc::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }
}

/// Outer phase of a lobby.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyPhase {
    /// Waiting room
    Lobby,

    ActiveGame {
        game: GameState,
    },

    /// Game paused until the missing players return or everyone else
    /// agrees to carry on without them
    Disconnected {
        game: GameState,
        missing_players: Vec<String>,
        ready_to_continue: HashSet<String>,
    },

    Scores {
        scores: Scores,
        ready_to_show_scores: HashSet<String>,
    },
}

impl LobbyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::ActiveGame { .. } => "active_game",
            Self::Disconnected { .. } => "disconnected",
            Self::Scores { .. } => "scores",
        }
    }
}

/// Events a lobby consumes, each issued by a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    Join,
    Leave,
    Disconnect,
    Reconnect,
    Command(Command),
}

/// One game session's lobby.
pub struct Lobby {
    /// Unique lobby ID
    pub id: String,

    config: LobbyConfig,

    /// Members in join order; the first is the leader
    members: Vec<LobbyMember>,

    phase: LobbyPhase,

    scorer: Box<dyn Scorer>,

    ended: bool,

    /// When lobby was created
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Lobby {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lobby")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("members", &self.members)
            .field("phase", &self.phase)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl Lobby {
    /// Create an empty lobby in the waiting room.
    pub fn new(id: impl Into<String>, config: LobbyConfig, scorer: impl Scorer) -> Self {
        Self {
            id: id.into(),
            config,
            members: Vec::new(),
            phase: LobbyPhase::Lobby,
            scorer: Box::new(scorer),
            ended: false,
            created_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn phase(&self) -> &LobbyPhase {
        &self.phase
    }

    /// The game being played or paused, if any.
    pub fn game(&self) -> Option<&GameState> {
        match &self.phase {
            LobbyPhase::ActiveGame { game } | LobbyPhase::Disconnected { game, .. } => Some(game),
            _ => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The earliest joiner still in the roster.
    pub fn leader(&self) -> Option<&str> {
        self.members.first().map(|m| m.name.as_str())
    }

    pub fn is_leader(&self, player: &str) -> bool {
        self.leader() == Some(player)
    }

    pub fn member(&self, player: &str) -> Option<&LobbyMember> {
        self.members.iter().find(|m| m.name == player)
    }

    pub fn has_member(&self, player: &str) -> bool {
        self.member(player).is_some()
    }

    /// Roster names in join order.
    pub fn players(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn connected_players(&self) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| m.is_connected())
            .map(|m| m.name.clone())
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_connected()).count()
    }

    /// Apply one event from `player`.
    ///
    /// On error nothing has changed and the error is meant for `player` only.
    pub fn handle(&mut self, player: &str, event: LobbyEvent) -> Result<Vec<Outbound>, GameError> {
        if self.ended {
            return Err(GameError::game_logic(format!("lobby {} has ended", self.id)));
        }

        let result = match event {
            LobbyEvent::Join => self.join(player),
            LobbyEvent::Leave => self.leave(player),
            LobbyEvent::Disconnect => self.disconnect(player),
            LobbyEvent::Reconnect => self.reconnect(player),
            LobbyEvent::Command(command) => self.apply_command(player, command),
        };

        if let Err(e) = &result {
            tracing::debug!(
                lobby = %self.id,
                player,
                phase = self.phase.as_str(),
                kind = e.kind(),
                error = %e,
                "Rejected lobby event"
            );
        }
        result
    }

    /// Tear the lobby down.
    pub fn shutdown(&mut self) -> Vec<Outbound> {
        if self.ended {
            return Vec::new();
        }
        self.end()
    }

    fn apply_command(&mut self, player: &str, command: Command) -> Result<Vec<Outbound>, GameError> {
        tracing::debug!(lobby = %self.id, player, command = command.as_str(), "Applying command");

        match command {
            Command::StartGame => self.start_game(player),
            Command::Announce { letter } => self.announce(player, &letter),
            Command::Place { pos } => self.place(player, pos),
            Command::ReadyShowScores => self.ready_show_scores(player),
            Command::ResetLobby => self.reset_lobby(player),
            Command::ReadyContinuePlayWithoutPlayer => self.ready_continue(player),
        }
    }

    // Presence

    fn join(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        if let Some(member) = self.member(player) {
            if member.is_connected() {
                return Ok(Vec::new());
            }
            return self.reconnect(player);
        }

        if !matches!(self.phase, LobbyPhase::Lobby) {
            return Err(GameError::game_logic(format!(
                "cannot join lobby {} while in {} phase",
                self.id,
                self.phase.as_str()
            )));
        }

        self.members.push(LobbyMember::new(player));
        tracing::info!(lobby = %self.id, player, "Player joined lobby");

        Ok(vec![self.lobby_phase_message()])
    }

    fn leave(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        let idx = self.member_index(player)?;

        match &mut self.phase {
            LobbyPhase::Lobby => {
                self.members.remove(idx);
                tracing::info!(lobby = %self.id, player, "Player left lobby");
                Ok(self.after_roster_shrank())
            }
            LobbyPhase::ActiveGame { .. } | LobbyPhase::Disconnected { .. } => {
                if self.members[idx].is_connected() {
                    self.disconnect(player)
                } else {
                    Ok(Vec::new())
                }
            }
            LobbyPhase::Scores {
                ready_to_show_scores,
                ..
            } => {
                ready_to_show_scores.remove(player);
                self.members.remove(idx);
                tracing::info!(lobby = %self.id, player, "Player left lobby");
                if self.connected_count() == 0 {
                    return Ok(self.end());
                }
                Ok(self.check_scores_ready())
            }
        }
    }

    fn disconnect(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        let idx = self.member_index(player)?;

        if matches!(self.phase, LobbyPhase::Lobby) {
            self.members.remove(idx);
            tracing::info!(lobby = %self.id, player, "Player dropped from waiting room");
            return Ok(self.after_roster_shrank());
        }

        self.members[idx]
            .state
            .apply_mut(PresenceEvent::Disconnect)?;
        tracing::info!(lobby = %self.id, player, phase = self.phase.as_str(), "Player disconnected");

        if self.connected_count() == 0 {
            return Ok(self.end());
        }

        match std::mem::replace(&mut self.phase, LobbyPhase::Lobby) {
            LobbyPhase::ActiveGame { game } => {
                if !game.has_player(player) {
                    self.phase = LobbyPhase::ActiveGame { game };
                    return Ok(Vec::new());
                }
                let missing_players = vec![player.to_string()];
                let message = Message::EnteringDisconnectPhase {
                    disconnected_players: missing_players.clone(),
                };
                self.transition(LobbyPhase::Disconnected {
                    game,
                    missing_players,
                    ready_to_continue: HashSet::new(),
                });
                Ok(vec![Outbound::all(message)])
            }
            LobbyPhase::Disconnected {
                game,
                mut missing_players,
                ..
            } => {
                if game.has_player(player) && !missing_players.iter().any(|m| m == player) {
                    missing_players.push(player.to_string());
                }
                let message = Message::EnteringDisconnectPhase {
                    disconnected_players: missing_players.clone(),
                };
                // Votes were cast for a different set of missing players
                self.phase = LobbyPhase::Disconnected {
                    game,
                    missing_players,
                    ready_to_continue: HashSet::new(),
                };
                Ok(vec![Outbound::all(message)])
            }
            LobbyPhase::Scores {
                scores,
                mut ready_to_show_scores,
            } => {
                ready_to_show_scores.remove(player);
                self.phase = LobbyPhase::Scores {
                    scores,
                    ready_to_show_scores,
                };
                Ok(self.check_scores_ready())
            }
            LobbyPhase::Lobby => Ok(Vec::new()),
        }
    }

    fn reconnect(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        let idx = self.member_index(player)?;
        self.members[idx].state.apply_mut(PresenceEvent::Connect)?;
        tracing::info!(lobby = %self.id, player, phase = self.phase.as_str(), "Player reconnected");

        match std::mem::replace(&mut self.phase, LobbyPhase::Lobby) {
            LobbyPhase::Disconnected {
                game,
                mut missing_players,
                ready_to_continue,
            } => {
                missing_players.retain(|m| m != player);
                if missing_players.is_empty() {
                    return self.resume(game);
                }
                let message = Message::EnteringDisconnectPhase {
                    disconnected_players: missing_players.clone(),
                };
                self.phase = LobbyPhase::Disconnected {
                    game,
                    missing_players,
                    ready_to_continue,
                };
                Ok(vec![Outbound::all(message)])
            }
            LobbyPhase::Scores {
                scores,
                ready_to_show_scores,
            } => {
                let message = Message::EnteringScoresPhase {
                    scores: scores.clone(),
                };
                self.phase = LobbyPhase::Scores {
                    scores,
                    ready_to_show_scores,
                };
                Ok(vec![Outbound::to(player, message)])
            }
            phase => {
                self.phase = phase;
                Ok(Vec::new())
            }
        }
    }

    // Commands

    fn start_game(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        if !matches!(self.phase, LobbyPhase::Lobby) {
            return Err(GameError::game_logic(format!(
                "cannot start game while in {} phase",
                self.phase.as_str()
            )));
        }
        self.require_leader(player)?;

        let players = self.connected_players();
        if players.is_empty() {
            return Err(GameError::game_logic("cannot start game with no players"));
        }

        let game = GameState::initial(players.clone(), self.config.grid_dimension)?;
        let mut out = vec![Outbound::all(Message::EnteringActiveGame { players })];
        out.extend(game_mode_messages(&game));
        self.transition(LobbyPhase::ActiveGame { game });

        Ok(out)
    }

    fn announce(&mut self, player: &str, letter: &str) -> Result<Vec<Outbound>, GameError> {
        let game = self.active_game_mut()?;

        if !game.has_player(player) {
            return Err(GameError::unknown_player(player));
        }
        if *game.status() == GameStatus::Announcing && game.current_announcing_player() != player {
            return Err(GameError::game_logic(format!(
                "it is {}'s turn to announce, not {}",
                game.current_announcing_player(),
                player
            )));
        }

        game.process_announcement(letter)?;
        Ok(game_mode_messages(game))
    }

    fn place(&mut self, player: &str, pos: Position) -> Result<Vec<Outbound>, GameError> {
        let game = self.active_game_mut()?;
        game.place_letter(player, pos)?;

        let mut out = vec![Outbound::to(player, Message::PlacementAck)];
        if game.all_placed() {
            out.extend(self.advance_round()?);
        }
        Ok(out)
    }

    fn ready_show_scores(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        self.member_index(player)?;
        let phase = self.phase.as_str();
        let LobbyPhase::Scores {
            ready_to_show_scores,
            ..
        } = &mut self.phase
        else {
            return Err(GameError::game_logic(format!(
                "cannot mark ready for scores while in {} phase",
                phase
            )));
        };

        ready_to_show_scores.insert(player.to_string());
        Ok(self.check_scores_ready())
    }

    fn reset_lobby(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        self.require_leader(player)?;
        tracing::info!(lobby = %self.id, player, phase = self.phase.as_str(), "Leader reset lobby");
        Ok(self.enter_lobby_phase())
    }

    fn ready_continue(&mut self, player: &str) -> Result<Vec<Outbound>, GameError> {
        self.member_index(player)?;
        let phase = self.phase.as_str();
        let LobbyPhase::Disconnected {
            missing_players,
            ready_to_continue,
            ..
        } = &mut self.phase
        else {
            return Err(GameError::game_logic(format!(
                "cannot continue without players while in {} phase",
                phase
            )));
        };

        if missing_players.iter().any(|m| m == player) {
            return Err(GameError::game_logic(format!(
                "player {} is disconnected",
                player
            )));
        }

        let newly_ready = ready_to_continue.insert(player.to_string());
        let result = self.check_continue();
        if result.is_err() && newly_ready {
            if let LobbyPhase::Disconnected {
                ready_to_continue, ..
            } = &mut self.phase
            {
                ready_to_continue.remove(player);
            }
        }
        result
    }

    // Transitions

    /// Continue without the missing players once every present player agrees.
    fn check_continue(&mut self) -> Result<Vec<Outbound>, GameError> {
        let LobbyPhase::Disconnected {
            game,
            missing_players,
            ready_to_continue,
        } = &self.phase
        else {
            return Ok(Vec::new());
        };

        let everyone_ready = self
            .members
            .iter()
            .filter(|m| m.is_connected())
            .all(|m| ready_to_continue.contains(&m.name));
        if !everyone_ready {
            return Ok(Vec::new());
        }

        let mut game = game.clone();
        for missing in missing_players {
            game.remove_player(missing)?;
        }

        let departed = missing_players.clone();
        self.members.retain(|m| !departed.contains(&m.name));
        tracing::info!(lobby = %self.id, departed = ?departed, "Continuing without players");

        self.resume(game)
    }

    /// Back to the active game, finishing the round if nobody is left to place.
    fn resume(&mut self, game: GameState) -> Result<Vec<Outbound>, GameError> {
        let mut out = vec![Outbound::all(Message::EnteringActiveGame {
            players: game.players().to_vec(),
        })];
        let round_done = game.all_placed();
        if !round_done {
            out.extend(game_mode_messages(&game));
        }

        self.transition(LobbyPhase::ActiveGame { game });
        if round_done {
            out.extend(self.advance_round()?);
        }
        Ok(out)
    }

    fn advance_round(&mut self) -> Result<Vec<Outbound>, GameError> {
        let LobbyPhase::ActiveGame { game } = &mut self.phase else {
            return Err(GameError::game_logic("no active game"));
        };

        game.finish_placement()?;
        let mut out = game_mode_messages(game);
        if !game.status().is_terminal() {
            return Ok(out);
        }

        let scores = self.scorer.score(game);
        tracing::info!(lobby = %self.id, "Game completed");
        out.push(Outbound::all(Message::EnteringScoresPhase {
            scores: scores.clone(),
        }));
        self.transition(LobbyPhase::Scores {
            scores,
            ready_to_show_scores: HashSet::new(),
        });
        Ok(out)
    }

    fn check_scores_ready(&mut self) -> Vec<Outbound> {
        let everyone_ready = match &self.phase {
            LobbyPhase::Scores {
                ready_to_show_scores,
                ..
            } => self
                .members
                .iter()
                .filter(|m| m.is_connected())
                .all(|m| ready_to_show_scores.contains(&m.name)),
            _ => false,
        };

        if everyone_ready {
            self.enter_lobby_phase()
        } else {
            Vec::new()
        }
    }

    /// Return to the waiting room, dropping anyone who is not connected.
    fn enter_lobby_phase(&mut self) -> Vec<Outbound> {
        self.members.retain(|m| m.is_connected());
        self.transition(LobbyPhase::Lobby);
        self.after_roster_shrank()
    }

    fn after_roster_shrank(&mut self) -> Vec<Outbound> {
        if self.connected_count() == 0 {
            return self.end();
        }
        vec![self.lobby_phase_message()]
    }

    fn end(&mut self) -> Vec<Outbound> {
        self.ended = true;
        tracing::info!(lobby = %self.id, "Lobby ended");
        vec![Outbound::all(Message::EndingLobby)]
    }

    fn transition(&mut self, phase: LobbyPhase) {
        tracing::info!(
            lobby = %self.id,
            from = self.phase.as_str(),
            to = phase.as_str(),
            "Lobby phase changed"
        );
        self.phase = phase;
    }

    // Helpers

    fn member_index(&self, player: &str) -> Result<usize, GameError> {
        self.members
            .iter()
            .position(|m| m.name == player)
            .ok_or_else(|| GameError::unknown_player(player))
    }

    fn require_leader(&self, player: &str) -> Result<(), GameError> {
        self.member_index(player)?;
        if !self.is_leader(player) {
            return Err(GameError::game_logic(format!(
                "player {} is not the lobby leader",
                player
            )));
        }
        Ok(())
    }

    fn active_game_mut(&mut self) -> Result<&mut GameState, GameError> {
        match &mut self.phase {
            LobbyPhase::ActiveGame { game } => Ok(game),
            LobbyPhase::Disconnected { .. } => Err(GameError::game_logic("game paused")),
            phase => Err(GameError::game_logic(format!(
                "no active game while in {} phase",
                phase.as_str()
            ))),
        }
    }

    fn lobby_phase_message(&self) -> Outbound {
        Outbound::all(Message::LobbyPhase {
            players: self.players(),
        })
    }

    /// Convert to JSON for sending to clients.
    pub fn to_json(&self) -> serde_json::Value {
        let members: Vec<serde_json::Value> = self
            .members
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "is_connected": m.is_connected(),
                    "joined_at": m.joined_at.to_rfc3339(),
                })
            })
            .collect();

        let mut phase = serde_json::json!({"status": self.phase.as_str()});
        match &self.phase {
            LobbyPhase::Lobby => {}
            LobbyPhase::ActiveGame { game } => {
                phase["game"] = game.to_json();
            }
            LobbyPhase::Disconnected {
                game,
                missing_players,
                ready_to_continue,
            } => {
                phase["game"] = game.to_json();
                phase["missing_players"] = serde_json::json!(missing_players);
                phase["ready_to_continue"] = serde_json::json!(sorted(ready_to_continue));
            }
            LobbyPhase::Scores {
                scores,
                ready_to_show_scores,
            } => {
                phase["scores"] = serde_json::json!(scores);
                phase["ready_to_show_scores"] = serde_json::json!(sorted(ready_to_show_scores));
            }
        }

        serde_json::json!({
            "lobby_id": self.id,
            "leader": self.leader(),
            "players": members,
            "phase": phase,
            "ended": self.ended,
        })
    }
}

fn sorted(set: &HashSet<String>) -> Vec<&String> {
    let mut names: Vec<&String> = set.iter().collect();
    names.sort();
    names
}

/// Per-player messages describing where the game's round stands.
fn game_mode_messages(game: &GameState) -> Vec<Outbound> {
    game.players()
        .iter()
        .filter_map(|player| {
            let grid = game.grid_for(player).ok()?.raw();
            let message = match game.status() {
                GameStatus::Announcing => Message::EnteringAnnouncementMode {
                    announcing_player: game.current_announcing_player().to_string(),
                    grid,
                },
                GameStatus::Placing { letter, .. } => Message::EnteringPlacementMode {
                    letter: letter.to_string(),
                    grid,
                },
                GameStatus::Complete => Message::GameCompleted { grid },
            };
            Some(Outbound::to(player.clone(), message))
        })
        .collect()
}
