//! Lobby workers.
//!
//! Each lobby runs on its own tokio task which owns the [`Lobby`] outright.
//! Joins, leaves, connection drops and commands are queued on the task's
//! inbox and applied one at a time in arrival order. Outbound messages are
//! pushed onto an unbounded channel for the transport to deliver.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::LobbyConfig;
use crate::state::{Command, GameError, Lobby, LobbyEvent, Outbound, Scorer};

/// Errors returned to the caller of a [`LobbyHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The lobby refused the event; nothing changed.
    #[error(transparent)]
    Rejected(#[from] GameError),
    #[error("lobby worker has stopped")]
    Closed,
    #[error("lobby {0} already exists")]
    LobbyExists(String),
}

/// Requests queued on a lobby worker's inbox.
#[derive(Debug)]
pub enum LobbyRequest {
    Event {
        player: String,
        event: LobbyEvent,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Shutdown,
}

/// Cloneable sender side of a lobby worker.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    id: String,
    tx: mpsc::Sender<LobbyRequest>,
}

impl LobbyHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if the worker has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue an event and wait until it has been applied.
    pub async fn send(&self, player: impl Into<String>, event: LobbyEvent) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(LobbyRequest::Event {
                player: player.into(),
                event,
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;

        response.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }

    pub async fn join(&self, player: impl Into<String>) -> Result<(), SessionError> {
        self.send(player, LobbyEvent::Join).await
    }

    pub async fn leave(&self, player: impl Into<String>) -> Result<(), SessionError> {
        self.send(player, LobbyEvent::Leave).await
    }

    pub async fn disconnect(&self, player: impl Into<String>) -> Result<(), SessionError> {
        self.send(player, LobbyEvent::Disconnect).await
    }

    pub async fn reconnect(&self, player: impl Into<String>) -> Result<(), SessionError> {
        self.send(player, LobbyEvent::Reconnect).await
    }

    pub async fn command(
        &self,
        player: impl Into<String>,
        command: Command,
    ) -> Result<(), SessionError> {
        self.send(player, LobbyEvent::Command(command)).await
    }

    /// Ask the worker to end the lobby and stop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.tx
            .send(LobbyRequest::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Spawn a worker task that owns `lobby`.
///
/// Must be called from within a tokio runtime. Returns the handle, the
/// outbound message stream and the task handle.
pub fn spawn_lobby(
    lobby: Lobby,
) -> (
    LobbyHandle,
    mpsc::UnboundedReceiver<Outbound>,
    JoinHandle<()>,
) {
    let (tx, inbox) = mpsc::channel(lobby.config().inbox_capacity.max(1));
    let (outbox, outbound) = mpsc::unbounded_channel();
    let handle = LobbyHandle {
        id: lobby.id.clone(),
        tx,
    };

    let task = tokio::spawn(run_lobby(lobby, inbox, outbox));

    (handle, outbound, task)
}

async fn run_lobby(
    mut lobby: Lobby,
    mut inbox: mpsc::Receiver<LobbyRequest>,
    outbox: mpsc::UnboundedSender<Outbound>,
) {
    tracing::info!(lobby = %lobby.id, "Lobby worker started");

    while let Some(request) = inbox.recv().await {
        match request {
            LobbyRequest::Event {
                player,
                event,
                reply,
            } => {
                let result = lobby
                    .handle(&player, event)
                    .map(|out| deliver(&lobby.id, &outbox, out));
                if reply.send(result).is_err() {
                    tracing::debug!(lobby = %lobby.id, player = %player, "Caller went away before reply");
                }
            }
            LobbyRequest::Shutdown => {
                let out = lobby.shutdown();
                deliver(&lobby.id, &outbox, out);
            }
        }

        if lobby.is_ended() {
            break;
        }
    }

    tracing::info!(lobby = %lobby.id, "Lobby worker stopped");
}

fn deliver(lobby_id: &str, outbox: &mpsc::UnboundedSender<Outbound>, out: Vec<Outbound>) {
    for outbound in out {
        if let Err(e) = outbox.send(outbound) {
            tracing::debug!(
                lobby = lobby_id,
                kind = e.0.message.as_str(),
                "Outbound receiver dropped"
            );
        }
    }
}

/// Lobby manager - tracks running lobby workers by ID.
#[derive(Debug, Default)]
pub struct LobbyManager {
    config: LobbyConfig,
    lobbies: HashMap<String, LobbyHandle>,
}

impl LobbyManager {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            lobbies: HashMap::new(),
        }
    }

    /// Create a lobby and spawn its worker.
    ///
    /// An ID whose previous worker has stopped may be reused.
    pub fn create(
        &mut self,
        id: impl Into<String>,
        scorer: impl Scorer,
    ) -> Result<(LobbyHandle, mpsc::UnboundedReceiver<Outbound>), SessionError> {
        let id = id.into();
        if self.lobbies.get(&id).is_some_and(|h| !h.is_closed()) {
            return Err(SessionError::LobbyExists(id));
        }

        let lobby = Lobby::new(id.clone(), self.config.clone(), scorer);
        let (handle, outbound, _task) = spawn_lobby(lobby);
        self.lobbies.insert(id, handle.clone());

        Ok((handle, outbound))
    }

    /// Get a running lobby.
    pub fn get(&self, id: &str) -> Option<&LobbyHandle> {
        self.lobbies.get(id).filter(|h| !h.is_closed())
    }

    /// Stop tracking a lobby. The worker keeps running until shut down.
    pub fn remove(&mut self, id: &str) -> Option<LobbyHandle> {
        self.lobbies.remove(id)
    }

    /// Forget lobbies whose workers have stopped.
    pub fn cleanup_closed(&mut self) -> Vec<String> {
        let closed: Vec<String> = self
            .lobbies
            .iter()
            .filter(|(_, h)| h.is_closed())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &closed {
            self.lobbies.remove(id);
        }

        closed
    }

    /// Count tracked lobbies.
    pub fn count(&self) -> usize {
        self.lobbies.len()
    }
}
