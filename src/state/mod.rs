mod game;
mod lobby;
mod registry;
mod submission;
mod vote;

pub use game::MIN_PLAYERS;
pub use lobby::Lobby;

use crate::protocol::{Delivery, ServerMessage};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// The full recoverable error taxonomy. Every variant is surfaced to the
/// originating client only; none affects another player's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Lobby not found")]
    NotFound,
    #[error("Game already started")]
    AlreadyStarted,
    #[error("At least {MIN_PLAYERS} players are required to start")]
    TooFewPlayers,
    #[error("No description round is open")]
    NotStarted,
    #[error("Player has been voted out")]
    AlreadyKicked,
    #[error("Description already submitted this round")]
    DuplicateSubmission,
    #[error("Not in the voting phase")]
    NotInVotingPhase,
    #[error("No game is running")]
    GameNotActive,
}

impl GameError {
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound => "NOT_FOUND",
            GameError::AlreadyStarted => "ALREADY_STARTED",
            GameError::TooFewPlayers => "TOO_FEW_PLAYERS",
            GameError::NotStarted => "NOT_STARTED",
            GameError::AlreadyKicked => "ALREADY_KICKED",
            GameError::DuplicateSubmission => "DUPLICATE_SUBMISSION",
            GameError::NotInVotingPhase => "NOT_IN_VOTING_PHASE",
            GameError::GameNotActive => "GAME_NOT_ACTIVE",
        }
    }
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Shared application state: the lobby registry plus the connection fan-out
/// table.
///
/// Each lobby sits behind its own mutex, so commands for one lobby are applied
/// atomically (a tally completes, game-over check included, before the next
/// command is admitted) while distinct lobbies proceed concurrently. The
/// registry map itself only guards insert/remove/lookup.
pub struct AppState {
    pub lobbies: RwLock<HashMap<LobbyCode, Arc<Mutex<Lobby>>>>,
    pub peers: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>,
    /// Which lobby a connection currently belongs to, for disconnect routing.
    pub memberships: RwLock<HashMap<ConnectionId, LobbyCode>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            lobbies: RwLock::new(HashMap::new()),
            peers: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection's outbound channel. Everything the core emits
    /// for this connection flows through it.
    pub async fn register_peer(
        &self,
        conn_id: &ConnectionId,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.peers.write().await.insert(conn_id.clone(), tx);
    }

    pub async fn unregister_peer(&self, conn_id: &ConnectionId) {
        self.peers.write().await.remove(conn_id);
    }

    /// Fan deliveries out to their recipients. Send failures mean the peer is
    /// already gone and are ignored; its disconnect path cleans up.
    pub(crate) async fn deliver(&self, members: &[ConnectionId], deliveries: Vec<Delivery>) {
        let peers = self.peers.read().await;
        for delivery in deliveries {
            match delivery {
                Delivery::Broadcast(msg) => {
                    for id in members {
                        if let Some(tx) = peers.get(id) {
                            let _ = tx.send(msg.clone());
                        }
                    }
                }
                Delivery::Direct(id, msg) => {
                    if let Some(tx) = peers.get(&id) {
                        let _ = tx.send(msg);
                    }
                }
            }
        }
    }

    /// Run one command against a lobby under its lock, then fan the produced
    /// deliveries out. The sender must be a member of the lobby it addresses.
    async fn with_lobby<F>(
        &self,
        conn_id: &ConnectionId,
        code: &str,
        op: F,
    ) -> Result<(), GameError>
    where
        F: FnOnce(&mut Lobby) -> Result<Vec<Delivery>, GameError>,
    {
        let lobby_arc = self
            .lobbies
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(GameError::NotFound)?;

        let (deliveries, members) = {
            let mut lobby = lobby_arc.lock().await;
            if !lobby.contains(conn_id) {
                return Err(GameError::NotFound);
            }
            let deliveries = op(&mut *lobby)?;
            (deliveries, lobby.member_ids())
        };

        self.deliver(&members, deliveries).await;
        Ok(())
    }

    pub async fn start_game(&self, conn_id: &ConnectionId, code: &str) -> Result<(), GameError> {
        self.with_lobby(conn_id, code, |lobby| {
            tracing::info!(code = %lobby.code, "Starting game");
            lobby.start_game()
        })
        .await
    }

    pub async fn submit_description(
        &self,
        conn_id: &ConnectionId,
        code: &str,
        text: String,
    ) -> Result<(), GameError> {
        let conn = conn_id.clone();
        self.with_lobby(conn_id, code, move |lobby| {
            lobby.submit_description(&conn, text)
        })
        .await
    }

    pub async fn submit_vote(
        &self,
        conn_id: &ConnectionId,
        code: &str,
        target_id: &str,
    ) -> Result<(), GameError> {
        let conn = conn_id.clone();
        self.with_lobby(conn_id, code, move |lobby| lobby.submit_vote(&conn, target_id))
            .await
    }

    pub async fn next_round(&self, conn_id: &ConnectionId, code: &str) -> Result<(), GameError> {
        self.with_lobby(conn_id, code, |lobby| lobby.next_round()).await
    }

    pub async fn return_to_lobby(
        &self,
        conn_id: &ConnectionId,
        code: &str,
    ) -> Result<(), GameError> {
        self.with_lobby(conn_id, code, |lobby| Ok(lobby.return_to_lobby()))
            .await
    }

    pub async fn force_advance(
        &self,
        conn_id: &ConnectionId,
        code: &str,
        phase: GamePhase,
    ) -> Result<(), GameError> {
        self.with_lobby(conn_id, code, move |lobby| Ok(lobby.force_advance(phase)))
            .await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
