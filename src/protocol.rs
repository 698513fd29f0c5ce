use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateLobby {
        name: String,
    },
    JoinLobby {
        code: LobbyCode,
        name: String,
    },
    StartGame {
        code: LobbyCode,
    },
    SubmitDescription {
        code: LobbyCode,
        text: String,
    },
    SubmitVote {
        code: LobbyCode,
        target_id: ConnectionId,
    },
    NextRound {
        code: LobbyCode,
    },
    ReturnToLobby {
        code: LobbyCode,
    },
    /// External-timer hook: close the named phase's barrier with whatever has
    /// been collected so far. A no-op if the phase already advanced.
    ForceAdvance {
        code: LobbyCode,
        phase: GamePhase,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        player_id: ConnectionId,
        server_now: String,
    },
    LobbyCreated {
        code: LobbyCode,
        players: Vec<PlayerInfo>,
    },
    LobbyJoined {
        code: LobbyCode,
        players: Vec<PlayerInfo>,
    },
    /// Broadcast to the whole lobby whenever the roster changes.
    UpdatePlayers {
        players: Vec<PlayerInfo>,
    },
    GameStarted {
        round: u32,
    },
    /// Private: the recipient's own secret word. Never broadcast.
    WordAssigned {
        word: String,
    },
    /// Broadcast once every active player has submitted; the list preserves
    /// submission order.
    DescriptionsSubmitted {
        list: Vec<Description>,
    },
    PlayerKicked {
        player_id: ConnectionId,
        name: String,
    },
    /// Private: sent to the player who was just voted out.
    Eliminated,
    GameOver {
        outcome: GameOutcome,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// Public roster entry (no word, to prevent spoilers)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub id: ConnectionId,
    pub name: String,
    pub eliminated: bool,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            eliminated: p.eliminated,
        }
    }
}

/// An outbound message produced by a lobby operation. The gateway fans these
/// out after the lobby lock is released.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// To every current lobby member, spectators included.
    Broadcast(ServerMessage),
    /// To a single connection only.
    Direct(ConnectionId, ServerMessage),
}
