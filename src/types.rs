use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type LobbyCode = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Lobby,
    Describing,
    Voting,
    Results,
    GameOver,
}

/// One catalog entry: the word most players share and the decoy handed to the
/// impostor minority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordPair {
    pub majority_word: String,
    pub minority_word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    /// Secret word for the current round; only ever sent to the player
    /// themselves, never in roster payloads.
    pub word: Option<String>,
    pub eliminated: bool,
}

impl Player {
    pub fn new(id: ConnectionId, name: String) -> Self {
        Self {
            id,
            name,
            word: None,
            eliminated: false,
        }
    }
}

/// A free-text description, kept in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Description {
    pub player_id: ConnectionId,
    pub name: String,
    pub text: String,
}

/// One voter's current pick. Stored as a sequence so first-vote order is
/// preserved for the tally tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub voter: ConnectionId,
    pub target: ConnectionId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    /// Two or fewer players left standing, no meaningful vote possible.
    TooFewPlayers,
    MajorityWins,
    MinorityWins,
}
