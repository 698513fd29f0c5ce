use crate::protocol::PlayerInfo;
use crate::state::GameError;
use crate::types::*;

/// One game session's isolated state, addressed by a short code.
///
/// The roster is a sequence, not a hash map: join order decides which active
/// player anchors the reference word in the game-over check, and vote order
/// decides the tally tie-break. Both orders are load-bearing.
#[derive(Debug, Clone)]
pub struct Lobby {
    pub code: LobbyCode,
    pub players: Vec<Player>,
    pub phase: GamePhase,
    pub round: u32,
    pub descriptions: Vec<Description>,
    pub votes: Vec<Vote>,
    pub word_pair: Option<WordPair>,
}

impl Lobby {
    /// Create a lobby with its host as the sole roster member.
    pub fn new(code: LobbyCode, host_id: ConnectionId, host_name: String) -> Self {
        Self {
            code,
            players: vec![Player::new(host_id, host_name)],
            phase: GamePhase::Lobby,
            round: 0,
            descriptions: Vec::new(),
            votes: Vec::new(),
            word_pair: None,
        }
    }

    /// Whether a game session is currently running. GAME_OVER counts as not
    /// running: it only returns to LOBBY via an explicit reset.
    pub fn started(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Describing | GamePhase::Voting | GamePhase::Results
        )
    }

    /// Add a player to the roster. Rejected once a game is running.
    pub fn add_player(&mut self, id: ConnectionId, name: String) -> Result<(), GameError> {
        if self.started() {
            return Err(GameError::AlreadyStarted);
        }
        self.players.push(Player::new(id, name));
        Ok(())
    }

    /// Remove a player entirely (disconnect). Their pending vote and any
    /// votes cast against them are dropped so the voting barrier stays
    /// measured against players who can still be counted.
    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let pos = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(pos);
        self.votes.retain(|v| v.voter != id && v.target != id);
        Some(removed)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.player(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Roster members not voted out, in join order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    /// Connection ids of everyone in the lobby, eliminated spectators
    /// included. Broadcasts go to all of them.
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Public roster payload, word-free.
    pub fn roster(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(PlayerInfo::from).collect()
    }
}
