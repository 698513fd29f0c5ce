use super::lobby::Lobby;
use super::GameError;
use crate::protocol::{Delivery, ServerMessage};
use crate::types::*;

/// Cap on description length; longer texts are cut, not rejected.
const MAX_DESCRIPTION_CHARS: usize = 500;

impl Lobby {
    /// Record one player's description of their word.
    ///
    /// Submission order is the order players will see, so entries are
    /// appended, never re-sorted. When every currently-active player has
    /// submitted, the full list goes out and the lobby moves to voting. The
    /// barrier tracks the active count at the moment of each submission, not
    /// a count frozen at round start.
    pub fn submit_description(
        &mut self,
        player_id: &str,
        text: String,
    ) -> Result<Vec<Delivery>, GameError> {
        if self.phase != GamePhase::Describing {
            return Err(GameError::NotStarted);
        }
        let (id, name) = {
            let player = self.player(player_id).ok_or(GameError::NotFound)?;
            if player.eliminated {
                return Err(GameError::AlreadyKicked);
            }
            (player.id.clone(), player.name.clone())
        };
        if self.descriptions.iter().any(|d| d.player_id == player_id) {
            return Err(GameError::DuplicateSubmission);
        }

        let text: String = text.trim().chars().take(MAX_DESCRIPTION_CHARS).collect();
        self.descriptions.push(Description {
            player_id: id,
            name,
            text,
        });

        if self.descriptions.len() >= self.active_count() {
            return Ok(self.close_description_barrier());
        }
        Ok(Vec::new())
    }

    /// Publish the ordered description list and open voting.
    pub(crate) fn close_description_barrier(&mut self) -> Vec<Delivery> {
        self.phase = GamePhase::Voting;
        vec![Delivery::Broadcast(ServerMessage::DescriptionsSubmitted {
            list: self.descriptions.clone(),
        })]
    }
}
