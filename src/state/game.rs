use super::lobby::Lobby;
use super::GameError;
use crate::protocol::{Delivery, ServerMessage};
use crate::types::*;
use crate::words;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Game-design minimum: one impostor must face a robust majority.
pub const MIN_PLAYERS: usize = 4;

/// Impostor count for a given number of active players, frozen at each word
/// assignment.
fn minority_count(active: usize) -> usize {
    (active / 4).max(1)
}

impl Lobby {
    /// Begin a game from the lobby phase. Emits a lobby-wide start notice and
    /// one private word per active player.
    pub fn start_game(&mut self) -> Result<Vec<Delivery>, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.active_count() < MIN_PLAYERS {
            return Err(GameError::TooFewPlayers);
        }

        self.round = 1;
        self.descriptions.clear();
        self.votes.clear();
        self.phase = GamePhase::Describing;

        let mut deliveries = vec![Delivery::Broadcast(ServerMessage::GameStarted {
            round: self.round,
        })];
        deliveries.extend(self.assign_words());
        Ok(deliveries)
    }

    /// Advance to the next round after a tally that left the game running.
    pub fn next_round(&mut self) -> Result<Vec<Delivery>, GameError> {
        if !self.started() {
            return Err(GameError::GameNotActive);
        }

        self.round += 1;
        self.descriptions.clear();
        self.votes.clear();
        self.phase = GamePhase::Describing;

        let mut deliveries = vec![Delivery::Broadcast(ServerMessage::GameStarted {
            round: self.round,
        })];
        deliveries.extend(self.assign_words());
        Ok(deliveries)
    }

    /// Full reset back to the lobby phase. Roster retained; words, elimination
    /// flags, round counter, and per-round collections all cleared.
    pub fn return_to_lobby(&mut self) -> Vec<Delivery> {
        self.phase = GamePhase::Lobby;
        self.round = 0;
        self.descriptions.clear();
        self.votes.clear();
        self.word_pair = None;
        for player in &mut self.players {
            player.word = None;
            player.eliminated = false;
        }
        vec![Delivery::Broadcast(ServerMessage::UpdatePlayers {
            players: self.roster(),
        })]
    }

    /// Pick a fresh word pair and deal it out: a uniform random k-subset of
    /// active players (partial Fisher-Yates) gets the decoy, everyone else
    /// active gets the majority word. Eliminated players keep no word.
    fn assign_words(&mut self) -> Vec<Delivery> {
        let mut rng = rand::rng();
        let pair = words::random_pair(&mut rng);

        let mut active_ids: Vec<ConnectionId> =
            self.active_players().map(|p| p.id.clone()).collect();
        let k = minority_count(active_ids.len());
        let (chosen, _) = active_ids.partial_shuffle(&mut rng, k);
        let minority: HashSet<ConnectionId> = chosen.iter().cloned().collect();

        let mut deliveries = Vec::new();
        for player in &mut self.players {
            if player.eliminated {
                player.word = None;
                continue;
            }
            let word = if minority.contains(&player.id) {
                pair.minority_word.clone()
            } else {
                pair.majority_word.clone()
            };
            player.word = Some(word.clone());
            deliveries.push(Delivery::Direct(
                player.id.clone(),
                ServerMessage::WordAssigned { word },
            ));
        }

        self.word_pair = Some(pair);
        deliveries
    }

    /// Evaluate the win conditions against the current active roster.
    ///
    /// Returns the game-over broadcast and moves to GAME_OVER if the game
    /// ended, or None if it continues. The too-few-players check takes
    /// priority over the word split.
    pub(crate) fn check_game_over(&mut self) -> Option<Delivery> {
        let active: Vec<&Player> = self.active_players().collect();

        let outcome = if active.len() <= 2 {
            Some(GameOutcome::TooFewPlayers)
        } else {
            // Reference word: whatever the first active player (join order)
            // holds. Everyone active holding something else is minority.
            let common_word = active[0].word.clone();
            let minority_remaining = active
                .iter()
                .filter(|p| p.word != common_word)
                .count();

            if minority_remaining == 0 {
                Some(GameOutcome::MajorityWins)
            } else if minority_remaining >= active.len() - minority_remaining {
                Some(GameOutcome::MinorityWins)
            } else {
                None
            }
        };

        let outcome = outcome?;
        self.phase = GamePhase::GameOver;
        // No word survives outside a running game.
        for player in &mut self.players {
            player.word = None;
        }
        Some(Delivery::Broadcast(ServerMessage::GameOver { outcome }))
    }

    /// Close the given phase's barrier early, on behalf of an external timer.
    /// Idempotent: if the phase already advanced this is a no-op, not an
    /// error.
    pub fn force_advance(&mut self, phase: GamePhase) -> Vec<Delivery> {
        if phase != self.phase {
            return Vec::new();
        }
        match phase {
            GamePhase::Describing => self.close_description_barrier(),
            // With zero votes there is nobody to eliminate; leave the phase
            // open rather than invent a result.
            GamePhase::Voting if !self.votes.is_empty() => self.tally_votes(),
            _ => Vec::new(),
        }
    }

    /// Called after a mid-game departure: the shrunken active roster may have
    /// ended the game, or satisfied a barrier the departed player was
    /// blocking.
    pub(crate) fn handle_departure(&mut self) -> Vec<Delivery> {
        if let Some(game_over) = self.check_game_over() {
            return vec![game_over];
        }
        match self.phase {
            GamePhase::Describing if self.descriptions.len() >= self.active_count() => {
                self.close_description_barrier()
            }
            GamePhase::Voting
                if !self.votes.is_empty() && self.votes.len() >= self.active_count() =>
            {
                self.tally_votes()
            }
            _ => Vec::new(),
        }
    }
}
