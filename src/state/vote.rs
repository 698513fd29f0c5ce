use super::lobby::Lobby;
use super::GameError;
use crate::protocol::{Delivery, ServerMessage};
use crate::types::*;

impl Lobby {
    /// Record or change one player's vote.
    ///
    /// A voter may change their mind until the barrier closes; the last vote
    /// wins but the voter keeps their original slot in vote order. When the
    /// vote count reaches the active player count the tally runs inside the
    /// same critical section, so no further command can slip in between the
    /// final vote and the elimination.
    pub fn submit_vote(
        &mut self,
        voter: &str,
        target: &str,
    ) -> Result<Vec<Delivery>, GameError> {
        if self.phase != GamePhase::Voting {
            return Err(GameError::NotInVotingPhase);
        }
        let voter_player = self.player(voter).ok_or(GameError::NotFound)?;
        if voter_player.eliminated {
            return Err(GameError::AlreadyKicked);
        }
        let target_player = self.player(target).ok_or(GameError::NotFound)?;
        if target_player.eliminated {
            return Err(GameError::AlreadyKicked);
        }

        let target = target.to_string();
        match self.votes.iter_mut().find(|v| v.voter == voter) {
            Some(vote) => vote.target = target,
            None => self.votes.push(Vote {
                voter: voter.to_string(),
                target,
            }),
        }

        if self.votes.len() >= self.active_count() {
            return Ok(self.tally_votes());
        }
        Ok(Vec::new())
    }

    /// Count votes and eliminate the leader.
    ///
    /// Targets are counted scanning votes in insertion order, and the winner
    /// is the first target whose count strictly exceeds the running maximum.
    /// Ties therefore go to the target encountered first in vote order; this
    /// is intentional and relied upon, not an accident of map iteration.
    pub(crate) fn tally_votes(&mut self) -> Vec<Delivery> {
        let mut counts: Vec<(ConnectionId, u32)> = Vec::new();
        for vote in &self.votes {
            match counts.iter_mut().find(|(target, _)| *target == vote.target) {
                Some((_, n)) => *n += 1,
                None => counts.push((vote.target.clone(), 1)),
            }
        }

        let mut kicked: Option<ConnectionId> = None;
        let mut max = 0;
        for (target, n) in &counts {
            if *n > max {
                max = *n;
                kicked = Some(target.clone());
            }
        }
        let Some(kicked) = kicked else {
            return Vec::new();
        };

        let name = self
            .player(&kicked)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        if let Some(player) = self.player_mut(&kicked) {
            player.eliminated = true;
            player.word = None;
        }

        let mut deliveries = vec![
            Delivery::Broadcast(ServerMessage::PlayerKicked {
                player_id: kicked.clone(),
                name,
            }),
            Delivery::Direct(kicked, ServerMessage::Eliminated),
        ];
        if let Some(game_over) = self.check_game_over() {
            deliveries.push(game_over);
        } else {
            self.phase = GamePhase::Results;
        }
        deliveries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five players in VOTING with a word split chosen so that one
    /// elimination never ends the game mid-test.
    fn voting_lobby() -> Lobby {
        let mut lobby = Lobby::new("ABCDE".to_string(), "p0".to_string(), "Player0".to_string());
        for i in 1..5 {
            lobby
                .add_player(format!("p{i}"), format!("Player{i}"))
                .unwrap();
        }
        lobby.start_game().unwrap();
        for i in 0..4 {
            lobby.player_mut(&format!("p{i}")).unwrap().word = Some("same".to_string());
        }
        lobby.player_mut("p4").unwrap().word = Some("decoy".to_string());
        lobby.phase = GamePhase::Voting;
        lobby
    }

    #[test]
    fn vote_outside_voting_phase_rejected() {
        let mut lobby = voting_lobby();
        lobby.phase = GamePhase::Describing;
        assert_eq!(
            lobby.submit_vote("p0", "p1"),
            Err(GameError::NotInVotingPhase)
        );
    }

    #[test]
    fn strict_majority_is_eliminated() {
        let mut lobby = voting_lobby();
        // X:2, Y:1 and the rest spread: p1 gets two votes.
        lobby.submit_vote("p0", "p1").unwrap();
        lobby.submit_vote("p1", "p2").unwrap();
        lobby.submit_vote("p2", "p1").unwrap();
        lobby.submit_vote("p3", "p4").unwrap();
        let deliveries = lobby.submit_vote("p4", "p0").unwrap();

        assert!(lobby.player("p1").unwrap().eliminated);
        match &deliveries[0] {
            Delivery::Broadcast(ServerMessage::PlayerKicked { player_id, name }) => {
                assert_eq!(player_id, "p1");
                assert_eq!(name, "Player1");
            }
            other => panic!("Expected PlayerKicked, got {other:?}"),
        }
        assert!(matches!(
            deliveries[1],
            Delivery::Direct(ref id, ServerMessage::Eliminated) if id == "p1"
        ));
    }

    #[test]
    fn tie_goes_to_first_target_in_vote_order() {
        let mut lobby = voting_lobby();
        // p3 and p1 both end on two votes; p3 was voted for first.
        lobby.submit_vote("p0", "p3").unwrap();
        lobby.submit_vote("p1", "p3").unwrap();
        lobby.submit_vote("p2", "p1").unwrap();
        lobby.submit_vote("p3", "p1").unwrap();
        lobby.submit_vote("p4", "p0").unwrap();

        assert!(lobby.player("p3").unwrap().eliminated);
        assert!(!lobby.player("p1").unwrap().eliminated);
    }

    #[test]
    fn two_way_tie_eliminates_first_encountered() {
        let mut lobby = voting_lobby();
        lobby.votes = vec![
            Vote {
                voter: "p0".to_string(),
                target: "p1".to_string(),
            },
            Vote {
                voter: "p2".to_string(),
                target: "p3".to_string(),
            },
        ];

        lobby.tally_votes();

        assert!(lobby.player("p1").unwrap().eliminated);
        assert!(!lobby.player("p3").unwrap().eliminated);
    }

    #[test]
    fn revote_overwrites_but_keeps_slot() {
        let mut lobby = voting_lobby();
        lobby.submit_vote("p0", "p1").unwrap();
        lobby.submit_vote("p1", "p2").unwrap();
        // p0 changes their mind; still only two votes recorded.
        lobby.submit_vote("p0", "p3").unwrap();

        assert_eq!(lobby.votes.len(), 2);
        assert_eq!(lobby.votes[0].voter, "p0");
        assert_eq!(lobby.votes[0].target, "p3");
    }

    #[test]
    fn barrier_waits_for_every_active_voter() {
        let mut lobby = voting_lobby();
        for (voter, target) in [("p0", "p4"), ("p1", "p4"), ("p2", "p4"), ("p3", "p4")] {
            let deliveries = lobby.submit_vote(voter, target).unwrap();
            assert!(deliveries.is_empty());
            assert_eq!(lobby.phase, GamePhase::Voting);
        }

        let deliveries = lobby.submit_vote("p4", "p0").unwrap();
        assert!(!deliveries.is_empty());
        assert!(lobby.player("p4").unwrap().eliminated);
    }

    #[test]
    fn kicking_the_last_impostor_ends_the_game() {
        let mut lobby = voting_lobby();
        for voter in ["p0", "p1", "p2", "p3"] {
            lobby.submit_vote(voter, "p4").unwrap();
        }
        let deliveries = lobby.submit_vote("p4", "p0").unwrap();

        assert_eq!(lobby.phase, GamePhase::GameOver);
        assert!(deliveries.iter().any(|d| matches!(
            d,
            Delivery::Broadcast(ServerMessage::GameOver {
                outcome: GameOutcome::MajorityWins
            })
        )));
    }

    #[test]
    fn kicking_a_majority_holder_continues_the_game() {
        let mut lobby = voting_lobby();
        for voter in ["p0", "p1", "p2", "p4"] {
            lobby.submit_vote(voter, "p3").unwrap();
        }
        let deliveries = lobby.submit_vote("p3", "p4").unwrap();

        // 4 active: 3 majority + 1 minority, game goes on.
        assert_eq!(lobby.phase, GamePhase::Results);
        assert!(!deliveries
            .iter()
            .any(|d| matches!(d, Delivery::Broadcast(ServerMessage::GameOver { .. }))));
    }

    #[test]
    fn eliminated_players_cannot_vote_or_be_voted_for() {
        let mut lobby = voting_lobby();
        lobby.player_mut("p3").unwrap().eliminated = true;

        assert_eq!(lobby.submit_vote("p3", "p0"), Err(GameError::AlreadyKicked));
        assert_eq!(lobby.submit_vote("p0", "p3"), Err(GameError::AlreadyKicked));
    }

    #[test]
    fn fixed_vote_map_tallies_deterministically() {
        // votes {A→X, B→Y, C→X}: X has 2, Y has 1, X is eliminated.
        let mut lobby = voting_lobby();
        lobby.player_mut("p3").unwrap().eliminated = true;
        lobby.player_mut("p4").unwrap().eliminated = true;
        // Only p0/p1/p2 are active now; rebuild a clean split so the
        // post-kick game-over check is exercised too.
        lobby.votes.clear();
        lobby.submit_vote("p0", "p2").unwrap();
        lobby.submit_vote("p1", "p0").unwrap();
        let deliveries = lobby.submit_vote("p2", "p2").unwrap();

        assert!(lobby.player("p2").unwrap().eliminated);
        // Two players left standing: the game must end regardless of words.
        assert!(deliveries.iter().any(|d| matches!(
            d,
            Delivery::Broadcast(ServerMessage::GameOver {
                outcome: GameOutcome::TooFewPlayers
            })
        )));
    }
}
