use super::{AppState, GameError, Lobby};
use crate::protocol::{Delivery, ServerMessage};
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Safe character set for lobby codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// The code space holds ~28M combinations. Exhausting it is a configuration
/// invariant violation, not a runtime error path.
const MAX_CODE_ATTEMPTS: usize = 1024;

const MAX_NAME_CHARS: usize = 24;

/// Generate a random short lobby code.
fn generate_lobby_code() -> LobbyCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Pick a code not currently in use.
fn fresh_code(lobbies: &HashMap<LobbyCode, Arc<Mutex<Lobby>>>) -> LobbyCode {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_lobby_code();
        if !lobbies.contains_key(&code) {
            return code;
        }
    }
    panic!("lobby code space exhausted");
}

fn clean_name(name: String) -> String {
    let name: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
    if name.is_empty() {
        "Anonymous".to_string()
    } else {
        name
    }
}

impl AppState {
    /// Create a lobby with the caller as its sole member and a freshly
    /// generated unique code.
    pub async fn create_lobby(&self, conn_id: &ConnectionId, name: String) -> ServerMessage {
        // Creating while already in a lobby counts as leaving the old one.
        self.leave_lobby(conn_id).await;

        let name = clean_name(name);
        let (code, players) = {
            let mut lobbies = self.lobbies.write().await;
            let code = fresh_code(&lobbies);
            let lobby = Lobby::new(code.clone(), conn_id.clone(), name);
            let players = lobby.roster();
            lobbies.insert(code.clone(), Arc::new(Mutex::new(lobby)));
            (code, players)
        };
        self.memberships
            .write()
            .await
            .insert(conn_id.clone(), code.clone());

        tracing::info!(%code, "Lobby created");
        ServerMessage::LobbyCreated { code, players }
    }

    /// Join an existing lobby by code. Fails if the code is unknown or a game
    /// is already running there.
    pub async fn join_lobby(
        &self,
        conn_id: &ConnectionId,
        code: LobbyCode,
        name: String,
    ) -> Result<ServerMessage, GameError> {
        let code = code.trim().to_uppercase();
        let name = clean_name(name);
        let lobby_arc = self
            .lobbies
            .read()
            .await
            .get(&code)
            .cloned()
            .ok_or(GameError::NotFound)?;

        // Re-joining the lobby one is already in is an idempotent ack, not a
        // leave-and-rejoin.
        if self.memberships.read().await.get(conn_id) == Some(&code) {
            let lobby = lobby_arc.lock().await;
            return Ok(ServerMessage::LobbyJoined {
                code,
                players: lobby.roster(),
            });
        }

        // Joining from inside another lobby counts as leaving it. Only after
        // the target code resolved, so a typo cannot strand the player.
        self.leave_lobby(conn_id).await;

        let (reply, members, deliveries) = {
            let mut lobby = lobby_arc.lock().await;
            lobby.add_player(conn_id.clone(), name)?;
            (
                ServerMessage::LobbyJoined {
                    code: code.clone(),
                    players: lobby.roster(),
                },
                lobby.member_ids(),
                vec![Delivery::Broadcast(ServerMessage::UpdatePlayers {
                    players: lobby.roster(),
                })],
            )
        };
        self.memberships.write().await.insert(conn_id.clone(), code);
        self.deliver(&members, deliveries).await;
        Ok(reply)
    }

    /// Lookup with no side effects.
    pub async fn get(&self, code: &str) -> Option<Arc<Mutex<Lobby>>> {
        self.lobbies.read().await.get(code).cloned()
    }

    /// A connection went away: fold it out of its lobby as a normal roster
    /// mutation, not an error.
    pub async fn disconnect(&self, conn_id: &ConnectionId) {
        self.leave_lobby(conn_id).await;
    }

    /// Remove a connection from whatever lobby it is in. Destroys the lobby
    /// if the roster empties; otherwise broadcasts the new roster and, if a
    /// game was running, re-evaluates game over and any open barrier the
    /// departed player was holding up.
    async fn leave_lobby(&self, conn_id: &ConnectionId) {
        let Some(code) = self.memberships.write().await.remove(conn_id) else {
            return;
        };
        let Some(lobby_arc) = self.lobbies.read().await.get(&code).cloned() else {
            return;
        };

        let (emptied, members, deliveries) = {
            let mut lobby = lobby_arc.lock().await;
            let was_started = lobby.started();
            let removed = lobby.remove_player(conn_id);
            if lobby.is_empty() {
                (true, Vec::new(), Vec::new())
            } else {
                let mut deliveries = vec![Delivery::Broadcast(ServerMessage::UpdatePlayers {
                    players: lobby.roster(),
                })];
                if was_started && removed.is_some() {
                    deliveries.extend(lobby.handle_departure());
                }
                (false, lobby.member_ids(), deliveries)
            }
        };

        if emptied {
            self.lobbies.write().await.remove(&code);
            tracing::info!(%code, "Last player left, lobby destroyed");
        } else {
            self.deliver(&members, deliveries).await;
        }
    }

    pub async fn lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.peers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn attach_peer(
        state: &AppState,
        conn_id: &str,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        state.register_peer(&conn_id.to_string(), tx).await;
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    async fn created_code(state: &AppState, conn: &str, name: &str) -> LobbyCode {
        match state.create_lobby(&conn.to_string(), name.to_string()).await {
            ServerMessage::LobbyCreated { code, .. } => code,
            other => panic!("Expected LobbyCreated, got {other:?}"),
        }
    }

    #[test]
    fn codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_lobby_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_CHARS.contains(&b)));
            assert!(!code.contains('O') && !code.contains('0'));
            assert!(!code.contains('I') && !code.contains('1') && !code.contains('L'));
        }
    }

    #[tokio::test]
    async fn create_makes_creator_sole_member() {
        let state = AppState::new();
        let msg = state
            .create_lobby(&"c1".to_string(), "Alice".to_string())
            .await;
        match msg {
            ServerMessage::LobbyCreated { code, players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "Alice");
                assert!(state.get(&code).await.is_some());
            }
            other => panic!("Expected LobbyCreated, got {other:?}"),
        }
        assert_eq!(state.lobby_count().await, 1);
    }

    #[tokio::test]
    async fn join_unknown_code_fails() {
        let state = AppState::new();
        let result = state
            .join_lobby(&"c1".to_string(), "ZZZZZ".to_string(), "Bob".to_string())
            .await;
        assert!(matches!(result, Err(GameError::NotFound)));
    }

    #[tokio::test]
    async fn join_is_case_insensitive_on_the_code() {
        let state = AppState::new();
        let code = created_code(&state, "c1", "Alice").await;

        let result = state
            .join_lobby(&"c2".to_string(), code.to_lowercase(), "Bob".to_string())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn join_after_start_is_rejected() {
        let state = AppState::new();
        let code = created_code(&state, "c1", "Alice").await;
        for (conn, name) in [("c2", "Bob"), ("c3", "Carol"), ("c4", "Dave")] {
            state
                .join_lobby(&conn.to_string(), code.clone(), name.to_string())
                .await
                .unwrap();
        }
        state.start_game(&"c1".to_string(), &code).await.unwrap();

        let result = state
            .join_lobby(&"c5".to_string(), code, "Eve".to_string())
            .await;
        assert!(matches!(result, Err(GameError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn last_disconnect_destroys_the_lobby() {
        let state = AppState::new();
        let code = created_code(&state, "c1", "Alice").await;
        state
            .join_lobby(&"c2".to_string(), code.clone(), "Bob".to_string())
            .await
            .unwrap();

        state.disconnect(&"c1".to_string()).await;
        assert!(state.get(&code).await.is_some());

        state.disconnect(&"c2".to_string()).await;
        assert!(state.get(&code).await.is_none());
        assert_eq!(state.lobby_count().await, 0);
    }

    #[tokio::test]
    async fn switching_lobbies_leaves_the_old_one() {
        let state = AppState::new();
        let first = created_code(&state, "c1", "Alice").await;
        let second = created_code(&state, "c1", "Alice").await;

        // Sole member moved on, so the first lobby is gone.
        assert!(state.get(&first).await.is_none());
        assert!(state.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn mid_game_disconnect_reevaluates_game_over() {
        let state = AppState::new();
        let ids = ["c1", "c2", "c3", "c4"];
        let mut rxs = Vec::new();
        for id in ids {
            rxs.push(attach_peer(&state, id).await);
        }

        let code = created_code(&state, "c1", "Alice").await;
        for (conn, name) in [("c2", "Bob"), ("c3", "Carol"), ("c4", "Dave")] {
            state
                .join_lobby(&conn.to_string(), code.clone(), name.to_string())
                .await
                .unwrap();
        }
        state.start_game(&"c1".to_string(), &code).await.unwrap();

        // Down to three active: the game may continue or end on the word
        // split, but it must not wedge.
        state.disconnect(&"c4".to_string()).await;

        // Down to two active: ends unconditionally.
        state.disconnect(&"c3".to_string()).await;
        let msgs = drain(&mut rxs[0]);
        assert!(
            msgs.iter()
                .any(|m| matches!(m, ServerMessage::GameOver { .. })),
            "two remaining players must end the game"
        );
    }

    #[tokio::test]
    async fn disconnect_of_a_straggler_closes_the_description_barrier() {
        let state = AppState::new();
        let ids = ["c1", "c2", "c3", "c4", "c5"];
        let mut rxs = Vec::new();
        for id in ids {
            rxs.push(attach_peer(&state, id).await);
        }

        let code = created_code(&state, "c1", "Alice").await;
        for (conn, name) in [("c2", "B"), ("c3", "C"), ("c4", "D"), ("c5", "E")] {
            state
                .join_lobby(&conn.to_string(), code.clone(), name.to_string())
                .await
                .unwrap();
        }
        state.start_game(&"c1".to_string(), &code).await.unwrap();

        // Pin the word split so the departure below cannot end the game:
        // one impostor among the four who stay.
        {
            let lobby = state.get(&code).await.unwrap();
            let mut lobby = lobby.lock().await;
            lobby.player_mut("c2").unwrap().word = Some("decoy".to_string());
            for conn in ["c1", "c3", "c4", "c5"] {
                lobby.player_mut(conn).unwrap().word = Some("same".to_string());
            }
        }

        for conn in ["c1", "c2", "c3", "c4"] {
            state
                .submit_description(&conn.to_string(), &code, "something".to_string())
                .await
                .unwrap();
        }

        // The one player who never submitted walks away; the other four were
        // all in, so the barrier closes for them.
        state.disconnect(&"c5".to_string()).await;
        let msgs = drain(&mut rxs[0]);
        assert!(msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::DescriptionsSubmitted { list } if list.len() == 4)));
    }

    #[tokio::test]
    async fn blank_names_get_a_placeholder() {
        let state = AppState::new();
        let msg = state
            .create_lobby(&"c1".to_string(), "   ".to_string())
            .await;
        match msg {
            ServerMessage::LobbyCreated { players, .. } => {
                assert_eq!(players[0].name, "Anonymous");
            }
            other => panic!("Expected LobbyCreated, got {other:?}"),
        }
    }
}
