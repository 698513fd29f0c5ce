//! WebSocket message dispatch
//!
//! Maps inbound client commands onto core lobby operations. Success output
//! travels through the per-connection channels registered with `AppState`;
//! the return value here is only used to answer the originating client
//! directly (creation/join acks and errors).

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, GameError};
use crate::types::ConnectionId;
use std::sync::Arc;

/// Handle a client message and return the optional direct response.
pub async fn handle_message(
    conn_id: &ConnectionId,
    msg: ClientMessage,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateLobby { name } => {
            tracing::info!(%conn_id, "Create lobby request from {}", name);
            Some(state.create_lobby(conn_id, name).await)
        }

        ClientMessage::JoinLobby { code, name } => {
            tracing::info!(%conn_id, %code, "Join request from {}", name);
            match state.join_lobby(conn_id, code, name).await {
                Ok(reply) => Some(reply),
                Err(e) => Some(e.into()),
            }
        }

        ClientMessage::StartGame { code } => reply(state.start_game(conn_id, &code).await),

        ClientMessage::SubmitDescription { code, text } => {
            reply(state.submit_description(conn_id, &code, text).await)
        }

        ClientMessage::SubmitVote { code, target_id } => {
            reply(state.submit_vote(conn_id, &code, &target_id).await)
        }

        ClientMessage::NextRound { code } => reply(state.next_round(conn_id, &code).await),

        ClientMessage::ReturnToLobby { code } => {
            reply(state.return_to_lobby(conn_id, &code).await)
        }

        ClientMessage::ForceAdvance { code, phase } => {
            tracing::info!(%conn_id, %code, ?phase, "Force-advance requested");
            reply(state.force_advance(conn_id, &code, phase).await)
        }
    }
}

/// Errors go back to the originating client only; success is silent here
/// because the interesting output already went out through the fan-out
/// channels.
fn reply(result: Result<(), GameError>) -> Option<ServerMessage> {
    match result {
        Ok(()) => None,
        Err(e) => Some(e.into()),
    }
}
