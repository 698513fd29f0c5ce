//! Small HTTP introspection surface next to the WebSocket endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub lobbies: usize,
    pub connections: usize,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        lobbies: state.lobby_count().await,
        connections: state.connection_count().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_counts() {
        let state = Arc::new(AppState::new());
        state
            .create_lobby(&"c1".to_string(), "Alice".to_string())
            .await;

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.lobbies, 1);
        assert_eq!(body.connections, 0);
    }
}
