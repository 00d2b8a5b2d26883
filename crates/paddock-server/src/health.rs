use axum::Json;
use axum::extract::State;
use serde::Serialize;

use paddock_core::GamePhase;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub source: String,
    pub game: GameInfo,
}

#[derive(Serialize)]
pub struct GameInfo {
    pub phase: GamePhase,
    pub players: usize,
    pub fetches_in_flight: usize,
}

/// Health check endpoint. Reports the snapshot source and game phase.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let game = {
        let session = state.session.read().await;
        GameInfo {
            phase: session.game.phase(),
            players: session.game.players().len(),
            fetches_in_flight: session.in_flight,
        }
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        source: state.source.name().to_string(),
        game,
    })
}
