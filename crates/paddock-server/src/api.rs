use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json};
use serde::Serialize;

use paddock_core::driver::{DriverCode, Team};
use paddock_core::export::{parse_export, render_export};
use paddock_core::leaderboard::CategoryLeaderboard;
use paddock_core::player::{Player, PlayerEntry, ScoreCard};
use paddock_core::results::parse_results;
use paddock_core::save::SavedGame;
use paddock_core::scoring::DnfMetric;
use paddock_core::standings::Standings;
use paddock_core::time::timestamp_now;
use paddock_core::{FetchPurpose, GamePhase, GameState, RaceSnapshot};

use crate::error::AppError;
use crate::refresh::{save_backup, start_fetch};
use crate::state::AppState;

/// One roster entry as shown to the operator. `index` is the handle for
/// `DELETE /players/{index}`.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    pub index: usize,
    pub name: String,
    pub dnf_prediction: u32,
    pub team_prediction: Team,
    pub drivers: [DriverCode; 2],
    pub scores: Option<ScoreCard>,
}

#[derive(Debug, Serialize)]
pub struct WinningTeamView {
    pub team: Team,
    pub points: f64,
}

/// Full view of the hosted game.
#[derive(Debug, Serialize)]
pub struct GameView {
    pub phase: GamePhase,
    pub players: Vec<PlayerView>,
    pub standings: Option<Standings>,
    pub leaderboards: Option<Vec<CategoryLeaderboard>>,
    pub refresh_count: u32,
    pub actual_dnf_count: Option<u32>,
    pub dnf_metric: Option<DnfMetric>,
    pub winning_team: Option<WinningTeamView>,
    pub warnings: Vec<String>,
    pub last_error: Option<String>,
    pub fetch_in_flight: bool,
    pub starting_grid: Option<RaceSnapshot>,
    pub current: Option<RaceSnapshot>,
}

/// Response for every endpoint that starts a fetch.
#[derive(Debug, Serialize)]
pub struct FetchStartedResponse {
    pub seq: u64,
    pub purpose: FetchPurpose,
    pub phase: GamePhase,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub phase: GamePhase,
    pub refresh_count: u32,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub phase: GamePhase,
    pub players: usize,
    pub refresh_count: u32,
}

fn player_view(index: usize, p: &Player) -> PlayerView {
    PlayerView {
        index,
        name: p.name.clone(),
        dnf_prediction: p.dnf_prediction,
        team_prediction: p.team_prediction,
        drivers: p.drivers,
        scores: p.scores,
    }
}

fn game_view(game: &GameState, last_error: Option<String>, in_flight: usize) -> GameView {
    GameView {
        phase: game.phase(),
        players: game
            .players()
            .iter()
            .enumerate()
            .map(|(index, p)| player_view(index, p))
            .collect(),
        standings: game.standings().cloned(),
        leaderboards: game.leaderboards(),
        refresh_count: game.refresh_count(),
        actual_dnf_count: game.actual_dnf_count(),
        dnf_metric: game.dnf_metric(),
        winning_team: game
            .winning_team()
            .map(|(team, points)| WinningTeamView { team, points }),
        warnings: game.warnings().iter().map(ToString::to_string).collect(),
        last_error,
        fetch_in_flight: in_flight > 0,
        starting_grid: game.starting_grid().cloned(),
        current: game.current_snapshot().cloned(),
    }
}

async fn current_view(state: &AppState) -> GameView {
    let session = state.session.read().await;
    game_view(&session.game, session.last_error.clone(), session.in_flight)
}

/// GET /api/v1/game — phase, roster, scores and fetch status.
pub async fn get_game(State(state): State<AppState>) -> Json<GameView> {
    Json(current_view(&state).await)
}

/// POST /api/v1/players — add a player and draw their two drivers.
pub async fn add_player(
    State(state): State<AppState>,
    body: Result<Json<PlayerEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<PlayerView>), AppError> {
    let Json(entry) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut session = state.session.write().await;
    let (game, rng) = session.game_and_rng();
    game.add_player(entry, rng)?;
    let players = session.game.players();
    let index = players.len() - 1;
    Ok((StatusCode::CREATED, Json(player_view(index, &players[index]))))
}

/// DELETE /api/v1/players/{index} — remove a player, freeing their drivers.
pub async fn remove_player(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<GameView>, AppError> {
    {
        let mut session = state.session.write().await;
        if index >= session.game.players().len() {
            return Err(AppError::NotFound(format!("no player at index {index}")));
        }
        session.game.remove_player(index)?;
    }
    Ok(Json(current_view(&state).await))
}

/// POST /api/v1/players/randomize — reshuffle every player's drivers.
pub async fn randomize_drivers(State(state): State<AppState>) -> Result<Json<GameView>, AppError> {
    {
        let mut session = state.session.write().await;
        let (game, rng) = session.game_and_rng();
        game.randomize_all_drivers(rng)?;
    }
    Ok(Json(current_view(&state).await))
}

/// POST /api/v1/players/clear — empty the roster.
pub async fn clear_players(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut session = state.session.write().await;
    session.game.clear_players()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_started(
    state: &AppState,
    purpose: FetchPurpose,
) -> Result<(StatusCode, Json<FetchStartedResponse>), AppError> {
    let ticket = start_fetch(state, purpose).await?;
    let phase = state.session.read().await.game.phase();
    Ok((
        StatusCode::ACCEPTED,
        Json(FetchStartedResponse {
            seq: ticket.seq,
            purpose: ticket.purpose,
            phase,
        }),
    ))
}

/// POST /api/v1/lock — lock bets and start capturing the starting grid.
pub async fn lock_bets(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FetchStartedResponse>), AppError> {
    state.session.write().await.game.lock()?;
    fetch_started(&state, FetchPurpose::StartingGrid).await
}

/// POST /api/v1/grid — retry the starting-grid capture.
pub async fn capture_grid(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FetchStartedResponse>), AppError> {
    fetch_started(&state, FetchPurpose::StartingGrid).await
}

/// POST /api/v1/refresh — fetch a live snapshot and rescore.
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FetchStartedResponse>), AppError> {
    fetch_started(&state, FetchPurpose::Refresh).await
}

/// POST /api/v1/finish — take the final snapshot and end the game.
pub async fn finish(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FetchStartedResponse>), AppError> {
    fetch_started(&state, FetchPurpose::Finalize).await
}

/// POST /api/v1/results — score an uploaded results CSV and end the game.
pub async fn upload_results(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ResultsResponse>, AppError> {
    let upload = parse_results(&body)?;
    let (response, backup) = {
        let mut session = state.session.write().await;
        let report = session.game.apply_results(upload)?;
        session.last_error = None;
        let backup = state
            .config
            .export
            .enabled
            .then(|| render_export(&session.game, &timestamp_now()));
        let response = ResultsResponse {
            phase: report.phase,
            refresh_count: report.refresh_count,
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
        };
        (response, backup)
    };
    if let Some(contents) = backup {
        save_backup(&state, contents).await;
    }
    Ok(Json(response))
}

/// GET /api/v1/export — the current game as an export CSV.
pub async fn export_csv(State(state): State<AppState>) -> impl IntoResponse {
    let body = {
        let session = state.session.read().await;
        render_export(&session.game, &timestamp_now())
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
}

/// POST /api/v1/import — replace the game with one read back from an export.
pub async fn import_csv(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let exported = parse_export(&body)?;
    let game = exported.into_state(state.config.game.max_players)?;

    let mut session = state.session.write().await;
    if session.in_flight > 0 {
        return Err(AppError::BadRequest(
            "cannot import while a fetch is in flight".to_string(),
        ));
    }
    let response = ImportResponse {
        phase: game.phase(),
        players: game.players().len(),
        refresh_count: game.refresh_count(),
    };
    session.game = game;
    session.last_error = None;
    tracing::info!(
        phase = %response.phase,
        players = response.players,
        "Game imported"
    );
    Ok(Json(response))
}

/// GET /api/v1/save — the saved-game JSON document.
pub async fn save_game(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let saved = {
        let session = state.session.read().await;
        SavedGame::from_state(&session.game)
    };
    let body = saved
        .to_json()
        .map_err(|e| AppError::Internal(format!("failed to encode saved game: {e}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    ))
}
