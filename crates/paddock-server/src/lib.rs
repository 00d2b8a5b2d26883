pub mod api;
pub mod backup;
pub mod config;
pub mod error;
pub mod health;
pub mod refresh;
pub mod session;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use paddock_core::{GameError, SnapshotSource};
use paddock_livetiming::LiveTimingSource;

use config::ServerConfig;
use state::AppState;

pub use refresh::spawn_auto_refresh;

/// Build the Axum router and application state around a snapshot source.
pub fn build_app_with_source(
    config: ServerConfig,
    source: Arc<dyn SnapshotSource>,
) -> (Router<()>, AppState) {
    let timeout = Duration::from_secs(config.http.request_timeout_secs);
    let allow_any_origin = config.http.allow_any_origin;
    let state = AppState::new(config, source);

    let api_routes = Router::new()
        .route("/game", get(api::get_game))
        .route("/players", post(api::add_player))
        .route("/players/{index}", delete(api::remove_player))
        .route("/players/randomize", post(api::randomize_drivers))
        .route("/players/clear", post(api::clear_players))
        .route("/lock", post(api::lock_bets))
        .route("/grid", post(api::capture_grid))
        .route("/refresh", post(api::refresh))
        .route("/finish", post(api::finish))
        .route("/results", post(api::upload_results))
        .route("/export", get(api::export_csv))
        .route("/import", post(api::import_csv))
        .route("/save", get(api::save_game))
        .route("/health", get(health::health_check));

    let mut app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TimeoutLayer::new(timeout))
        .with_state(state.clone());
    if allow_any_origin {
        app = app.layer(CorsLayer::permissive());
    }

    (app, state)
}

/// Build the app against the live-timing dashboard named in the config.
pub fn build_app(config: ServerConfig) -> Result<(Router<()>, AppState), GameError> {
    let source = LiveTimingSource::new(config.live_timing.clone())?;
    Ok(build_app_with_source(config, Arc::new(source)))
}
