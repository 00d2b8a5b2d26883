use std::sync::Arc;
use std::time::Duration;

use paddock_core::export::render_export;
use paddock_core::time::timestamp_now;
use paddock_core::{FetchOutcome, FetchPurpose, FetchTicket, GameError, GamePhase};

use crate::backup::write_backup;
use crate::session::Session;
use crate::state::AppState;

/// Issue a ticket and run the fetch on a background task. Returns as soon
/// as the ticket exists; the result is applied when the source answers.
pub async fn start_fetch(state: &AppState, purpose: FetchPurpose) -> Result<FetchTicket, GameError> {
    let ticket = {
        let mut session = state.session.write().await;
        let ticket = session.game.issue_fetch(purpose)?;
        session.in_flight += 1;
        ticket
    };
    tracing::info!(seq = ticket.seq, ?purpose, source = state.source.name(), "Fetch started");

    let task_state = state.clone();
    tokio::spawn(async move {
        run_fetch(task_state, ticket).await;
    });
    Ok(ticket)
}

async fn run_fetch(state: AppState, ticket: FetchTicket) {
    let source = Arc::clone(&state.source);
    let result = source.fetch_snapshot(ticket.purpose.detect_dnf()).await;

    let backup = {
        let mut session = state.session.write().await;
        session.in_flight = session.in_flight.saturating_sub(1);
        apply(&mut session, ticket, result, state.config.export.enabled)
    };

    if let Some(contents) = backup {
        save_backup(&state, contents).await;
    }
}

/// Apply a fetch result to the session. Returns the export document to
/// back up when a live snapshot was committed and exports are enabled.
fn apply(
    session: &mut Session,
    ticket: FetchTicket,
    result: Result<paddock_core::RaceSnapshot, GameError>,
    export_enabled: bool,
) -> Option<String> {
    match session.game.apply_fetch(ticket, result) {
        Ok(FetchOutcome::Applied(_)) => {
            session.last_error = None;
            export_enabled.then(|| render_export(&session.game, &timestamp_now()))
        },
        Ok(FetchOutcome::GridCaptured { .. }) => {
            session.last_error = None;
            None
        },
        Ok(FetchOutcome::Stale { .. }) => None,
        Err(e) => {
            session.last_error = Some(e.to_string());
            None
        },
    }
}

/// Write a backup file, logging instead of failing the caller.
pub async fn save_backup(state: &AppState, contents: String) {
    match write_backup(&state.config.export.dir, contents).await {
        Ok(path) => tracing::info!(path = %path.display(), "Backup written"),
        Err(e) => tracing::warn!(
            dir = %state.config.export.dir.display(),
            error = %e,
            "Failed to write backup"
        ),
    }
}

/// Background task issuing refresh fetches on a fixed interval while the
/// race is live. Ticks are skipped while a fetch is already running.
pub fn spawn_auto_refresh(state: AppState) {
    let secs = state.config.refresh.interval_secs;
    if secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let interval = Duration::from_secs(secs);
        loop {
            tokio::time::sleep(interval).await;

            let (phase, busy) = {
                let session = state.session.read().await;
                (
                    session.game.phase(),
                    session.in_flight > 0 || session.game.is_finalizing(),
                )
            };
            match phase {
                GamePhase::Betting => continue,
                GamePhase::Finished => {
                    tracing::info!("Race finished, stopping auto-refresh");
                    break;
                },
                GamePhase::Race if busy => {
                    tracing::debug!("Fetch in flight, skipping auto-refresh tick");
                },
                GamePhase::Race => {
                    if let Err(e) = start_fetch(&state, FetchPurpose::Refresh).await {
                        tracing::warn!(error = %e, "Auto-refresh not started");
                    }
                },
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use paddock_core::test_helpers::{full_grid, locked_game};

    use super::*;
    use crate::config::GameSection;

    fn session() -> Session {
        let mut session = Session::new(&GameSection::default());
        session.game = locked_game(2, 8);
        session
    }

    #[test]
    fn applied_refresh_produces_backup() {
        let mut s = session();
        let ticket = s.game.issue_fetch(FetchPurpose::Refresh).unwrap();
        let backup = apply(&mut s, ticket, Ok(full_grid()), true);
        assert!(backup.unwrap().starts_with("Phase,race"));
        assert!(s.last_error.is_none());
    }

    #[test]
    fn failure_recorded_as_last_error() {
        let mut s = session();
        let ticket = s.game.issue_fetch(FetchPurpose::Refresh).unwrap();
        let backup = apply(
            &mut s,
            ticket,
            Err(GameError::source_unavailable("timeout")),
            true,
        );
        assert!(backup.is_none());
        assert!(s.last_error.as_deref().unwrap().contains("timeout"));

        let retry = s.game.issue_fetch(FetchPurpose::Refresh).unwrap();
        apply(&mut s, retry, Ok(full_grid()), false);
        assert!(s.last_error.is_none());
    }

    #[test]
    fn grid_capture_skips_backup() {
        let mut s = session();
        let ticket = s.game.issue_fetch(FetchPurpose::StartingGrid).unwrap();
        assert!(apply(&mut s, ticket, Ok(full_grid()), true).is_none());
        assert!(s.game.starting_grid().is_some());
    }
}
