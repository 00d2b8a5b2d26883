use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::driver::Team;
use crate::error::GameError;
use crate::leaderboard::{self, CategoryLeaderboard};
use crate::player::{Player, PlayerEntry, ScoreCard};
use crate::results::ResultsUpload;
use crate::roster::{DEFAULT_MAX_PLAYERS, Roster};
use crate::scoring::{self, DnfMetric};
use crate::snapshot::RaceSnapshot;
use crate::standings::{self, Standings};

/// Settings fixed when a game is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub max_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// Lifecycle of a game. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Betting,
    Race,
    Finished,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Betting => "betting",
            GamePhase::Race => "race",
            GamePhase::Finished => "finished",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GamePhase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "betting" => Ok(GamePhase::Betting),
            "race" => Ok(GamePhase::Race),
            "finished" => Ok(GamePhase::Finished),
            other => Err(GameError::validation(format!("unknown phase '{other}'"))),
        }
    }
}

/// Why a snapshot is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPurpose {
    /// Baseline positions, captured once after bets lock.
    StartingGrid,
    /// Live update of the current snapshot.
    Refresh,
    /// Last update; the game finishes once it applies.
    Finalize,
}

impl FetchPurpose {
    /// The grid is sampled before anyone can have retired.
    pub fn detect_dnf(self) -> bool {
        !matches!(self, FetchPurpose::StartingGrid)
    }
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    pub seq: u64,
    pub purpose: FetchPurpose,
}

/// Summary of a committed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub seq: u64,
    pub purpose: FetchPurpose,
    pub refresh_count: u32,
    pub phase: GamePhase,
    pub warnings: Vec<GameError>,
}

/// What happened to a fetch result handed to [`GameState::apply_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    GridCaptured { seq: u64, drivers: usize },
    Applied(RefreshReport),
    /// A newer fetch was issued, or the game moved on, before this one
    /// returned. Nothing changed.
    Stale { seq: u64 },
}

/// All state of one game.
///
/// The roster is frozen once bets lock, so fetch results never race a
/// roster change. Snapshot results are only committed through tickets.
#[derive(Debug, Clone)]
pub struct GameState {
    phase: GamePhase,
    roster: Roster,
    starting_grid: Option<RaceSnapshot>,
    current: Option<RaceSnapshot>,
    standings: Option<Standings>,
    actual_dnf_count: Option<u32>,
    dnf_metric: Option<DnfMetric>,
    winning_team: Option<(Team, f64)>,
    warnings: Vec<GameError>,
    refresh_count: u32,
    next_seq: u64,
    latest_live_seq: Option<u64>,
    pending_finalize: Option<u64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            phase: GamePhase::Betting,
            roster: Roster::with_capacity(config.max_players),
            starting_grid: None,
            current: None,
            standings: None,
            actual_dnf_count: None,
            dnf_metric: None,
            winning_team: None,
            warnings: Vec::new(),
            refresh_count: 0,
            next_seq: 1,
            latest_live_seq: None,
            pending_finalize: None,
        }
    }

    /// Rebuild a game from persisted parts and rescore it.
    pub fn restore(
        phase: GamePhase,
        roster: Roster,
        starting_grid: Option<RaceSnapshot>,
        current: Option<RaceSnapshot>,
        refresh_count: u32,
    ) -> Self {
        let mut state = Self {
            phase,
            roster,
            starting_grid,
            current,
            refresh_count,
            ..Self::default()
        };
        state.rescore();
        state
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn starting_grid(&self) -> Option<&RaceSnapshot> {
        self.starting_grid.as_ref()
    }

    pub fn current_snapshot(&self) -> Option<&RaceSnapshot> {
        self.current.as_ref()
    }

    pub fn standings(&self) -> Option<&Standings> {
        self.standings.as_ref()
    }

    pub fn refresh_count(&self) -> u32 {
        self.refresh_count
    }

    pub fn actual_dnf_count(&self) -> Option<u32> {
        self.actual_dnf_count
    }

    pub fn dnf_metric(&self) -> Option<DnfMetric> {
        self.dnf_metric
    }

    pub fn winning_team(&self) -> Option<(Team, f64)> {
        self.winning_team
    }

    /// DataIncomplete warnings from the latest scoring pass.
    pub fn warnings(&self) -> &[GameError] {
        &self.warnings
    }

    pub fn is_finalizing(&self) -> bool {
        self.pending_finalize.is_some()
    }

    fn ensure_phase(&self, expected: GamePhase, action: &str) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::validation(format!(
                "cannot {action} during {} phase",
                self.phase
            )));
        }
        Ok(())
    }

    // ---- Roster --------------------------------------------------------

    pub fn add_player<R: Rng + ?Sized>(
        &mut self,
        entry: PlayerEntry,
        rng: &mut R,
    ) -> Result<&Player, GameError> {
        self.ensure_phase(GamePhase::Betting, "add players")?;
        let player = self.roster.add(entry, rng)?;
        tracing::info!(
            player = %player.name,
            drivers = %format!("{}/{}", player.drivers[0], player.drivers[1]),
            "Player added"
        );
        Ok(player)
    }

    pub fn remove_player(&mut self, index: usize) -> Result<Player, GameError> {
        self.ensure_phase(GamePhase::Betting, "remove players")?;
        let removed = self.roster.remove(index)?;
        tracing::info!(player = %removed.name, index, "Player removed");
        Ok(removed)
    }

    pub fn randomize_all_drivers<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Betting, "reshuffle drivers")?;
        self.roster.randomize(rng)?;
        tracing::info!(players = self.roster.len(), "Drivers reshuffled");
        Ok(())
    }

    pub fn clear_players(&mut self) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Betting, "clear players")?;
        let cleared = self.roster.len();
        self.roster.clear();
        tracing::info!(cleared, "Roster cleared");
        Ok(())
    }

    /// Freeze predictions and start the race. Happens exactly once.
    pub fn lock(&mut self) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Betting, "lock bets")?;
        if self.roster.is_empty() {
            return Err(GameError::validation("cannot lock bets with no players"));
        }
        self.phase = GamePhase::Race;
        tracing::info!(players = self.roster.len(), "Bets locked");
        Ok(())
    }

    // ---- Fetch sequencing ----------------------------------------------

    /// Issue a ticket for a new fetch. Refresh and finalize tickets
    /// supersede every earlier one.
    pub fn issue_fetch(&mut self, purpose: FetchPurpose) -> Result<FetchTicket, GameError> {
        match purpose {
            FetchPurpose::StartingGrid => {
                self.ensure_phase(GamePhase::Race, "capture the starting grid")?;
                if self.starting_grid.is_some() {
                    return Err(GameError::validation("starting grid already captured"));
                }
            },
            FetchPurpose::Refresh | FetchPurpose::Finalize => {
                self.ensure_phase(GamePhase::Race, "refresh positions")?;
                if self.pending_finalize.is_some() {
                    return Err(GameError::validation("race is already being finalized"));
                }
            },
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        match purpose {
            FetchPurpose::StartingGrid => {},
            FetchPurpose::Refresh => self.latest_live_seq = Some(seq),
            FetchPurpose::Finalize => {
                self.latest_live_seq = Some(seq);
                self.pending_finalize = Some(seq);
            },
        }
        tracing::debug!(seq, ?purpose, "Fetch issued");
        Ok(FetchTicket { seq, purpose })
    }

    /// Commit a fetch result if its ticket is still current.
    ///
    /// Grid results only land during the race, so a finished game's scores
    /// never move.
    ///
    /// Errors, including an empty snapshot, leave every snapshot and score
    /// untouched and are handed back to the caller.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<RaceSnapshot, GameError>,
    ) -> Result<FetchOutcome, GameError> {
        let snapshot = match result {
            Ok(s) if s.is_empty() => Err(GameError::source_unavailable(
                "snapshot contained no drivers",
            )),
            other => other,
        };
        let snapshot = match snapshot {
            Ok(s) => s,
            Err(e) => {
                if self.pending_finalize == Some(ticket.seq) {
                    self.pending_finalize = None;
                }
                tracing::warn!(seq = ticket.seq, purpose = ?ticket.purpose, error = %e, "Fetch failed");
                return Err(e);
            },
        };

        match ticket.purpose {
            FetchPurpose::StartingGrid => {
                if self.starting_grid.is_some() || self.phase != GamePhase::Race {
                    tracing::debug!(seq = ticket.seq, "Stale grid fetch discarded");
                    return Ok(FetchOutcome::Stale { seq: ticket.seq });
                }
                let drivers = snapshot.driver_count();
                self.starting_grid = Some(snapshot);
                tracing::info!(seq = ticket.seq, drivers, "Starting grid captured");
                if self.current.is_some() {
                    self.rescore();
                }
                Ok(FetchOutcome::GridCaptured {
                    seq: ticket.seq,
                    drivers,
                })
            },
            FetchPurpose::Refresh | FetchPurpose::Finalize => {
                if self.phase != GamePhase::Race || self.latest_live_seq != Some(ticket.seq) {
                    tracing::debug!(
                        seq = ticket.seq,
                        latest = ?self.latest_live_seq,
                        "Stale fetch discarded"
                    );
                    return Ok(FetchOutcome::Stale { seq: ticket.seq });
                }
                Ok(FetchOutcome::Applied(self.commit(ticket, snapshot)))
            },
        }
    }

    fn commit(&mut self, ticket: FetchTicket, snapshot: RaceSnapshot) -> RefreshReport {
        self.current = Some(snapshot);
        match ticket.purpose {
            FetchPurpose::Finalize => {
                self.phase = GamePhase::Finished;
                self.pending_finalize = None;
            },
            _ => self.refresh_count += 1,
        }
        self.rescore();
        tracing::info!(
            seq = ticket.seq,
            refresh_count = self.refresh_count,
            phase = %self.phase,
            warnings = self.warnings.len(),
            "Snapshot applied"
        );
        RefreshReport {
            seq: ticket.seq,
            purpose: ticket.purpose,
            refresh_count: self.refresh_count,
            phase: self.phase,
            warnings: self.warnings.clone(),
        }
    }

    /// Score an uploaded final classification and finish the game.
    ///
    /// An already captured starting grid wins over the uploaded one. Any
    /// fetch still in flight becomes stale.
    pub fn apply_results(&mut self, upload: ResultsUpload) -> Result<RefreshReport, GameError> {
        self.ensure_phase(GamePhase::Race, "upload results")?;
        let ResultsUpload {
            starting_grid,
            final_snapshot,
            warnings,
        } = upload;
        if self.starting_grid.is_none() {
            self.starting_grid = starting_grid;
        } else if starting_grid.is_some() {
            tracing::info!("Keeping captured starting grid over uploaded one");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_live_seq = Some(seq);
        let ticket = FetchTicket {
            seq,
            purpose: FetchPurpose::Finalize,
        };
        let mut report = self.commit(ticket, final_snapshot);
        for w in &warnings {
            tracing::warn!(warning = %w, "Results upload");
        }
        report.warnings.extend(warnings);
        Ok(report)
    }

    // ---- Scoring -------------------------------------------------------

    /// Recompute scores and standings from the stored snapshots.
    fn rescore(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let outcome =
            scoring::score_players(self.roster.players(), self.starting_grid.as_ref(), current);
        let standings = standings::aggregate(
            self.roster.players(),
            &outcome.scores,
            outcome.dnf_metric,
        );
        for ((player, scores), won) in self
            .roster
            .players_mut()
            .iter_mut()
            .zip(&outcome.scores)
            .zip(&standings.categories_won)
        {
            player.scores = Some(ScoreCard {
                dnf_score: scores.dnf_score,
                team_score: scores.team_score,
                places_gained_score: scores.places_gained_score,
                categories_won: *won,
            });
        }
        for w in &outcome.warnings {
            tracing::warn!(warning = %w, "Scoring on incomplete data");
        }
        self.actual_dnf_count = Some(outcome.actual_dnf_count);
        self.dnf_metric = outcome.dnf_metric;
        self.winning_team = outcome.winning_team;
        self.warnings = outcome.warnings;
        self.standings = Some(standings);
    }

    /// Players in standings order, or roster order before any scoring.
    pub fn ranked_players(&self) -> Vec<&Player> {
        let players = self.roster.players();
        match &self.standings {
            Some(s) => s.ranking.iter().filter_map(|i| players.get(*i)).collect(),
            None => players.iter().collect(),
        }
    }

    pub fn leaderboards(&self) -> Option<Vec<CategoryLeaderboard>> {
        let current = self.current.as_ref()?;
        Some(leaderboard::category_leaderboards(
            self.roster.players(),
            current,
        ))
    }
}
