use serde::{Deserialize, Serialize};

use crate::driver::{DRIVER_COUNT, DriverCode, Team};
use crate::error::GameError;
use crate::player::Player;
use crate::snapshot::RaceSnapshot;

/// How the DNF category was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnfMetric {
    /// At least one player named the exact count.
    Exact,
    /// Nobody was exact; the nearest predictions won.
    Closest,
}

/// Raw category scores for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub dnf_score: u8,
    pub team_score: u8,
    pub places_gained_score: i32,
}

/// Everything one scoring pass produces. `scores` is parallel to the
/// roster it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub scores: Vec<CategoryScores>,
    pub actual_dnf_count: u32,
    pub dnf_metric: Option<DnfMetric>,
    pub winning_team: Option<(Team, f64)>,
    pub warnings: Vec<GameError>,
}

/// Score every player against the current snapshot.
///
/// Deterministic for identical inputs. A missing starting grid holds
/// places gained at zero instead of failing.
pub fn score_players(
    players: &[Player],
    grid: Option<&RaceSnapshot>,
    current: &RaceSnapshot,
) -> ScoringOutcome {
    let actual_dnf_count = current.dnf_count();
    let predictions: Vec<u32> = players.iter().map(|p| p.dnf_prediction).collect();
    let (dnf, dnf_metric) = dnf_scores(&predictions, actual_dnf_count);
    let teams: Vec<Team> = players.iter().map(|p| p.team_prediction).collect();
    let team = team_scores(&teams, current);

    let scores = players
        .iter()
        .zip(dnf.iter().zip(&team))
        .map(|(player, (&dnf_score, &team_score))| CategoryScores {
            dnf_score,
            team_score,
            places_gained_score: places_gained(&player.drivers, grid, current),
        })
        .collect();

    ScoringOutcome {
        scores,
        actual_dnf_count,
        dnf_metric,
        winning_team: current.winning_team(),
        warnings: data_warnings(players, grid, current),
    }
}

/// 1 for every exact prediction; failing that, 1 for every prediction at
/// the smallest distance from `actual`.
pub fn dnf_scores(predictions: &[u32], actual: u32) -> (Vec<u8>, Option<DnfMetric>) {
    let Some(min_diff) = predictions.iter().map(|p| p.abs_diff(actual)).min() else {
        return (Vec::new(), None);
    };
    let metric = if min_diff == 0 {
        DnfMetric::Exact
    } else {
        DnfMetric::Closest
    };
    let scores = predictions
        .iter()
        .map(|p| u8::from(p.abs_diff(actual) == min_diff))
        .collect();
    (scores, Some(metric))
}

/// 1 for every predicted team whose points sit closest to the leader's.
/// With no team points at all there is no leader and nobody scores.
pub fn team_scores(predictions: &[Team], snapshot: &RaceSnapshot) -> Vec<u8> {
    let Some((_, winning_points)) = snapshot.winning_team() else {
        return vec![0; predictions.len()];
    };
    let diffs: Vec<f64> = predictions
        .iter()
        .map(|t| (snapshot.points_for(*t) - winning_points).abs())
        .collect();
    let min_diff = diffs.iter().copied().fold(f64::INFINITY, f64::min);
    diffs.iter().map(|d| u8::from(*d == min_diff)).collect()
}

/// Sum of `start - current` over the drivers that are still running and
/// ranked in both snapshots.
pub fn places_gained(
    drivers: &[DriverCode; 2],
    grid: Option<&RaceSnapshot>,
    current: &RaceSnapshot,
) -> i32 {
    let Some(grid) = grid else {
        return 0;
    };
    drivers
        .iter()
        .filter(|d| !current.is_dnf(**d))
        .filter_map(|d| Some((grid.position(*d)?, current.position(*d)?)))
        .map(|(start, now)| start as i32 - now as i32)
        .sum()
}

/// Non-fatal gaps in the data a scoring pass ran on.
pub fn data_warnings(
    players: &[Player],
    grid: Option<&RaceSnapshot>,
    current: &RaceSnapshot,
) -> Vec<GameError> {
    let mut warnings = Vec::new();
    if current.driver_count() < DRIVER_COUNT {
        warnings.push(GameError::data_incomplete(format!(
            "current snapshot covers {} of {DRIVER_COUNT} drivers",
            current.driver_count()
        )));
    }
    if !players.is_empty() && grid.is_none() {
        warnings.push(GameError::data_incomplete(
            "no starting grid captured; places gained held at 0",
        ));
    }
    for player in players {
        for driver in player.drivers {
            if !current.covers(driver) {
                warnings.push(GameError::data_incomplete(format!(
                    "{driver} ({}) missing from current snapshot",
                    player.name
                )));
            }
            if let Some(grid) = grid
                && grid.position(driver).is_none()
            {
                warnings.push(GameError::data_incomplete(format!(
                    "{driver} ({}) missing from starting grid",
                    player.name
                )));
            }
        }
    }
    warnings
}
