use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::snapshot::RaceSnapshot;
use crate::standings::Category;

/// The figure a player is ranked by within one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Measure {
    /// Distance between the DNF prediction and the actual count.
    OffBy(u32),
    PlacesGained(i32),
    /// Current points of the predicted team.
    TeamPoints(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub measure: Measure,
}

/// Every player ordered within one category, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeaderboard {
    pub category: Category,
    pub entries: Vec<LeaderboardEntry>,
}

/// Full per-category orderings. All sorts are stable, so players with
/// equal measures stay in roster order.
pub fn category_leaderboards(
    players: &[Player],
    current: &RaceSnapshot,
) -> Vec<CategoryLeaderboard> {
    let actual = current.dnf_count();

    let mut dnf: Vec<(u32, LeaderboardEntry)> = players
        .iter()
        .map(|p| {
            let off_by = p.dnf_prediction.abs_diff(actual);
            (
                off_by,
                LeaderboardEntry {
                    name: p.name.clone(),
                    measure: Measure::OffBy(off_by),
                },
            )
        })
        .collect();
    dnf.sort_by_key(|(off_by, _)| *off_by);

    let mut team: Vec<(f64, LeaderboardEntry)> = players
        .iter()
        .map(|p| {
            let points = current.points_for(p.team_prediction);
            (
                points,
                LeaderboardEntry {
                    name: p.name.clone(),
                    measure: Measure::TeamPoints(points),
                },
            )
        })
        .collect();
    team.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut places: Vec<(i32, LeaderboardEntry)> = players
        .iter()
        .map(|p| {
            let gained = p.scores.map(|s| s.places_gained_score).unwrap_or(0);
            (
                gained,
                LeaderboardEntry {
                    name: p.name.clone(),
                    measure: Measure::PlacesGained(gained),
                },
            )
        })
        .collect();
    places.sort_by(|a, b| b.0.cmp(&a.0));

    vec![
        CategoryLeaderboard {
            category: Category::Dnf,
            entries: dnf.into_iter().map(|(_, e)| e).collect(),
        },
        CategoryLeaderboard {
            category: Category::Team,
            entries: team.into_iter().map(|(_, e)| e).collect(),
        },
        CategoryLeaderboard {
            category: Category::PlacesGained,
            entries: places.into_iter().map(|(_, e)| e).collect(),
        },
    ]
}
