use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::driver::{DriverCode, Team};
use crate::error::GameError;

/// Championship points awarded for positions 1 through 10.
pub const POINTS_BY_POSITION: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

/// Points for a classified position, zero outside the top ten.
pub fn points_for_position(position: u32) -> f64 {
    match position {
        0 => 0.0,
        p => POINTS_BY_POSITION
            .get(p as usize - 1)
            .copied()
            .unwrap_or(0.0),
    }
}

/// A point-in-time sample of the race.
///
/// Retired drivers never carry a position, ranks are unique and start at 1
/// (gaps allowed), and team points are finite and non-negative. A snapshot
/// is never mutated once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "SnapshotParts")]
pub struct RaceSnapshot {
    positions: BTreeMap<DriverCode, u32>,
    dnf: BTreeSet<DriverCode>,
    team_points: BTreeMap<Team, f64>,
}

#[derive(Deserialize)]
struct SnapshotParts {
    #[serde(default)]
    positions: BTreeMap<DriverCode, u32>,
    #[serde(default)]
    dnf: BTreeSet<DriverCode>,
    #[serde(default)]
    team_points: BTreeMap<Team, f64>,
}

impl TryFrom<SnapshotParts> for RaceSnapshot {
    type Error = GameError;

    fn try_from(parts: SnapshotParts) -> Result<Self, Self::Error> {
        RaceSnapshot::new(parts.positions, parts.dnf, parts.team_points)
    }
}

impl RaceSnapshot {
    pub fn new(
        positions: BTreeMap<DriverCode, u32>,
        dnf: BTreeSet<DriverCode>,
        team_points: BTreeMap<Team, f64>,
    ) -> Result<Self, GameError> {
        if let Some(driver) = dnf.iter().find(|d| positions.contains_key(d)) {
            return Err(GameError::validation(format!(
                "{driver} is both classified and retired"
            )));
        }
        let mut seen = BTreeSet::new();
        for (driver, &rank) in &positions {
            if rank == 0 {
                return Err(GameError::validation(format!(
                    "{driver} has position 0; positions start at 1"
                )));
            }
            if !seen.insert(rank) {
                return Err(GameError::validation(format!(
                    "position {rank} is held by more than one driver"
                )));
            }
        }
        if let Some((team, points)) = team_points
            .iter()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(GameError::validation(format!(
                "{team} has invalid points total {points}"
            )));
        }
        Ok(Self {
            positions,
            dnf,
            team_points,
        })
    }

    /// Build a snapshot from a running order.
    ///
    /// Drivers in `dnf` are skipped; the rest are ranked 1..n in the order
    /// given and their teams collect points from [`POINTS_BY_POSITION`].
    /// Repeated drivers keep their first slot.
    pub fn from_classification(
        order: &[DriverCode],
        dnf: &BTreeSet<DriverCode>,
    ) -> Result<Self, GameError> {
        let mut positions = BTreeMap::new();
        let mut team_points = BTreeMap::new();
        let mut rank = 0u32;
        for &driver in order {
            if dnf.contains(&driver) || positions.contains_key(&driver) {
                continue;
            }
            rank += 1;
            positions.insert(driver, rank);
            let points = points_for_position(rank);
            if points > 0.0 {
                *team_points.entry(driver.team()).or_insert(0.0) += points;
            }
        }
        Self::new(positions, dnf.clone(), team_points)
    }

    pub fn position(&self, driver: DriverCode) -> Option<u32> {
        self.positions.get(&driver).copied()
    }

    pub fn positions(&self) -> &BTreeMap<DriverCode, u32> {
        &self.positions
    }

    pub fn is_dnf(&self, driver: DriverCode) -> bool {
        self.dnf.contains(&driver)
    }

    pub fn dnf_set(&self) -> &BTreeSet<DriverCode> {
        &self.dnf
    }

    pub fn dnf_count(&self) -> u32 {
        self.dnf.len() as u32
    }

    pub fn team_points(&self) -> &BTreeMap<Team, f64> {
        &self.team_points
    }

    /// Points for `team`, zero when the team is absent.
    pub fn points_for(&self, team: Team) -> f64 {
        self.team_points.get(&team).copied().unwrap_or(0.0)
    }

    /// Highest-scoring team; the earliest-declared team wins a tie.
    pub fn winning_team(&self) -> Option<(Team, f64)> {
        self.team_points
            .iter()
            .fold(None, |best: Option<(Team, f64)>, (&team, &points)| match best {
                Some((_, top)) if top >= points => best,
                _ => Some((team, points)),
            })
    }

    /// Classified and retired drivers together.
    pub fn driver_count(&self) -> usize {
        self.positions.len() + self.dnf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.driver_count() == 0
    }

    /// Whether the driver appears at all, classified or retired.
    pub fn covers(&self, driver: DriverCode) -> bool {
        self.positions.contains_key(&driver) || self.dnf.contains(&driver)
    }

    /// Classified drivers ordered by position.
    pub fn running_order(&self) -> Vec<(DriverCode, u32)> {
        let mut order: Vec<_> = self.positions.iter().map(|(&d, &p)| (d, p)).collect();
        order.sort_by_key(|&(_, p)| p);
        order
    }

    /// Team totals ordered by points descending; ties keep team order.
    pub fn team_standings(&self) -> Vec<(Team, f64)> {
        let mut standings: Vec<_> = self.team_points.iter().map(|(&t, &p)| (t, p)).collect();
        standings.sort_by(|a, b| b.1.total_cmp(&a.1));
        standings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(entries: &[(DriverCode, u32)]) -> BTreeMap<DriverCode, u32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn points_table_matches_championship() {
        assert_eq!(points_for_position(1), 25.0);
        assert_eq!(points_for_position(10), 1.0);
        assert_eq!(points_for_position(11), 0.0);
        assert_eq!(points_for_position(0), 0.0);
    }

    #[test]
    fn rejects_retired_driver_with_position() {
        let dnf = BTreeSet::from([DriverCode::Ver]);
        let err = RaceSnapshot::new(positions(&[(DriverCode::Ver, 1)]), dnf, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn rejects_duplicate_and_zero_ranks() {
        let dup = positions(&[(DriverCode::Ver, 1), (DriverCode::Ham, 1)]);
        assert!(RaceSnapshot::new(dup, BTreeSet::new(), BTreeMap::new()).is_err());
        let zero = positions(&[(DriverCode::Ver, 0)]);
        assert!(RaceSnapshot::new(zero, BTreeSet::new(), BTreeMap::new()).is_err());
    }

    #[test]
    fn rejects_negative_points() {
        let points = BTreeMap::from([(Team::Ferrari, -1.0)]);
        assert!(RaceSnapshot::new(BTreeMap::new(), BTreeSet::new(), points).is_err());
    }

    #[test]
    fn gaps_in_ranks_are_allowed() {
        let snap = RaceSnapshot::new(
            positions(&[(DriverCode::Ver, 1), (DriverCode::Ham, 4)]),
            BTreeSet::new(),
            BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(snap.position(DriverCode::Ham), Some(4));
    }

    #[test]
    fn classification_skips_retired_and_awards_points() {
        let order = [
            DriverCode::Nor,
            DriverCode::Ver,
            DriverCode::Pia,
            DriverCode::Lec,
        ];
        let dnf = BTreeSet::from([DriverCode::Ver]);
        let snap = RaceSnapshot::from_classification(&order, &dnf).unwrap();
        assert_eq!(snap.position(DriverCode::Nor), Some(1));
        assert_eq!(snap.position(DriverCode::Pia), Some(2));
        assert_eq!(snap.position(DriverCode::Lec), Some(3));
        assert_eq!(snap.position(DriverCode::Ver), None);
        assert!(snap.is_dnf(DriverCode::Ver));
        assert_eq!(snap.points_for(Team::McLaren), 43.0);
        assert_eq!(snap.points_for(Team::Ferrari), 15.0);
        assert_eq!(snap.points_for(Team::RedBullRacing), 0.0);
        assert_eq!(snap.driver_count(), 4);
    }

    #[test]
    fn classification_ignores_repeated_driver() {
        let order = [DriverCode::Ver, DriverCode::Ham, DriverCode::Ver];
        let snap = RaceSnapshot::from_classification(&order, &BTreeSet::new()).unwrap();
        assert_eq!(snap.position(DriverCode::Ver), Some(1));
        assert_eq!(snap.positions().len(), 2);
    }

    #[test]
    fn winning_team_tie_goes_to_declaration_order() {
        let points = BTreeMap::from([(Team::Haas, 30.0), (Team::Mercedes, 30.0)]);
        let snap = RaceSnapshot::new(BTreeMap::new(), BTreeSet::new(), points).unwrap();
        assert_eq!(snap.winning_team(), Some((Team::Mercedes, 30.0)));
    }

    #[test]
    fn winning_team_absent_without_points() {
        assert_eq!(RaceSnapshot::default().winning_team(), None);
    }

    #[test]
    fn team_standings_sorted_descending() {
        let points = BTreeMap::from([
            (Team::Haas, 4.0),
            (Team::Ferrari, 44.0),
            (Team::Mercedes, 18.0),
        ]);
        let snap = RaceSnapshot::new(BTreeMap::new(), BTreeSet::new(), points).unwrap();
        let teams: Vec<_> = snap.team_standings().into_iter().map(|(t, _)| t).collect();
        assert_eq!(teams, vec![Team::Ferrari, Team::Mercedes, Team::Haas]);
    }

    #[test]
    fn deserialize_validates() {
        let ok = r#"{"positions":{"VER":1},"dnf":["HAM"],"team_points":{"Red Bull Racing":25.0}}"#;
        let snap: RaceSnapshot = serde_json::from_str(ok).unwrap();
        assert_eq!(snap.position(DriverCode::Ver), Some(1));
        let bad = r#"{"positions":{"VER":1},"dnf":["VER"]}"#;
        assert!(serde_json::from_str::<RaceSnapshot>(bad).is_err());
    }
}
