use serde::{Deserialize, Serialize};

use crate::driver::{DriverCode, Team};

/// A participant's wager, as submitted during betting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    pub dnf_prediction: u32,
    pub team_prediction: Team,
}

/// A player on the roster.
///
/// `scores` stays `None` until the first scoring pass runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub dnf_prediction: u32,
    pub team_prediction: Team,
    pub drivers: [DriverCode; 2],
    #[serde(default)]
    pub scores: Option<ScoreCard>,
}

impl Player {
    pub fn holds(&self, driver: DriverCode) -> bool {
        self.drivers.contains(&driver)
    }

    pub fn categories_won(&self) -> u8 {
        self.scores.map(|s| s.categories_won).unwrap_or(0)
    }
}

/// Per-player result of the latest scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreCard {
    pub dnf_score: u8,
    pub team_score: u8,
    pub places_gained_score: i32,
    pub categories_won: u8,
}
