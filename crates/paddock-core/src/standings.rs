use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::scoring::{CategoryScores, DnfMetric};

/// One of the three independent prediction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Dnf,
    Team,
    PlacesGained,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Dnf, Category::Team, Category::PlacesGained];

    pub fn label(self) -> &'static str {
        match self {
            Category::Dnf => "DNF",
            Category::Team => "Team",
            Category::PlacesGained => "Places Gained",
        }
    }
}

/// Winners of a single category. Ties are kept, so there may be several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub winners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<DnfMetric>,
}

/// Aggregated standings for a roster.
///
/// `categories_won` is parallel to the roster. `ranking` lists roster
/// indices in final order: categories won descending, insertion order on
/// ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub categories: Vec<CategoryResult>,
    pub categories_won: Vec<u8>,
    pub ranking: Vec<usize>,
    pub overall_winners: Vec<String>,
    pub top_categories: u8,
}

impl Standings {
    pub fn winners(&self, category: Category) -> &[String] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.winners.as_slice())
            .unwrap_or(&[])
    }
}

/// Build standings from one scoring pass over `players`.
pub fn aggregate(
    players: &[Player],
    scores: &[CategoryScores],
    dnf_metric: Option<DnfMetric>,
) -> Standings {
    let n = players.len().min(scores.len());
    let max_places = scores[..n].iter().map(|s| s.places_gained_score).max();

    let won_dnf: Vec<bool> = scores[..n].iter().map(|s| s.dnf_score == 1).collect();
    let won_team: Vec<bool> = scores[..n].iter().map(|s| s.team_score == 1).collect();
    let won_places: Vec<bool> = scores[..n]
        .iter()
        .map(|s| Some(s.places_gained_score) == max_places)
        .collect();

    let names_where = |flags: &[bool]| -> Vec<String> {
        players[..n]
            .iter()
            .zip(flags)
            .filter(|(_, won)| **won)
            .map(|(p, _)| p.name.clone())
            .collect()
    };

    let categories = vec![
        CategoryResult {
            category: Category::Dnf,
            winners: names_where(&won_dnf),
            metric: dnf_metric,
        },
        CategoryResult {
            category: Category::Team,
            winners: names_where(&won_team),
            metric: None,
        },
        CategoryResult {
            category: Category::PlacesGained,
            winners: names_where(&won_places),
            metric: None,
        },
    ];

    let categories_won: Vec<u8> = (0..n)
        .map(|i| u8::from(won_dnf[i]) + u8::from(won_team[i]) + u8::from(won_places[i]))
        .collect();

    // Stable sort keeps roster order among equal counts.
    let mut ranking: Vec<usize> = (0..n).collect();
    ranking.sort_by(|a, b| categories_won[*b].cmp(&categories_won[*a]));

    let top_categories = categories_won.iter().copied().max().unwrap_or(0);
    let overall_winners = players[..n]
        .iter()
        .zip(&categories_won)
        .filter(|(_, won)| **won == top_categories)
        .map(|(p, _)| p.name.clone())
        .collect();

    Standings {
        categories,
        categories_won,
        ranking,
        overall_winners,
        top_categories,
    }
}
