use serde::{Deserialize, Serialize};

use crate::game::{GamePhase, GameState};
use crate::player::Player;

/// JSON document with the phase and every player, scores included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub phase: GamePhase,
    pub players: Vec<Player>,
}

impl SavedGame {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            phase: state.phase(),
            players: state.players().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::betting_game;

    #[test]
    fn saves_phase_and_players() {
        let game = betting_game(2, 3);
        let saved = SavedGame::from_state(&game);
        let json = saved.to_json().unwrap();
        assert!(json.contains("\"phase\": \"betting\""));
        assert!(json.contains("\"team_prediction\""));
        let back: SavedGame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, saved);
        assert_eq!(back.players.len(), 2);
    }
}
