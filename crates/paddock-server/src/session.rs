use rand::SeedableRng;
use rand::rngs::StdRng;

use paddock_core::{GameConfig, GameState};

use crate::config::GameSection;

/// The one game this server hosts, plus bookkeeping around its fetches.
pub struct Session {
    pub game: GameState,
    pub rng: StdRng,
    /// Message of the most recent failed fetch, cleared by the next success.
    pub last_error: Option<String>,
    pub in_flight: usize,
}

impl Session {
    pub fn new(config: &GameSection) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            game: GameState::new(GameConfig {
                max_players: config.max_players,
            }),
            rng,
            last_error: None,
            in_flight: 0,
        }
    }

    /// Split borrow so roster calls can take the game and the RNG together.
    pub fn game_and_rng(&mut self) -> (&mut GameState, &mut StdRng) {
        (&mut self.game, &mut self.rng)
    }
}
