pub mod csv;
pub mod driver;
pub mod error;
pub mod export;
pub mod game;
pub mod leaderboard;
pub mod player;
pub mod results;
pub mod roster;
pub mod save;
pub mod scoring;
pub mod snapshot;
pub mod source;
pub mod standings;
pub mod time;

pub use error::GameError;
pub use game::{FetchOutcome, FetchPurpose, FetchTicket, GameConfig, GamePhase, GameState};
pub use snapshot::RaceSnapshot;
pub use source::SnapshotSource;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::{BTreeSet, VecDeque};
    use std::sync::Mutex;

    use futures::FutureExt;
    use futures::future::BoxFuture;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::driver::{DriverCode, Team};
    use crate::error::GameError;
    use crate::game::{GameConfig, GameState};
    use crate::player::{Player, PlayerEntry};
    use crate::snapshot::RaceSnapshot;
    use crate::source::SnapshotSource;

    /// Create `n` players holding consecutive pairs from the entry list.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                name: format!("Player{}", i + 1),
                dnf_prediction: i as u32,
                team_prediction: Team::ALL[i % Team::ALL.len()],
                drivers: [DriverCode::ALL[i * 2], DriverCode::ALL[i * 2 + 1]],
                scores: None,
            })
            .collect()
    }

    /// Every driver classified in entry-list order, nobody retired.
    pub fn full_grid() -> RaceSnapshot {
        RaceSnapshot::from_classification(&DriverCode::ALL, &BTreeSet::new())
            .expect("entry list is a valid classification")
    }

    /// A betting-phase game with `n` players added through a seeded RNG.
    pub fn betting_game(n: usize, seed: u64) -> GameState {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = GameState::new(GameConfig::default());
        for i in 0..n {
            game.add_player(
                PlayerEntry {
                    name: format!("Player{}", i + 1),
                    dnf_prediction: (i % 5) as u32,
                    team_prediction: Team::ALL[i % Team::ALL.len()],
                },
                &mut rng,
            )
            .expect("fixture player is valid");
        }
        game
    }

    /// Like [`betting_game`] with bets already locked.
    pub fn locked_game(n: usize, seed: u64) -> GameState {
        let mut game = betting_game(n, seed);
        game.lock().expect("fixture game has players");
        game
    }

    /// A snapshot source that replays queued results, then falls back to a
    /// fixed snapshot (or an error when none is set).
    #[derive(Default)]
    pub struct ScriptedSource {
        script: Mutex<VecDeque<Result<RaceSnapshot, GameError>>>,
        fallback: Option<RaceSnapshot>,
        calls: Mutex<Vec<bool>>,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer every unscripted call with `snapshot`.
        pub fn repeating(snapshot: RaceSnapshot) -> Self {
            Self {
                fallback: Some(snapshot),
                ..Self::default()
            }
        }

        pub fn push(&self, result: Result<RaceSnapshot, GameError>) {
            self.script.lock().unwrap().push_back(result);
        }

        /// The `detect_dnf` flag of every call so far.
        pub fn calls(&self) -> Vec<bool> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SnapshotSource for ScriptedSource {
        fn fetch_snapshot(
            &self,
            detect_dnf: bool,
        ) -> BoxFuture<'_, Result<RaceSnapshot, GameError>> {
            self.calls.lock().unwrap().push(detect_dnf);
            let next = self.script.lock().unwrap().pop_front();
            let result = match (next, &self.fallback) {
                (Some(r), _) => r,
                (None, Some(snapshot)) => Ok(snapshot.clone()),
                (None, None) => Err(GameError::source_unavailable("script exhausted")),
            };
            futures::future::ready(result).boxed()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}
