use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::driver::{DRIVER_COUNT, DriverCode};
use crate::error::GameError;
use crate::player::{Player, PlayerEntry};

/// Default number of players a game accepts.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Ordered player list with a disjoint two-driver assignment per player.
///
/// Insertion order is preserved; it is the tie-break order for standings.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    players: Vec<Player>,
    capacity: usize,
}

impl Default for Roster {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_PLAYERS)
    }
}

impl Roster {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            players: Vec::new(),
            capacity,
        }
    }

    /// Rebuild a roster from already-assigned players, checking that names
    /// are unique and no driver is held twice.
    pub fn from_players(players: Vec<Player>, capacity: usize) -> Result<Self, GameError> {
        if players.len() > capacity {
            return Err(GameError::validation(format!(
                "{} players exceed the limit of {capacity}",
                players.len()
            )));
        }
        let mut names = BTreeSet::new();
        let mut held = BTreeSet::new();
        for player in &players {
            validate_name(&player.name)?;
            if !names.insert(player.name.as_str()) {
                return Err(GameError::validation(format!(
                    "player '{}' appears twice",
                    player.name
                )));
            }
            for driver in player.drivers {
                if !held.insert(driver) {
                    return Err(GameError::validation(format!(
                        "driver {driver} is assigned to more than one player"
                    )));
                }
            }
        }
        Ok(Self { players, capacity })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drivers not yet held by any player, in entry-list order.
    pub fn unassigned_drivers(&self) -> Vec<DriverCode> {
        DriverCode::ALL
            .into_iter()
            .filter(|d| !self.players.iter().any(|p| p.holds(*d)))
            .collect()
    }

    /// Validate a wager and append the player with two drivers drawn
    /// uniformly without replacement from the unassigned pool.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        entry: PlayerEntry,
        rng: &mut R,
    ) -> Result<&Player, GameError> {
        if self.players.len() >= self.capacity {
            return Err(GameError::validation(format!(
                "game is full ({} players)",
                self.capacity
            )));
        }
        let name = entry.name.trim();
        validate_name(name)?;
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::validation(format!(
                "player '{name}' already exists"
            )));
        }
        if entry.dnf_prediction as usize > DRIVER_COUNT {
            return Err(GameError::validation(format!(
                "DNF prediction {} exceeds the {DRIVER_COUNT} drivers in the race",
                entry.dnf_prediction
            )));
        }
        let pool = self.unassigned_drivers();
        if pool.len() < 2 {
            return Err(GameError::validation("not enough unassigned drivers left"));
        }
        let picked = rand::seq::index::sample(rng, pool.len(), 2);
        let drivers = [pool[picked.index(0)], pool[picked.index(1)]];

        self.players.push(Player {
            name: name.to_string(),
            dnf_prediction: entry.dnf_prediction,
            team_prediction: entry.team_prediction,
            drivers,
            scores: None,
        });
        let player = &self.players[self.players.len() - 1];
        Ok(player)
    }

    pub fn remove(&mut self, index: usize) -> Result<Player, GameError> {
        if index >= self.players.len() {
            return Err(GameError::validation(format!(
                "no player at index {index}"
            )));
        }
        Ok(self.players.remove(index))
    }

    /// Shuffle the whole entry list and deal two consecutive drivers to each
    /// player in roster order. Previous pairings are discarded.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.players.is_empty() {
            return Err(GameError::validation("no players to assign drivers to"));
        }
        if DRIVER_COUNT < self.players.len() * 2 {
            return Err(GameError::validation(format!(
                "{} players need more than the {DRIVER_COUNT} drivers available",
                self.players.len()
            )));
        }
        let mut pool = DriverCode::ALL.to_vec();
        pool.shuffle(rng);
        for (player, pair) in self.players.iter_mut().zip(pool.chunks_exact(2)) {
            player.drivers = [pair[0], pair[1]];
            player.scores = None;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}

fn validate_name(name: &str) -> Result<(), GameError> {
    if name.trim().is_empty() {
        return Err(GameError::validation("player name is empty"));
    }
    Ok(())
}
