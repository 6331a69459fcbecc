use crate::model::graph::{CONSPIRACY_FLOOR, INITIAL_CONSPIRACY_WEIGHT, INITIAL_RELATIONSHIP_WEIGHT};
use crate::model::player::DEFAULT_ROSTER_SIZE;
use std::env;

pub const MIN_ROSTER_SIZE: u8 = 4;
pub const MAX_ROSTER_SIZE: u8 = 99;
pub const DEFAULT_TOP_TRIPLETS: usize = 10;

/// Tunable parameters for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub roster_size: u8,
    /// How many ranked trios a player-info query returns.
    pub top_triplets: usize,
    pub initial_relationship: f64,
    pub initial_conspiracy: f64,
    /// Lower bound for a decayed conspired-together edge.
    pub conspiracy_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            roster_size: DEFAULT_ROSTER_SIZE,
            top_triplets: DEFAULT_TOP_TRIPLETS,
            initial_relationship: INITIAL_RELATIONSHIP_WEIGHT,
            initial_conspiracy: INITIAL_CONSPIRACY_WEIGHT,
            conspiracy_floor: CONSPIRACY_FLOOR,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    pub fn with_roster_size(mut self, roster_size: u8) -> Self {
        self.roster_size = roster_size.clamp(MIN_ROSTER_SIZE, MAX_ROSTER_SIZE);
        self
    }

    pub fn with_top_triplets(mut self, top_triplets: usize) -> Self {
        self.top_triplets = top_triplets.max(1);
        self
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let roster_size = read("MAFIA_ROSTER_SIZE")
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .unwrap_or(base.roster_size);
        let top_triplets = read("MAFIA_TOP_TRIPLETS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.top_triplets);

        base.with_roster_size(roster_size)
            .with_top_triplets(top_triplets)
    }
}
