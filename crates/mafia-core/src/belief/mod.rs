//! Deduction over candidate mafia trios.
//!
//! This module is composed of:
//! - `constraints`: which trios the sheriff claims and eliminations still allow.
//! - `triplets`: per-player ranking of trios by graph weights, plus player info.
//! - `advisor`: entropy-based choice of the next player worth checking.
//! - `telemetry`: summary metrics over the global candidate space.
//!
//! Every query is a pure read of a [`DeductionInput`] snapshot.

mod advisor;
mod constraints;
pub mod telemetry;
mod triplets;

pub use advisor::{Recommendation, candidate_space, recommend_checks};
pub use constraints::valid_triplet;
pub use telemetry::SpaceMetrics;
pub use triplets::{PlayerInfo, ScoredTriplet, TripletProbability, generate_triplets, player_info};

use crate::model::graph::{ConspiracyGraph, RelationshipGraph};
use crate::model::ledger::SheriffLedger;
use crate::model::player::{Player, Roster};
use serde::Serialize;
use std::collections::BTreeSet;

/// Size of the hidden team.
pub const MAFIA_SIZE: usize = 3;

/// Borrowed view of the session state the deduction queries read.
#[derive(Debug, Clone, Copy)]
pub struct DeductionInput<'a> {
    pub roster: Roster,
    pub conspiracy: &'a ConspiracyGraph,
    pub relationships: &'a RelationshipGraph,
    pub ledger: &'a SheriffLedger,
    pub eliminated: &'a BTreeSet<Player>,
}

impl DeductionInput<'_> {
    pub fn is_alive(&self, player: Player) -> bool {
        !self.eliminated.contains(&player)
    }

    pub fn alive_count(&self) -> usize {
        self.roster.iter().filter(|p| self.is_alive(*p)).count()
    }

    /// Mean incoming relationship weight; high means others vouch for the player.
    pub fn redness(&self, player: Player) -> f64 {
        self.relationships.incoming_mean(player)
    }

    /// `clamp(1 - redness, 0, 1)`.
    pub fn mafia_probability(&self, player: Player) -> f64 {
        (1.0 - self.redness(player)).clamp(0.0, 1.0)
    }
}

/// Three distinct players in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Trio([Player; MAFIA_SIZE]);

impl Trio {
    pub fn new(a: Player, b: Player, c: Player) -> Self {
        let mut members = [a, b, c];
        members.sort();
        Self(members)
    }

    pub fn members(&self) -> [Player; MAFIA_SIZE] {
        self.0
    }

    pub fn contains(&self, player: Player) -> bool {
        self.0.contains(&player)
    }

    /// The three unordered pairs `(a,b)`, `(a,c)`, `(b,c)`.
    pub fn pairs(&self) -> [(Player, Player); 3] {
        let [a, b, c] = self.0;
        [(a, b), (a, c), (b, c)]
    }

    pub fn contains_all<'a>(&self, players: impl IntoIterator<Item = &'a Player>) -> bool {
        players.into_iter().all(|p| self.contains(*p))
    }

    pub fn contains_any<'a>(&self, players: impl IntoIterator<Item = &'a Player>) -> bool {
        players.into_iter().any(|p| self.contains(*p))
    }
}

/// Every 3-combination of `pool` in lexicographic index order.
pub fn trios_from(pool: &[Player]) -> impl Iterator<Item = Trio> + '_ {
    let n = pool.len();
    (0..n).flat_map(move |i| {
        ((i + 1)..n).flat_map(move |j| {
            ((j + 1)..n).map(move |k| Trio::new(pool[i], pool[j], pool[k]))
        })
    })
}
