use super::constraints::valid_triplet;
use super::telemetry::{SpaceMetrics, entropy_bits};
use super::{DeductionInput, Trio, trios_from};
use crate::model::player::Player;
use serde::Serialize;
use tracing::{Level, event};

/// Expected information from checking `player` next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub player: Player,
    pub info_gain_bits: f64,
}

/// Every valid trio of living players nobody has red-checked.
pub fn candidate_space(input: &DeductionInput<'_>) -> Vec<Trio> {
    let confirmed_red = input.ledger.confirmed_red();
    let pool: Vec<Player> = input
        .roster
        .iter()
        .filter(|p| input.is_alive(*p) && !confirmed_red.contains(p))
        .collect();
    trios_from(&pool)
        .filter(|trio| valid_triplet(input, *trio))
        .collect()
}

/// Ranks living non-sheriff players by expected entropy reduction, best first.
///
/// A check on `c` splits the space into trios with and without `c`; the
/// outcome is weighted by `c`'s mafia probability derived from redness.
/// An empty candidate space yields an empty list.
pub fn recommend_checks(input: &DeductionInput<'_>) -> Vec<Recommendation> {
    let space = candidate_space(input);
    if space.is_empty() {
        event!(
            target: "mafia_core::advisor",
            Level::INFO,
            "no possible mafia teams with the current information"
        );
        return Vec::new();
    }

    let metrics = SpaceMetrics::from_space(input.roster, &space);
    event!(
        target: "mafia_core::advisor",
        Level::DEBUG,
        space_size = metrics.space_size,
        entropy_bits = metrics.entropy_bits,
        "candidate space built"
    );

    let current = entropy_bits(space.len());
    let mut gains: Vec<Recommendation> = input
        .roster
        .iter()
        .filter(|p| input.is_alive(*p) && !input.ledger.is_sheriff(*p))
        .map(|candidate| {
            let p_mafia = input.mafia_probability(candidate);
            let containing = space.iter().filter(|t| t.contains(candidate)).count();
            let excluding = space.len() - containing;
            let expected =
                p_mafia * entropy_bits(containing) + (1.0 - p_mafia) * entropy_bits(excluding);
            Recommendation {
                player: candidate,
                info_gain_bits: current - expected,
            }
        })
        .collect();

    gains.sort_by(|a, b| b.info_gain_bits.total_cmp(&a.info_gain_bits));

    for rec in &gains {
        event!(
            target: "mafia_core::advisor",
            Level::INFO,
            player = rec.player.id(),
            info_gain_bits = rec.info_gain_bits,
            "suggested check"
        );
    }
    gains
}
