use super::Trio;
use crate::model::player::{Player, Roster};
use serde::Serialize;

/// Entropy in bits of a uniform distribution over `n` outcomes.
pub fn entropy_bits(n: usize) -> f64 {
    if n > 1 { (n as f64).log2() } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MembershipShare {
    pub player: Player,
    /// Fraction of candidate trios that contain the player.
    pub share: f64,
    /// Binary entropy of `share`, in bits.
    pub uncertainty_bits: f64,
}

/// Summary of the global candidate space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceMetrics {
    pub space_size: usize,
    pub entropy_bits: f64,
    pub membership: Vec<MembershipShare>,
}

impl SpaceMetrics {
    pub fn from_space(roster: Roster, space: &[Trio]) -> Self {
        let total = space.len();
        let membership = roster
            .iter()
            .map(|player| {
                let containing = space.iter().filter(|t| t.contains(player)).count();
                let share = if total == 0 {
                    0.0
                } else {
                    containing as f64 / total as f64
                };
                MembershipShare {
                    player,
                    share,
                    uncertainty_bits: binary_entropy(share),
                }
            })
            .collect();

        Self {
            space_size: total,
            entropy_bits: entropy_bits(total),
            membership,
        }
    }

    pub fn share_of(&self, player: Player) -> Option<f64> {
        self.membership
            .iter()
            .find(|m| m.player == player)
            .map(|m| m.share)
    }
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}
