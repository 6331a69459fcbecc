use super::constraints::valid_triplet;
use super::{DeductionInput, Trio, trios_from};
use crate::model::player::Player;
use serde::Serialize;
use std::collections::BTreeMap;

/// A trio with its unnormalised ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredTriplet {
    pub players: Trio,
    pub score: f64,
}

/// A trio with its share of the returned score mass, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripletProbability {
    pub players: Trio,
    pub probability: f64,
}

/// Everything shown for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub player: Player,
    pub redness: f64,
    pub triplets: Vec<TripletProbability>,
    /// Players ordered by cumulative probability across `triplets`.
    pub va: Vec<Player>,
}

/// Ranks candidate teams from `subject`'s point of view, best first.
///
/// Trios must pass [`valid_triplet`]. If `subject` black-checked anyone, all
/// of those players must be in the trio. If a sheriff black-checked
/// `subject`, the trio must hold that sheriff and none of their black checks.
/// Score is the product of the three conspired-together weights times
/// `1 - relationship(subject -> member)` for each member. Equal scores keep
/// ascending enumeration order.
pub fn generate_triplets(
    input: &DeductionInput<'_>,
    subject: Player,
    limit: usize,
) -> Vec<ScoredTriplet> {
    let others: Vec<Player> = input.roster.iter().filter(|p| *p != subject).collect();
    let own_black = input.ledger.black_checks_of(subject);

    let mut scored: Vec<ScoredTriplet> = trios_from(&others)
        .filter(|trio| own_black.is_none_or(|checked| trio.contains_all(checked)))
        .filter(|trio| {
            input
                .ledger
                .black_checks()
                .filter(|(_, checked)| checked.contains(&subject))
                .all(|(sheriff, checked)| trio.contains(sheriff) && !trio.contains_any(checked))
        })
        .filter(|trio| valid_triplet(input, *trio))
        .map(|players| ScoredTriplet {
            players,
            score: score_trio(input, subject, players),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

fn score_trio(input: &DeductionInput<'_>, subject: Player, trio: Trio) -> f64 {
    let together: f64 = trio
        .pairs()
        .iter()
        .map(|(a, b)| input.conspiracy.weight(*a, *b))
        .product();
    let distrust: f64 = trio
        .members()
        .iter()
        .map(|member| 1.0 - input.relationships.weight(subject, *member))
        .product();
    together * distrust
}

/// Redness, normalised top trios and the VA ordering for `subject`.
pub fn player_info(input: &DeductionInput<'_>, subject: Player, limit: usize) -> PlayerInfo {
    let ranked = generate_triplets(input, subject, limit);
    let total: f64 = ranked.iter().map(|t| t.score).sum();

    let triplets: Vec<TripletProbability> = ranked
        .iter()
        .map(|t| TripletProbability {
            players: t.players,
            probability: if total > 0.0 {
                t.score / total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    let mut cumulative: BTreeMap<Player, f64> = BTreeMap::new();
    for triplet in &triplets {
        for member in triplet.players.members() {
            *cumulative.entry(member).or_insert(0.0) += triplet.probability;
        }
    }
    let mut va: Vec<(Player, f64)> = cumulative.into_iter().collect();
    va.sort_by(|a, b| b.1.total_cmp(&a.1));

    PlayerInfo {
        player: subject,
        redness: input.redness(subject),
        triplets,
        va: va.into_iter().map(|(player, _)| player).collect(),
    }
}
