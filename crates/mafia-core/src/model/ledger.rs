use super::player::Player;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Verdict reported by a sheriff for a checked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckVerdict {
    Black,
    Red,
}

/// Claimed check results, keyed by the claiming sheriff.
///
/// Claims are never retracted, so the sheriff set only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheriffLedger {
    black_checks: BTreeMap<Player, BTreeSet<Player>>,
    red_checks: BTreeMap<Player, BTreeSet<Player>>,
}

impl SheriffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a claim; returns `true` when `sheriff` was not a sheriff before.
    pub fn record(&mut self, sheriff: Player, target: Player, verdict: CheckVerdict) -> bool {
        let newcomer = !self.is_sheriff(sheriff);
        let book = match verdict {
            CheckVerdict::Black => &mut self.black_checks,
            CheckVerdict::Red => &mut self.red_checks,
        };
        book.entry(sheriff).or_default().insert(target);
        newcomer
    }

    pub fn is_sheriff(&self, player: Player) -> bool {
        self.black_checks.contains_key(&player) || self.red_checks.contains_key(&player)
    }

    /// Every claiming player, ascending.
    pub fn sheriffs(&self) -> BTreeSet<Player> {
        self.black_checks
            .keys()
            .chain(self.red_checks.keys())
            .copied()
            .collect()
    }

    pub fn sheriff_count(&self) -> usize {
        self.sheriffs().len()
    }

    /// Players `sheriff` claims are guilty. `None` when they never claimed one.
    pub fn black_checks_of(&self, sheriff: Player) -> Option<&BTreeSet<Player>> {
        self.black_checks.get(&sheriff)
    }

    pub fn red_checks_of(&self, sheriff: Player) -> Option<&BTreeSet<Player>> {
        self.red_checks.get(&sheriff)
    }

    pub fn has_black_checked(&self, sheriff: Player, target: Player) -> bool {
        self.black_checks
            .get(&sheriff)
            .is_some_and(|checked| checked.contains(&target))
    }

    pub fn has_red_checked(&self, sheriff: Player, target: Player) -> bool {
        self.red_checks
            .get(&sheriff)
            .is_some_and(|checked| checked.contains(&target))
    }

    pub fn black_checks(&self) -> impl Iterator<Item = (Player, &BTreeSet<Player>)> {
        self.black_checks.iter().map(|(sheriff, set)| (*sheriff, set))
    }

    /// Sheriffs who have black-checked `player`.
    pub fn accusers_of(&self, player: Player) -> impl Iterator<Item = Player> + '_ {
        self.black_checks
            .iter()
            .filter(move |(_, checked)| checked.contains(&player))
            .map(|(sheriff, _)| *sheriff)
    }

    /// Anyone red-checked by at least one sheriff.
    pub fn confirmed_red(&self) -> BTreeSet<Player> {
        self.red_checks.values().flatten().copied().collect()
    }

    /// Players red-checked by two or more distinct sheriffs.
    pub fn double_red_players(&self) -> BTreeSet<Player> {
        let mut counts: BTreeMap<Player, usize> = BTreeMap::new();
        for checked in self.red_checks.values() {
            for player in checked {
                *counts.entry(*player).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(player, _)| player)
            .collect()
    }
}
