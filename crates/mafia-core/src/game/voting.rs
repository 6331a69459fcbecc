use super::parser::TieBreak;
use crate::model::action::ActionKind;
use crate::model::player::{Player, Roster};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingPhase {
    Idle,
    CollectingVotes,
    SecondRound,
    AwaitingTiebreak,
}

/// What recording a ballot led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Some living players have not voted yet.
    Pending,
    /// A single plurality; the player leaves the game.
    Eliminated(Player),
    /// First tie: ballots are cleared and a runoff is collected.
    Runoff(Vec<Player>),
    /// Runoff tied again: the operator must answer `vel` or `novel`.
    Deadlock(Vec<Player>),
}

/// Day-vote protocol: plurality, one runoff, then an operator decision.
#[derive(Debug, Clone)]
pub struct VotingState {
    phase: VotingPhase,
    ballots: BTreeMap<Player, Player>,
    tied: Vec<Player>,
}

impl Default for VotingState {
    fn default() -> Self {
        Self::new()
    }
}

impl VotingState {
    pub fn new() -> Self {
        Self {
            phase: VotingPhase::Idle,
            ballots: BTreeMap::new(),
            tied: Vec::new(),
        }
    }

    pub fn phase(&self) -> VotingPhase {
        self.phase
    }

    /// `voter -> target` for the round in progress.
    pub fn ballots(&self) -> &BTreeMap<Player, Player> {
        &self.ballots
    }

    /// Candidates awaiting the operator's tie-break, ascending.
    pub fn tied_candidates(&self) -> &[Player] {
        &self.tied
    }

    pub fn is_voting(&self) -> bool {
        matches!(
            self.phase,
            VotingPhase::CollectingVotes | VotingPhase::SecondRound
        )
    }

    /// A round has ballots but does not yet cover the roster.
    pub fn is_open(&self) -> bool {
        self.is_voting() && !self.ballots.is_empty()
    }

    pub fn awaiting_tiebreak(&self) -> bool {
        self.phase == VotingPhase::AwaitingTiebreak
    }

    /// Soft when at most one player voted or at most one eligible player abstained.
    pub fn classify(
        target: Player,
        voters: &[Player],
        roster: Roster,
        eliminated: &BTreeSet<Player>,
    ) -> ActionKind {
        let declared: BTreeSet<Player> = voters.iter().copied().collect();
        let non_voters = roster
            .iter()
            .filter(|p| !eliminated.contains(p) && *p != target)
            .filter(|p| !declared.contains(p))
            .count();
        if voters.len() <= 1 || non_voters <= 1 {
            ActionKind::VotedSoft
        } else {
            ActionKind::Voted
        }
    }

    /// Records `voter -> target`, resolving the round once everyone alive has voted.
    pub fn record(
        &mut self,
        voter: Player,
        target: Player,
        roster: Roster,
        eliminated: &BTreeSet<Player>,
    ) -> RoundOutcome {
        debug_assert!(!self.awaiting_tiebreak(), "ballot recorded during tie-break");
        if self.phase == VotingPhase::Idle {
            self.phase = VotingPhase::CollectingVotes;
            self.ballots.clear();
        }
        self.ballots.insert(voter, target);

        let covered = roster
            .iter()
            .all(|p| self.ballots.contains_key(&p) || eliminated.contains(&p));
        if covered {
            self.resolve()
        } else {
            RoundOutcome::Pending
        }
    }

    /// Ballots received per target.
    pub fn tally(&self) -> BTreeMap<Player, usize> {
        let mut counts = BTreeMap::new();
        for target in self.ballots.values() {
            *counts.entry(*target).or_insert(0usize) += 1;
        }
        counts
    }

    /// Every target sharing the top tally, ascending.
    pub fn candidates(&self) -> Vec<Player> {
        let tally = self.tally();
        let Some(max) = tally.values().copied().max() else {
            return Vec::new();
        };
        tally
            .into_iter()
            .filter(|(_, count)| *count == max)
            .map(|(player, _)| player)
            .collect()
    }

    /// Applies the operator's answer and returns the players to eliminate.
    pub fn tiebreak(&mut self, decision: TieBreak) -> Vec<Player> {
        let tied = std::mem::take(&mut self.tied);
        self.ballots.clear();
        self.phase = VotingPhase::Idle;
        match decision {
            TieBreak::EliminateAll => tied,
            TieBreak::KeepAll => Vec::new(),
        }
    }

    fn resolve(&mut self) -> RoundOutcome {
        let candidates = self.candidates();
        self.ballots.clear();
        match candidates.as_slice() {
            [] => {
                self.phase = VotingPhase::Idle;
                RoundOutcome::Pending
            }
            [single] => {
                self.phase = VotingPhase::Idle;
                RoundOutcome::Eliminated(*single)
            }
            _ if self.phase == VotingPhase::CollectingVotes => {
                self.phase = VotingPhase::SecondRound;
                RoundOutcome::Runoff(candidates)
            }
            _ => {
                self.phase = VotingPhase::AwaitingTiebreak;
                self.tied = candidates.clone();
                RoundOutcome::Deadlock(candidates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u8) -> Player {
        Player::new(id)
    }

    fn cast(state: &mut VotingState, target: u8, voters: &[u8]) -> RoundOutcome {
        let roster = Roster::default();
        let eliminated = BTreeSet::new();
        let mut last = RoundOutcome::Pending;
        for voter in voters {
            last = state.record(p(*voter), p(target), roster, &eliminated);
        }
        last
    }

    #[test]
    fn unanimous_round_eliminates() {
        let mut state = VotingState::new();
        let outcome = cast(&mut state, 1, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(outcome, RoundOutcome::Eliminated(p(1)));
        assert_eq!(state.phase(), VotingPhase::Idle);
        assert!(state.ballots().is_empty());
    }

    #[test]
    fn partial_round_stays_open() {
        let mut state = VotingState::new();
        assert_eq!(cast(&mut state, 1, &[1, 2, 3]), RoundOutcome::Pending);
        assert!(state.is_open());
        assert_eq!(state.phase(), VotingPhase::CollectingVotes);
    }

    #[test]
    fn split_escalates_to_runoff_then_deadlock() {
        let mut state = VotingState::new();
        cast(&mut state, 1, &[1, 2, 3, 4, 5]);
        let outcome = cast(&mut state, 2, &[6, 7, 8, 9, 10]);
        assert_eq!(outcome, RoundOutcome::Runoff(vec![p(1), p(2)]));
        assert_eq!(state.phase(), VotingPhase::SecondRound);
        assert!(!state.is_open());

        cast(&mut state, 1, &[1, 2, 3, 4, 5]);
        let outcome = cast(&mut state, 2, &[6, 7, 8, 9, 10]);
        assert_eq!(outcome, RoundOutcome::Deadlock(vec![p(1), p(2)]));
        assert!(state.awaiting_tiebreak());
        assert_eq!(state.tied_candidates(), &[p(1), p(2)]);
    }

    #[test]
    fn runoff_with_single_winner_eliminates() {
        let mut state = VotingState::new();
        cast(&mut state, 1, &[1, 2, 3, 4, 5]);
        cast(&mut state, 2, &[6, 7, 8, 9, 10]);
        cast(&mut state, 1, &[1, 2, 3, 4, 5, 6]);
        let outcome = cast(&mut state, 2, &[7, 8, 9, 10]);
        assert_eq!(outcome, RoundOutcome::Eliminated(p(1)));
        assert_eq!(state.phase(), VotingPhase::Idle);
    }

    #[test]
    fn tiebreak_vel_returns_all_tied() {
        let mut state = VotingState::new();
        for _ in 0..2 {
            cast(&mut state, 1, &[1, 2, 3, 4, 5]);
            cast(&mut state, 2, &[6, 7, 8, 9, 10]);
        }
        assert_eq!(state.tiebreak(TieBreak::EliminateAll), vec![p(1), p(2)]);
        assert_eq!(state.phase(), VotingPhase::Idle);
        assert!(state.tied_candidates().is_empty());
    }

    #[test]
    fn tiebreak_novel_keeps_everyone() {
        let mut state = VotingState::new();
        for _ in 0..2 {
            cast(&mut state, 1, &[1, 2, 3, 4, 5]);
            cast(&mut state, 2, &[6, 7, 8, 9, 10]);
        }
        assert!(state.tiebreak(TieBreak::KeepAll).is_empty());
        assert_eq!(state.phase(), VotingPhase::Idle);
    }

    #[test]
    fn eliminated_players_count_as_covered() {
        let mut state = VotingState::new();
        let eliminated: BTreeSet<Player> = [p(9), p(10)].into_iter().collect();
        let mut outcome = RoundOutcome::Pending;
        for voter in 1..=8 {
            outcome = state.record(p(voter), p(3), Roster::default(), &eliminated);
        }
        assert_eq!(outcome, RoundOutcome::Eliminated(p(3)));
    }

    #[test]
    fn classify_soft_and_significant() {
        let roster = Roster::default();
        let none = BTreeSet::new();
        let ids = |v: &[u8]| v.iter().copied().map(p).collect::<Vec<_>>();
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4, 5, 6, 7, 8, 9, 10]), roster, &none),
            ActionKind::VotedSoft
        );
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4]), roster, &none),
            ActionKind::Voted
        );
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2]), roster, &none),
            ActionKind::VotedSoft
        );
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4, 5, 6, 7, 8, 9]), roster, &none),
            ActionKind::VotedSoft
        );
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4, 5, 6]), roster, &none),
            ActionKind::Voted
        );
    }

    #[test]
    fn classify_accounts_for_eliminated() {
        let roster = Roster::default();
        let ids = |v: &[u8]| v.iter().copied().map(p).collect::<Vec<_>>();
        let gone: BTreeSet<Player> = [p(9), p(10)].into_iter().collect();
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4, 5, 6, 7]), roster, &gone),
            ActionKind::VotedSoft
        );
        let many: BTreeSet<Player> = (2..=9).map(p).collect();
        assert_eq!(
            VotingState::classify(p(1), &ids(&[10]), roster, &many),
            ActionKind::VotedSoft
        );
        let three: BTreeSet<Player> = [p(8), p(9), p(10)].into_iter().collect();
        assert_eq!(
            VotingState::classify(p(1), &ids(&[2, 3, 4]), roster, &three),
            ActionKind::Voted
        );
    }
}
