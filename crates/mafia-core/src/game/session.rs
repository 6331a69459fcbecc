use super::config::EngineConfig;
use super::parser::{
    EventError, EventTarget, ParsedEvent, TieBreak, parse_generic, parse_redness_shorthand,
    parse_vote_line,
};
use super::report::SessionReport;
use super::voting::{RoundOutcome, VotingPhase, VotingState};
use crate::belief::{
    self, DeductionInput, PlayerInfo, Recommendation, ScoredTriplet, SpaceMetrics, Trio,
};
use crate::model::action::ActionKind;
use crate::model::graph::{ConspiracyGraph, RelationshipGraph};
use crate::model::ledger::{CheckVerdict, SheriffLedger};
use crate::model::player::{Player, Roster};
use std::collections::BTreeSet;
use tracing::{Level, event};

/// All mutable state of one game, fed one event line at a time.
#[derive(Debug, Clone)]
pub struct Session {
    config: EngineConfig,
    roster: Roster,
    conspiracy: ConspiracyGraph,
    relationships: RelationshipGraph,
    ledger: SheriffLedger,
    voting: VotingState,
    eliminated: BTreeSet<Player>,
    messages: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let roster = Roster::new(config.roster_size);
        Self {
            config,
            roster,
            conspiracy: ConspiracyGraph::with_weights(
                roster,
                config.initial_conspiracy,
                config.conspiracy_floor,
            ),
            relationships: RelationshipGraph::with_weight(roster, config.initial_relationship),
            ledger: SheriffLedger::new(),
            voting: VotingState::new(),
            eliminated: BTreeSet::new(),
            messages: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> Roster {
        self.roster
    }

    pub fn conspiracy(&self) -> &ConspiracyGraph {
        &self.conspiracy
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    pub fn ledger(&self) -> &SheriffLedger {
        &self.ledger
    }

    pub fn voting(&self) -> &VotingState {
        &self.voting
    }

    pub fn voting_phase(&self) -> VotingPhase {
        self.voting.phase()
    }

    pub fn eliminated(&self) -> &BTreeSet<Player> {
        &self.eliminated
    }

    pub fn is_eliminated(&self, player: Player) -> bool {
        self.eliminated.contains(&player)
    }

    /// Append-only log of diagnostics and elimination notices.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn deduction_input(&self) -> DeductionInput<'_> {
        DeductionInput {
            roster: self.roster,
            conspiracy: &self.conspiracy,
            relationships: &self.relationships,
            ledger: &self.ledger,
            eliminated: &self.eliminated,
        }
    }

    /// Reads one line into an event.
    ///
    /// Rules are tried in order: `+` shorthand, tie-break answer, vote
    /// notation, open-round guard, generic `<source><code><target>`. A
    /// tie-break answer is applied here and yields an empty event, as does
    /// every rejected line.
    pub fn parse_event(&mut self, line: &str) -> ParsedEvent {
        match self.lex(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.push_diagnostic(err);
                ParsedEvent::empty()
            }
        }
    }

    /// The `+` shorthand goes through the ordinary `r` decay, so repeating
    /// `4+7` keeps compounding the forward edge by 1.15 until it clamps at 1
    /// rather than pinning it once at `6/9 * 1.15`.
    fn lex(&mut self, line: &str) -> Result<ParsedEvent, EventError> {
        if let Some((source, targets)) = parse_redness_shorthand(line) {
            let source = self.seat(u32::from(source.id()))?;
            for target in &targets {
                self.seat(u32::from(target.id()))?;
            }
            return Ok(ParsedEvent::new(
                source,
                ActionKind::Redness.code(),
                EventTarget::Many(targets),
            ));
        }

        if self.voting.awaiting_tiebreak() {
            let decision = TieBreak::parse(line).ok_or(EventError::TieBreakExpected)?;
            self.resolve_tiebreak(decision);
            return Ok(ParsedEvent::empty());
        }

        if line.contains(':') {
            return self.classify_vote(line);
        }

        if self.voting.is_open() {
            return Err(EventError::VotingIncomplete);
        }

        let (source, code, target) = parse_generic(line)?;
        let source = self.seat(source)?;
        let target = match target {
            Some(id) => EventTarget::Single(self.seat(id)?),
            None => EventTarget::None,
        };
        Ok(ParsedEvent::new(source, code, target))
    }

    /// Parses `"<target>: <voters>"` into `(target, v|vs, voters)` without applying it.
    pub fn classify_vote(&self, line: &str) -> Result<ParsedEvent, EventError> {
        let (target, voters) = parse_vote_line(line).ok_or(EventError::InvalidFormat)??;
        let target = self.seat(target)?;
        let voters = voters
            .into_iter()
            .map(|id| self.seat(id))
            .collect::<Result<Vec<_>, _>>()?;
        let kind = VotingState::classify(target, &voters, self.roster, &self.eliminated);
        Ok(ParsedEvent::new(target, kind.code(), EventTarget::Many(voters)))
    }

    /// Applies a parsed event. Empty events are ignored.
    pub fn apply_event(&mut self, parsed: &ParsedEvent) {
        let (Some(source), Some(code)) = (parsed.source, parsed.action.as_deref()) else {
            return;
        };
        let Some(kind) = ActionKind::from_code(code) else {
            self.push_diagnostic(EventError::UnknownAction(code.to_string()));
            return;
        };

        match &parsed.target {
            EventTarget::Many(voters) if kind.is_vote() => {
                for voter in voters {
                    self.cast_ballot(source, *voter, kind);
                }
            }
            EventTarget::Many(targets) => {
                for target in targets {
                    self.apply_single(source, kind, *target);
                }
            }
            EventTarget::Single(target) => self.apply_single(source, kind, *target),
            EventTarget::None if kind.is_elimination() => self.eliminate(source, kind),
            EventTarget::None => {
                self.push_diagnostic(EventError::MissingTarget(kind.code().to_string()));
            }
        }
    }

    /// Parses and applies one line.
    pub fn process_line(&mut self, line: &str) {
        let parsed = self.parse_event(line);
        self.apply_event(&parsed);
    }

    /// Applies every line in order and captures the resulting report.
    pub fn process_events<I, S>(&mut self, lines: I) -> SessionReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.process_line(line.as_ref());
        }
        self.report()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport::capture(self)
    }

    pub fn redness(&self, player: Player) -> f64 {
        self.deduction_input().redness(player)
    }

    pub fn valid_triplet(&self, trio: Trio) -> bool {
        belief::valid_triplet(&self.deduction_input(), trio)
    }

    pub fn generate_triplets(&self, subject: Player) -> Vec<ScoredTriplet> {
        belief::generate_triplets(&self.deduction_input(), subject, self.config.top_triplets)
    }

    pub fn player_info(&self, subject: Player) -> PlayerInfo {
        belief::player_info(&self.deduction_input(), subject, self.config.top_triplets)
    }

    pub fn candidate_space(&self) -> Vec<Trio> {
        belief::candidate_space(&self.deduction_input())
    }

    pub fn space_metrics(&self) -> SpaceMetrics {
        SpaceMetrics::from_space(self.roster, &self.candidate_space())
    }

    pub fn recommend_checks(&self) -> Vec<Recommendation> {
        belief::recommend_checks(&self.deduction_input())
    }

    fn seat(&self, id: u32) -> Result<Player, EventError> {
        u8::try_from(id)
            .ok()
            .map(Player::new)
            .filter(|player| self.roster.contains(*player))
            .ok_or(EventError::UnknownPlayer(id))
    }

    fn cast_ballot(&mut self, target: Player, voter: Player, kind: ActionKind) {
        if !self.voting.awaiting_tiebreak() {
            let outcome = self
                .voting
                .record(voter, target, self.roster, &self.eliminated);
            self.handle_outcome(outcome);
        }
        self.apply_single(target, kind, voter);
    }

    fn handle_outcome(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Pending => {}
            RoundOutcome::Eliminated(player) => {
                event!(
                    target: "mafia_core::voting",
                    Level::INFO,
                    player = player.id(),
                    "vote resolved with a single candidate"
                );
                self.eliminate_by_vote(player);
            }
            RoundOutcome::Runoff(tied) => {
                event!(
                    target: "mafia_core::voting",
                    Level::INFO,
                    tied = ?ids(&tied),
                    "vote tied, collecting a second round"
                );
            }
            RoundOutcome::Deadlock(tied) => {
                event!(
                    target: "mafia_core::voting",
                    Level::INFO,
                    tied = ?ids(&tied),
                    "second round tied, awaiting vel or novel"
                );
            }
        }
    }

    fn resolve_tiebreak(&mut self, decision: TieBreak) {
        let removed = self.voting.tiebreak(decision);
        event!(
            target: "mafia_core::voting",
            Level::INFO,
            decision = ?decision,
            eliminated = ?ids(&removed),
            "tie-break applied"
        );
        for player in removed {
            self.eliminate_by_vote(player);
        }
    }

    fn apply_single(&mut self, source: Player, kind: ActionKind, target: Player) {
        if kind.is_elimination() {
            self.eliminate(source, kind);
            return;
        }

        self.conspiracy.apply_decay(source, target, kind);
        self.relationships.apply_decay(source, target, kind);

        if kind.is_check() {
            let verdict = if kind == ActionKind::CheckedBlack {
                CheckVerdict::Black
            } else {
                CheckVerdict::Red
            };
            if self.ledger.record(source, target, verdict) {
                event!(
                    target: "mafia_core::ledger",
                    Level::INFO,
                    sheriff = source.id(),
                    "new sheriff claim"
                );
            }
        }
        self.sever_sheriff_pairs();

        event!(
            target: "mafia_core::session",
            Level::DEBUG,
            source = source.id(),
            action = kind.code(),
            target_player = target.id(),
            "action applied"
        );
    }

    fn sever_sheriff_pairs(&mut self) {
        let sheriffs: Vec<Player> = self.ledger.sheriffs().into_iter().collect();
        if sheriffs.len() < 2 {
            return;
        }
        for (i, a) in sheriffs.iter().enumerate() {
            for b in &sheriffs[i + 1..] {
                self.conspiracy.sever(*a, *b);
                self.relationships.sever(*a, *b);
            }
        }
    }

    fn eliminate(&mut self, player: Player, kind: ActionKind) {
        self.conspiracy
            .scale_incident(player, 1.0 - kind.weights().breaking_weight);
        self.eliminated.insert(player);
        event!(
            target: "mafia_core::session",
            Level::INFO,
            player = player.id(),
            action = kind.code(),
            "player eliminated"
        );
    }

    fn eliminate_by_vote(&mut self, player: Player) {
        self.eliminated.insert(player);
        self.messages
            .push(format!("Player {player} has been eliminated."));
        event!(
            target: "mafia_core::session",
            Level::INFO,
            player = player.id(),
            "player eliminated by vote"
        );
    }

    fn push_diagnostic(&mut self, err: EventError) {
        let message = err.to_string();
        event!(
            target: "mafia_core::session",
            Level::WARN,
            diagnostic = %message,
            "event rejected"
        );
        self.messages.push(message);
    }
}

fn ids(players: &[Player]) -> Vec<u8> {
    players.iter().map(|p| p.id()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u8) -> Player {
        Player::new(id)
    }

    fn many(ids: &[u8]) -> EventTarget {
        EventTarget::Many(ids.iter().copied().map(Player::new).collect())
    }

    fn vote(session: &mut Session, target: u8, voters: &[u8]) {
        session.apply_event(&ParsedEvent::new(p(target), "v", many(voters)));
    }

    fn split_twice(session: &mut Session) {
        vote(session, 1, &[1, 2, 3, 4, 5]);
        vote(session, 2, &[6, 7, 8, 9, 10]);
        assert_eq!(session.voting_phase(), VotingPhase::SecondRound);
        vote(session, 1, &[1, 2, 3, 4, 5]);
        vote(session, 2, &[6, 7, 8, 9, 10]);
        assert_eq!(session.voting_phase(), VotingPhase::AwaitingTiebreak);
    }

    fn trio_ids(trios: &[ScoredTriplet]) -> BTreeSet<[u8; 3]> {
        trios
            .iter()
            .map(|t| {
                let [a, b, c] = t.players.members();
                [a.id(), b.id(), c.id()]
            })
            .collect()
    }

    #[test]
    fn parses_shorthand_votes_and_generic_lines() {
        let mut session = Session::default();
        assert_eq!(
            session.parse_event("4+7890"),
            ParsedEvent::new(p(4), "r", many(&[7, 8, 9, 10]))
        );
        assert_eq!(
            session.parse_event("4+0"),
            ParsedEvent::new(p(4), "r", many(&[10]))
        );
        assert_eq!(
            session.parse_event("1s7"),
            ParsedEvent::new(p(1), "s", EventTarget::Single(p(7)))
        );
        assert_eq!(
            session.parse_event("5: 3 4 8"),
            ParsedEvent::new(p(5), "v", many(&[3, 4, 8]))
        );
        assert_eq!(
            session.parse_event("1: 2,3,4,6, 7"),
            ParsedEvent::new(p(1), "v", many(&[2, 3, 4, 6, 7]))
        );
        assert!(session.messages().is_empty());
    }

    #[test]
    fn invalid_lines_are_logged_not_raised() {
        let mut session = Session::default();
        assert!(session.parse_event("hello").is_empty());
        assert!(session.parse_event("12s3").is_empty());
        assert_eq!(
            session.messages(),
            &[
                "Invalid event string format".to_string(),
                "Player 12 is not in the roster".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_action_skips_updates() {
        let mut session = Session::default();
        session.process_line("1zz7");
        assert_eq!(session.messages(), &["Unknown action: zz".to_string()]);
        assert_eq!(session.conspiracy().weight(p(1), p(7)), 1.0);
    }

    #[test]
    fn missing_target_is_diagnosed() {
        let mut session = Session::default();
        session.process_line("1s");
        assert_eq!(
            session.messages(),
            &["Action 's' requires a target player".to_string()]
        );
    }

    #[test]
    fn vote_classification_follows_abstentions() {
        let session = Session::default();
        let kind = |line: &str| session.classify_vote(line).map(|e| e.action);
        assert_eq!(kind("1: 2,3,4,5,6,7,8,9,10"), Ok(Some("vs".into())));
        assert_eq!(kind("1: 2,3,4"), Ok(Some("v".into())));
        assert_eq!(kind("1: 2"), Ok(Some("vs".into())));
        assert_eq!(kind("1: 2,3,4,5,6"), Ok(Some("v".into())));
        assert_eq!(kind("1: 2,3,4,5,6,7,8,9"), Ok(Some("vs".into())));
        assert!(matches!(
            session.classify_vote("1:"),
            Err(EventError::InvalidVote(_))
        ));
    }

    #[test]
    fn suspicion_decays_both_graphs() {
        let mut session = Session::default();
        session.process_line("1s7");
        let w = ActionKind::Suspicion.weights();
        assert!(
            (session.conspiracy().weight(p(1), p(7)) - (1.0 - w.breaking_weight)).abs() < 1e-12
        );
        assert!(
            (session.relationships().weight(p(1), p(7)) - 6.0 / 9.0 * (1.0 - w.strength)).abs()
                < 1e-12
        );
        assert!(
            (session.relationships().weight(p(7), p(1))
                - 6.0 / 9.0 * (1.0 - w.reverse_strength))
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn shorthand_redness_raises_each_target() {
        let mut session = Session::default();
        session.process_line("4+7890");
        let expected = (6.0 / 9.0 * 1.15f64).clamp(0.0, 1.0);
        for target in [7, 8, 9, 10] {
            assert!((session.relationships().weight(p(4), p(target)) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn unanimous_vote_eliminates_target() {
        let mut session = Session::default();
        vote(&mut session, 1, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert!(session.is_eliminated(p(1)));
        assert_eq!(session.voting_phase(), VotingPhase::Idle);
        assert_eq!(
            session.messages(),
            &["Player 1 has been eliminated.".to_string()]
        );
    }

    #[test]
    fn repeated_tie_blocks_ordinary_actions() {
        let mut session = Session::default();
        split_twice(&mut session);
        assert!(session.parse_event("1s7").is_empty());
        assert_eq!(
            session.messages().last().map(String::as_str),
            Some("Tie in voting, expected 'vel' or 'novel' command.")
        );
        assert_eq!(session.voting_phase(), VotingPhase::AwaitingTiebreak);
    }

    #[test]
    fn vel_eliminates_every_tied_candidate() {
        let mut session = Session::default();
        split_twice(&mut session);
        session.process_line("vel");
        session.process_events(["4eo"]);
        assert!(session.is_eliminated(p(1)));
        assert!(session.is_eliminated(p(2)));
        assert!(session.is_eliminated(p(4)));
        assert_eq!(session.voting_phase(), VotingPhase::Idle);
    }

    #[test]
    fn novel_keeps_everyone() {
        let mut session = Session::default();
        split_twice(&mut session);
        session.process_line("novel");
        assert!(session.eliminated().is_empty());
        assert_eq!(session.voting_phase(), VotingPhase::Idle);
        assert!(session.voting().tied_candidates().is_empty());
    }

    #[test]
    fn incomplete_round_rejects_other_input() {
        let mut session = Session::default();
        session.process_line("2: 1,3,5");
        assert!(session.parse_event("1s7").is_empty());
        assert_eq!(
            session.messages(),
            &["Voting block incomplete, all players must vote before proceeding.".to_string()]
        );
    }

    #[test]
    fn completed_round_after_elimination() {
        let mut session = Session::default();
        for line in ["9e", "2: 1,3,5", "3: 2,8", "5: 4,6,7,10"] {
            session.process_line(line);
        }
        assert!(session.is_eliminated(p(9)));
        assert!(session.is_eliminated(p(5)));
        assert_eq!(session.voting_phase(), VotingPhase::Idle);
        assert!(session.conspiracy().weight(p(1), p(5)) > 0.0);
    }

    #[test]
    fn two_black_checks_pin_the_team() {
        let mut session = Session::default();
        session.process_line("3cb5");
        session.process_line("3cb6");
        let expected: BTreeSet<[u8; 3]> = [
            [2, 5, 6],
            [4, 5, 6],
            [5, 6, 7],
            [5, 6, 8],
            [5, 6, 9],
            [5, 6, 10],
        ]
        .into_iter()
        .collect();
        assert_eq!(trio_ids(&session.generate_triplets(p(1))), expected);
    }

    #[test]
    fn red_check_needs_its_sheriff() {
        let mut session = Session::default();
        session.process_line("3cr5");
        for trio in session.generate_triplets(p(1)) {
            if trio.players.contains(p(5)) {
                assert!(trio.players.contains(p(3)));
            }
        }
    }

    #[test]
    fn double_red_player_never_appears() {
        let mut session = Session::default();
        session.process_line("3cr5");
        session.process_line("4cr5");
        assert!(session.ledger().double_red_players().contains(&p(5)));
        for trio in session.generate_triplets(p(1)) {
            assert!(!trio.players.contains(p(5)));
        }
    }

    #[test]
    fn black_checked_subject_sees_accusing_sheriff() {
        let mut session = Session::default();
        session.process_line("3cb5");
        session.process_line("3cb7");
        let trios = session.generate_triplets(p(7));
        assert!(trios.is_empty());

        let mut session = Session::default();
        session.process_line("1cb2");
        session.process_line("3cb2");
        for trio in session.generate_triplets(p(1)) {
            assert!(trio.players.contains(p(2)));
            assert!(trio.players.contains(p(3)));
        }
        for trio in session.generate_triplets(p(3)) {
            assert!(trio.players.contains(p(1)));
            assert!(trio.players.contains(p(2)));
        }
    }

    #[test]
    fn sheriff_pairs_are_severed() {
        let mut session = Session::default();
        session.process_line("9cr6");
        session.process_line("8cb6");
        assert_eq!(session.conspiracy().weight(p(8), p(9)), 0.0);
        assert_eq!(session.relationships().weight(p(8), p(9)), 0.0);
        assert_eq!(session.relationships().weight(p(9), p(8)), 0.0);
        assert!(session.ledger().double_red_players().is_empty());
    }

    #[test]
    fn sheriff_pairs_stay_severed_after_later_events() {
        let mut session = Session::default();
        for line in ["3cr5", "4cr6", "3s4", "3+4", "4: 3", "7: 3"] {
            session.process_line(line);
        }
        assert!(session.messages().is_empty());
        assert_eq!(session.conspiracy().weight(p(3), p(4)), 0.0);
        assert_eq!(session.relationships().weight(p(3), p(4)), 0.0);
        assert_eq!(session.relationships().weight(p(4), p(3)), 0.0);
    }

    #[test]
    fn third_sheriff_keeps_earlier_pairs_at_zero() {
        let mut session = Session::default();
        for line in ["3cr5", "4cr6", "3s4", "8cr1", "4s8"] {
            session.process_line(line);
        }
        for (a, b) in [(3, 4), (3, 8), (4, 8)] {
            assert_eq!(session.conspiracy().weight(p(a), p(b)), 0.0);
        }
        for trio in session.generate_triplets(p(2)) {
            if trio.players.contains(p(3)) && trio.players.contains(p(4)) {
                assert_eq!(trio.score, 0.0);
            }
        }
    }

    #[test]
    fn ballots_decay_from_target_to_each_voter() {
        let base = 6.0 / 9.0;
        let mut session = Session::default();
        session.process_line("5: 3 4 8");
        let w = ActionKind::Voted.weights();
        for voter in [3, 4, 8] {
            let forward = session.relationships().weight(p(5), p(voter));
            let reverse = session.relationships().weight(p(voter), p(5));
            assert!((forward - base * (1.0 - w.strength)).abs() < 1e-12);
            assert!((reverse - base * (1.0 - w.reverse_strength)).abs() < 1e-12);
            assert!((session.conspiracy().weight(p(5), p(voter)) - 0.15).abs() < 1e-12);
        }
        assert_eq!(session.relationships().weight(p(5), p(6)), base);
        assert_eq!(session.voting_phase(), VotingPhase::CollectingVotes);

        let mut session = Session::default();
        session.process_line("1: 2");
        let w = ActionKind::VotedSoft.weights();
        let forward = session.relationships().weight(p(1), p(2));
        let reverse = session.relationships().weight(p(2), p(1));
        assert!((forward - base * (1.0 - w.strength)).abs() < 1e-12);
        assert!((reverse - base * (1.0 - w.reverse_strength)).abs() < 1e-12);
        assert!(
            (session.conspiracy().weight(p(1), p(2)) - (1.0 - w.breaking_weight)).abs() < 1e-12
        );
    }

    #[test]
    fn advisor_runs_on_a_busy_table() {
        let mut session = Session::default();
        for line in [
            "3s2", "7s2", "5s7", "8s4", "10rc9", "3s4", "4rc2", "3rc2", "9e", "9s2", "9s7",
            "9s10",
        ] {
            session.process_line(line);
        }
        assert!(session.messages().is_empty());
        let recs = session.recommend_checks();
        assert_eq!(recs.len(), 9);
        assert!(recs.iter().all(|r| r.player != p(9)));
        assert!(
            recs.windows(2)
                .all(|w| w[0].info_gain_bits >= w[1].info_gain_bits)
        );
    }
}
