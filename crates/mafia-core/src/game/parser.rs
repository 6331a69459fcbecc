//! Line grammar for session events.
//!
//! Lexing here is stateless. Which rule wins for a given line depends on the
//! voting phase and is decided by [`crate::game::session::Session::parse_event`].

use crate::model::player::Player;
use serde::Serialize;
use std::fmt;

/// Target slot of a parsed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventTarget {
    None,
    Single(Player),
    Many(Vec<Player>),
}

/// `(source, action code, target)` as read from one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEvent {
    pub source: Option<Player>,
    pub action: Option<String>,
    pub target: EventTarget,
}

impl ParsedEvent {
    pub fn empty() -> Self {
        Self {
            source: None,
            action: None,
            target: EventTarget::None,
        }
    }

    pub fn new(source: Player, action: impl Into<String>, target: EventTarget) -> Self {
        Self {
            source: Some(source),
            action: Some(action.into()),
            target,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_none()
    }
}

/// Operator decision after a tied runoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// `vel`: eliminate every tied candidate.
    EliminateAll,
    /// `novel`: keep every tied candidate alive.
    KeepAll,
}

impl TieBreak {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "vel" => Some(TieBreak::EliminateAll),
            "novel" => Some(TieBreak::KeepAll),
            _ => None,
        }
    }
}

/// Non-fatal problems with an event line. Each one ends up in the messages log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    InvalidFormat,
    InvalidVote(String),
    UnknownAction(String),
    UnknownPlayer(u32),
    MissingTarget(String),
    VotingIncomplete,
    TieBreakExpected,
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::InvalidFormat => write!(f, "Invalid event string format"),
            EventError::InvalidVote(detail) => write!(f, "Invalid voting notation: {detail}"),
            EventError::UnknownAction(code) => write!(f, "Unknown action: {code}"),
            EventError::UnknownPlayer(id) => write!(f, "Player {id} is not in the roster"),
            EventError::MissingTarget(code) => {
                write!(f, "Action '{code}' requires a target player")
            }
            EventError::VotingIncomplete => write!(
                f,
                "Voting block incomplete, all players must vote before proceeding."
            ),
            EventError::TieBreakExpected => {
                write!(f, "Tie in voting, expected 'vel' or 'novel' command.")
            }
        }
    }
}

impl std::error::Error for EventError {}

/// `"<source>+<digits>"`, each digit one target with `0` meaning seat 10.
pub fn parse_redness_shorthand(line: &str) -> Option<(Player, Vec<Player>)> {
    let (head, tail) = line.split_once('+')?;
    let source_digits = trailing_digits(head.trim_end());
    let target_digits = leading_digits(tail.trim_start());
    if source_digits.is_empty() || target_digits.is_empty() {
        return None;
    }
    let source = source_digits.parse::<u8>().ok().map(Player::new)?;
    let targets = target_digits
        .bytes()
        .filter_map(|b| Player::from_shorthand_digit(b - b'0'))
        .collect();
    Some((source, targets))
}

/// `"<target>: <voters>"`; `None` when the line has no colon.
pub fn parse_vote_line(line: &str) -> Option<Result<(u32, Vec<u32>), EventError>> {
    let (target_part, voters_part) = line.split_once(':')?;
    Some(parse_vote_parts(target_part, voters_part))
}

fn parse_vote_parts(target_part: &str, voters_part: &str) -> Result<(u32, Vec<u32>), EventError> {
    let target = target_part
        .trim()
        .parse::<u32>()
        .map_err(|_| EventError::InvalidVote(format!("bad target '{}'", target_part.trim())))?;

    let voters = voters_part
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| EventError::InvalidVote(format!("bad voter '{token}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if voters.is_empty() {
        return Err(EventError::InvalidVote("no voters listed".to_string()));
    }
    Ok((target, voters))
}

/// Generic `"<source><code><optional target>"`, e.g. `1s7` or `9e`.
pub fn parse_generic(line: &str) -> Result<(u32, String, Option<u32>), EventError> {
    let rest = line.trim();

    let source_digits = leading_digits(rest);
    if source_digits.is_empty() {
        return Err(EventError::InvalidFormat);
    }
    let rest = rest[source_digits.len()..].trim_start();

    let code_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    if code_len == 0 {
        return Err(EventError::InvalidFormat);
    }
    let code = rest[..code_len].to_ascii_lowercase();
    let rest = rest[code_len..].trim_start();

    let target_digits = leading_digits(rest);
    if !rest[target_digits.len()..].trim().is_empty() {
        return Err(EventError::InvalidFormat);
    }

    let source = parse_id(source_digits)?;
    let target = if target_digits.is_empty() {
        None
    } else {
        Some(parse_id(target_digits)?)
    };
    Ok((source, code, target))
}

fn parse_id(digits: &str) -> Result<u32, EventError> {
    digits.parse::<u32>().map_err(|_| EventError::InvalidFormat)
}

fn leading_digits(text: &str) -> &str {
    let len = text.bytes().take_while(u8::is_ascii_digit).count();
    &text[..len]
}

fn trailing_digits(text: &str) -> &str {
    let len = text.bytes().rev().take_while(u8::is_ascii_digit).count();
    &text[text.len() - len..]
}
