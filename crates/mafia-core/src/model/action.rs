use core::fmt;
use serde::{Deserialize, Serialize};

/// Decay constants carried by an action.
///
/// `breaking_weight` scales the conspired-together edge down, `strength` the
/// forward relationship edge and `reverse_strength` the reverse one. Negative
/// values strengthen the edge instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionWeights {
    pub breaking_weight: f64,
    pub reverse_strength: f64,
    pub strength: f64,
}

impl ActionWeights {
    const fn new(breaking_weight: f64, reverse_strength: f64, strength: f64) -> Self {
        Self {
            breaking_weight,
            reverse_strength,
            strength,
        }
    }
}

/// Every event kind the engine understands, keyed by its short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Suspicion,
    StrongSuspicion,
    Redness,
    RednessStrong,
    Voted,
    VotedSoft,
    RequestedCheck,
    CheckedBlack,
    CheckedRed,
    Other,
    OtherSheriff,
    Eliminated,
    EliminatedSheriff,
    EliminatedOther,
}

impl ActionKind {
    pub const ALL: [ActionKind; 14] = [
        ActionKind::Suspicion,
        ActionKind::StrongSuspicion,
        ActionKind::Redness,
        ActionKind::RednessStrong,
        ActionKind::Voted,
        ActionKind::VotedSoft,
        ActionKind::RequestedCheck,
        ActionKind::CheckedBlack,
        ActionKind::CheckedRed,
        ActionKind::Other,
        ActionKind::OtherSheriff,
        ActionKind::Eliminated,
        ActionKind::EliminatedSheriff,
        ActionKind::EliminatedOther,
    ];

    /// Looks up an action by code. Codes are matched case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let lowered = code.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == lowered)
    }

    pub const fn code(self) -> &'static str {
        match self {
            ActionKind::Suspicion => "s",
            ActionKind::StrongSuspicion => "ss",
            ActionKind::Redness => "r",
            ActionKind::RednessStrong => "rr",
            ActionKind::Voted => "v",
            ActionKind::VotedSoft => "vs",
            ActionKind::RequestedCheck => "rc",
            ActionKind::CheckedBlack => "cb",
            ActionKind::CheckedRed => "cr",
            ActionKind::Other => "o",
            ActionKind::OtherSheriff => "os",
            ActionKind::Eliminated => "e",
            ActionKind::EliminatedSheriff => "es",
            ActionKind::EliminatedOther => "eo",
        }
    }

    pub const fn weights(self) -> ActionWeights {
        match self {
            ActionKind::Suspicion => ActionWeights::new(0.5, 0.1, 0.2),
            ActionKind::StrongSuspicion => ActionWeights::new(0.85, 0.15, 0.3),
            ActionKind::Redness => ActionWeights::new(0.0, 0.0, -0.15),
            ActionKind::RednessStrong => ActionWeights::new(0.0, 0.0, -1.0),
            ActionKind::Voted => ActionWeights::new(0.85, 0.3, 0.6),
            ActionKind::VotedSoft => ActionWeights::new(0.4, 0.15, 0.3),
            ActionKind::RequestedCheck => ActionWeights::new(0.7, 0.1, 0.3),
            ActionKind::CheckedBlack => ActionWeights::new(0.85, 1.0, 1.0),
            ActionKind::CheckedRed => ActionWeights::new(0.0, -0.1, 1.0),
            ActionKind::Other => ActionWeights::new(0.8, 0.0, 0.0),
            ActionKind::OtherSheriff => ActionWeights::new(1.0, 0.0, 0.0),
            ActionKind::Eliminated => ActionWeights::new(0.99, 0.0, 0.0),
            ActionKind::EliminatedSheriff => ActionWeights::new(0.9, 0.0, 0.0),
            ActionKind::EliminatedOther => ActionWeights::new(0.0, 0.0, 0.0),
        }
    }

    pub const fn is_elimination(self) -> bool {
        matches!(
            self,
            ActionKind::Eliminated | ActionKind::EliminatedSheriff | ActionKind::EliminatedOther
        )
    }

    pub const fn is_vote(self) -> bool {
        matches!(self, ActionKind::Voted | ActionKind::VotedSoft)
    }

    pub const fn is_check(self) -> bool {
        matches!(self, ActionKind::CheckedBlack | ActionKind::CheckedRed)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
