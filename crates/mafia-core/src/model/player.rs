use core::fmt;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROSTER_SIZE: u8 = 10;

/// Seat number of a participant, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Player(u8);

impl Player {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    /// Maps a single digit of the `+` shorthand to a seat; `0` stands for seat 10.
    pub const fn from_shorthand_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Player(10)),
            1..=9 => Some(Player(digit)),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of seats for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roster {
    size: u8,
}

impl Roster {
    pub const fn new(size: u8) -> Self {
        Self { size }
    }

    pub const fn size(self) -> usize {
        self.size as usize
    }

    pub const fn contains(self, player: Player) -> bool {
        player.0 >= 1 && player.0 <= self.size
    }

    /// Seats in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = Player> {
        (1..=self.size).map(Player)
    }

    pub fn players(self) -> Vec<Player> {
        self.iter().collect()
    }

    /// Every unordered pair `(a, b)` with `a < b`.
    pub fn pairs(self) -> impl Iterator<Item = (Player, Player)> {
        self.iter()
            .flat_map(move |a| self.iter().filter(move |b| a < *b).map(move |b| (a, b)))
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_ROSTER_SIZE)
    }
}
