//! Core identity and game-piece types.
//!
//! Everything in this module is serializable because it ends up in one of
//! two places: a durable room record on disk, or the text of a message
//! sent back to a chat channel.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, as assigned by the chat platform.
///
/// This is a "newtype wrapper" around `String`. Chat platforms hand out
/// opaque string ids; wrapping them means a `ChannelId` can never be
/// passed where a `PlayerId` is expected, even though both are strings.
///
/// `#[serde(transparent)]` serializes this as the bare string, so a
/// `PlayerId("1001")` is just `"1001"` in a room record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a group channel. One channel hosts at most one
/// room, so this doubles as the room id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Creates a channel id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a notice?
// ---------------------------------------------------------------------------

/// Specifies who should receive a notice produced by a room.
///
/// The channel has two addressing modes: the shared group channel that
/// hosts the room, and private messages to a single player. Hidden
/// information (hands, your own played cards) only ever goes to
/// `Player`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Send to the room's group channel.
    Channel,

    /// Send privately to one player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// The four card faces.
///
/// Sun, Moon and Star can be the round's target suit. Joker is a wildcard
/// that always counts as matching the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Sun,
    Moon,
    Star,
    Joker,
}

impl Suit {
    /// Every suit, in the canonical order used for deck composition and
    /// for breaking rounding ties.
    pub const ALL: [Suit; 4] = [Suit::Sun, Suit::Moon, Suit::Star, Suit::Joker];

    /// The suits that can be drawn as a round's target.
    pub const TARGETS: [Suit; 3] = [Suit::Sun, Suit::Moon, Suit::Star];

    /// Relative weight of this suit in a freshly composed deck (3:3:3:1).
    pub fn weight(self) -> usize {
        match self {
            Suit::Sun | Suit::Moon | Suit::Star => 3,
            Suit::Joker => 1,
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Suit::Sun => "Sun",
            Suit::Moon => "Moon",
            Suit::Star => "Star",
            Suit::Joker => "Joker",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of a physical card within one game's deck.
///
/// Ids are assigned once when the deck is composed at game start and stay
/// with the card for the rest of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u16);

/// A single card: a stable id and its face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub suit: Suit,
}

impl Card {
    /// Creates a card.
    pub fn new(id: u16, suit: Suit) -> Self {
        Self {
            id: CardId(id),
            suit,
        }
    }

    /// Returns `true` if this card backs up a claim of `target`.
    /// Jokers always do.
    pub fn matches(&self, target: Suit) -> bool {
        self.suit == target || self.suit == Suit::Joker
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.suit, f)
    }
}

// ---------------------------------------------------------------------------
// Wire colours
// ---------------------------------------------------------------------------

/// The visually distinct wires a penalized player chooses between.
///
/// Stage 1 offers all three, stage 2 the first two, stage 3 only red.
/// Slot numbers are 1-based in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireColor {
    Red,
    Blue,
    Yellow,
}

impl WireColor {
    /// All wires in slot order.
    pub const ALL: [WireColor; 3] = [WireColor::Red, WireColor::Blue, WireColor::Yellow];

    /// The wires offered when `slots` choices remain.
    pub fn offered(slots: usize) -> &'static [WireColor] {
        &Self::ALL[..slots.min(Self::ALL.len())]
    }

    /// The 1-based slot this wire occupies.
    pub fn slot(self) -> usize {
        match self {
            WireColor::Red => 1,
            WireColor::Blue => 2,
            WireColor::Yellow => 3,
        }
    }

    /// Parses a colour name or one-letter alias, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Some(WireColor::Red),
            "blue" | "b" => Some(WireColor::Blue),
            "yellow" | "y" => Some(WireColor::Yellow),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            WireColor::Red => "red",
            WireColor::Blue => "blue",
            WireColor::Yellow => "yellow",
        }
    }
}

impl fmt::Display for WireColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::new("1001")).unwrap();
        assert_eq!(json, "\"1001\"");
    }

    #[test]
    fn test_channel_id_display() {
        assert_eq!(ChannelId::new("group-7").to_string(), "group-7");
    }

    #[test]
    fn test_joker_matches_every_target() {
        let joker = Card::new(0, Suit::Joker);
        for target in Suit::TARGETS {
            assert!(joker.matches(target));
        }
    }

    #[test]
    fn test_off_suit_card_does_not_match() {
        let sun = Card::new(1, Suit::Sun);
        assert!(sun.matches(Suit::Sun));
        assert!(!sun.matches(Suit::Moon));
    }

    #[test]
    fn test_suit_weights_are_three_three_three_one() {
        let weights: Vec<usize> = Suit::ALL.iter().map(|s| s.weight()).collect();
        assert_eq!(weights, vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_wire_offered_shrinks_by_stage() {
        assert_eq!(WireColor::offered(3).len(), 3);
        assert_eq!(WireColor::offered(2), &[WireColor::Red, WireColor::Blue]);
        assert_eq!(WireColor::offered(1), &[WireColor::Red]);
    }

    #[test]
    fn test_wire_from_name_aliases() {
        assert_eq!(WireColor::from_name("Yellow"), Some(WireColor::Yellow));
        assert_eq!(WireColor::from_name("b"), Some(WireColor::Blue));
        assert_eq!(WireColor::from_name("green"), None);
    }

    #[test]
    fn test_suit_serializes_lowercase() {
        let json = serde_json::to_string(&Suit::Joker).unwrap();
        assert_eq!(json, "\"joker\"");
    }
}
