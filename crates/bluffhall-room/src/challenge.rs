//! Judging a claim.

use bluffhall_protocol::{Card, Suit};
use serde::{Deserialize, Serialize};

/// Outcome of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every played card was the target suit or a Joker. The challenger
    /// is penalized.
    Truthful,
    /// At least one card was off-suit. The claimant is penalized.
    Lie,
}

impl Verdict {
    pub fn is_lie(self) -> bool {
        matches!(self, Verdict::Lie)
    }
}

/// A claim is a lie iff some played card is neither `target` nor a Joker.
pub fn judge(cards: &[Card], target: Suit) -> Verdict {
    if cards.iter().all(|c| c.matches(target)) {
        Verdict::Truthful
    } else {
        Verdict::Lie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn suit_strategy() -> impl Strategy<Value = Suit> {
        prop_oneof![
            Just(Suit::Sun),
            Just(Suit::Moon),
            Just(Suit::Star),
            Just(Suit::Joker),
        ]
    }

    #[test]
    fn test_all_target_is_truthful() {
        let cards = [Card::new(0, Suit::Moon), Card::new(1, Suit::Moon)];
        assert_eq!(judge(&cards, Suit::Moon), Verdict::Truthful);
    }

    #[test]
    fn test_jokers_back_any_claim() {
        let cards = [Card::new(0, Suit::Joker), Card::new(1, Suit::Star)];
        assert_eq!(judge(&cards, Suit::Star), Verdict::Truthful);
    }

    #[test]
    fn test_one_off_suit_card_is_a_lie() {
        let cards = [
            Card::new(0, Suit::Sun),
            Card::new(1, Suit::Joker),
            Card::new(2, Suit::Moon),
        ];
        assert_eq!(judge(&cards, Suit::Sun), Verdict::Lie);
    }

    proptest! {
        #[test]
        fn prop_lie_iff_some_card_off_suit(
            suits in proptest::collection::vec(suit_strategy(), 1..6),
            target in prop_oneof![Just(Suit::Sun), Just(Suit::Moon), Just(Suit::Star)],
        ) {
            let cards: Vec<Card> = suits.iter().enumerate()
                .map(|(i, &s)| Card::new(i as u16, s))
                .collect();
            let off_suit = suits.iter().any(|&s| s != target && s != Suit::Joker);
            prop_assert_eq!(judge(&cards, target).is_lie(), off_suit);
        }
    }
}
