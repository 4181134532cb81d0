//! Deck composition and dealing.
//!
//! The deck is fixed when the game starts: `players × hand_size` cards
//! with suits in a 3:3:3:1 Sun:Moon:Star:Joker ratio. Every round the
//! whole set is gathered back, shuffled and dealt again.

use std::collections::BTreeMap;

use bluffhall_protocol::{Card, Suit};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The locked shape of a game's deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSpec {
    /// Total cards, `players_at_start × hand_size`.
    pub total: usize,
    /// Cards of each suit. Sums to `total`.
    pub counts: BTreeMap<Suit, usize>,
}

impl DeckSpec {
    /// How many cards of `suit` the deck holds.
    pub fn count(&self, suit: Suit) -> usize {
        self.counts.get(&suit).copied().unwrap_or(0)
    }
}

/// Scales the suit weights to `total` with largest-remainder rounding.
///
/// Each suit first gets `floor(total × weight / 10)`. The cards still
/// missing go one each to the suits with the largest fractional parts;
/// ties keep `Suit::ALL` order.
pub fn suit_counts(total: usize) -> BTreeMap<Suit, usize> {
    let weight_sum: usize = Suit::ALL.iter().map(|s| s.weight()).sum();

    let mut shares: Vec<(Suit, usize, usize)> = Suit::ALL
        .iter()
        .map(|&suit| {
            let scaled = total * suit.weight();
            (suit, scaled / weight_sum, scaled % weight_sum)
        })
        .collect();

    let assigned: usize = shares.iter().map(|(_, whole, _)| whole).sum();
    let mut missing = total - assigned;

    // sort_by is stable, so equal remainders stay in suit order
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|&a, &b| shares[b].2.cmp(&shares[a].2));
    for idx in by_remainder {
        if missing == 0 {
            break;
        }
        shares[idx].1 += 1;
        missing -= 1;
    }

    shares.into_iter().map(|(suit, n, _)| (suit, n)).collect()
}

/// Builds and deals the game's deck.
pub struct DeckAllocator;

impl DeckAllocator {
    /// Locks the deck for a game started with `players` players.
    ///
    /// Returns the spec and the cards, ids `0..total` in suit order.
    pub fn lock(players: usize, hand_size: usize) -> (DeckSpec, Vec<Card>) {
        let total = players * hand_size;
        let counts = suit_counts(total);

        let mut cards = Vec::with_capacity(total);
        for (&suit, &n) in &counts {
            for _ in 0..n {
                cards.push(Card::new(cards.len() as u16, suit));
            }
        }

        (DeckSpec { total, counts }, cards)
    }

    /// Shuffles `pool` and deals `hand_size` cards to each of `seats`
    /// hands, in order. Undealt cards stay in `pool`.
    ///
    /// Returns `None` (leaving `pool` untouched) if there are not enough
    /// cards.
    pub fn deal<R: Rng + ?Sized>(
        pool: &mut Vec<Card>,
        seats: usize,
        hand_size: usize,
        rng: &mut R,
    ) -> Option<Vec<Vec<Card>>> {
        let needed = seats * hand_size;
        if pool.len() < needed {
            return None;
        }
        pool.shuffle(rng);
        let mut hands = Vec::with_capacity(seats);
        for _ in 0..seats {
            let rest = pool.split_off(hand_size);
            hands.push(std::mem::replace(pool, rest));
        }
        Some(hands)
    }

    /// Draws a round's target suit uniformly from Sun, Moon and Star.
    pub fn draw_target<R: Rng + ?Sized>(rng: &mut R) -> Suit {
        Suit::TARGETS[rng.random_range(0..Suit::TARGETS.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_four_players_get_twenty_cards_six_six_six_two() {
        let (spec, cards) = DeckAllocator::lock(4, 5);
        assert_eq!(spec.total, 20);
        assert_eq!(cards.len(), 20);
        assert_eq!(spec.count(Suit::Sun), 6);
        assert_eq!(spec.count(Suit::Moon), 6);
        assert_eq!(spec.count(Suit::Star), 6);
        assert_eq!(spec.count(Suit::Joker), 2);
    }

    #[test]
    fn test_three_players_ties_break_in_suit_order() {
        let counts = suit_counts(15);
        assert_eq!(counts[&Suit::Sun], 5);
        assert_eq!(counts[&Suit::Moon], 5);
        assert_eq!(counts[&Suit::Star], 4);
        assert_eq!(counts[&Suit::Joker], 1);
    }

    #[test]
    fn test_five_players() {
        let counts = suit_counts(25);
        assert_eq!(
            counts.values().copied().collect::<Vec<_>>(),
            vec![8, 8, 7, 2]
        );
    }

    #[test]
    fn test_card_ids_are_unique() {
        let (_, cards) = DeckAllocator::lock(5, 5);
        let mut ids: Vec<u16> = cards.iter().map(|c| c.id.0).collect();
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }

    #[test]
    fn test_deal_leaves_undealt_cards_in_pool() {
        let (_, mut pool) = DeckAllocator::lock(4, 5);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let hands = DeckAllocator::deal(&mut pool, 3, 5, &mut rng).unwrap();
        assert_eq!(hands.len(), 3);
        assert!(hands.iter().all(|h| h.len() == 5));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_deal_refuses_short_pool() {
        let (_, mut pool) = DeckAllocator::lock(3, 5);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert!(DeckAllocator::deal(&mut pool, 4, 5, &mut rng).is_none());
        assert_eq!(pool.len(), 15);
    }

    #[test]
    fn test_same_seed_same_deal() {
        let deal = |seed| {
            let (_, mut pool) = DeckAllocator::lock(4, 5);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            DeckAllocator::deal(&mut pool, 4, 5, &mut rng).unwrap()
        };
        assert_eq!(deal(42), deal(42));
    }

    #[test]
    fn test_target_is_never_joker() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert_ne!(DeckAllocator::draw_target(&mut rng), Suit::Joker);
        }
    }

    proptest! {
        #[test]
        fn prop_counts_sum_exactly(total in 0usize..500) {
            let counts = suit_counts(total);
            prop_assert_eq!(counts.values().sum::<usize>(), total);
        }

        #[test]
        fn prop_counts_stay_within_one_of_ratio(total in 0usize..500) {
            let counts = suit_counts(total);
            for suit in Suit::ALL {
                let exact = total as f64 * suit.weight() as f64 / 10.0;
                let got = counts[&suit] as f64;
                prop_assert!((got - exact).abs() < 1.0);
            }
        }

        #[test]
        fn prop_deal_conserves_cards(players in 3usize..=5, alive in 2usize..=5, seed: u64) {
            let alive = alive.min(players);
            let (spec, mut pool) = DeckAllocator::lock(players, 5);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let hands = DeckAllocator::deal(&mut pool, alive, 5, &mut rng).unwrap();
            let dealt: usize = hands.iter().map(Vec::len).sum();
            prop_assert_eq!(dealt + pool.len(), spec.total);
        }
    }
}
