//! Rarity classification of a three-card reading.
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. three Major Arcana: Legendary
//! 2. exactly two Major Arcana: Epic
//! 3. one suit with consecutive ranks: Epic
//! 4. exactly one Major Arcana: Uncommon
//! 5. one suit, ranks not consecutive: Rare
//! 6. anything else: Common

use cd_core::{CardId, Rarity};

/// Classify three cards. Card order does not matter.
pub fn classify(cards: [CardId; 3]) -> Rarity {
    let majors = cards.iter().filter(|c| c.is_major()).count();
    match majors {
        3 => return Rarity::Legendary,
        2 => return Rarity::Epic,
        _ => {}
    }
    let same_suit = same_suit(cards);
    if same_suit && consecutive_ranks(cards) {
        Rarity::Epic
    } else if majors == 1 {
        Rarity::Uncommon
    } else if same_suit {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

/// All three cards are Minor Arcana of one suit.
fn same_suit(cards: [CardId; 3]) -> bool {
    match cards.map(CardId::suit) {
        [Some(a), Some(b), Some(c)] => a == b && b == c,
        _ => false,
    }
}

/// The ranks form a run of three, in any order. No wrap from King to Ace.
fn consecutive_ranks(cards: [CardId; 3]) -> bool {
    match cards.map(CardId::rank) {
        [Some(a), Some(b), Some(c)] => {
            let mut ranks = [a.value(), b.value(), c.value()];
            ranks.sort_unstable();
            ranks[1] == ranks[0] + 1 && ranks[2] == ranks[1] + 1
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cd_core::DECK_SIZE;
    use std::collections::HashMap;

    fn cards(ids: [u8; 3]) -> [CardId; 3] {
        ids.map(|id| CardId::new(id).unwrap())
    }

    #[test]
    fn three_majors_are_legendary() {
        assert_eq!(classify(cards([0, 1, 2])), Rarity::Legendary);
        assert_eq!(classify(cards([0, 10, 21])), Rarity::Legendary);
    }

    #[test]
    fn two_majors_are_epic() {
        assert_eq!(classify(cards([0, 1, 25])), Rarity::Epic);
        assert_eq!(classify(cards([0, 10, 50])), Rarity::Epic);
    }

    #[test]
    fn suit_runs_are_epic() {
        assert_eq!(classify(cards([22, 23, 24])), Rarity::Epic);
        assert_eq!(classify(cards([30, 31, 32])), Rarity::Epic);
        assert_eq!(classify(cards([77, 75, 76])), Rarity::Epic);
    }

    #[test]
    fn runs_do_not_cross_suits() {
        // Queen of Wands, King of Wands, Ace of Cups
        assert_eq!(classify(cards([34, 35, 36])), Rarity::Common);
    }

    #[test]
    fn majors_never_form_runs() {
        // consecutive IDs, but Major Arcana have no suit
        assert_eq!(classify(cards([20, 21, 22])), Rarity::Epic);
        assert_eq!(classify(cards([21, 22, 23])), Rarity::Uncommon);
    }

    #[test]
    fn one_major_is_uncommon() {
        assert_eq!(classify(cards([5, 40, 60])), Rarity::Uncommon);
        assert_eq!(classify(cards([5, 22, 24])), Rarity::Uncommon);
    }

    #[test]
    fn same_suit_is_rare() {
        assert_eq!(classify(cards([22, 24, 26])), Rarity::Rare);
        assert_eq!(classify(cards([64, 70, 77])), Rarity::Rare);
    }

    #[test]
    fn mixed_is_common() {
        assert_eq!(classify(cards([22, 36, 50])), Rarity::Common);
        assert_eq!(classify(cards([25, 40, 65])), Rarity::Common);
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(classify(cards([24, 22, 23])), classify(cards([22, 23, 24])));
        assert_eq!(classify(cards([25, 1, 0])), Rarity::Epic);
    }

    #[test]
    fn classification_is_total_over_all_triples() {
        let n = DECK_SIZE as u8;
        let mut counts: HashMap<Rarity, usize> = HashMap::new();
        for a in 0..n {
            for b in a + 1..n {
                for c in b + 1..n {
                    let r = classify(cards([a, b, c]));
                    *counts.entry(r).or_default() += 1;
                }
            }
        }
        let total: usize = counts.values().sum();
        assert_eq!(total, 76_076); // C(78, 3)
        assert_eq!(counts[&Rarity::Legendary], 1_540); // C(22, 3)
        // C(22, 2) * 56 two-major triples plus 4 suits * 12 runs
        assert_eq!(counts[&Rarity::Epic], 231 * 56 + 48);
        // 22 * C(56, 2)
        assert_eq!(counts[&Rarity::Uncommon], 22 * 1_540);
        // 4 * (C(14, 3) - 12)
        assert_eq!(counts[&Rarity::Rare], 4 * (364 - 12));
        for tier in Rarity::all() {
            assert!(counts.contains_key(tier), "{tier} never produced");
        }
    }
}
