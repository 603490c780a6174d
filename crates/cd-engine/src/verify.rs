//! Client-side verification of a fortune against its own entropy.

use cd_core::FortuneRecord;

use crate::draw::{draw_three, entropy_seed};
use crate::error::{EngineError, EngineResult};
use crate::rarity::classify;

/// Re-derive a fortune's seed, draw and rarity and compare with the record.
pub fn verify_fortune(fortune: &FortuneRecord) -> EngineResult<()> {
    let fail = |reason: String| EngineError::Verification {
        fortune_id: fortune.fortune_id,
        reason,
    };

    if !fortune.has_distinct_cards() {
        return Err(fail("cards are not distinct".to_string()));
    }

    let seed = entropy_seed(
        &fortune.owner,
        fortune.timestamp,
        fortune.slot,
        fortune.fortune_id,
    );
    if seed != fortune.entropy_seed {
        return Err(fail("entropy seed does not match owner, time and slot".to_string()));
    }

    let drawn = draw_three(seed, usize::from(fortune.deck_size)).map_err(|e| fail(e.to_string()))?;
    if drawn != fortune.cards {
        return Err(fail(format!(
            "cards {:?} differ from draw {:?}",
            fortune.cards.map(|c| c.value()),
            drawn.map(|c| c.value())
        )));
    }

    let rarity = classify(fortune.cards);
    if rarity != fortune.rarity {
        return Err(fail(format!("rarity {} should be {rarity}", fortune.rarity)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cd_core::{CardId, Identity};
    use chrono::DateTime;

    fn honest(deck_size: u8) -> FortuneRecord {
        let owner = Identity::new([4; 32]);
        let timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let seed = entropy_seed(&owner, timestamp, 42, 7);
        let cards = draw_three(seed, usize::from(deck_size)).unwrap();
        FortuneRecord {
            fortune_id: 7,
            owner,
            cards,
            rarity: classify(cards),
            timestamp,
            slot: 42,
            deck_size,
            entropy_seed: seed,
        }
    }

    #[test]
    fn honest_fortune_verifies() {
        assert!(verify_fortune(&honest(78)).is_ok());
        assert!(verify_fortune(&honest(10)).is_ok());
    }

    #[test]
    fn tampered_rarity_fails() {
        let mut f = honest(78);
        f.rarity = if f.rarity == cd_core::Rarity::Legendary {
            cd_core::Rarity::Common
        } else {
            cd_core::Rarity::Legendary
        };
        let err = verify_fortune(&f).unwrap_err();
        assert!(err.to_string().contains("rarity"));
    }

    #[test]
    fn tampered_cards_fail() {
        let mut f = honest(78);
        let [a, b, c] = f.cards;
        f.cards = [b, a, c];
        assert!(matches!(
            verify_fortune(&f),
            Err(EngineError::Verification { fortune_id: 7, .. })
        ));
    }

    #[test]
    fn duplicate_cards_fail() {
        let mut f = honest(78);
        f.cards = [CardId::new(1).unwrap(); 3];
        let err = verify_fortune(&f).unwrap_err();
        assert!(err.to_string().contains("not distinct"));
    }

    #[test]
    fn wrong_seed_fails() {
        let mut f = honest(78);
        f.slot += 1;
        let err = verify_fortune(&f).unwrap_err();
        assert!(err.to_string().contains("entropy seed"));
    }

    #[test]
    fn bad_deck_size_fails() {
        let mut f = honest(78);
        f.deck_size = 2;
        assert!(verify_fortune(&f).is_err());
    }
}
