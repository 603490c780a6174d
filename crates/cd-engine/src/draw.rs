//! Entropy and the three-card draw.
//!
//! The oracle hashes the user, time, slot and fortune counter into a 32-byte
//! seed, then draws three distinct cards from a `StdRng` seeded with it.
//! Anyone holding a fortune record can repeat both steps.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use sha2::{Digest, Sha256};

use cd_core::{CardId, DECK_SIZE, Identity};

use crate::error::{EngineError, EngineResult};

/// Number of cards in a reading.
pub const CARDS_PER_READING: usize = 3;

/// Hash the inputs that make a draw unique into a seed.
pub fn entropy_seed(
    user: &Identity,
    timestamp: DateTime<Utc>,
    slot: u64,
    fortune_counter: u64,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(user.as_bytes());
    hasher.update(timestamp.timestamp().to_le_bytes());
    hasher.update(slot.to_le_bytes());
    hasher.update(fortune_counter.to_le_bytes());
    hasher.finalize().into()
}

/// Draw three distinct cards uniformly from `[0, deck_size)`.
///
/// The order of the result is the reading order: past, present, future.
pub fn draw_three(seed: [u8; 32], deck_size: usize) -> EngineResult<[CardId; 3]> {
    if deck_size < CARDS_PER_READING {
        return Err(EngineError::DeckTooSmall(deck_size));
    }
    if deck_size > DECK_SIZE {
        return Err(EngineError::InvalidDeckSize(deck_size));
    }

    let mut rng = StdRng::from_seed(seed);
    let picks = index::sample(&mut rng, deck_size, CARDS_PER_READING);
    let card = |i: usize| -> EngineResult<CardId> {
        // deck_size <= 78, so every index fits in a u8
        let id = u8::try_from(picks.index(i)).map_err(|_| EngineError::InvalidDeckSize(deck_size))?;
        Ok(CardId::new(id)?)
    };
    Ok([card(0)?, card(1)?, card(2)?])
}
