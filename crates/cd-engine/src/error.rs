//! Error types for the fortune engine.

use chrono::{DateTime, Duration, Utc};

/// Errors raised by the fortune rules.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Fewer than three cards to draw from.
    #[error("deck too small: {0} card(s), need at least 3")]
    DeckTooSmall(usize),

    /// A deck size larger than the full deck.
    #[error("invalid deck size: {0}")]
    InvalidDeckSize(usize),

    /// The user must wait before divining again.
    #[error("cooldown active until {until} ({}s remaining)", remaining.num_seconds())]
    CooldownActive {
        /// Earliest time the next divination is allowed.
        until: DateTime<Utc>,
        /// Time left at the moment of the attempt.
        remaining: Duration,
    },

    /// The user reached the configured daily cap.
    #[error("daily limit of {0} fortunes reached")]
    DailyLimitExceeded(u8),

    /// Fee outside the accepted range.
    #[error("fee {fee} outside [{min}, {max}]")]
    InvalidFee {
        /// The proposed fee.
        fee: u64,
        /// Smallest accepted fee.
        min: u64,
        /// Largest accepted fee.
        max: u64,
    },

    /// A fortune that does not match its own entropy.
    #[error("fortune #{fortune_id} failed verification: {reason}")]
    Verification {
        /// The fortune checked.
        fortune_id: u64,
        /// What did not match.
        reason: String,
    },

    /// Rules that could not be parsed.
    #[error("invalid rules: {0}")]
    InvalidRules(String),

    /// A core protocol error.
    #[error(transparent)]
    Core(#[from] cd_core::CoreError),
}

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
