//! Fortune rules for the CyberDamus oracle.
//!
//! Everything the oracle decides about a divination lives here as pure
//! functions: the entropy seed, the three-card draw, rarity, cooldowns and
//! the daily window. The reference ledger applies these rules and clients
//! use the same functions to verify what the oracle returned.

/// Cooldown and daily-window bookkeeping.
pub mod cooldown;
/// Entropy seeds and the three-card draw.
pub mod draw;
/// Error types used throughout the crate.
pub mod error;
/// Rarity classification.
pub mod rarity;
/// Tunable rules and fee bounds.
pub mod rules;
/// Fortune verification.
pub mod verify;

/// Re-export cooldown bookkeeping.
pub use cooldown::{UserStats, check_divination, daily_count_at, record_divination};
/// Re-export draw functions.
pub use draw::{CARDS_PER_READING, draw_three, entropy_seed};
/// Re-export error types.
pub use error::{EngineError, EngineResult};
/// Re-export rarity classification.
pub use rarity::classify;
/// Re-export rules.
pub use rules::{CooldownPolicy, MAX_FEE, MAX_PERIOD_SECS, MIN_FEE, OracleRules};
/// Re-export verification.
pub use verify::verify_fortune;
