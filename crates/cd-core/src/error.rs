use crate::address::AddressKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while deriving addresses, reading the deck layout, or
/// decoding records.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Key parts do not match what the address kind expects.
    #[error("invalid key for {kind}: {reason}")]
    InvalidKey {
        /// The address kind being derived.
        kind: AddressKind,
        /// What was wrong with the key parts.
        reason: String,
    },

    /// A card ID outside the 78-card deck.
    #[error("unknown card: {0} (deck has 78 cards)")]
    UnknownCard(u16),

    /// An upload plan that cannot partition the deck.
    #[error("invalid upload batch: {0}")]
    InvalidBatch(String),

    /// A string that is not a valid base58 identity or address.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Stored bytes that do not match the expected record schema.
    #[error("cannot decode {expected}: {reason}")]
    Decode {
        /// The record kind the caller asked for.
        expected: &'static str,
        /// Why decoding failed.
        reason: String,
    },

    /// A value that could not be serialized.
    #[error("cannot encode: {0}")]
    Encode(String),
}
