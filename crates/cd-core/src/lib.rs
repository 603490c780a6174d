//! Core protocol types for the CyberDamus tarot oracle.
//!
//! This crate defines the contract between a client and the oracle: where
//! each record lives ([`AddressDeriver`]), what the deck looks like
//! ([`deck`]), how records are stored ([`record`]) and what requests look
//! like on the wire ([`wire`]). It performs no I/O.

/// Deterministic record addresses.
pub mod address;
/// Deck layout, card names and upload planning.
pub mod deck;
/// Error types used throughout the crate.
pub mod error;
/// Identities and addresses.
pub mod identity;
/// Stored record schemas.
pub mod record;
/// Request schemas and rejection codes.
pub mod wire;

/// Re-export address derivation.
pub use address::{AddressDeriver, AddressKind};
/// Re-export deck types.
pub use deck::{CardId, CardLibrary, DECK_SIZE, Suit, name_of, plan_upload_batches};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identity types.
pub use identity::{Address, Identity};
/// Re-export record types.
pub use record::{
    AccountRecord, CardLibraryRecord, FortuneRecord, OracleConfig, Rarity, Record, UserRecord,
};
/// Re-export wire types.
pub use wire::{Instruction, Receipt, Rejection, Request};
