//! Request schemas sent to the oracle and the codes it rejects them with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::identity::{Address, Identity};

/// Schema version of every request this crate builds.
pub const REQUEST_SCHEMA_VERSION: u16 = 1;

/// An operation on the oracle, with every address it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Create the oracle configuration and an empty card library.
    Initialize {
        /// Derived config address.
        oracle_config: Address,
        /// Derived library address.
        card_library: Address,
        /// Fee recipient.
        treasury: Identity,
        /// Fee per divination.
        fee: u64,
    },
    /// Replace the treasury and fee. Authority only.
    Reinitialize {
        /// Derived config address.
        oracle_config: Address,
        /// New fee recipient.
        treasury: Identity,
        /// New fee per divination.
        fee: u64,
    },
    /// Write descriptors into unset library slots. Authority only.
    UploadCards {
        /// Derived config address.
        oracle_config: Address,
        /// Derived library address.
        card_library: Address,
        /// Library index of the first descriptor.
        start_index: u8,
        /// Descriptors for consecutive slots.
        cards: Vec<String>,
    },
    /// Draw a fortune for the signer.
    DivineFortune {
        /// Derived config address.
        oracle_config: Address,
        /// Derived library address.
        card_library: Address,
        /// Derived address of the signer's user record.
        user_record: Address,
        /// Derived address for the next fortune sequence number.
        fortune_record: Address,
        /// Fee recipient; must match the config.
        treasury: Identity,
    },
}

impl Instruction {
    /// Short operation name, for logs.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Reinitialize { .. } => "reinitialize",
            Self::UploadCards { .. } => "upload_cards",
            Self::DivineFortune { .. } => "divine_fortune",
        }
    }
}

/// A versioned request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Request schema version.
    pub schema: u16,
    /// The operation.
    pub instruction: Instruction,
}

impl Request {
    /// Wrap an instruction in the current schema version.
    pub fn new(instruction: Instruction) -> Self {
        Self {
            schema: REQUEST_SCHEMA_VERSION,
            instruction,
        }
    }

    /// Serialize for transport.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::Encode(e.to_string()))
    }

    /// Parse from transport bytes.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::Decode {
            expected: "request",
            reason: e.to_string(),
        })
    }
}

/// Proof that a request was durably committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction signature.
    pub signature: String,
    /// Ledger slot the request committed in.
    pub slot: u64,
}

/// Why the oracle refused a request. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    /// A record that must be created already exists.
    #[error("account {address} already in use")]
    AccountInUse {
        /// The occupied address.
        address: Address,
    },

    /// A supplied address is not the one the oracle derives.
    #[error("seeds mismatch: expected {expected}, got {actual}")]
    SeedsMismatch {
        /// What the oracle derived.
        expected: Address,
        /// What the request supplied.
        actual: Address,
    },

    /// A record the request depends on does not exist.
    #[error("account {address} not found")]
    AccountNotFound {
        /// The missing address.
        address: Address,
    },

    /// The signer lacks authority, or a supplied identity does not match.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// What failed to match.
        reason: String,
    },

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

    /// The card library cannot take the batch.
    #[error("capacity exceeded: {reason}")]
    CapacityExceeded {
        /// Which limit was hit.
        reason: String,
    },

    /// The user divined too recently.
    #[error("cooldown active until {until} ({remaining_secs}s remaining)")]
    CooldownActive {
        /// Earliest time the next divination is allowed.
        until: DateTime<Utc>,
        /// Seconds left at the time of the attempt.
        remaining_secs: i64,
    },

    /// The user reached the daily cap.
    #[error("daily limit of {limit} fortunes reached")]
    DailyLimitExceeded {
        /// The configured cap.
        limit: u8,
    },

    /// Too few cards are uploaded to draw three distinct ones.
    #[error("card library not ready: {populated} usable card(s)")]
    DeckNotReady {
        /// Usable cards at the time of the attempt.
        populated: usize,
    },

    /// A stored record the oracle could not decode.
    #[error("account {address} holds invalid data")]
    InvalidAccountData {
        /// The unreadable address.
        address: Address,
    },

    /// The request schema version is not understood.
    #[error("unsupported request schema {schema}")]
    UnsupportedSchema {
        /// The version the request carried.
        schema: u16,
    },
}
