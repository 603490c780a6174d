//! Deterministic record addresses.
//!
//! Every persistent record lives at an address computed from a fixed seed for
//! its kind plus identifying key parts. The oracle derives the same addresses
//! on its side and rejects requests whose addresses do not match, so
//! malformed keys must be caught here, before anything is submitted.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};
use crate::identity::{Address, Identity};

const DOMAIN_TAG: &[u8] = b"cyberdamus/address/v1";

/// The kinds of records the oracle stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// The singleton oracle configuration.
    OracleConfig,
    /// The singleton card library.
    CardLibrary,
    /// A per-user record, keyed by the user's identity.
    UserRecord,
    /// A fortune, keyed by its sequence number.
    FortuneRecord,
}

impl AddressKind {
    /// The fixed seed string for this kind.
    pub fn seed(self) -> &'static [u8] {
        match self {
            Self::OracleConfig => b"oracle_state",
            Self::CardLibrary => b"card_library",
            Self::UserRecord => b"user_record",
            Self::FortuneRecord => b"fortune",
        }
    }

    /// Expected byte length of each key part.
    fn key_layout(self) -> &'static [usize] {
        match self {
            Self::OracleConfig | Self::CardLibrary => &[],
            Self::UserRecord => &[Identity::LEN],
            Self::FortuneRecord => &[8],
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OracleConfig => write!(f, "oracle_config"),
            Self::CardLibrary => write!(f, "card_library"),
            Self::UserRecord => write!(f, "user_record"),
            Self::FortuneRecord => write!(f, "fortune_record"),
        }
    }
}

/// Computes record addresses for one oracle program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Identity,
}

impl AddressDeriver {
    /// Create a deriver scoped to the given program.
    pub fn new(program_id: Identity) -> Self {
        Self { program_id }
    }

    /// The program this deriver is scoped to.
    pub fn program_id(&self) -> Identity {
        self.program_id
    }

    /// Derive the address for `kind` from raw key parts.
    ///
    /// Fails with [`CoreError::InvalidKey`] when the number of parts or the
    /// length of any part does not match the kind.
    pub fn derive(&self, kind: AddressKind, key_parts: &[&[u8]]) -> CoreResult<Address> {
        let layout = kind.key_layout();
        if key_parts.len() != layout.len() {
            return Err(CoreError::InvalidKey {
                kind,
                reason: format!(
                    "expected {} key part(s), got {}",
                    layout.len(),
                    key_parts.len()
                ),
            });
        }
        for (i, (part, want)) in key_parts.iter().zip(layout).enumerate() {
            if part.len() != *want {
                return Err(CoreError::InvalidKey {
                    kind,
                    reason: format!("key part {i} is {} bytes, expected {want}", part.len()),
                });
            }
        }

        Ok(self.hash(kind, key_parts))
    }

    fn hash(&self, kind: AddressKind, key_parts: &[&[u8]]) -> Address {
        // Length-prefix every field so distinct tuples never share a preimage.
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        hasher.update(self.program_id.as_bytes());
        for field in std::iter::once(kind.seed()).chain(key_parts.iter().copied()) {
            hasher.update((field.len() as u32).to_le_bytes());
            hasher.update(field);
        }
        Address::new(hasher.finalize().into())
    }

    /// Address of the singleton oracle configuration.
    pub fn oracle_config(&self) -> Address {
        self.hash(AddressKind::OracleConfig, &[])
    }

    /// Address of the singleton card library.
    pub fn card_library(&self) -> Address {
        self.hash(AddressKind::CardLibrary, &[])
    }

    /// Address of a user's record.
    pub fn user_record(&self, user: &Identity) -> Address {
        self.hash(AddressKind::UserRecord, &[user.as_bytes()])
    }

    /// Address of the fortune with the given sequence number.
    pub fn fortune_record(&self, fortune_id: u64) -> Address {
        self.hash(AddressKind::FortuneRecord, &[&fortune_id.to_le_bytes()])
    }
}
