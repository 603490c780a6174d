//! The ledger the oracle runs on, as seen from the client.
//!
//! A [`Ledger`] submits a request and waits for a durable commit, or reads
//! the raw bytes stored at an address. Signing, broadcast and confirmation
//! are the implementation's business.

use std::time::Duration;

use cd_core::{Address, Identity, Receipt, Rejection, Request};

/// In-memory reference oracle.
pub mod memory;

pub use memory::{MemoryLedger, OracleLimits};

/// Why a ledger round trip failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The oracle refused the request. Nothing was committed.
    #[error("rejected by oracle: {0}")]
    Rejected(Rejection),

    /// No commit confirmation within the transport's deadline.
    ///
    /// The request may or may not have been applied.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The transport failed before reaching the oracle.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Submit-and-wait access to the oracle's ledger.
pub trait Ledger {
    /// Submit a request signed by `signer` and wait for it to commit.
    fn submit(&mut self, signer: &Identity, request: &Request) -> Result<Receipt, LedgerError>;

    /// Read the raw record stored at `address`, if any.
    fn fetch(&self, address: &Address) -> Result<Option<Vec<u8>>, LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for &mut L {
    fn submit(&mut self, signer: &Identity, request: &Request) -> Result<Receipt, LedgerError> {
        (**self).submit(signer, request)
    }

    fn fetch(&self, address: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).fetch(address)
    }
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn submit(&mut self, signer: &Identity, request: &Request) -> Result<Receipt, LedgerError> {
        (**self).submit(signer, request)
    }

    fn fetch(&self, address: &Address) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).fetch(address)
    }
}
