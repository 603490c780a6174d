//! Client for the CyberDamus tarot oracle.
//!
//! An [`OracleSession`] wraps a [`Ledger`] and an identity and exposes the
//! oracle's operations: initialize, reconfigure, upload the deck, divine a
//! fortune and read records back. [`MemoryLedger`] is a complete in-process
//! oracle for tests and local runs.

/// Time sources.
pub mod clock;
/// Client configuration.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// The ledger interface and the in-memory oracle.
pub mod ledger;
/// The oracle session.
pub mod session;

/// Re-export clocks.
pub use clock::{Clock, ManualClock, SystemClock};
/// Re-export configuration.
pub use config::ClientConfig;
/// Re-export error types.
pub use error::{OracleError, OracleResult};
/// Re-export ledger types.
pub use ledger::{Ledger, LedgerError, MemoryLedger, OracleLimits};
/// Re-export session types.
pub use session::{OracleSession, SessionState, UploadReport};

/// Re-export the stats view, which lives with the cooldown rules.
pub use cd_engine::UserStats;
