//! Error types for the oracle client.

use chrono::{DateTime, Utc};

use cd_core::{CoreError, Rejection};
use cd_engine::EngineError;

use crate::ledger::LedgerError;
use crate::session::SessionState;

/// Errors returned by [`OracleSession`](crate::session::OracleSession).
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Address key parts or an identity that do not fit.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A card ID outside the deck.
    #[error("unknown card ID: {0}")]
    UnknownCard(u16),

    /// Stored bytes that do not decode as the expected record.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// The record kind expected.
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// A request that could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The oracle configuration already exists.
    #[error("oracle already initialized")]
    AlreadyInitialized,

    /// No oracle configuration exists yet.
    #[error("oracle not initialized")]
    NotInitialized,

    /// The signer is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

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

    /// The card library refused a batch. Earlier batches stay committed.
    #[error("capacity exceeded at card {start_index} ({populated}/78 uploaded): {reason}")]
    CapacityExceeded {
        /// First index of the refused batch.
        start_index: usize,
        /// Cards confirmed in the library.
        populated: usize,
        /// What the oracle reported.
        reason: String,
    },

    /// The user must wait before divining again.
    #[error("cooldown active until {until} ({}s remaining)", remaining.num_seconds())]
    CooldownActive {
        /// Earliest time the next divination is allowed.
        until: DateTime<Utc>,
        /// Time left when the attempt was made.
        remaining: chrono::Duration,
    },

    /// The user reached the oracle's daily cap.
    #[error("daily limit of {0} fortunes reached")]
    DailyLimitExceeded(u8),

    /// Another divination took the fortune address first, on every attempt.
    #[error("fortune address collision after {attempts} attempt(s), last counter {fortune_id}")]
    AddressCollision {
        /// Counter value of the last attempt.
        fortune_id: u64,
        /// Attempts made.
        attempts: u32,
    },

    /// A record that was never created.
    #[error("not found: {0}")]
    NotFound(String),

    /// Too few cards uploaded to draw three distinct ones.
    #[error("deck not ready: {populated} usable card(s), need at least 3")]
    DeckNotReady {
        /// Usable cards.
        populated: usize,
    },

    /// The operation is not valid in the session's current state.
    #[error("cannot {op} while {state}")]
    InvalidState {
        /// The attempted operation.
        op: &'static str,
        /// The session state.
        state: SessionState,
    },

    /// The ledger did not confirm in time. The request may have committed.
    #[error("transport timed out after {0:?}")]
    TransportTimeout(std::time::Duration),

    /// The ledger could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// A committed fortune that does not match its own entropy.
    #[error("verification failed: {0}")]
    Verification(String),

    /// Any other oracle rejection.
    #[error("rejected by oracle: {0}")]
    Rejected(Rejection),
}

impl OracleError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CooldownActive { .. }
                | Self::DailyLimitExceeded(_)
                | Self::AddressCollision { .. }
                | Self::TransportTimeout(_)
                | Self::Transport(_)
        )
    }

    /// Earliest time a retry can succeed, when the oracle told us.
    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::CooldownActive { until, .. } => Some(*until),
            _ => None,
        }
    }
}

impl From<CoreError> for OracleError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidKey { .. } | CoreError::InvalidIdentity(_) => {
                Self::InvalidKey(e.to_string())
            }
            CoreError::UnknownCard(id) => Self::UnknownCard(id),
            CoreError::InvalidBatch(reason) => Self::Config(reason),
            CoreError::Decode { expected, reason } => Self::Decode {
                what: expected,
                reason,
            },
            CoreError::Encode(reason) => Self::Encode(reason),
        }
    }
}

impl From<EngineError> for OracleError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::DeckTooSmall(populated) => Self::DeckNotReady { populated },
            EngineError::CooldownActive { until, remaining } => {
                Self::CooldownActive { until, remaining }
            }
            EngineError::DailyLimitExceeded(limit) => Self::DailyLimitExceeded(limit),
            EngineError::InvalidFee { fee, min, max } => Self::InvalidFee { fee, min, max },
            EngineError::InvalidRules(reason) => Self::Config(reason),
            EngineError::Core(core) => core.into(),
            EngineError::InvalidDeckSize(_) | EngineError::Verification { .. } => {
                Self::Verification(e.to_string())
            }
        }
    }
}

impl From<Rejection> for OracleError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Unauthorized { reason } => Self::Unauthorized(reason),
            Rejection::InvalidFee { fee, min, max } => Self::InvalidFee { fee, min, max },
            Rejection::CooldownActive {
                until,
                remaining_secs,
            } => Self::CooldownActive {
                until,
                remaining: chrono::TimeDelta::try_seconds(remaining_secs)
                    .unwrap_or(chrono::TimeDelta::MAX),
            },
            Rejection::DailyLimitExceeded { limit } => Self::DailyLimitExceeded(limit),
            Rejection::DeckNotReady { populated } => Self::DeckNotReady { populated },
            other => Self::Rejected(other),
        }
    }
}

impl From<LedgerError> for OracleError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Rejected(r) => r.into(),
            LedgerError::Timeout(after) => Self::TransportTimeout(after),
            LedgerError::Transport(reason) => Self::Transport(reason),
        }
    }
}

/// Convenience result type for client operations.
pub type OracleResult<T> = Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cd_core::Address;

    #[test]
    fn retryable_errors() {
        assert!(OracleError::TransportTimeout(std::time::Duration::from_secs(30)).is_retryable());
        assert!(
            OracleError::AddressCollision {
                fortune_id: 3,
                attempts: 4
            }
            .is_retryable()
        );
        assert!(!OracleError::AlreadyInitialized.is_retryable());
        assert!(!OracleError::Unauthorized("nope".into()).is_retryable());
    }

    #[test]
    fn cooldown_carries_retry_time() {
        let until = DateTime::from_timestamp(1_700_086_400, 0).unwrap();
        let err: OracleError = LedgerError::Rejected(Rejection::CooldownActive {
            until,
            remaining_secs: 3_600,
        })
        .into();
        assert_eq!(err.retry_after(), Some(until));
        match err {
            OracleError::CooldownActive { remaining, .. } => {
                assert_eq!(remaining, chrono::Duration::hours(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absurd_remaining_time_saturates() {
        let until = DateTime::from_timestamp(1_700_086_400, 0).unwrap();
        let err: OracleError = Rejection::CooldownActive {
            until,
            remaining_secs: i64::MAX,
        }
        .into();
        match err {
            OracleError::CooldownActive { remaining, .. } => {
                assert_eq!(remaining, chrono::TimeDelta::MAX);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn timeout_is_not_a_rejection() {
        let err: OracleError = LedgerError::Timeout(std::time::Duration::from_secs(5)).into();
        assert!(matches!(err, OracleError::TransportTimeout(_)));
    }

    #[test]
    fn unmapped_rejections_pass_through() {
        let r = Rejection::AccountNotFound {
            address: Address::new([3; 32]),
        };
        let err: OracleError = r.clone().into();
        assert!(matches!(err, OracleError::Rejected(inner) if inner == r));
    }

    #[test]
    fn engine_errors_map() {
        let err: OracleError = EngineError::DeckTooSmall(2).into();
        assert!(matches!(err, OracleError::DeckNotReady { populated: 2 }));
        let err: OracleError = EngineError::Core(CoreError::UnknownCard(90)).into();
        assert!(matches!(err, OracleError::UnknownCard(90)));
    }
}
