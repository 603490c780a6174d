//! Tunable oracle rules: cooldowns, the daily window and fee bounds.

use chrono::{Duration, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Smallest accepted fee (0.001 of the ledger's native unit).
pub const MIN_FEE: u64 = 1_000_000;

/// Largest accepted fee (0.1 of the ledger's native unit).
pub const MAX_FEE: u64 = 100_000_000;

/// Length of the rolling window `daily_count` is measured over.
pub const DAILY_WINDOW_SECS: i64 = 24 * 3600;

/// Longest accepted cooldown step or daily window.
pub const MAX_PERIOD_SECS: i64 = 365 * DAILY_WINDOW_SECS;

/// How long a user waits after a divination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// The same wait after every divination.
    Fixed {
        /// Wait in seconds.
        period_secs: i64,
    },
    /// A wait that grows with the number of fortunes in the current window.
    ///
    /// `steps_secs[n - 1]` applies after the n-th fortune; the last step
    /// repeats.
    Escalating {
        /// Waits in seconds, by fortune count within the window.
        steps_secs: Vec<i64>,
    },
}

impl CooldownPolicy {
    /// A fixed 24 hour cooldown.
    pub fn daily() -> Self {
        Self::Fixed {
            period_secs: DAILY_WINDOW_SECS,
        }
    }

    /// No wait after the first fortune, 30 minutes after the second, two
    /// hours after the third and a day after every one beyond.
    pub fn escalating() -> Self {
        Self::Escalating {
            steps_secs: vec![0, 30 * 60, 2 * 3600, 24 * 3600],
        }
    }

    /// The wait after the `daily_count`-th fortune of the window.
    ///
    /// Fails with [`EngineError::InvalidRules`] for a step too long to
    /// represent; [`OracleRules::validate`] rejects those up front.
    pub fn after(&self, daily_count: u8) -> EngineResult<Duration> {
        let secs = match self {
            Self::Fixed { period_secs } => *period_secs,
            Self::Escalating { steps_secs } => {
                let i = usize::from(daily_count.max(1)) - 1;
                steps_secs
                    .get(i)
                    .or(steps_secs.last())
                    .copied()
                    .unwrap_or(0)
            }
        };
        seconds(secs.max(0), "cooldown")
    }

    fn steps(&self) -> &[i64] {
        match self {
            Self::Fixed { period_secs } => std::slice::from_ref(period_secs),
            Self::Escalating { steps_secs } => steps_secs,
        }
    }
}

fn seconds(secs: i64, what: &str) -> EngineResult<Duration> {
    TimeDelta::try_seconds(secs)
        .ok_or_else(|| EngineError::InvalidRules(format!("{what} of {secs}s out of range")))
}

fn check_period(secs: i64, what: &str) -> EngineResult<()> {
    if (0..=MAX_PERIOD_SECS).contains(&secs) {
        Ok(())
    } else {
        Err(EngineError::InvalidRules(format!(
            "{what} of {secs}s outside 0-{MAX_PERIOD_SECS}s"
        )))
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::daily()
    }
}

/// Rules the oracle enforces on every divination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleRules {
    /// Cooldown after each divination.
    pub cooldown: CooldownPolicy,
    /// Length of the rolling daily window, in seconds.
    pub daily_window_secs: i64,
    /// Optional cap on fortunes per window. `None` leaves the count
    /// informational.
    pub daily_limit: Option<u8>,
    /// Smallest accepted fee.
    pub min_fee: u64,
    /// Largest accepted fee.
    pub max_fee: u64,
}

impl Default for OracleRules {
    fn default() -> Self {
        Self {
            cooldown: CooldownPolicy::default(),
            daily_window_secs: DAILY_WINDOW_SECS,
            daily_limit: None,
            min_fee: MIN_FEE,
            max_fee: MAX_FEE,
        }
    }
}

impl OracleRules {
    /// Parse rules from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let rules: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidRules(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that every period is within 0-365 days and the fee bounds are
    /// ordered.
    pub fn validate(&self) -> EngineResult<()> {
        for secs in self.cooldown.steps() {
            check_period(*secs, "cooldown")?;
        }
        check_period(self.daily_window_secs, "daily window")?;
        if self.min_fee > self.max_fee {
            return Err(EngineError::InvalidRules(format!(
                "min_fee {} above max_fee {}",
                self.min_fee, self.max_fee
            )));
        }
        Ok(())
    }

    /// Set the cooldown policy.
    pub fn with_cooldown(mut self, cooldown: CooldownPolicy) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Cap fortunes per window.
    pub fn with_daily_limit(mut self, limit: u8) -> Self {
        self.daily_limit = Some(limit);
        self
    }

    /// The daily window as a duration.
    pub fn daily_window(&self) -> EngineResult<Duration> {
        seconds(self.daily_window_secs.max(0), "daily window")
    }

    /// Check that a fee lies within the accepted bounds.
    pub fn validate_fee(&self, fee: u64) -> EngineResult<()> {
        if (self.min_fee..=self.max_fee).contains(&fee) {
            Ok(())
        } else {
            Err(EngineError::InvalidFee {
                fee,
                min: self.min_fee,
                max: self.max_fee,
            })
        }
    }
}
