//! Per-user cooldown and daily-window bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cd_core::UserRecord;

use crate::error::{EngineError, EngineResult};
use crate::rules::OracleRules;

/// Fortunes counted in the window that is current at `now`.
///
/// The window opens with the first fortune after the previous one closed,
/// and lasts [`OracleRules::daily_window`]. A window whose end cannot be
/// represented never closes.
pub fn daily_count_at(record: &UserRecord, now: DateTime<Utc>, rules: &OracleRules) -> u8 {
    let Some(start) = record.window_started_at else {
        return 0;
    };
    let end = rules
        .daily_window()
        .ok()
        .and_then(|window| start.checked_add_signed(window));
    match end {
        Some(end) if now >= end => 0,
        _ => record.daily_count,
    }
}

/// Refuse a divination the rules do not allow yet.
pub fn check_divination(
    record: &UserRecord,
    now: DateTime<Utc>,
    rules: &OracleRules,
) -> EngineResult<()> {
    if let Some(until) = record.cooldown_until.filter(|until| *until > now) {
        return Err(EngineError::CooldownActive {
            until,
            remaining: until - now,
        });
    }
    let count = daily_count_at(record, now, rules);
    match rules.daily_limit {
        Some(limit) if count >= limit => Err(EngineError::DailyLimitExceeded(limit)),
        _ => Ok(()),
    }
}

/// Update a user record for a divination at `now`.
///
/// Does not check the rules; call [`check_divination`] first. The record is
/// left untouched when the cooldown end cannot be represented.
pub fn record_divination(
    record: &mut UserRecord,
    now: DateTime<Utc>,
    rules: &OracleRules,
) -> EngineResult<()> {
    let window_open = daily_count_at(record, now, rules) > 0;
    let daily_count = if window_open {
        record.daily_count.saturating_add(1)
    } else {
        1
    };

    let wait = rules.cooldown.after(daily_count)?;
    let cooldown_until = if wait > chrono::Duration::zero() {
        let until = now.checked_add_signed(wait).ok_or_else(|| {
            EngineError::InvalidRules(format!(
                "cooldown of {}s from {now} out of range",
                wait.num_seconds()
            ))
        })?;
        Some(until)
    } else {
        None
    };

    if !window_open {
        record.window_started_at = Some(now);
    }
    record.daily_count = daily_count;
    record.total_fortunes += 1;
    record.last_fortune_at = Some(now);
    record.cooldown_until = cooldown_until;
    Ok(())
}

/// What a user can see about their own divination history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Lifetime number of fortunes.
    pub total_fortunes: u64,
    /// When the last fortune was divined.
    pub last_fortune: Option<DateTime<Utc>>,
    /// When the cooldown ends, if it is still running.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Fortunes in the current daily window.
    pub daily_count: u8,
}

impl UserStats {
    /// Stats as of `now`. A missing record reads as a user who never divined.
    pub fn of(record: Option<&UserRecord>, now: DateTime<Utc>, rules: &OracleRules) -> Self {
        let Some(record) = record else {
            return Self::default();
        };
        Self {
            total_fortunes: record.total_fortunes,
            last_fortune: record.last_fortune_at,
            cooldown_until: record.cooldown_until.filter(|until| *until > now),
            daily_count: daily_count_at(record, now, rules),
        }
    }

    /// Whether the user may divine at `now` as far as the cooldown goes.
    pub fn can_divine(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_none_or(|until| until <= now)
    }
}
