//! Cooldown records and the window state machine.
//!
//! Every backend stores one [`CooldownRecord`] per user and applies the same
//! transitions, implemented once on [`CooldownPolicy`]:
//!
//! - **increase**: no record, an exhausted record or an elapsed window starts
//!   a fresh window `{calledAt: now, times: 1}`; otherwise `times` grows by one.
//! - **check**: a user is in cooldown only while their record is exhausted
//!   (`times >= maxTimes`) and its window has not elapsed. An exhausted record
//!   whose window has elapsed is expired and gets deleted by the check.
//! - **acquire**: check and increase in one step. A user in cooldown is
//!   denied and their record left as is; anyone else gets the increased record.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CooldownError, CooldownResult};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// One user's usage in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownRecord {
    /// Start of the window, in milliseconds since the Unix epoch.
    pub called_at: u64,
    /// Uses in the window.
    pub times: u32,
}

impl CooldownRecord {
    /// The record of a first use at `now`.
    pub fn first(now: u64) -> Self {
        Self {
            called_at: now,
            times: 1,
        }
    }

    /// Encodes the record as stored by durable backends.
    pub fn to_json(&self) -> CooldownResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a record written by [`to_json`](Self::to_json).
    pub fn from_json(raw: &str) -> CooldownResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// What a check observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    /// No record, or uses left in the window.
    Free,
    /// Exhausted and the window is still open.
    Active {
        /// Time left until the window closes.
        retry_after: Duration,
    },
    /// Exhausted but the window has elapsed; the record should be deleted.
    Expired,
}

/// Outcome of [`CooldownPolicy::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The use was recorded.
    Granted(CooldownRecord),
    /// The user is in cooldown; nothing was recorded.
    Denied {
        /// Time left until the window closes.
        retry_after: Duration,
    },
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Window length and uses allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    /// Window length in milliseconds.
    pub cooldown_ms: u64,
    /// Uses permitted per window.
    pub max_times: u32,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            max_times: 1,
        }
    }
}

impl CooldownPolicy {
    pub fn new(cooldown: Duration, max_times: u32) -> Self {
        Self {
            cooldown_ms: u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX),
            max_times,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Rejects a zero window or a zero use count.
    pub fn validate(&self) -> CooldownResult<()> {
        if self.cooldown_ms == 0 {
            return Err(CooldownError::Policy("cooldown time must be positive".into()));
        }
        if self.max_times == 0 {
            return Err(CooldownError::Policy("max times must be at least 1".into()));
        }
        Ok(())
    }

    /// End of the window that started with `record`.
    pub fn window_end(&self, record: &CooldownRecord) -> u64 {
        record.called_at.saturating_add(self.cooldown_ms)
    }

    /// The record after one more use at `now`.
    pub fn increase(&self, current: Option<&CooldownRecord>, now: u64) -> CooldownRecord {
        match current {
            Some(record) if record.times < self.max_times && now < self.window_end(record) => {
                CooldownRecord {
                    called_at: record.called_at,
                    times: record.times + 1,
                }
            }
            _ => CooldownRecord::first(now),
        }
    }

    /// Time left at `now` until the window of `record` closes.
    pub fn retry_after(&self, record: &CooldownRecord, now: u64) -> Duration {
        Duration::from_millis(self.window_end(record).saturating_sub(now))
    }

    /// Whether `record` can be dropped at `now` without changing any
    /// future check or increase.
    pub fn is_stale(&self, record: &CooldownRecord, now: u64) -> bool {
        now >= self.window_end(record)
    }

    /// Checks `current` and, unless the user is in cooldown, records one
    /// more use at `now`.
    pub fn acquire(&self, current: Option<&CooldownRecord>, now: u64) -> Acquire {
        match self.check(current, now) {
            CooldownState::Active { retry_after } => Acquire::Denied { retry_after },
            CooldownState::Expired => Acquire::Granted(CooldownRecord::first(now)),
            CooldownState::Free => Acquire::Granted(self.increase(current, now)),
        }
    }

    /// Classifies `current` at `now`.
    pub fn check(&self, current: Option<&CooldownRecord>, now: u64) -> CooldownState {
        let Some(record) = current else {
            return CooldownState::Free;
        };
        if record.times < self.max_times {
            return CooldownState::Free;
        }
        let end = self.window_end(record);
        if now >= end {
            CooldownState::Expired
        } else {
            CooldownState::Active {
                retry_after: Duration::from_millis(end - now),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_times: u32) -> CooldownPolicy {
        CooldownPolicy {
            cooldown_ms: 1000,
            max_times,
        }
    }

    #[test]
    fn test_increase_within_window() {
        let p = policy(3);
        let first = p.increase(None, 10);
        assert_eq!(first, CooldownRecord::first(10));
        let second = p.increase(Some(&first), 500);
        assert_eq!(second, CooldownRecord { called_at: 10, times: 2 });
    }

    #[test]
    fn test_increase_resets() {
        let p = policy(2);
        let exhausted = CooldownRecord { called_at: 0, times: 2 };
        assert_eq!(p.increase(Some(&exhausted), 100), CooldownRecord::first(100));

        let stale = CooldownRecord { called_at: 0, times: 1 };
        assert_eq!(p.increase(Some(&stale), 1000), CooldownRecord::first(1000));
    }

    #[test]
    fn test_check() {
        let p = policy(1);
        assert_eq!(p.check(None, 0), CooldownState::Free);

        let used = CooldownRecord::first(0);
        assert_eq!(
            p.check(Some(&used), 400),
            CooldownState::Active { retry_after: Duration::from_millis(600) }
        );
        assert_eq!(p.check(Some(&used), 1000), CooldownState::Expired);

        let p = policy(2);
        assert_eq!(p.check(Some(&used), 400), CooldownState::Free);
    }

    #[test]
    fn test_acquire() {
        let p = policy(2);
        let first = p.acquire(None, 0);
        assert_eq!(first, Acquire::Granted(CooldownRecord::first(0)));

        let used = CooldownRecord { called_at: 0, times: 2 };
        assert_eq!(
            p.acquire(Some(&used), 250),
            Acquire::Denied { retry_after: Duration::from_millis(750) }
        );
        assert_eq!(p.acquire(Some(&used), 1000), Acquire::Granted(CooldownRecord::first(1000)));

        let once = CooldownRecord::first(0);
        assert_eq!(
            p.acquire(Some(&once), 10),
            Acquire::Granted(CooldownRecord { called_at: 0, times: 2 })
        );
        assert!(p.is_stale(&once, 1000));
        assert!(!p.is_stale(&once, 999));
    }

    #[test]
    fn test_record_json_shape() {
        let record = CooldownRecord { called_at: 1_700_000_000_000, times: 2 };
        assert_eq!(record.to_json().unwrap(), r#"{"calledAt":1700000000000,"times":2}"#);
        assert_eq!(CooldownRecord::from_json(r#"{"calledAt":5,"times":1}"#).unwrap(), CooldownRecord::first(5));
        assert!(CooldownRecord::from_json("{}").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(CooldownPolicy::default().validate().is_ok());
        assert!(policy(0).validate().is_err());
        assert!(CooldownPolicy::new(Duration::ZERO, 1).validate().is_err());
    }
}
