//! Brute-force lockout
//!
//! A guard is Open until consecutive failures reach the threshold, then
//! Locked until `lockout_until`. Expiry reopens the guard but leaves the
//! failure count in place, so the next failure after a lockout locks again
//! immediately. Only a successful login clears the count.

use chrono::{DateTime, Duration, Utc};

use crate::error::{SealboxError, SealboxResult};

/// Observable state of a guard at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Open,
    Locked { until: DateTime<Utc> },
}

/// Per-session failed-login tracker
#[derive(Debug, Clone)]
pub struct LockoutGuard {
    threshold: u32,
    duration: Duration,
    failed_attempts: u32,
    lockout_until: Option<DateTime<Utc>>,
}

impl LockoutGuard {
    pub fn new(threshold: u32, duration: std::time::Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            duration: Duration::from_std(duration).unwrap_or(Duration::MAX),
            failed_attempts: 0,
            lockout_until: None,
        }
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn lockout_until(&self) -> Option<DateTime<Utc>> {
        self.lockout_until
    }

    pub fn state(&self, now: DateTime<Utc>) -> LockState {
        match self.lockout_until {
            Some(until) if now < until => LockState::Locked { until },
            _ => LockState::Open,
        }
    }

    /// Reject the attempt if the guard is Locked
    pub fn check(&self, now: DateTime<Utc>) -> SealboxResult<()> {
        match self.state(now) {
            LockState::Open => Ok(()),
            LockState::Locked { until } => Err(SealboxError::LockedOut {
                remaining_secs: remaining_secs(until, now),
            }),
        }
    }

    /// Count a failed attempt; returns the new state
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> LockState {
        if let LockState::Locked { until } = self.state(now) {
            return LockState::Locked { until };
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);
        if self.failed_attempts >= self.threshold {
            let until = now
                .checked_add_signed(self.duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.lockout_until = Some(until);
        }
        self.state(now)
    }

    /// Clear the failure count after a successful login
    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
        self.lockout_until = None;
    }

    /// Seconds until an active lockout ends
    pub fn locked_for_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.state(now) {
            LockState::Open => None,
            LockState::Locked { until } => Some(remaining_secs(until, now)),
        }
    }

    /// Attempts left before the next lockout
    pub fn attempts_remaining(&self) -> u32 {
        self.threshold.saturating_sub(self.failed_attempts)
    }
}

/// Whole seconds left, rounded up so a live lockout never reports zero
fn remaining_secs(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
