// ============================================================================
// FamEdu Security - Login Attempt Tracker
// File: crates/famedu-security/src/login_tracker.rs
// Description: Per-username failed login throttling with a sliding lockout
// ============================================================================
//! In-memory login attempt throttling.
//!
//! Every failed attempt for a username bumps its counter and refreshes the
//! timestamp of the last attempt, so the lockout window slides forward while
//! an attacker keeps guessing. A successful login clears the record; a record
//! whose window has elapsed is treated as absent and dropped on the next read.
//!
//! Records are process-local and lost on restart.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use famedu_shared::constants::{DEFAULT_LOCKOUT_MINUTES, DEFAULT_MAX_FAILED_ATTEMPTS};
use famedu_shared::utils::{mask_username, normalize_username};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("max_failed_attempts must be at least 1")]
    ZeroAttempts,
    #[error("lockout duration must be positive")]
    NonPositiveDuration,
}

/// Threshold and window for the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_failed_attempts: u32,
    lockout_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_failed_attempts: u32, lockout_duration: Duration) -> Result<Self, PolicyError> {
        if max_failed_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if lockout_duration <= Duration::zero() {
            return Err(PolicyError::NonPositiveDuration);
        }
        Ok(Self { max_failed_attempts, lockout_duration })
    }

    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration: Duration::minutes(DEFAULT_LOCKOUT_MINUTES),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub count: u32,
    pub last_attempt: DateTime<Utc>,
}

/// Outcome of [`LoginAttemptTracker::check_limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCheck {
    Allowed,
    Locked { retry_after_minutes: i64 },
}

impl LimitCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LimitCheck::Allowed)
    }

    pub fn retry_after_minutes(&self) -> Option<i64> {
        match self {
            LimitCheck::Allowed => None,
            LimitCheck::Locked { retry_after_minutes } => Some(*retry_after_minutes),
        }
    }
}

/// Shared, explicitly constructed failed-attempt store.
///
/// Cloning is cheap and every clone observes the same records.
#[derive(Clone)]
pub struct LoginAttemptTracker {
    records: Arc<DashMap<String, AttemptRecord>>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl LoginAttemptTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Initializing login attempt tracker: max_failed_attempts={}, lockout={}m",
            policy.max_failed_attempts,
            policy.lockout_duration.num_minutes()
        );
        Self {
            records: Arc::new(DashMap::new()),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Decides whether a login attempt for `username` may proceed.
    pub fn check_limits(&self, username: &str) -> LimitCheck {
        let key = normalize_username(username);
        let now = self.clock.now();

        // Expired windows are removed under the shard lock so a concurrent
        // failure cannot be dropped between the read and the delete.
        let removed = self
            .records
            .remove_if(&key, |_, record| self.is_expired(record, now));
        if removed.is_some() {
            debug!("Lockout window elapsed for {}, record cleared", mask_username(&key));
            return LimitCheck::Allowed;
        }

        let Some(record) = self.records.get(&key).map(|r| *r.value()) else {
            return LimitCheck::Allowed;
        };

        if record.count < self.policy.max_failed_attempts {
            return LimitCheck::Allowed;
        }

        let remaining = self.policy.lockout_duration - (now - record.last_attempt);
        let retry_after_minutes = ceil_minutes(remaining).max(1);
        warn!(
            "Login blocked for {}: {} failures, retry in {}m",
            mask_username(&key),
            record.count,
            retry_after_minutes
        );
        LimitCheck::Locked { retry_after_minutes }
    }

    /// Records a failed attempt and returns the updated failure count.
    pub fn record_failure(&self, username: &str) -> u32 {
        let key = normalize_username(username);
        let now = self.clock.now();

        let mut entry = self
            .records
            .entry(key.clone())
            .and_modify(|record| {
                record.count = record.count.saturating_add(1);
                record.last_attempt = now;
            })
            .or_insert(AttemptRecord { count: 1, last_attempt: now });
        let count = entry.value_mut().count;
        drop(entry);

        if count == self.policy.max_failed_attempts {
            warn!(
                "Account {} locked after {} failed attempts",
                mask_username(&key),
                count
            );
        } else {
            debug!("Failed attempt {} recorded for {}", count, mask_username(&key));
        }
        count
    }

    /// Forgets all failures for `username`, typically after a successful login.
    pub fn clear_failures(&self, username: &str) {
        let key = normalize_username(username);
        if self.records.remove(&key).is_some() {
            debug!("Cleared failed attempts for {}", mask_username(&key));
        }
    }

    /// Current failure count inside a live window, if any.
    pub fn failure_count(&self, username: &str) -> Option<u32> {
        let key = normalize_username(username);
        let now = self.clock.now();
        self.records
            .get(&key)
            .filter(|record| !self.is_expired(record.value(), now))
            .map(|record| record.count)
    }

    /// Drops every record whose window has elapsed. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, record| !self.is_expired(record, now));
        let purged = before.saturating_sub(self.records.len());
        if purged > 0 {
            info!("Purged {} expired login attempt records", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn is_expired(&self, record: &AttemptRecord, now: DateTime<Utc>) -> bool {
        now - record.last_attempt > self.policy.lockout_duration
    }
}

fn ceil_minutes(duration: Duration) -> i64 {
    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + 59_999) / 60_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tracker(max: u32, minutes: i64) -> (LoginAttemptTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let policy = LockoutPolicy::new(max, Duration::minutes(minutes)).unwrap();
        (LoginAttemptTracker::with_clock(policy, clock.clone()), clock)
    }

    #[test]
    fn test_policy_rejects_zero_attempts() {
        assert_eq!(
            LockoutPolicy::new(0, Duration::minutes(15)),
            Err(PolicyError::ZeroAttempts)
        );
        assert_eq!(
            LockoutPolicy::new(5, Duration::zero()),
            Err(PolicyError::NonPositiveDuration)
        );
    }

    #[test]
    fn test_unknown_username_is_allowed() {
        let (tracker, _) = tracker(5, 15);
        assert_eq!(tracker.check_limits("nobody"), LimitCheck::Allowed);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_below_threshold_is_allowed() {
        let (tracker, _) = tracker(5, 15);
        for _ in 0..4 {
            tracker.record_failure("grace");
        }
        assert!(tracker.check_limits("grace").is_allowed());
    }

    #[test]
    fn test_lockout_scenario() {
        let (tracker, clock) = tracker(5, 15);
        for _ in 0..5 {
            tracker.record_failure("grace");
        }

        clock.advance(Duration::minutes(1));
        assert_eq!(
            tracker.check_limits("grace"),
            LimitCheck::Locked { retry_after_minutes: 14 }
        );

        clock.advance(Duration::minutes(15));
        assert_eq!(tracker.check_limits("grace"), LimitCheck::Allowed);
    }

    #[test]
    fn test_retry_hint_rounds_up() {
        let (tracker, clock) = tracker(3, 15);
        for _ in 0..3 {
            tracker.record_failure("ada");
        }
        clock.advance(Duration::seconds(30));
        assert_eq!(tracker.check_limits("ada").retry_after_minutes(), Some(15));
    }

    #[test]
    fn test_hint_is_positive_at_window_edge() {
        let (tracker, clock) = tracker(1, 15);
        tracker.record_failure("ada");
        clock.advance(Duration::minutes(15));
        assert_eq!(tracker.check_limits("ada").retry_after_minutes(), Some(1));
    }

    #[test]
    fn test_failure_during_lockout_slides_window() {
        let (tracker, clock) = tracker(5, 15);
        for _ in 0..5 {
            tracker.record_failure("grace");
        }
        clock.advance(Duration::minutes(10));
        let before = tracker.check_limits("grace").retry_after_minutes().unwrap();
        assert_eq!(before, 5);

        tracker.record_failure("grace");
        let after = tracker.check_limits("grace").retry_after_minutes().unwrap();
        assert_eq!(after, 15);
        assert!(after >= before);

        // Original window would have ended here; the slid one has not.
        clock.advance(Duration::minutes(6));
        assert!(!tracker.check_limits("grace").is_allowed());
    }

    #[test]
    fn test_clear_failures_unlocks() {
        let (tracker, _) = tracker(5, 15);
        for _ in 0..7 {
            tracker.record_failure("grace");
        }
        assert!(!tracker.check_limits("grace").is_allowed());

        tracker.clear_failures("grace");
        assert!(tracker.check_limits("grace").is_allowed());
        assert_eq!(tracker.failure_count("grace"), None);
    }

    #[test]
    fn test_expired_record_is_removed_and_count_restarts() {
        let (tracker, clock) = tracker(5, 15);
        for _ in 0..3 {
            tracker.record_failure("grace");
        }
        clock.advance(Duration::minutes(16));

        assert!(tracker.check_limits("grace").is_allowed());
        assert!(tracker.is_empty());
        assert_eq!(tracker.record_failure("grace"), 1);
    }

    #[test]
    fn test_usernames_are_case_insensitive() {
        let (tracker, _) = tracker(2, 15);
        tracker.record_failure("Grace");
        tracker.record_failure(" grace ");
        assert!(!tracker.check_limits("GRACE").is_allowed());
    }

    #[test]
    fn test_usernames_are_isolated() {
        let (tracker, _) = tracker(2, 15);
        tracker.record_failure("grace");
        tracker.record_failure("grace");
        assert!(!tracker.check_limits("grace").is_allowed());
        assert!(tracker.check_limits("alan").is_allowed());
    }

    #[test]
    fn test_purge_expired_keeps_live_records() {
        let (tracker, clock) = tracker(5, 15);
        tracker.record_failure("old");
        clock.advance(Duration::minutes(10));
        tracker.record_failure("fresh");
        clock.advance(Duration::minutes(6));

        assert_eq!(tracker.purge_expired(), 1);
        assert_eq!(tracker.failure_count("fresh"), Some(1));
        assert_eq!(tracker.failure_count("old"), None);
    }

    #[test]
    fn test_concurrent_failures_are_not_lost() {
        let (tracker, _) = tracker(1000, 15);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        tracker.record_failure("grace");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.failure_count("grace"), Some(400));
    }
}
