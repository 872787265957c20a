//! Timestamps and the clock seam.
//!
//! All timestamps in the engine are server-assigned at commit time; callers
//! never supply their own. Components take a [`Clock`] so tests can drive
//! time deterministically.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds in one UTC day.
pub const SECS_PER_DAY: u64 = 86_400;

/// Seconds since the Unix epoch, UTC.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Construct from raw unix seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Raw unix seconds.
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// UTC day index (days since the epoch). Used for allowance resets and
    /// score bucketing.
    pub const fn day(self) -> u64 {
        self.0 / SECS_PER_DAY
    }

    /// First second of this timestamp's UTC day.
    pub const fn day_start(self) -> Timestamp {
        Timestamp(self.day() * SECS_PER_DAY)
    }

    /// This timestamp moved back by `secs`, clamped at the epoch.
    pub const fn saturating_sub_secs(self, secs: u64) -> Timestamp {
        Timestamp(self.0.saturating_sub(secs))
    }

    /// Seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub const fn secs_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Timestamp(secs)
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self { now: AtomicU64::new(at.0) }
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: Timestamp) {
        self.now.store(at.0, Ordering::Relaxed);
    }

    /// Advance by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::Relaxed))
    }
}
