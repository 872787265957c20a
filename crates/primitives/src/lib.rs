//! Core primitive types for the promotion engine.
//!
//! This crate provides the fundamental types shared across the pulse stack,
//! kept separate to avoid circular dependencies: identifiers, point
//! quantities, timestamps, and the scoring windows.

use core::fmt;

use serde::{Deserialize, Serialize};

mod time;
mod window;

pub use time::{Clock, ManualClock, SystemClock, Timestamp, SECS_PER_DAY};
pub use window::{Window, WindowScores};

/// Stable identifier for a registered user account.
///
/// Assigned by the authentication collaborator; the engine treats it as
/// opaque and never derives meaning from the value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

/// Stable external identifier for a boostable entity (tour or restaurant).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// Identifier of an immutable point grant record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GrantId(pub u64);

/// Identifier of an immutable point spend record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpendId(pub u64);

/// A non-negative quantity of promotion points.
///
/// Balances are kept non-negative by construction: every debit goes through
/// the ledger's check-then-spend path, so `Points` never needs signed
/// arithmetic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Points(pub u64);

impl Points {
    /// The zero quantity.
    pub const ZERO: Points = Points(0);

    /// Raw point count.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is a zero quantity.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    pub const fn saturating_add(self, other: Points) -> Points {
        Points(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction, clamping at zero.
    pub const fn saturating_sub(self, other: Points) -> Points {
        Points(self.0.saturating_sub(other.0))
    }

    /// Smaller of two quantities.
    pub const fn min(self, other: Points) -> Points {
        if self.0 <= other.0 { self } else { other }
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pts", self.0)
    }
}

impl From<u64> for Points {
    fn from(value: u64) -> Self {
        Points(value)
    }
}

/// Region tag used to narrow leaderboard queries (e.g. a destination slug).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Region(name.into())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why points were added to an account.
///
/// Recorded verbatim on the grant so the append-only log doubles as an
/// audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    /// Flat allowance granted once per UTC day.
    DailyAllowance,
    /// Additional grant scaled by the account's active-day streak.
    StreakBonus,
    /// Points bought through a one-time-payment package.
    Purchase {
        /// Store package name, e.g. `"3000_points"`.
        package: String,
    },
}

impl fmt::Display for GrantReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantReason::DailyAllowance => f.write_str("daily_allowance"),
            GrantReason::StreakBonus => f.write_str("streak_bonus"),
            GrantReason::Purchase { package } => write!(f, "purchase:{package}"),
        }
    }
}
