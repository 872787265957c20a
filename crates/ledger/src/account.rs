//! Per-account ledger state.
//!
//! Hot counters are atomics so balance reads never take a lock; the
//! check-then-debit path is serialized by the per-account mutex held in
//! [`crate::Ledger::prepare_spend`] and [`crate::SpendReservation::commit`].

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use pulse_primitives::{AccountId, Points, Timestamp, SECS_PER_DAY};

const ORD: Ordering = Ordering::Relaxed;

/// Outcome of recording account activity for streak purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Streak length after the update.
    pub streak_days: u32,
    /// Whether this activity extended (or started) the streak.
    pub extended: bool,
}

/// Per-account counters and the spend-serializing lock.
///
/// # Balance semantics
///
/// `balance = granted - spent - reserved`, all unsigned. `reserved` holds
/// amounts claimed by in-flight [`crate::SpendReservation`]s so concurrent
/// prepares from the same account cannot both pass the balance check.
#[derive(Debug)]
pub struct AccountState {
    account: AccountId,
    granted: AtomicU64,
    spent: AtomicU64,
    reserved: AtomicU64,
    streak_days: AtomicU32,
    /// Time of the last streak-relevant activity, 0 = never active.
    last_streak_at: AtomicU64,
    /// Serializes check-then-debit for this account.
    pub(crate) spend_lock: Mutex<()>,
}

impl AccountState {
    pub(crate) fn new(account: AccountId) -> Self {
        Self {
            account,
            granted: AtomicU64::new(0),
            spent: AtomicU64::new(0),
            reserved: AtomicU64::new(0),
            streak_days: AtomicU32::new(0),
            last_streak_at: AtomicU64::new(0),
            spend_lock: Mutex::new(()),
        }
    }

    /// The account this state belongs to.
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Lifetime points granted.
    pub fn granted(&self) -> Points {
        Points(self.granted.load(ORD))
    }

    /// Lifetime points spent.
    pub fn spent(&self) -> Points {
        Points(self.spent.load(ORD))
    }

    /// Points held by in-flight reservations.
    pub fn reserved(&self) -> Points {
        Points(self.reserved.load(ORD))
    }

    /// Spendable balance: granted minus spent minus reserved.
    pub fn balance(&self) -> Points {
        let granted = self.granted.load(ORD);
        let debits = self.spent.load(ORD).saturating_add(self.reserved.load(ORD));
        Points(granted.saturating_sub(debits))
    }

    /// Consecutive-day activity streak.
    pub fn streak_days(&self) -> u32 {
        self.streak_days.load(ORD)
    }

    pub(crate) fn add_granted(&self, amount: Points) {
        self.granted.fetch_add(amount.get(), ORD);
    }

    pub(crate) fn add_reserved(&self, amount: Points) {
        self.reserved.fetch_add(amount.get(), ORD);
    }

    pub(crate) fn release_reserved(&self, amount: Points) {
        self.reserved.fetch_sub(amount.get(), ORD);
    }

    /// Convert a reservation into a spend.
    ///
    /// Ordering matters: `spent` is bumped before `reserved` is released so a
    /// lock-free balance read can never observe an inflated balance mid-commit.
    pub(crate) fn settle_reserved(&self, amount: Points) {
        self.spent.fetch_add(amount.get(), ORD);
        self.reserved.fetch_sub(amount.get(), ORD);
    }

    /// Streak length as it would be after activity at `at`, without
    /// recording anything.
    pub fn projected_streak(&self, at: Timestamp) -> u32 {
        let last = self.last_streak_at.load(ORD);
        if last == 0 {
            return 1;
        }
        let gap = at.as_secs().saturating_sub(last);
        if gap < SECS_PER_DAY {
            self.streak_days.load(ORD)
        } else if gap < 2 * SECS_PER_DAY {
            self.streak_days.load(ORD).saturating_add(1)
        } else {
            1
        }
    }

    /// Update the activity streak for activity at `at`.
    ///
    /// The streak grows at most once per rolling 24 h window: a second
    /// activity within 24 h of the last streak-relevant one is a no-op, one
    /// between 24 h and 48 h extends the streak, and a longer gap resets it
    /// to one.
    pub(crate) fn record_activity(&self, at: Timestamp) -> StreakUpdate {
        let last = self.last_streak_at.load(ORD);
        if last == 0 {
            self.streak_days.store(1, ORD);
            self.last_streak_at.store(at.as_secs(), ORD);
            return StreakUpdate { streak_days: 1, extended: true };
        }

        let gap = at.as_secs().saturating_sub(last);
        if gap < SECS_PER_DAY {
            return StreakUpdate { streak_days: self.streak_days.load(ORD), extended: false };
        }

        let streak = if gap < 2 * SECS_PER_DAY {
            self.streak_days.fetch_add(1, ORD).saturating_add(1)
        } else {
            self.streak_days.store(1, ORD);
            1
        };
        self.last_streak_at.store(at.as_secs(), ORD);
        StreakUpdate { streak_days: streak, extended: true }
    }
}
