//! Boost error taxonomy.
//!
//! Every rejection carries a specific, actionable reason so the calling UI
//! can distinguish terminal outcomes ("not enough points today") from
//! retryable ones - a generic failure is never returned.

use pulse_primitives::{AccountId, EntityId, Points};

use pulse_ledger::LedgerError;

/// Errors returned by [`crate::SpendCoordinator::boost`].
///
/// A rejected boost writes nothing, so its idempotency key stays unused.
/// Only [`BoostError::RateLimited`] is worth retrying, after the given
/// delay; the other variants will fail the same way again.
#[derive(Debug, thiserror::Error)]
pub enum BoostError {
    /// Amount was zero or above the per-action cap.
    #[error("boost amount {amount} outside 1..={max}")]
    InvalidAmount { amount: Points, max: Points },

    /// The account's balance does not cover the boost.
    #[error("account {account} has {have}, needs {need}")]
    InsufficientBalance {
        account: AccountId,
        have: Points,
        need: Points,
    },

    /// This idempotency key was already used.
    #[error("boost with idempotency key {key:?} already recorded")]
    DuplicateSpend { key: String },

    /// Too many boosts of this entity inside the cooldown window.
    #[error("account {account} is rate limited for {entity}, retry in {retry_after_secs}s")]
    RateLimited {
        account: AccountId,
        entity: EntityId,
        retry_after_secs: u64,
    },
}

impl From<LedgerError> for BoostError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { account, have, need } => {
                BoostError::InsufficientBalance { account, have, need }
            }
            LedgerError::DuplicateSpend { key } => BoostError::DuplicateSpend { key },
            // Grants never happen on the boost path; surface the key the
            // ledger rejected rather than inventing a new category.
            LedgerError::DuplicateSource { source_ref } => {
                BoostError::DuplicateSpend { key: source_ref }
            }
        }
    }
}
