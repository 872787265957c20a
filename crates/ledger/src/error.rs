//! Ledger error types.

use pulse_primitives::{AccountId, Points};

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A grant with this source reference was already recorded.
    #[error("grant source {source_ref:?} already applied")]
    DuplicateSource {
        /// Payment/session id or synthetic daily-grant reference.
        source_ref: String,
    },

    /// A spend with this idempotency key was already recorded or is in flight.
    #[error("spend with idempotency key {key:?} already recorded")]
    DuplicateSpend {
        /// Caller-supplied idempotency key.
        key: String,
    },

    /// The account's balance does not cover the requested amount.
    #[error("account {account} has {have}, needs {need}")]
    InsufficientBalance {
        account: AccountId,
        have: Points,
        need: Points,
    },
}
