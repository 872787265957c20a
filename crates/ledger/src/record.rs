//! Immutable ledger records.
//!
//! Records are append-only: once written they are never mutated or deleted,
//! so the logs double as the audit trail and every derived view (balances,
//! leaderboards) can be rebuilt from them.

use serde::{Deserialize, Serialize};

use pulse_primitives::{AccountId, EntityId, GrantId, GrantReason, Points, SpendId, Timestamp};

/// Points added to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointGrant {
    pub id: GrantId,
    pub account: AccountId,
    pub amount: Points,
    pub reason: GrantReason,
    /// Idempotency key for the grant: payment/session id for purchases,
    /// a synthetic `daily:<acct>:<day>` style reference for allowances.
    pub source_ref: String,
    pub at: Timestamp,
}

/// Points removed from an account to boost an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointSpend {
    pub id: SpendId,
    pub account: AccountId,
    pub amount: Points,
    pub entity: EntityId,
    /// Caller-supplied idempotency key guarding against retried requests.
    pub idempotency_key: String,
    /// Commit time, assigned by the spend coordinator's clock.
    pub at: Timestamp,
}
