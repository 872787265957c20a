//! Two-phase spend reservations.
//!
//! A reservation represents a pending debit that must either be committed
//! or released when dropped. The spend coordinator uses this to make the
//! debit and the score credit one atomic unit: the score event is recorded
//! between prepare and commit, and an abort anywhere before commit unwinds
//! to exactly the pre-boost state.

use core::fmt;
use std::sync::Arc;

use pulse_primitives::{EntityId, Points, SpendId, Timestamp};

use crate::account::AccountState;
use crate::store::Ledger;

/// A prepared, uncommitted spend.
///
/// Created by [`Ledger::prepare_spend`], which has already validated the
/// idempotency key and reserved the amount. Dropping the reservation without
/// committing releases the points and the key; nothing reaches the
/// append-only log.
#[must_use = "a reservation that is dropped without commit() is rolled back"]
pub struct SpendReservation<'a> {
    ledger: &'a Ledger,
    state: Arc<AccountState>,
    entity: EntityId,
    amount: Points,
    /// Taken on commit; `Some` means still pending.
    key: Option<String>,
}

impl<'a> SpendReservation<'a> {
    pub(crate) fn new(
        ledger: &'a Ledger,
        state: Arc<AccountState>,
        entity: EntityId,
        amount: Points,
        key: String,
    ) -> Self {
        Self { ledger, state, entity, amount, key: Some(key) }
    }

    /// The reserved amount.
    pub fn amount(&self) -> Points {
        self.amount
    }

    /// The entity this spend targets.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Balance as seen with this reservation already deducted.
    pub fn projected_balance(&self) -> Points {
        self.state.balance()
    }

    /// Commit the spend at `at`, appending it to the log.
    ///
    /// Infallible: validation happened at prepare time and the points are
    /// already held.
    pub fn commit(mut self, at: Timestamp) -> SpendId {
        // `key` is always present until commit or drop consumes it.
        let key = self.key.take().unwrap_or_default();
        self.ledger.commit_reservation(&self.state, self.entity, self.amount, key, at)
    }
}

impl fmt::Debug for SpendReservation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpendReservation")
            .field("account", &self.state.account())
            .field("entity", &self.entity)
            .field("amount", &self.amount)
            .field("pending", &self.key.is_some())
            .finish()
    }
}

impl Drop for SpendReservation<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.ledger.abandon_reservation(&self.state, self.amount, &key);
        }
    }
}
