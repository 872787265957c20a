//! The ledger store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use pulse_primitives::{
    AccountId, EntityId, GrantId, GrantReason, Points, SpendId, Timestamp,
};

use crate::account::{AccountState, StreakUpdate};
use crate::error::LedgerError;
use crate::record::{PointGrant, PointSpend};
use crate::reservation::SpendReservation;

#[derive(Default)]
struct GrantLog {
    records: Vec<PointGrant>,
    by_source: HashMap<String, GrantId>,
}

#[derive(Default)]
struct SpendLog {
    records: Vec<PointSpend>,
    by_key: HashMap<String, SpendId>,
}

/// Durable record of point grants and spends per account.
///
/// Accounts are created lazily on first touch. The registry uses
/// double-checked locking: a read lock on the fast path, a write lock only
/// on first access per account; afterwards all hot operations go through
/// the `Arc`-wrapped [`AccountState`].
pub struct Ledger {
    accounts: RwLock<HashMap<AccountId, Arc<AccountState>>>,
    grants: RwLock<GrantLog>,
    spends: RwLock<SpendLog>,
    /// Idempotency keys claimed by in-flight reservations.
    pending_keys: Mutex<HashSet<String>>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            grants: RwLock::new(GrantLog::default()),
            spends: RwLock::new(SpendLog::default()),
            pending_keys: Mutex::new(HashSet::new()),
        }
    }

    /// Get or create the state for an account.
    pub fn account(&self, account: AccountId) -> Arc<AccountState> {
        // Fast path: read lock
        if let Some(state) = self.accounts.read().get(&account) {
            return Arc::clone(state);
        }

        // Slow path: write lock (only on first access)
        self.accounts
            .write()
            .entry(account)
            .or_insert_with(|| {
                debug!(%account, "creating account state");
                Arc::new(AccountState::new(account))
            })
            .clone()
    }

    /// Get the state for an account if it exists.
    pub fn get_account(&self, account: AccountId) -> Option<Arc<AccountState>> {
        self.accounts.read().get(&account).cloned()
    }

    /// Record a point grant.
    ///
    /// Idempotent on `source_ref`: a retry of the same payment or daily
    /// allowance fails with [`LedgerError::DuplicateSource`] and leaves the
    /// log untouched.
    pub fn grant(
        &self,
        account: AccountId,
        amount: Points,
        reason: GrantReason,
        source_ref: impl Into<String>,
        at: Timestamp,
    ) -> Result<GrantId, LedgerError> {
        let source_ref = source_ref.into();
        let state = self.account(account);

        let mut log = self.grants.write();
        if log.by_source.contains_key(&source_ref) {
            return Err(LedgerError::DuplicateSource { source_ref });
        }

        let id = GrantId(log.records.len() as u64 + 1);
        log.by_source.insert(source_ref.clone(), id);
        log.records.push(PointGrant {
            id,
            account,
            amount,
            reason: reason.clone(),
            source_ref,
            at,
        });
        drop(log);

        state.add_granted(amount);
        debug!(%account, %amount, %reason, "recorded grant");
        Ok(id)
    }

    /// Whether a grant with this source reference exists.
    pub fn has_source(&self, source_ref: &str) -> bool {
        self.grants.read().by_source.contains_key(source_ref)
    }

    /// Reserve points for a spend without committing it.
    ///
    /// Holds the account's spend lock for the check-then-reserve, so
    /// concurrent prepares from the same account are serialized and can
    /// never jointly overdraw. The returned reservation must be
    /// [`committed`](SpendReservation::commit); dropping it releases the
    /// points and the idempotency key with no trace in the log.
    pub fn prepare_spend(
        &self,
        account: AccountId,
        amount: Points,
        entity: EntityId,
        key: impl Into<String>,
    ) -> Result<SpendReservation<'_>, LedgerError> {
        let key = key.into();
        let state = self.account(account);

        let _guard = state.spend_lock.lock();

        if self.spends.read().by_key.contains_key(&key)
            || !self.pending_keys.lock().insert(key.clone())
        {
            return Err(LedgerError::DuplicateSpend { key });
        }

        let have = state.balance();
        if amount > have {
            self.pending_keys.lock().remove(&key);
            return Err(LedgerError::InsufficientBalance { account, have, need: amount });
        }

        state.add_reserved(amount);
        Ok(SpendReservation::new(self, Arc::clone(&state), entity, amount, key))
    }

    /// Record a spend in one step (reserve and commit immediately).
    pub fn spend(
        &self,
        account: AccountId,
        amount: Points,
        entity: EntityId,
        key: impl Into<String>,
        at: Timestamp,
    ) -> Result<SpendId, LedgerError> {
        let reservation = self.prepare_spend(account, amount, entity, key)?;
        Ok(reservation.commit(at))
    }

    /// Spendable balance for an account, zero if it was never seen.
    pub fn balance(&self, account: AccountId) -> Points {
        self.get_account(account).map(|s| s.balance()).unwrap_or(Points::ZERO)
    }

    /// Update the activity streak for an account.
    pub fn record_activity(&self, account: AccountId, at: Timestamp) -> StreakUpdate {
        self.account(account).record_activity(at)
    }

    /// Lifetime points spent per account, for the promoter ranking.
    /// Accounts that never spent are omitted.
    pub fn promoter_totals(&self) -> Vec<(AccountId, Points)> {
        self.accounts
            .read()
            .iter()
            .map(|(account, state)| (*account, state.spent()))
            .filter(|(_, spent)| !spent.is_zero())
            .collect()
    }

    /// Snapshot of all grant records.
    pub fn grants(&self) -> Vec<PointGrant> {
        self.grants.read().records.clone()
    }

    /// Snapshot of all spend records.
    pub fn spends(&self) -> Vec<PointSpend> {
        self.spends.read().records.clone()
    }

    /// Grant records for one account.
    pub fn grants_for(&self, account: AccountId) -> Vec<PointGrant> {
        self.grants
            .read()
            .records
            .iter()
            .filter(|g| g.account == account)
            .cloned()
            .collect()
    }

    /// Spend records for one account.
    pub fn spends_for(&self, account: AccountId) -> Vec<PointSpend> {
        self.spends
            .read()
            .records
            .iter()
            .filter(|s| s.account == account)
            .cloned()
            .collect()
    }

    pub(crate) fn commit_reservation(
        &self,
        state: &AccountState,
        entity: EntityId,
        amount: Points,
        key: String,
        at: Timestamp,
    ) -> SpendId {
        let _guard = state.spend_lock.lock();

        let mut log = self.spends.write();
        let id = SpendId(log.records.len() as u64 + 1);
        log.by_key.insert(key.clone(), id);
        log.records.push(PointSpend {
            id,
            account: state.account(),
            amount,
            entity,
            idempotency_key: key.clone(),
            at,
        });
        drop(log);

        state.settle_reserved(amount);
        self.pending_keys.lock().remove(&key);
        debug!(account = %state.account(), %entity, %amount, "committed spend");
        id
    }

    pub(crate) fn abandon_reservation(&self, state: &AccountState, amount: Points, key: &str) {
        state.release_reserved(amount);
        self.pending_keys.lock().remove(key);
        debug!(account = %state.account(), %amount, "released spend reservation");
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const T0: Timestamp = Timestamp(1_700_000_000);

    fn granted_ledger(amount: u64) -> Ledger {
        let ledger = Ledger::new();
        ledger
            .grant(
                AccountId(1),
                Points(amount),
                GrantReason::DailyAllowance,
                "seed",
                T0,
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_grant_and_balance() {
        let ledger = granted_ledger(100);
        assert_eq!(ledger.balance(AccountId(1)), Points(100));
        assert_eq!(ledger.grants().len(), 1);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let ledger = granted_ledger(100);
        let err = ledger
            .grant(AccountId(1), Points(100), GrantReason::DailyAllowance, "seed", T0)
            .unwrap_err();
        assert_matches!(err, LedgerError::DuplicateSource { source_ref } if source_ref == "seed");

        // Balance unchanged by the rejected retry.
        assert_eq!(ledger.balance(AccountId(1)), Points(100));
    }

    #[test]
    fn test_spend_debits_balance() {
        let ledger = granted_ledger(50);
        let id = ledger.spend(AccountId(1), Points(30), EntityId(7), "k1", T0).unwrap();
        assert_eq!(id, SpendId(1));
        assert_eq!(ledger.balance(AccountId(1)), Points(20));
    }

    #[test]
    fn test_duplicate_spend_key_rejected() {
        let ledger = granted_ledger(50);
        ledger.spend(AccountId(1), Points(10), EntityId(7), "k1", T0).unwrap();
        let err = ledger.spend(AccountId(1), Points(10), EntityId(7), "k1", T0).unwrap_err();
        assert_matches!(err, LedgerError::DuplicateSpend { key } if key == "k1");

        assert_eq!(ledger.spends().len(), 1);
        assert_eq!(ledger.balance(AccountId(1)), Points(40));
    }

    #[test]
    fn test_insufficient_balance() {
        let ledger = granted_ledger(50);
        ledger.spend(AccountId(1), Points(30), EntityId(7), "k1", T0).unwrap();

        let err = ledger.spend(AccountId(1), Points(30), EntityId(7), "k2", T0).unwrap_err();
        assert_matches!(
            err,
            LedgerError::InsufficientBalance { have, need, .. }
                if have == Points(20) && need == Points(30)
        );
        assert_eq!(ledger.balance(AccountId(1)), Points(20));
    }

    #[test]
    fn test_unknown_account_balance_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance(AccountId(99)), Points::ZERO);
    }

    #[test]
    fn test_reservation_blocks_concurrent_overspend() {
        let ledger = granted_ledger(50);

        let reservation = ledger
            .prepare_spend(AccountId(1), Points(40), EntityId(7), "k1")
            .unwrap();

        // Only 10 left while the reservation is live.
        let err = ledger.spend(AccountId(1), Points(20), EntityId(8), "k2", T0).unwrap_err();
        assert_matches!(err, LedgerError::InsufficientBalance { have, .. } if have == Points(10));

        reservation.commit(T0);
        assert_eq!(ledger.balance(AccountId(1)), Points(10));
    }

    #[test]
    fn test_dropped_reservation_leaves_no_trace() {
        let ledger = granted_ledger(50);

        {
            let _reservation = ledger
                .prepare_spend(AccountId(1), Points(40), EntityId(7), "k1")
                .unwrap();
        }

        assert_eq!(ledger.balance(AccountId(1)), Points(50));
        assert!(ledger.spends().is_empty());

        // The key is usable again after the abort.
        ledger.spend(AccountId(1), Points(40), EntityId(7), "k1", T0).unwrap();
        assert_eq!(ledger.balance(AccountId(1)), Points(10));
    }

    #[test]
    fn test_pending_key_counts_as_duplicate() {
        let ledger = granted_ledger(50);
        let _reservation = ledger
            .prepare_spend(AccountId(1), Points(10), EntityId(7), "k1")
            .unwrap();

        let err = ledger
            .prepare_spend(AccountId(1), Points(10), EntityId(7), "k1")
            .unwrap_err();
        assert_matches!(err, LedgerError::DuplicateSpend { .. });
    }

    #[test]
    fn test_balance_invariant_matches_logs() {
        let ledger = granted_ledger(100);
        ledger
            .grant(
                AccountId(1),
                Points(40),
                GrantReason::Purchase { package: "500_points".into() },
                "sess_1",
                T0,
            )
            .unwrap();
        ledger.spend(AccountId(1), Points(60), EntityId(7), "k1", T0).unwrap();
        ledger.spend(AccountId(1), Points(25), EntityId(8), "k2", T0).unwrap();

        let granted: u64 = ledger.grants_for(AccountId(1)).iter().map(|g| g.amount.get()).sum();
        let spent: u64 = ledger.spends_for(AccountId(1)).iter().map(|s| s.amount.get()).sum();

        assert!(spent <= granted);
        assert_eq!(ledger.balance(AccountId(1)), Points(granted - spent));
    }

    #[test]
    fn test_concurrent_spends_never_overdraw() {
        use std::thread;

        let ledger = std::sync::Arc::new(granted_ledger(100));
        let mut handles = vec![];

        // 20 threads racing to spend 10 each from a balance of 100.
        for i in 0..20 {
            let ledger = std::sync::Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger
                    .spend(AccountId(1), Points(10), EntityId(7), format!("k{i}"), T0)
                    .is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 10);
        assert_eq!(ledger.balance(AccountId(1)), Points::ZERO);
        assert_eq!(ledger.spends().len(), 10);
    }

    #[test]
    fn test_promoter_totals() {
        let ledger = granted_ledger(100);
        ledger
            .grant(AccountId(2), Points(50), GrantReason::DailyAllowance, "seed2", T0)
            .unwrap();
        ledger.spend(AccountId(1), Points(60), EntityId(7), "k1", T0).unwrap();
        ledger.spend(AccountId(2), Points(20), EntityId(7), "k2", T0).unwrap();

        let mut totals = ledger.promoter_totals();
        totals.sort_by_key(|(account, _)| *account);
        assert_eq!(totals, vec![(AccountId(1), Points(60)), (AccountId(2), Points(20))]);
    }
}
