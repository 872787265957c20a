//! The spend coordinator.

use std::sync::Arc;

use tracing::debug;

use pulse_ledger::Ledger;
use pulse_primitives::{AccountId, Clock, EntityId, Points, SpendId, Timestamp, Window};
use pulse_scoring::Scorer;

use crate::config::SpendConfig;
use crate::cooldown::CooldownTracker;
use crate::error::BoostError;
use crate::metrics::BoostMetrics;

/// Result of a committed boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostReceipt {
    pub spend_id: SpendId,
    /// Account balance after the debit.
    pub new_balance: Points,
    /// The entity's daily score read immediately after commit; reflects at
    /// least the just-committed event, possibly concurrent ones too.
    pub entity_daily_score: Points,
    /// Server-assigned commit time.
    pub at: Timestamp,
}

/// Turns a user boost into a ledger spend plus a score event, atomically.
pub struct SpendCoordinator {
    ledger: Arc<Ledger>,
    scorer: Arc<Scorer>,
    clock: Arc<dyn Clock>,
    config: SpendConfig,
    cooldown: CooldownTracker,
    metrics: BoostMetrics,
}

impl SpendCoordinator {
    /// Create a coordinator over the shared ledger and scorer.
    pub fn new(
        ledger: Arc<Ledger>,
        scorer: Arc<Scorer>,
        clock: Arc<dyn Clock>,
        config: SpendConfig,
    ) -> Self {
        let cooldown = CooldownTracker::new(config.cooldown_secs, config.max_spends_per_entity);
        Self {
            ledger,
            scorer,
            clock,
            config,
            cooldown,
            metrics: BoostMetrics::default(),
        }
    }

    /// The limits this coordinator enforces.
    pub fn config(&self) -> &SpendConfig {
        &self.config
    }

    /// Spend `amount` points from `account` to boost `entity`.
    ///
    /// The debit and the score credit commit as one unit: the ledger
    /// reservation is held while the score event is recorded, and the commit
    /// that follows cannot fail. An error return therefore means nothing was
    /// written - no partial debit, no orphaned score event.
    pub fn boost(
        &self,
        account: AccountId,
        entity: EntityId,
        amount: Points,
        key: impl Into<String>,
    ) -> Result<BoostReceipt, BoostError> {
        self.boost_inner(account, entity, amount, key.into())
            .inspect(|receipt| {
                self.metrics.record_accepted();
                debug!(%account, %entity, %amount, spend = ?receipt.spend_id, "boost committed");
            })
            .inspect_err(|err| {
                self.metrics.record_rejected(err);
                debug!(%account, %entity, %amount, %err, "boost rejected");
            })
    }

    fn boost_inner(
        &self,
        account: AccountId,
        entity: EntityId,
        amount: Points,
        key: String,
    ) -> Result<BoostReceipt, BoostError> {
        if amount.is_zero() || amount > self.config.per_action_max {
            return Err(BoostError::InvalidAmount {
                amount,
                max: self.config.per_action_max,
            });
        }

        // Timestamps are assigned here, at commit time, never by the caller.
        let now = self.clock.now();

        // Claim the cooldown slot before touching the ledger so concurrent
        // boosts race for slots; a spend that aborts hands its slot back.
        self.cooldown.claim(account, entity, now).map_err(|retry_after_secs| {
            BoostError::RateLimited { account, entity, retry_after_secs }
        })?;

        let reservation = match self.ledger.prepare_spend(account, amount, entity, key) {
            Ok(reservation) => reservation,
            Err(err) => {
                self.cooldown.release(account, entity, now);
                return Err(err.into());
            }
        };

        // Credit the score while the reservation is live; from here on
        // nothing can fail, so debit and credit land together.
        self.scorer.record(entity, amount, now);
        let spend_id = reservation.commit(now);

        Ok(BoostReceipt {
            spend_id,
            new_balance: self.ledger.balance(account),
            entity_daily_score: self.scorer.scores_for(entity, now).get(Window::Daily),
            at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use pulse_primitives::{GrantReason, ManualClock};

    use super::*;

    const T0: Timestamp = Timestamp(1_700_000_000);
    const A: AccountId = AccountId(1);
    const TOUR_X: EntityId = EntityId(7);

    struct Fixture {
        ledger: Arc<Ledger>,
        scorer: Arc<Scorer>,
        clock: Arc<ManualClock>,
        coordinator: SpendCoordinator,
    }

    fn fixture(balance: u64, config: SpendConfig) -> Fixture {
        let ledger = Arc::new(Ledger::new());
        let scorer = Arc::new(Scorer::new());
        let clock = Arc::new(ManualClock::new(T0));
        ledger
            .grant(A, Points(balance), GrantReason::DailyAllowance, "seed", T0)
            .unwrap();
        let coordinator = SpendCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            Arc::clone(&clock) as Arc<dyn Clock>,
            config,
        );
        Fixture { ledger, scorer, clock, coordinator }
    }

    #[test]
    fn test_boost_debits_and_credits_together() {
        let fx = fixture(50, SpendConfig::default());

        let receipt = fx.coordinator.boost(A, TOUR_X, Points(30), "k1").unwrap();
        assert_eq!(receipt.new_balance, Points(20));
        assert_eq!(receipt.entity_daily_score, Points(30));
        assert_eq!(receipt.at, T0);

        assert_eq!(fx.ledger.balance(A), Points(20));
        assert_eq!(fx.scorer.scores_for(TOUR_X, T0).daily, Points(30));
    }

    #[test]
    fn test_retry_same_key_is_rejected_without_effect() {
        let fx = fixture(50, SpendConfig::default());
        fx.coordinator.boost(A, TOUR_X, Points(30), "k1").unwrap();

        let err = fx.coordinator.boost(A, TOUR_X, Points(30), "k1").unwrap_err();
        assert_matches!(err, BoostError::DuplicateSpend { key } if key == "k1");

        // Exactly one spend and one score event.
        assert_eq!(fx.ledger.balance(A), Points(20));
        assert_eq!(fx.ledger.spends().len(), 1);
        assert_eq!(fx.scorer.scores_for(TOUR_X, T0).daily, Points(30));
    }

    #[test]
    fn test_insufficient_balance_after_partial_spend() {
        let fx = fixture(50, SpendConfig::default());
        fx.coordinator.boost(A, TOUR_X, Points(30), "k1").unwrap();

        let err = fx.coordinator.boost(A, TOUR_X, Points(30), "k2").unwrap_err();
        assert_matches!(
            err,
            BoostError::InsufficientBalance { have, need, .. }
                if have == Points(20) && need == Points(30)
        );

        // Balance unchanged, no orphaned score event.
        assert_eq!(fx.ledger.balance(A), Points(20));
        assert_eq!(fx.scorer.scores_for(TOUR_X, T0).daily, Points(30));
    }

    #[test]
    fn test_amount_bounds() {
        let fx = fixture(1_000, SpendConfig::default());

        let err = fx.coordinator.boost(A, TOUR_X, Points::ZERO, "k0").unwrap_err();
        assert_matches!(err, BoostError::InvalidAmount { .. });

        let max = fx.coordinator.config().per_action_max;
        let err = fx
            .coordinator
            .boost(A, TOUR_X, max.saturating_add(Points(1)), "k1")
            .unwrap_err();
        assert_matches!(err, BoostError::InvalidAmount { .. });

        fx.coordinator.boost(A, TOUR_X, max, "k2").unwrap();
    }

    #[test]
    fn test_cooldown_limits_repeat_boosts() {
        let config = SpendConfig {
            cooldown_secs: 300,
            max_spends_per_entity: 2,
            ..SpendConfig::default()
        };
        let fx = fixture(1_000, config);

        fx.coordinator.boost(A, TOUR_X, Points(1), "k1").unwrap();
        fx.coordinator.boost(A, TOUR_X, Points(1), "k2").unwrap();

        let err = fx.coordinator.boost(A, TOUR_X, Points(1), "k3").unwrap_err();
        assert_matches!(
            err,
            BoostError::RateLimited { retry_after_secs, .. } if retry_after_secs == 301
        );

        // A different entity is unaffected.
        fx.coordinator.boost(A, EntityId(8), Points(1), "k4").unwrap();

        // The budget frees up once hits age out.
        fx.clock.advance(301);
        fx.coordinator.boost(A, TOUR_X, Points(1), "k5").unwrap();
    }

    #[test]
    fn test_rejected_boost_burns_no_cooldown_budget() {
        let config = SpendConfig {
            cooldown_secs: 300,
            max_spends_per_entity: 1,
            ..SpendConfig::default()
        };
        let fx = fixture(10, config);

        // Insufficient balance, repeatedly: never trips the limiter.
        for i in 0..5 {
            let err = fx
                .coordinator
                .boost(A, TOUR_X, Points(50), format!("k{i}"))
                .unwrap_err();
            assert_matches!(err, BoostError::InsufficientBalance { .. });
        }

        fx.coordinator.boost(A, TOUR_X, Points(10), "ok").unwrap();
    }

    #[test]
    fn test_concurrent_boosts_cannot_exceed_entity_limit() {
        use std::sync::Barrier;
        use std::thread;

        let ledger = Arc::new(Ledger::new());
        let scorer = Arc::new(Scorer::new());
        let clock = Arc::new(ManualClock::new(T0));
        ledger
            .grant(A, Points(1_000), GrantReason::DailyAllowance, "seed", T0)
            .unwrap();
        let coordinator = Arc::new(SpendCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            clock as Arc<dyn Clock>,
            SpendConfig { max_spends_per_entity: 1, ..SpendConfig::default() },
        ));

        // 8 simultaneous boosts of the same (account, entity) with distinct
        // keys: only one may commit.
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = vec![];
        for i in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                coordinator.boost(A, TOUR_X, Points(10), format!("k{i}")).is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(ledger.spends().len(), 1);
        assert_eq!(scorer.scores_for(TOUR_X, T0).daily, Points(10));
    }

    #[test]
    fn test_concurrent_boosts_from_many_accounts() {
        use std::thread;

        let ledger = Arc::new(Ledger::new());
        let scorer = Arc::new(Scorer::new());
        let clock = Arc::new(ManualClock::new(T0));
        for i in 0..8 {
            ledger
                .grant(
                    AccountId(i),
                    Points(100),
                    GrantReason::DailyAllowance,
                    format!("seed{i}"),
                    T0,
                )
                .unwrap();
        }
        let coordinator = Arc::new(SpendCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            clock as Arc<dyn Clock>,
            SpendConfig { max_spends_per_entity: 100, ..SpendConfig::default() },
        ));

        let mut handles = vec![];
        for i in 0..8u64 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    coordinator
                        .boost(AccountId(i), TOUR_X, Points(10), format!("k{i}-{j}"))
                        .unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // All committed score events are counted, regardless of interleaving.
        assert_eq!(scorer.scores_for(TOUR_X, T0).daily, Points(800));
        for i in 0..8 {
            assert_eq!(ledger.balance(AccountId(i)), Points::ZERO);
        }
    }
}
