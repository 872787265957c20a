//! The promotion engine.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use pulse_leaderboard::{LeaderboardEntry, LeaderboardIndex, PromoterEntry};
use pulse_ledger::Ledger;
use pulse_primitives::{
    AccountId, Clock, EntityId, GrantReason, Points, Region, SystemClock, Timestamp, Window,
    WindowScores,
};
use pulse_purchase::{PackageGrantAdapter, PurchaseError, PurchaseOutcome};
use pulse_scoring::Scorer;
use pulse_spend::{BoostError, BoostReceipt, SpendCoordinator};

use crate::config::EngineConfig;
use crate::metadata::MetadataSource;

/// What an account sees on its profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Spendable balance right now.
    pub balance: Points,
    /// Consecutive-day activity streak.
    pub streak_days: u32,
    /// Allowance (plus streak bonus) the account would still be granted
    /// today; zero once the day's grants have been applied.
    pub daily_points_available: Points,
}

/// The promotion & ranking engine.
///
/// Owns every core component and shares the ledger and scorer between them.
/// Construction is cheap; the expensive state grows lazily with use.
pub struct PromotionEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    ledger: Arc<Ledger>,
    scorer: Arc<Scorer>,
    coordinator: SpendCoordinator,
    leaderboard: LeaderboardIndex,
    purchases: PackageGrantAdapter,
    metadata: Option<Arc<dyn MetadataSource>>,
}

impl PromotionEngine {
    /// Create an engine on the system clock.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an engine on an explicit clock (tests drive a manual one).
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(Ledger::new());
        let scorer = Arc::new(Scorer::new());
        let coordinator = SpendCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            Arc::clone(&clock),
            config.spend,
        );
        let leaderboard = LeaderboardIndex::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            Arc::clone(&clock),
            config.leaderboard,
        );
        let purchases = PackageGrantAdapter::new(Arc::clone(&ledger), config.prices.clone());

        Self {
            config,
            clock,
            ledger,
            scorer,
            coordinator,
            leaderboard,
            purchases,
            metadata: None,
        }
    }

    /// Attach the catalog collaborator used for best-effort metadata
    /// backfill on first boost.
    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(source);
        self
    }

    /// The ledger, for audit and invariant checks.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// The scorer, for direct score state access.
    pub fn scorer(&self) -> &Arc<Scorer> {
        &self.scorer
    }

    /// Spend `amount` points from `account` to boost `entity`.
    ///
    /// Applies the day's allowance and streak grants first, so an account's
    /// first visit of the day can spend immediately. After the boost
    /// commits, missing entity metadata is backfilled by a fire-and-forget
    /// task; a catalog failure is logged and never surfaces here.
    pub async fn boost(
        &self,
        account: AccountId,
        entity: EntityId,
        amount: Points,
        key: impl Into<String>,
    ) -> Result<BoostReceipt, BoostError> {
        let now = self.clock.now();
        self.apply_daily_grants(account, now);

        let receipt = self.coordinator.boost(account, entity, amount, key)?;

        if !self.scorer.has_meta(entity) {
            self.spawn_metadata_backfill(entity);
        }
        Ok(receipt)
    }

    /// Grant the daily allowance and streak bonus for `now`'s UTC day if
    /// not yet granted. Idempotent through the grant source index, so a
    /// race between two requests of the same account cannot double-grant.
    fn apply_daily_grants(&self, account: AccountId, now: Timestamp) {
        let update = self.ledger.record_activity(account, now);
        let day = now.day();

        let daily_ref = format!("daily:{account}:{day}");
        if !self.ledger.has_source(&daily_ref) {
            let granted = self.ledger.grant(
                account,
                self.config.daily_allowance,
                GrantReason::DailyAllowance,
                daily_ref,
                now,
            );
            if granted.is_ok() {
                debug!(%account, day, "daily allowance granted");

                let bonus = self.config.streak_bonus(update.streak_days);
                if !bonus.is_zero() {
                    let granted_bonus = self.ledger.grant(
                        account,
                        bonus,
                        GrantReason::StreakBonus,
                        format!("streak:{account}:{day}"),
                        now,
                    );
                    // A lost idempotency race means another request of this
                    // account already granted the bonus.
                    if granted_bonus.is_ok() {
                        debug!(%account, streak = update.streak_days, %bonus, "streak bonus granted");
                    }
                }
            }
        }
    }

    fn spawn_metadata_backfill(&self, entity: EntityId) {
        let Some(source) = self.metadata.as_ref().map(Arc::clone) else {
            return;
        };
        let scorer = Arc::clone(&self.scorer);
        tokio::spawn(async move {
            match source.fetch(entity).await {
                Ok(meta) => {
                    debug!(%entity, name = %meta.name, "entity metadata backfilled");
                    scorer.set_meta(entity, meta);
                }
                // The boost already committed; the next one retries.
                Err(err) => warn!(%entity, %err, "metadata backfill failed"),
            }
        });
    }

    /// Profile summary for an account.
    pub fn account_summary(&self, account: AccountId) -> AccountSummary {
        let now = self.clock.now();
        let daily_ref = format!("daily:{account}:{}", now.day());

        let (balance, streak_days, projected) = match self.ledger.get_account(account) {
            Some(state) => (state.balance(), state.streak_days(), state.projected_streak(now)),
            None => (Points::ZERO, 0, 1),
        };

        let daily_points_available = if self.ledger.has_source(&daily_ref) {
            Points::ZERO
        } else {
            self.config.daily_allowance.saturating_add(self.config.streak_bonus(projected))
        };

        AccountSummary { balance, streak_days, daily_points_available }
    }

    /// Scores for an entity across every window, at the current time.
    pub fn entity_score(&self, entity: EntityId) -> WindowScores {
        self.scorer.scores_for(entity, self.clock.now())
    }

    /// Ranked entities for a window, optionally narrowed to a region.
    pub fn top_entities(
        &self,
        window: Window,
        region: Option<&Region>,
        limit: usize,
        offset: usize,
    ) -> Vec<LeaderboardEntry> {
        self.leaderboard.top_entities(window, region, limit, offset)
    }

    /// Top accounts by lifetime points spent.
    pub fn top_promoters(&self, limit: usize) -> Vec<PromoterEntry> {
        self.leaderboard.top_promoters(limit)
    }

    /// Rebuild the leaderboard now; reads otherwise refresh on staleness.
    pub fn refresh_leaderboard(&self) {
        let _ = self.leaderboard.force_refresh();
    }

    /// Apply a completed purchase notification, idempotently on
    /// `source_ref` (at-least-once delivery is assumed).
    pub async fn apply_purchase(
        &self,
        account: AccountId,
        package: &str,
        source_ref: &str,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        self.purchases.apply_purchase(account, package, source_ref, self.clock.now())
    }
}
