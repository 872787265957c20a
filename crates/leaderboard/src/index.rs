//! The leaderboard index: staleness-driven refresh over immutable snapshots.

use std::sync::Arc;

use metrics::Counter;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use pulse_ledger::Ledger;
use pulse_primitives::{Clock, Region, Timestamp, Window};
use pulse_scoring::Scorer;

use crate::snapshot::{LeaderboardEntry, LeaderboardSnapshot, PromoterEntry};

/// Default maximum snapshot age before a read triggers a rebuild. Matches
/// the page-level cache policy of the embedding application.
pub const DEFAULT_MAX_AGE_SECS: u64 = 60;

/// Leaderboard refresh policy.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardConfig {
    /// Snapshots older than this are rebuilt on the next read.
    pub max_age_secs: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self { max_age_secs: DEFAULT_MAX_AGE_SECS }
    }
}

/// Read-mostly ranked view over entities and promoters.
///
/// The served snapshot is immutable and swapped whole: a rebuild constructs
/// a fresh [`LeaderboardSnapshot`] and replaces the `Arc`, so concurrent
/// readers always hold a consistent ranking. When a read finds the snapshot
/// stale, exactly one caller rebuilds synchronously (bounded by the rebuild
/// itself, never a queue); others keep serving the stale snapshot rather
/// than blocking behind the rebuild.
pub struct LeaderboardIndex {
    ledger: Arc<Ledger>,
    scorer: Arc<Scorer>,
    clock: Arc<dyn Clock>,
    config: LeaderboardConfig,
    snapshot: RwLock<Arc<LeaderboardSnapshot>>,
    rebuild: Mutex<()>,
    rebuilds_total: Counter,
}

impl LeaderboardIndex {
    /// Create an index over the shared ledger and scorer.
    pub fn new(
        ledger: Arc<Ledger>,
        scorer: Arc<Scorer>,
        clock: Arc<dyn Clock>,
        config: LeaderboardConfig,
    ) -> Self {
        Self {
            ledger,
            scorer,
            clock,
            config,
            snapshot: RwLock::new(Arc::new(LeaderboardSnapshot::empty())),
            rebuild: Mutex::new(()),
            rebuilds_total: metrics::counter!("leaderboard.rebuilds_total"),
        }
    }

    /// Current snapshot, refreshed first if stale.
    pub fn current(&self) -> Arc<LeaderboardSnapshot> {
        let now = self.clock.now();
        let snapshot = self.snapshot.read().clone();
        if now.secs_since(snapshot.built_at()) <= self.config.max_age_secs {
            return snapshot;
        }

        // Stale: one caller rebuilds, everyone else serves the old snapshot.
        match self.rebuild.try_lock() {
            Some(_guard) => {
                // Re-check: a rebuild may have finished since the staleness check.
                let current = self.snapshot.read().clone();
                if now.secs_since(current.built_at()) <= self.config.max_age_secs {
                    return current;
                }
                self.rebuild_locked(now)
            }
            None => snapshot,
        }
    }

    /// Rebuild now regardless of staleness.
    pub fn force_refresh(&self) -> Arc<LeaderboardSnapshot> {
        let _guard = self.rebuild.lock();
        self.rebuild_locked(self.clock.now())
    }

    fn rebuild_locked(&self, now: Timestamp) -> Arc<LeaderboardSnapshot> {
        let fresh = Arc::new(LeaderboardSnapshot::build(
            self.scorer.snapshot(now),
            self.ledger.promoter_totals(),
            now,
        ));
        *self.snapshot.write() = Arc::clone(&fresh);
        self.rebuilds_total.increment(1);
        debug!(built_at = %now, "leaderboard snapshot rebuilt");
        fresh
    }

    /// Ranked entities for a window, optionally narrowed to a region.
    pub fn top_entities(
        &self,
        window: Window,
        region: Option<&Region>,
        limit: usize,
        offset: usize,
    ) -> Vec<LeaderboardEntry> {
        self.current().top_entities(window, region, limit, offset)
    }

    /// Top accounts by lifetime points spent.
    pub fn top_promoters(&self, limit: usize) -> Vec<PromoterEntry> {
        self.current().top_promoters(limit)
    }
}

#[cfg(test)]
mod tests {
    use pulse_primitives::{AccountId, EntityId, GrantReason, ManualClock, Points};

    use super::*;

    const T0: Timestamp = Timestamp(1_700_000_000);

    struct Fixture {
        ledger: Arc<Ledger>,
        scorer: Arc<Scorer>,
        clock: Arc<ManualClock>,
        index: LeaderboardIndex,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(Ledger::new());
        let scorer = Arc::new(Scorer::new());
        let clock = Arc::new(ManualClock::new(T0));
        let index = LeaderboardIndex::new(
            Arc::clone(&ledger),
            Arc::clone(&scorer),
            Arc::clone(&clock) as Arc<dyn Clock>,
            LeaderboardConfig::default(),
        );
        Fixture { ledger, scorer, clock, index }
    }

    #[test]
    fn test_first_read_builds_snapshot() {
        let fx = fixture();
        fx.scorer.record(EntityId(1), Points(10), T0);

        let top = fx.index.top_entities(Window::Daily, None, 10, 0);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, Points(10));
    }

    #[test]
    fn test_fresh_snapshot_is_served_unchanged() {
        let fx = fixture();
        fx.scorer.record(EntityId(1), Points(10), T0);
        let first = fx.index.current();

        // New events inside the freshness window are not yet visible.
        fx.scorer.record(EntityId(1), Points(5), T0);
        let second = fx.index.current();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_stale_snapshot_is_rebuilt() {
        let fx = fixture();
        fx.scorer.record(EntityId(1), Points(10), T0);
        let first = fx.index.current();

        fx.clock.advance(DEFAULT_MAX_AGE_SECS + 1);
        fx.scorer.record(EntityId(1), Points(5), fx.clock.now());

        let second = fx.index.current();
        assert!(!Arc::ptr_eq(&first, &second));
        let top = second.top_entities(Window::Daily, None, 10, 0);
        assert_eq!(top[0].score, Points(15));

        // The old snapshot still serves its original view.
        assert_eq!(
            first.top_entities(Window::Daily, None, 10, 0)[0].score,
            Points(10)
        );
    }

    #[test]
    fn test_force_refresh_swaps_immediately() {
        let fx = fixture();
        let before = fx.index.current();

        fx.scorer.record(EntityId(1), Points(10), T0);
        let after = fx.index.force_refresh();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.top_entities(Window::Daily, None, 10, 0).len(), 1);
    }

    #[test]
    fn test_promoters_come_from_ledger() {
        let fx = fixture();
        fx.ledger
            .grant(AccountId(1), Points(100), GrantReason::DailyAllowance, "s1", T0)
            .unwrap();
        fx.ledger.spend(AccountId(1), Points(60), EntityId(1), "k1", T0).unwrap();

        let promoters = fx.index.force_refresh().top_promoters(10);
        assert_eq!(promoters.len(), 1);
        assert_eq!(promoters[0].lifetime_spent, Points(60));
    }

    #[test]
    fn test_concurrent_reads_during_rebuild() {
        use std::thread;

        let fx = fixture();
        for i in 0..50 {
            fx.scorer.record(EntityId(i), Points(i + 1), T0);
        }
        fx.index.force_refresh();
        fx.clock.advance(DEFAULT_MAX_AGE_SECS + 1);

        let index = Arc::new(fx.index);
        let mut handles = vec![];
        for _ in 0..8 {
            let index = Arc::clone(&index);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let top = index.top_entities(Window::Daily, None, 10, 0);
                    // Ranking is always consistent: strictly descending scores.
                    for pair in top.windows(2) {
                        assert!(pair[0].score >= pair[1].score);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
