//! Per-entity score state.
//!
//! Events are bucketed by UTC day. Each bucket keeps its events and a
//! running total, so a window query sums whole days from the bucket totals
//! and only scans events in the partial day at each edge of the window.
//! The all-time score is a plain running counter.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use pulse_primitives::{Points, Region, Timestamp, Window, WindowScores, SECS_PER_DAY};

use crate::event::ScoreEvent;

const ORD: Ordering = Ordering::Relaxed;

/// Denormalized entity metadata, cached at first boost so scoring and
/// leaderboard rendering never need the origin catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub name: String,
    pub image_url: Option<String>,
    pub region: Option<Region>,
}

#[derive(Debug, Default)]
struct DayBucket {
    total: u64,
    events: Vec<ScoreEvent>,
}

impl DayBucket {
    fn partial_sum(&self, cutoff: Timestamp, now: Timestamp) -> u64 {
        self.events
            .iter()
            .filter(|e| e.at >= cutoff && e.at <= now)
            .map(|e| e.amount.get())
            .sum()
    }
}

/// Score state for one entity.
pub struct EntityScores {
    buckets: RwLock<BTreeMap<u64, DayBucket>>,
    all_time: AtomicU64,
    meta: RwLock<Option<EntityMeta>>,
}

impl EntityScores {
    /// Create empty score state.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            all_time: AtomicU64::new(0),
            meta: RwLock::new(None),
        }
    }

    /// Record a score event.
    pub fn record(&self, amount: Points, at: Timestamp) {
        let mut buckets = self.buckets.write();
        let bucket = buckets.entry(at.day()).or_default();
        bucket.total += amount.get();
        bucket.events.push(ScoreEvent { amount, at });
        drop(buckets);

        self.all_time.fetch_add(amount.get(), ORD);
    }

    /// Score for one window at query time `now`.
    ///
    /// Whole days inside `[now - d, now]` come from bucket totals; the
    /// partial day at each edge is summed from that bucket's events, which
    /// keeps the result identical to [`crate::recompute`] over the full
    /// event log.
    pub fn score(&self, window: Window, now: Timestamp) -> Points {
        let Some(d) = window.duration_secs() else {
            return Points(self.all_time.load(ORD));
        };

        let cutoff = now.saturating_sub_secs(d);
        let buckets = self.buckets.read();

        let sum: u64 = buckets
            .range(cutoff.day()..=now.day())
            .map(|(day, bucket)| {
                let day_start = day * SECS_PER_DAY;
                let day_end = day_start + SECS_PER_DAY - 1;
                if day_start >= cutoff.as_secs() && day_end <= now.as_secs() {
                    bucket.total
                } else {
                    bucket.partial_sum(cutoff, now)
                }
            })
            .sum();
        Points(sum)
    }

    /// Scores for every window at query time `now`.
    pub fn scores(&self, now: Timestamp) -> WindowScores {
        let mut scores = WindowScores::default();
        for window in Window::iter() {
            scores.set(window, self.score(window, now));
        }
        scores
    }

    /// Flattened event log, ordered by day then insertion.
    pub fn events(&self) -> Vec<ScoreEvent> {
        self.buckets
            .read()
            .values()
            .flat_map(|bucket| bucket.events.iter().copied())
            .collect()
    }

    /// Cached metadata snapshot, if any.
    pub fn meta(&self) -> Option<EntityMeta> {
        self.meta.read().clone()
    }

    /// Whether a metadata snapshot has been cached.
    pub fn has_meta(&self) -> bool {
        self.meta.read().is_some()
    }

    /// Cache a metadata snapshot. The first write wins; backfill after a
    /// failed fetch passes `overwrite = false` and never clobbers data that
    /// arrived in the meantime.
    pub fn set_meta(&self, meta: EntityMeta, overwrite: bool) {
        let mut slot = self.meta.write();
        if overwrite || slot.is_none() {
            *slot = Some(meta);
        }
    }
}

impl Default for EntityScores {
    fn default() -> Self {
        Self::new()
    }
}
