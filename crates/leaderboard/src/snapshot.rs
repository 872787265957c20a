//! Immutable leaderboard snapshots.

use std::collections::HashMap;

use serde::Serialize;
use strum::IntoEnumIterator;

use pulse_primitives::{AccountId, EntityId, Points, Region, Timestamp, Window};
use pulse_scoring::{EntityMeta, EntityScoreView};

/// One row of an entity ranking, as returned to callers.
///
/// A plain value: callers may mutate or drop it freely without affecting
/// the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position within the (possibly region-filtered) ranking.
    pub rank: u32,
    pub entity: EntityId,
    pub score: Points,
    pub meta: Option<EntityMeta>,
}

/// One row of the promoter ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoterEntry {
    /// 1-based position.
    pub rank: u32,
    pub account: AccountId,
    pub lifetime_spent: Points,
}

#[derive(Debug, Clone)]
struct RankedEntity {
    entity: EntityId,
    score: Points,
    meta: Option<EntityMeta>,
}

/// A point-in-time materialized ranking.
///
/// Built once, then shared read-only behind an `Arc`; a refresh builds a
/// new snapshot and swaps the pointer.
pub struct LeaderboardSnapshot {
    built_at: Timestamp,
    /// Per window: entities sorted by score descending, id ascending.
    rankings: HashMap<Window, Vec<RankedEntity>>,
    /// Accounts sorted by lifetime spend descending, id ascending.
    promoters: Vec<PromoterEntry>,
}

impl LeaderboardSnapshot {
    /// An empty snapshot, older than any refresh threshold.
    pub fn empty() -> Self {
        Self {
            built_at: Timestamp(0),
            rankings: HashMap::new(),
            promoters: Vec::new(),
        }
    }

    /// Build a snapshot from evaluated entity scores and promoter totals.
    pub fn build(
        views: Vec<EntityScoreView>,
        mut promoter_totals: Vec<(AccountId, Points)>,
        built_at: Timestamp,
    ) -> Self {
        let mut rankings = HashMap::new();
        for window in Window::iter() {
            let mut ranked: Vec<RankedEntity> = views
                .iter()
                .map(|view| RankedEntity {
                    entity: view.entity,
                    score: view.scores.get(window),
                    meta: view.meta.clone(),
                })
                .collect();
            // Deterministic order: score descending, entity id ascending.
            ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.entity.cmp(&b.entity)));
            rankings.insert(window, ranked);
        }

        promoter_totals.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let promoters = promoter_totals
            .into_iter()
            .enumerate()
            .map(|(i, (account, lifetime_spent))| PromoterEntry {
                rank: i as u32 + 1,
                account,
                lifetime_spent,
            })
            .collect();

        Self { built_at, rankings, promoters }
    }

    /// When this snapshot was built.
    pub fn built_at(&self) -> Timestamp {
        self.built_at
    }

    /// Ranked entities for a window, optionally narrowed to a region.
    ///
    /// The region filter is applied before rank positions are assigned, so
    /// ranks within a filtered view are contiguous from 1.
    pub fn top_entities(
        &self,
        window: Window,
        region: Option<&Region>,
        limit: usize,
        offset: usize,
    ) -> Vec<LeaderboardEntry> {
        let Some(ranked) = self.rankings.get(&window) else {
            return Vec::new();
        };

        ranked
            .iter()
            .filter(|e| match region {
                None => true,
                Some(r) => entity_region(&e.meta) == Some(r),
            })
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, e)| LeaderboardEntry {
                rank: i as u32 + 1,
                entity: e.entity,
                score: e.score,
                meta: e.meta.clone(),
            })
            .collect()
    }

    /// Top accounts by lifetime points spent.
    pub fn top_promoters(&self, limit: usize) -> Vec<PromoterEntry> {
        self.promoters.iter().take(limit).cloned().collect()
    }
}

fn entity_region(meta: &Option<EntityMeta>) -> Option<&Region> {
    meta.as_ref().and_then(|m| m.region.as_ref())
}
