//! Central scorer registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use pulse_primitives::{EntityId, Points, Timestamp, WindowScores};

use crate::entity::{EntityMeta, EntityScores};

/// One entity's scores and metadata at a fixed query time, as handed to the
/// leaderboard rebuild.
#[derive(Debug, Clone)]
pub struct EntityScoreView {
    pub entity: EntityId,
    pub scores: WindowScores,
    pub meta: Option<EntityMeta>,
}

/// Registry of per-entity score state.
///
/// Uses double-checked locking: read lock on the fast path, write lock only
/// on the first event for an entity. Afterwards recording goes through the
/// `Arc`-wrapped [`EntityScores`] with no registry contention, which is safe
/// because the sliding-window sum is commutative - interleaving of events
/// from unrelated accounts needs no ordering beyond "eventually counted".
pub struct Scorer {
    entities: RwLock<HashMap<EntityId, Arc<EntityScores>>>,
}

impl Scorer {
    /// Create an empty scorer.
    pub fn new() -> Self {
        Self { entities: RwLock::new(HashMap::new()) }
    }

    /// Get or create the score state for an entity.
    pub fn entity(&self, entity: EntityId) -> Arc<EntityScores> {
        // Fast path: read lock
        if let Some(state) = self.entities.read().get(&entity) {
            return Arc::clone(state);
        }

        // Slow path: write lock (only on first access)
        self.entities
            .write()
            .entry(entity)
            .or_insert_with(|| {
                debug!(%entity, "creating entity score state");
                Arc::new(EntityScores::new())
            })
            .clone()
    }

    /// Get the score state for an entity if it exists.
    pub fn get_entity(&self, entity: EntityId) -> Option<Arc<EntityScores>> {
        self.entities.read().get(&entity).cloned()
    }

    /// Record a score event for an entity.
    pub fn record(&self, entity: EntityId, amount: Points, at: Timestamp) {
        self.entity(entity).record(amount, at);
    }

    /// Scores for every window. An entity with no events scores zero in
    /// every window rather than being absent.
    pub fn scores_for(&self, entity: EntityId, now: Timestamp) -> WindowScores {
        self.get_entity(entity).map(|s| s.scores(now)).unwrap_or_default()
    }

    /// Cached metadata for an entity.
    pub fn meta(&self, entity: EntityId) -> Option<EntityMeta> {
        self.get_entity(entity).and_then(|s| s.meta())
    }

    /// Whether the entity already has a metadata snapshot.
    pub fn has_meta(&self, entity: EntityId) -> bool {
        self.get_entity(entity).is_some_and(|s| s.has_meta())
    }

    /// Cache a metadata snapshot for an entity (first write wins).
    pub fn set_meta(&self, entity: EntityId, meta: EntityMeta) {
        self.entity(entity).set_meta(meta, false);
    }

    /// Evaluate every known entity at `now`, for the leaderboard rebuild.
    pub fn snapshot(&self, now: Timestamp) -> Vec<EntityScoreView> {
        let entities: Vec<_> = self
            .entities
            .read()
            .iter()
            .map(|(entity, state)| (*entity, Arc::clone(state)))
            .collect();

        entities
            .into_iter()
            .map(|(entity, state)| EntityScoreView {
                entity,
                scores: state.scores(now),
                meta: state.meta(),
            })
            .collect()
    }

    /// Number of entities with at least one recorded event or snapshot.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Whether no entity has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pulse_primitives::{Window, SECS_PER_DAY};

    use super::*;

    const NOW: Timestamp = Timestamp(50 * SECS_PER_DAY);

    #[test]
    fn test_get_or_create_returns_same_state() {
        let scorer = Scorer::new();
        let a = scorer.entity(EntityId(1));
        let b = scorer.entity(EntityId(1));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_entity_scores_zero() {
        let scorer = Scorer::new();
        assert_eq!(scorer.scores_for(EntityId(9), NOW), WindowScores::default());
    }

    #[test]
    fn test_record_and_query() {
        let scorer = Scorer::new();
        scorer.record(EntityId(1), Points(30), NOW.saturating_sub_secs(60));
        assert_eq!(scorer.scores_for(EntityId(1), NOW).daily, Points(30));
        assert_eq!(scorer.scores_for(EntityId(1), NOW).all_time, Points(30));
    }

    #[test]
    fn test_snapshot_covers_all_entities() {
        let scorer = Scorer::new();
        scorer.record(EntityId(1), Points(10), NOW);
        scorer.record(EntityId(2), Points(20), NOW);

        let mut views = scorer.snapshot(NOW);
        views.sort_by_key(|v| v.entity);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].scores.get(Window::Daily), Points(10));
        assert_eq!(views[1].scores.get(Window::Daily), Points(20));
    }

    #[test]
    fn test_concurrent_recording() {
        use std::thread;

        let scorer = Arc::new(Scorer::new());
        let mut handles = vec![];

        for i in 0..8u64 {
            let scorer = Arc::clone(&scorer);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    scorer.record(EntityId(i % 2), Points(1), NOW);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let total: u64 = (0..2)
            .map(|i| scorer.scores_for(EntityId(i), NOW).all_time.get())
            .sum();
        assert_eq!(total, 800);
    }
}
