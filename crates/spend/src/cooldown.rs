//! Per (account, entity) cooldown tracking.
//!
//! Anti-spam: an account may land at most N boosts on one entity inside a
//! trailing window. A slot is claimed before the spend is prepared and
//! handed back if the spend aborts, so a rejected boost never burns
//! cooldown budget and concurrent boosts race for slots instead of all
//! passing a stale check.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use pulse_primitives::{AccountId, EntityId, Timestamp};

/// Sliding-window slot tracker.
pub struct CooldownTracker {
    window_secs: u64,
    max_hits: u32,
    hits: Mutex<HashMap<(AccountId, EntityId), VecDeque<Timestamp>>>,
}

impl CooldownTracker {
    /// Track up to `max_hits` slots per key within `window_secs`.
    pub fn new(window_secs: u64, max_hits: u32) -> Self {
        Self { window_secs, max_hits, hits: Mutex::new(HashMap::new()) }
    }

    /// Claim a slot at `now`.
    ///
    /// Check and claim are a single critical section: once this returns
    /// `Ok` the slot counts against the limit until it ages out or is
    /// handed back via [`release`](Self::release), so concurrent claims can
    /// never jointly exceed `max_hits`. Returns `Err(retry_after_secs)`
    /// when the budget is exhausted, where `retry_after_secs` is the time
    /// until the oldest counted slot ages out.
    pub fn claim(&self, account: AccountId, entity: EntityId, now: Timestamp) -> Result<(), u64> {
        let mut hits = self.hits.lock();
        let queue = hits.entry((account, entity)).or_default();
        Self::prune(queue, self.window_secs, now);

        if (queue.len() as u32) < self.max_hits {
            queue.push_back(now);
            return Ok(());
        }

        let retry_after = queue
            .front()
            .map(|oldest| (oldest.as_secs() + self.window_secs + 1).saturating_sub(now.as_secs()))
            .unwrap_or(0);
        if queue.is_empty() {
            hits.remove(&(account, entity));
        }
        Err(retry_after)
    }

    /// Hand back a slot claimed at `now` after an aborted spend.
    pub fn release(&self, account: AccountId, entity: EntityId, now: Timestamp) {
        let mut hits = self.hits.lock();
        let Some(queue) = hits.get_mut(&(account, entity)) else {
            return;
        };
        if let Some(pos) = queue.iter().rposition(|t| *t == now) {
            let _ = queue.remove(pos);
        }
        // Entries pruned or released down to nothing are dropped so the map
        // stays bounded by live keys.
        if queue.is_empty() {
            hits.remove(&(account, entity));
        }
    }

    fn prune(queue: &mut VecDeque<Timestamp>, window_secs: u64, now: Timestamp) {
        let cutoff = now.saturating_sub_secs(window_secs);
        while queue.front().is_some_and(|t| *t < cutoff) {
            queue.pop_front();
        }
    }
}
