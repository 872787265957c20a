//! Score events and the recompute oracle.

use serde::{Deserialize, Serialize};

use pulse_primitives::{Points, Timestamp, Window};

/// One boost's contribution to an entity's score.
///
/// Logically distinct from the ledger's spend record: the ledger answers
/// "was this authorized", the event answers "when did this count".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub amount: Points,
    pub at: Timestamp,
}

/// Sum a window directly from a slice of events.
///
/// This is the reference implementation: simple, obviously correct, and the
/// oracle the bucketed counters in [`crate::EntityScores`] are tested
/// against. Window boundaries are inclusive on both ends - an event exactly
/// `d(W)` seconds old still counts, one second older does not.
pub fn recompute(events: &[ScoreEvent], window: Window, now: Timestamp) -> Points {
    let sum: u64 = match window.duration_secs() {
        None => events.iter().map(|e| e.amount.get()).sum(),
        Some(d) => {
            let cutoff = now.saturating_sub_secs(d);
            events
                .iter()
                .filter(|e| e.at >= cutoff && e.at <= now)
                .map(|e| e.amount.get())
                .sum()
        }
    };
    Points(sum)
}
