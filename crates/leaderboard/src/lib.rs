//! Materialized leaderboard over entity scores and promoter spend.
//!
//! The leaderboard is entirely derived state: safe to rebuild from the
//! scorer and ledger at any time, never a source of truth. Served snapshots
//! are immutable and swapped atomically - readers see either the old or the
//! new ranking, never a torn one, and mutating a returned entry has no
//! effect on stored state.

mod index;
mod snapshot;

pub use index::{LeaderboardConfig, LeaderboardIndex, DEFAULT_MAX_AGE_SECS};
pub use snapshot::{LeaderboardEntry, LeaderboardSnapshot, PromoterEntry};
