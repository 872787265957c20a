//! Concurrency-safe spend coordinator.
//!
//! The coordinator is the only path by which a user boost becomes a ledger
//! spend plus a score event. It enforces the per-action amount cap, the
//! per (account, entity) cooldown, and the central atomicity invariant:
//! either both the debit and the score credit happen, or neither does.
//!
//! The prepare/commit shape makes that invariant structural rather than
//! transactional: the ledger reservation is a drop-guard, the score credit
//! is recorded while the reservation is live, and the commit that follows
//! is infallible. Any abort before commit unwinds the reservation and no
//! score event has been written yet.

mod config;
mod cooldown;
mod coordinator;
mod error;
mod metrics;

pub use config::{
    SpendConfig, DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_SPENDS_PER_ENTITY, DEFAULT_PER_ACTION_MAX,
};
pub use cooldown::CooldownTracker;
pub use coordinator::{BoostReceipt, SpendCoordinator};
pub use error::BoostError;
pub use metrics::BoostMetrics;
