//! Promotion engine facade.
//!
//! Wires the ledger, scorer, spend coordinator, leaderboard index and
//! package grant adapter together behind the interface the surrounding
//! application calls: boost, account summary, entity scores, leaderboards,
//! and purchase application. Page renderers only ever read from here; the
//! sole mutation paths are [`PromotionEngine::boost`] and
//! [`PromotionEngine::apply_purchase`].

mod config;
mod engine;
mod metadata;

pub use config::{
    EngineConfig, DEFAULT_DAILY_ALLOWANCE, DEFAULT_STREAK_BONUS_CAP,
    DEFAULT_STREAK_BONUS_PER_DAY,
};
pub use engine::{AccountSummary, PromotionEngine};
pub use metadata::{MetadataError, MetadataSource};

pub use pulse_leaderboard::{LeaderboardEntry, PromoterEntry};
pub use pulse_primitives::{
    AccountId, EntityId, Points, Region, Timestamp, Window, WindowScores,
};
pub use pulse_purchase::{PurchaseError, PurchaseOutcome};
pub use pulse_scoring::EntityMeta;
pub use pulse_spend::{BoostError, BoostReceipt};
