//! Spend coordinator configuration.

use pulse_primitives::Points;

/// Default cap on a single boost.
pub const DEFAULT_PER_ACTION_MAX: Points = Points(100);

/// Default cooldown window for repeat boosts of one entity.
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// Default number of boosts allowed per (account, entity) pair inside the
/// cooldown window.
pub const DEFAULT_MAX_SPENDS_PER_ENTITY: u32 = 3;

/// Limits enforced on every boost.
#[derive(Debug, Clone, Copy)]
pub struct SpendConfig {
    /// Largest amount a single boost may carry.
    pub per_action_max: Points,
    /// Trailing window for the per-entity cooldown.
    pub cooldown_secs: u64,
    /// Committed boosts allowed per (account, entity) inside the window.
    pub max_spends_per_entity: u32,
}

impl Default for SpendConfig {
    fn default() -> Self {
        Self {
            per_action_max: DEFAULT_PER_ACTION_MAX,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            max_spends_per_entity: DEFAULT_MAX_SPENDS_PER_ENTITY,
        }
    }
}
