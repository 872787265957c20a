//! Engine configuration.

use pulse_leaderboard::LeaderboardConfig;
use pulse_primitives::Points;
use pulse_purchase::PriceList;
use pulse_spend::SpendConfig;

/// Default flat allowance granted once per UTC day.
pub const DEFAULT_DAILY_ALLOWANCE: Points = Points(50);

/// Default streak bonus per consecutive active day beyond the first.
pub const DEFAULT_STREAK_BONUS_PER_DAY: Points = Points(5);

/// Default cap on the streak bonus.
pub const DEFAULT_STREAK_BONUS_CAP: Points = Points(25);

/// Tunables for the whole engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Points granted once per UTC day on first activity.
    pub daily_allowance: Points,
    /// Bonus points per consecutive active day beyond the first.
    pub streak_bonus_per_day: Points,
    /// Upper bound on the streak bonus.
    pub streak_bonus_cap: Points,
    /// Spend coordinator limits.
    pub spend: SpendConfig,
    /// Leaderboard refresh policy.
    pub leaderboard: LeaderboardConfig,
    /// Point packages purchasable through the payment collaborator.
    pub prices: PriceList,
}

impl EngineConfig {
    /// Streak bonus for a streak of `streak_days`, zero for the first day.
    pub fn streak_bonus(&self, streak_days: u32) -> Points {
        if streak_days < 2 {
            return Points::ZERO;
        }
        let scaled = self
            .streak_bonus_per_day
            .get()
            .saturating_mul(u64::from(streak_days) - 1);
        Points(scaled).min(self.streak_bonus_cap)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_allowance: DEFAULT_DAILY_ALLOWANCE,
            streak_bonus_per_day: DEFAULT_STREAK_BONUS_PER_DAY,
            streak_bonus_cap: DEFAULT_STREAK_BONUS_CAP,
            spend: SpendConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            prices: PriceList::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_bonus_curve() {
        let config = EngineConfig::default();

        assert_eq!(config.streak_bonus(0), Points::ZERO);
        assert_eq!(config.streak_bonus(1), Points::ZERO);
        assert_eq!(config.streak_bonus(2), Points(5));
        assert_eq!(config.streak_bonus(4), Points(15));
        // Capped from day 7 on.
        assert_eq!(config.streak_bonus(7), Points(25));
        assert_eq!(config.streak_bonus(100), Points(25));
    }
}
