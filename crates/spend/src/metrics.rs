//! Spend coordinator metrics.

use metrics::Counter;

use crate::error::BoostError;

/// Boost-path counters.
#[derive(Clone, Debug)]
pub struct BoostMetrics {
    /// Committed boosts.
    pub(crate) accepted_total: Counter,
    /// Rejections with an invalid amount.
    pub(crate) rejected_invalid_amount_total: Counter,
    /// Rejections for insufficient balance.
    pub(crate) rejected_insufficient_total: Counter,
    /// Rejections for a reused idempotency key.
    pub(crate) rejected_duplicate_total: Counter,
    /// Rejections by the cooldown limiter.
    pub(crate) rejected_rate_limited_total: Counter,
}

impl Default for BoostMetrics {
    fn default() -> Self {
        Self {
            accepted_total: metrics::counter!("boost.accepted_total"),
            rejected_invalid_amount_total: metrics::counter!(
                "boost.rejected.invalid_amount_total"
            ),
            rejected_insufficient_total: metrics::counter!(
                "boost.rejected.insufficient_balance_total"
            ),
            rejected_duplicate_total: metrics::counter!("boost.rejected.duplicate_spend_total"),
            rejected_rate_limited_total: metrics::counter!("boost.rejected.rate_limited_total"),
        }
    }
}

impl BoostMetrics {
    pub(crate) fn record_accepted(&self) {
        self.accepted_total.increment(1);
    }

    pub(crate) fn record_rejected(&self, err: &BoostError) {
        match err {
            BoostError::InvalidAmount { .. } => self.rejected_invalid_amount_total.increment(1),
            BoostError::InsufficientBalance { .. } => {
                self.rejected_insufficient_total.increment(1)
            }
            BoostError::DuplicateSpend { .. } => self.rejected_duplicate_total.increment(1),
            BoostError::RateLimited { .. } => self.rejected_rate_limited_total.increment(1),
        }
    }
}
