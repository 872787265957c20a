//! The purchase-to-grant adapter.

use std::sync::Arc;

use tracing::{info, warn};

use pulse_ledger::{Ledger, LedgerError};
use pulse_primitives::{AccountId, GrantId, GrantReason, Points, Timestamp};

use crate::price::PriceList;

/// Result of applying a purchase notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// First delivery: points were granted.
    Granted { grant_id: GrantId, points: Points },
    /// Redelivery of an already-applied purchase; nothing changed.
    AlreadyApplied,
}

/// Errors from [`PackageGrantAdapter::apply_purchase`].
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// Package name not on the price list.
    #[error("unknown point package {package:?}")]
    UnknownPackage { package: String },

    /// Ledger rejected the grant for a reason other than redelivery.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Applies completed purchases to the ledger, exactly once per payment id.
pub struct PackageGrantAdapter {
    ledger: Arc<Ledger>,
    prices: PriceList,
}

impl PackageGrantAdapter {
    /// Create an adapter over the shared ledger.
    pub fn new(ledger: Arc<Ledger>, prices: PriceList) -> Self {
        Self { ledger, prices }
    }

    /// The price list in effect.
    pub fn prices(&self) -> &PriceList {
        &self.prices
    }

    /// Grant the points for `package` to `account`, idempotently on
    /// `source_ref` (the payment/session id).
    pub fn apply_purchase(
        &self,
        account: AccountId,
        package: &str,
        source_ref: &str,
        at: Timestamp,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        let Some(points) = self.prices.points_for(package) else {
            warn!(%account, package, source_ref, "purchase for unknown package");
            return Err(PurchaseError::UnknownPackage { package: package.to_string() });
        };

        let reason = GrantReason::Purchase { package: package.to_string() };
        match self.ledger.grant(account, points, reason, source_ref, at) {
            Ok(grant_id) => {
                info!(%account, package, %points, source_ref, "purchase applied");
                Ok(PurchaseOutcome::Granted { grant_id, points })
            }
            Err(LedgerError::DuplicateSource { .. }) => {
                info!(%account, package, source_ref, "purchase already applied");
                Ok(PurchaseOutcome::AlreadyApplied)
            }
            Err(err) => {
                warn!(%account, package, source_ref, %err, "purchase grant failed");
                Err(err.into())
            }
        }
    }
}
