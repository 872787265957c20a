//! Package grant adapter.
//!
//! Translates an external "payment completed" notification into exactly one
//! point grant. Payment notifications are delivered at least once, so the
//! adapter is idempotent on the payment/session id: the first delivery
//! grants, every redelivery reports [`PurchaseOutcome::AlreadyApplied`]
//! without touching the ledger. Unknown package names fail closed - the
//! adapter never guesses an amount.

mod adapter;
mod price;

pub use adapter::{PackageGrantAdapter, PurchaseError, PurchaseOutcome};
pub use price::PriceList;
