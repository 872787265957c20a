//! Append-only point ledger with per-account balance accounting.
//!
//! The ledger is the source of truth for the points economy. It holds two
//! append-only logs (grants and spends) plus per-account running counters,
//! and guarantees by construction that no account ever spends more than it
//! was granted.
//!
//! # Components
//!
//! - [`Ledger`] - account registry and the grant/spend entry points
//! - [`AccountState`] - atomic per-account counters with a spend-serializing lock
//! - [`SpendReservation`] - prepare/commit guard for the two-phase boost path
//! - [`PointGrant`] / [`PointSpend`] - immutable audit records
//!
//! # Idempotency
//!
//! Grants are idempotent on `source_ref`, spends on the caller-supplied
//! idempotency key. A retried payment notification or a double-clicked boost
//! therefore has exactly one effect; the retry surfaces as
//! [`LedgerError::DuplicateSource`] / [`LedgerError::DuplicateSpend`].

mod account;
mod error;
mod record;
mod reservation;
mod store;

pub use account::{AccountState, StreakUpdate};
pub use error::LedgerError;
pub use record::{PointGrant, PointSpend};
pub use reservation::SpendReservation;
pub use store::Ledger;
