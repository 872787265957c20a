//! Rolling-window decay scoring over boost events.
//!
//! Turns a stream of timestamped score events per entity into scores over
//! five windows: daily, weekly, past-28-days, monthly, and all-time. The
//! score for a finite window at query time `t` is the sum of event amounts
//! with timestamps in `[t - d, t]` - a sliding-window sum in which an event
//! keeps its full weight until it ages out, then drops to zero.
//!
//! # Components
//!
//! - [`Scorer`] - per-entity registry and the recording/query entry points
//! - [`EntityScores`] - bucketed counters plus the retained event log
//! - [`recompute`] - the pure from-events oracle the bucketed path must match
//!
//! Timestamps are assigned by the spend coordinator at commit time; nothing
//! here trusts a client-supplied time.

mod entity;
mod event;
mod registry;

pub use entity::{EntityMeta, EntityScores};
pub use event::{recompute, ScoreEvent};
pub use registry::{EntityScoreView, Scorer};
