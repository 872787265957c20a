//! Scoring windows.

use serde::{Deserialize, Serialize};

use crate::time::SECS_PER_DAY;
use crate::Points;

/// A fixed lookback duration over which an entity's score is summed.
///
/// Scores are sliding-window sums: an event contributes its full weight
/// while inside the window and drops to zero once it ages out.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Window {
    /// Trailing 24 hours.
    #[default]
    Daily,
    /// Trailing 7 days.
    Weekly,
    /// Trailing 28 days.
    Past28Days,
    /// Trailing 30 days.
    Monthly,
    /// Unbounded.
    AllTime,
}

impl Window {
    /// Window duration in seconds, `None` for [`Window::AllTime`].
    pub const fn duration_secs(self) -> Option<u64> {
        match self {
            Window::Daily => Some(SECS_PER_DAY),
            Window::Weekly => Some(7 * SECS_PER_DAY),
            Window::Past28Days => Some(28 * SECS_PER_DAY),
            Window::Monthly => Some(30 * SECS_PER_DAY),
            Window::AllTime => None,
        }
    }
}

/// An entity's score across every window, at one query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowScores {
    pub daily: Points,
    pub weekly: Points,
    pub past_28_days: Points,
    pub monthly: Points,
    pub all_time: Points,
}

impl WindowScores {
    /// Score for one window.
    pub const fn get(&self, window: Window) -> Points {
        match window {
            Window::Daily => self.daily,
            Window::Weekly => self.weekly,
            Window::Past28Days => self.past_28_days,
            Window::Monthly => self.monthly,
            Window::AllTime => self.all_time,
        }
    }

    /// Set the score for one window.
    pub fn set(&mut self, window: Window, score: Points) {
        match window {
            Window::Daily => self.daily = score,
            Window::Weekly => self.weekly = score,
            Window::Past28Days => self.past_28_days = score,
            Window::Monthly => self.monthly = score,
            Window::AllTime => self.all_time = score,
        }
    }
}
