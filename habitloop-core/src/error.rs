//! Error type for the habit engine.

use thiserror::Error;

/// Every failure the engine can report. All of them are local and recoverable;
/// a call either returns a complete result or one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed schedule configuration (unknown tag, empty or out-of-range days).
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Goal target that cannot be compared against (zero, negative, NaN).
    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    /// Event that cannot be attributed to an occurrence of its habit.
    #[error("invalid event for habit '{habit_id}': {reason}")]
    InvalidEvent { habit_id: String, reason: String },

    /// Zone identifier not found in the IANA database.
    #[error("unrecognized timezone: {0}")]
    TimezoneResolution(String),

    /// Stats window outside 1..=365 days.
    #[error("stats window must be between 1 and 365 days, got {0}")]
    InvalidWindow(u32),

    /// Externally supplied insight that is out of range.
    #[error("invalid insight: {0}")]
    InvalidInsight(String),
}

impl EngineError {
    pub(crate) fn event(habit_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            habit_id: habit_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
