//! Check-in / miss events. Appended immutably; never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Checkin,
    Miss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub habit_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,

    /// Amount for count/duration goals. Only meaningful on check-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Event {
    pub fn checkin(habit_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            habit_id: habit_id.into(),
            timestamp,
            kind: EventKind::Checkin,
            value: None,
        }
    }

    pub fn miss(habit_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            habit_id: habit_id.into(),
            timestamp,
            kind: EventKind::Miss,
            value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}
