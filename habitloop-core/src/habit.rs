//! Habit configuration: goal type, schedule, grace allowance and timezone.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::time::{iso_weekday, local_date, resolve_tz};

/// What counts as doing the habit on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "goal_type", rename_all = "snake_case")]
pub enum Goal {
    /// Binary complete/incomplete.
    Check,
    /// Numeric target per occurrence (glasses of water, pages).
    Count { target_value: f64 },
    /// Minutes per occurrence.
    Duration { target_value: f64 },
}

impl Goal {
    /// Target a check-in value is compared against, if any.
    pub fn target(&self) -> Option<f64> {
        match self {
            Goal::Check => None,
            Goal::Count { target_value } | Goal::Duration { target_value } => Some(*target_value),
        }
    }

    /// Whether check-ins must carry a value.
    pub fn requires_value(&self) -> bool {
        self.target().is_some()
    }

    /// Whether a check-in with `value` meets the goal.
    pub fn is_met_by(&self, value: Option<f64>) -> bool {
        match (self.target(), value) {
            (None, _) => true,
            (Some(target), Some(v)) => v >= target,
            (Some(_), None) => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Goal::Check => "check",
            Goal::Count { .. } => "count",
            Goal::Duration { .. } => "duration",
        }
    }

    /// Build a goal from its wire tag and optional target.
    pub fn parse(kind: &str, target_value: Option<f64>) -> Result<Self> {
        let goal = match kind.trim().to_lowercase().as_str() {
            "check" => Goal::Check,
            "count" => Goal::Count {
                target_value: target_value.ok_or_else(|| {
                    EngineError::InvalidGoal("count goals need a target value".into())
                })?,
            },
            "duration" => Goal::Duration {
                target_value: target_value.ok_or_else(|| {
                    EngineError::InvalidGoal("duration goals need a target value".into())
                })?,
            },
            other => {
                return Err(EngineError::InvalidGoal(format!(
                    "goal type must be 'check', 'count', or 'duration', got '{other}'"
                )));
            }
        };
        goal.validate()?;
        Ok(goal)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.target() {
            if !target.is_finite() || target <= 0.0 {
                return Err(EngineError::InvalidGoal(format!(
                    "{} target must be a positive number, got {target}",
                    self.label()
                )));
            }
        }
        Ok(())
    }
}

/// Which calendar days the habit is expected on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Every calendar day.
    Daily,
    /// An explicit set of ISO weekdays (1 = Mon .. 7 = Sun).
    Weekly { days: Vec<u8> },
    /// `count` days of the user's choosing in each Monday-anchored week.
    TimesPerWeek { count: u8 },
}

/// Wire tag of a schedule, used when building one from loose parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Daily,
    Weekly,
    TimesPerWeek,
}

impl FromStr for ScheduleKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(ScheduleKind::Daily),
            "weekly" => Ok(ScheduleKind::Weekly),
            "times_per_week" | "timesperweek" => Ok(ScheduleKind::TimesPerWeek),
            other => Err(EngineError::InvalidSchedule(format!(
                "unrecognized schedule type '{other}'"
            ))),
        }
    }
}

impl Schedule {
    /// Build and validate a schedule from its tag plus the fields that tag uses.
    pub fn from_parts(kind: &str, days: &[u8], count: Option<u8>) -> Result<Self> {
        let schedule = match kind.parse::<ScheduleKind>()? {
            ScheduleKind::Daily => Schedule::Daily,
            ScheduleKind::Weekly => Schedule::Weekly {
                days: days.to_vec(),
            },
            ScheduleKind::TimesPerWeek => Schedule::TimesPerWeek {
                count: count.ok_or_else(|| {
                    EngineError::InvalidSchedule("times_per_week needs a count".into())
                })?,
            },
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Schedule::Daily => Ok(()),
            Schedule::Weekly { days } => {
                if days.is_empty() {
                    return Err(EngineError::InvalidSchedule(
                        "weekly schedule has no days".into(),
                    ));
                }
                if let Some(bad) = days.iter().find(|d| !(1..=7).contains(*d)) {
                    return Err(EngineError::InvalidSchedule(format!(
                        "weekday {bad} is outside 1 (Mon) ..= 7 (Sun)"
                    )));
                }
                Ok(())
            }
            Schedule::TimesPerWeek { count } => {
                if !(1..=7).contains(count) {
                    return Err(EngineError::InvalidSchedule(format!(
                        "times_per_week count must be 1..=7, got {count}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether `date` is a fixed scheduled day. Always false for `TimesPerWeek`,
    /// whose occurrences are chosen by the user.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        match self {
            Schedule::Daily => true,
            Schedule::Weekly { days } => days.contains(&iso_weekday(date)),
            Schedule::TimesPerWeek { .. } => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Schedule::Daily => "daily".to_string(),
            Schedule::Weekly { days } => {
                const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
                let mut sorted = days.clone();
                sorted.sort_unstable();
                sorted.dedup();
                let names: Vec<&str> = sorted
                    .iter()
                    .filter_map(|d| NAMES.get(usize::from(*d).wrapping_sub(1)).copied())
                    .collect();
                format!("weekly ({})", names.join("/"))
            }
            Schedule::TimesPerWeek { count } => format!("{count}x per week"),
        }
    }
}

/// A habit definition. Streak state is never stored here; it is derived from
/// the event log on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub goal: Goal,

    /// Missed occurrences per week that do not break the streak.
    pub grace_per_week: u32,

    /// IANA zone; day boundaries are computed here.
    pub timezone: String,

    pub schedule: Schedule,

    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// A daily check habit in UTC with one grace day, created at `created_at`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: None,
            goal: Goal::Check,
            grace_per_week: 1,
            timezone: "UTC".to_string(),
            schedule: Schedule::Daily,
            created_at,
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_grace(mut self, grace_per_week: u32) -> Self {
        self.grace_per_week = grace_per_week;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the whole configuration and resolve its zone.
    pub fn validate(&self) -> Result<Tz> {
        self.goal.validate()?;
        self.schedule.validate()?;
        resolve_tz(&self.timezone)
    }

    /// Local calendar date the habit was created on.
    pub fn created_date(&self, tz: Tz) -> NaiveDate {
        local_date(self.created_at, tz)
    }
}
