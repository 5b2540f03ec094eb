//! Day-bucketed view of a habit's event log.
//!
//! Events are grouped by their local calendar date in the habit's timezone.
//! Within a bucket the latest check-in replaces earlier ones, and a miss is
//! inert once the bucket holds a check-in.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::event::{Event, EventKind};
use crate::habit::{Goal, Habit};
use crate::time::local_date;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckinEntry {
    pub at: DateTime<Utc>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub checkin: Option<CheckinEntry>,
    /// An explicit miss was recorded. Ignored when `checkin` is set.
    pub missed: bool,
}

impl DayBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            checkin: None,
            missed: false,
        }
    }

    pub fn is_satisfied(&self, goal: &Goal) -> bool {
        self.checkin.as_ref().is_some_and(|c| goal.is_met_by(c.value))
    }

    pub fn has_activity(&self) -> bool {
        self.checkin.is_some() || self.missed
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    tz: Tz,
    goal: Goal,
    buckets: BTreeMap<NaiveDate, DayBucket>,
}

impl Ledger {
    /// Validate `events` against `habit` and bucket the ones at or before `as_of`.
    ///
    /// Any malformed event fails the whole build.
    pub fn build(habit: &Habit, tz: Tz, events: &[Event], as_of: DateTime<Utc>) -> Result<Self> {
        for event in events {
            check_event(habit, event)?;
        }

        let created = habit.created_date(tz);
        let mut ordered: Vec<&Event> = events.iter().filter(|e| e.timestamp <= as_of).collect();
        ordered.sort_by_key(|e| e.timestamp);

        let skipped = events.len() - ordered.len();
        if skipped > 0 {
            debug!(habit_id = %habit.id, skipped, "ignoring events after as-of instant");
        }

        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        for event in ordered {
            let date = local_date(event.timestamp, tz);
            if date < created {
                // Only misses can land here; check_event rejects early check-ins.
                continue;
            }
            let bucket = buckets.entry(date).or_insert_with(|| DayBucket::empty(date));
            match event.kind {
                EventKind::Checkin => {
                    bucket.checkin = Some(CheckinEntry {
                        at: event.timestamp,
                        value: event.value,
                    });
                }
                EventKind::Miss => bucket.missed = true,
            }
        }

        Ok(Self {
            tz,
            goal: habit.goal,
            buckets,
        })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.buckets.get(&date)
    }

    pub fn is_satisfied(&self, date: NaiveDate) -> bool {
        self.get(date).is_some_and(|b| b.is_satisfied(&self.goal))
    }

    pub fn has_activity(&self, date: NaiveDate) -> bool {
        self.get(date).is_some_and(DayBucket::has_activity)
    }

    /// Earliest bucket holding any event; streak tracking starts here.
    pub fn first_activity(&self) -> Option<NaiveDate> {
        self.buckets.keys().next().copied()
    }

    /// Satisfied dates in `from..=to`, ascending.
    pub fn satisfied_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        if from > to {
            return Vec::new();
        }
        self.buckets
            .range(from..=to)
            .filter(|(_, b)| b.is_satisfied(&self.goal))
            .map(|(d, _)| *d)
            .collect()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &DayBucket> {
        self.buckets.values()
    }
}

fn check_event(habit: &Habit, event: &Event) -> Result<()> {
    if event.habit_id != habit.id {
        return Err(EngineError::event(
            &habit.id,
            format!("event belongs to habit '{}'", event.habit_id),
        ));
    }

    if let Some(v) = event.value {
        if !v.is_finite() || v < 0.0 {
            return Err(EngineError::event(
                &habit.id,
                format!("value must be a non-negative number, got {v}"),
            ));
        }
    }

    if event.kind == EventKind::Checkin {
        if habit.goal.requires_value() && event.value.is_none() {
            return Err(EngineError::event(
                &habit.id,
                format!("{} check-in at {} has no value", habit.goal.label(), event.timestamp),
            ));
        }
        if event.timestamp < habit.created_at {
            return Err(EngineError::event(
                &habit.id,
                format!(
                    "check-in at {} is before the habit was created ({})",
                    event.timestamp, habit.created_at
                ),
            ));
        }
    }

    Ok(())
}
