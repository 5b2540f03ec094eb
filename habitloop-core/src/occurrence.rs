//! Occurrence enumeration and grace classification.
//!
//! Tracking starts at the first bucket with any event. From there every
//! scheduled occurrence up to today is judged, oldest first, so the earliest
//! unmet occurrences of a week are the ones that spend its grace.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, Schedule};
use crate::ledger::Ledger;
use crate::time::{week_end, week_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Satisfied,
    /// Unmet, but covered by the week's grace.
    Graced,
    Broken,
}

impl Standing {
    pub fn keeps_streak(&self) -> bool {
        !matches!(self, Standing::Broken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub standing: Standing,
}

/// Judged occurrences of `habit` up to `today`, ascending by date.
///
/// Today's occurrence is judged only once its bucket holds an event; until
/// then it is in progress and left out.
pub fn judge(habit: &Habit, ledger: &Ledger, today: NaiveDate) -> Vec<Occurrence> {
    let Some(start) = ledger.first_activity() else {
        return Vec::new();
    };
    if start > today {
        return Vec::new();
    }

    let outcomes = match &habit.schedule {
        Schedule::Daily | Schedule::Weekly { .. } => {
            fixed_days(&habit.schedule, ledger, start, today)
        }
        Schedule::TimesPerWeek { count } => weekly_quota(*count, ledger, start, today),
    };

    apply_grace(outcomes, habit.grace_per_week)
}

/// `(date, satisfied)` for every scheduled day in `start..=today`.
fn fixed_days(
    schedule: &Schedule,
    ledger: &Ledger,
    start: NaiveDate,
    today: NaiveDate,
) -> Vec<(NaiveDate, bool)> {
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .filter(|d| schedule.falls_on(*d))
        .filter(|d| *d < today || ledger.has_activity(*d))
        .map(|d| (d, ledger.is_satisfied(d)))
        .collect()
}

/// `(date, satisfied)` for a times-per-week habit.
///
/// Each week owes `min(count, days left in the week from tracking start)`
/// occurrences. Satisfied days count on their own date, at most the quota
/// (the latest ones win). A closed week's shortfall becomes unmet occurrences
/// on its Sunday; the current week only reports what is already done.
fn weekly_quota(
    count: u8,
    ledger: &Ledger,
    start: NaiveDate,
    today: NaiveDate,
) -> Vec<(NaiveDate, bool)> {
    let mut out = Vec::new();
    let current = week_start(today);
    let mut monday = week_start(start);

    while monday <= current {
        let sunday = week_end(monday);
        let first = monday.max(start);
        let quota = week_quota(count, first);

        let mut done = ledger.satisfied_between(first, sunday.min(today));
        if done.len() > quota {
            done.drain(..done.len() - quota);
        }
        let shortfall = quota - done.len();
        out.extend(done.into_iter().map(|d| (d, true)));

        if monday < current {
            out.extend(std::iter::repeat_n((sunday, false), shortfall));
        }

        monday += Duration::weeks(1);
    }

    out
}

/// Occurrences owed by the week containing `first`, counted from `first` on.
///
/// Only the week tracking starts in is shortened.
pub(crate) fn week_quota(count: u8, first: NaiveDate) -> usize {
    let open_days = (week_end(first) - first).num_days() + 1;
    i64::from(count).min(open_days) as usize
}

fn apply_grace(outcomes: Vec<(NaiveDate, bool)>, grace_per_week: u32) -> Vec<Occurrence> {
    let mut spent: HashMap<NaiveDate, u32> = HashMap::new();

    outcomes
        .into_iter()
        .map(|(date, satisfied)| {
            let standing = if satisfied {
                Standing::Satisfied
            } else {
                let used = spent.entry(week_start(date)).or_insert(0);
                if *used < grace_per_week {
                    *used += 1;
                    Standing::Graced
                } else {
                    Standing::Broken
                }
            };
            Occurrence { date, standing }
        })
        .collect()
}
