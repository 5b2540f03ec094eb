//! Single entry point producing the full status triple for one habit.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::due::due_on;
use crate::error::Result;
use crate::event::Event;
use crate::habit::Habit;
use crate::ledger::Ledger;
use crate::occurrence::judge;
use crate::streak::{summarize, StreakSummary};
use crate::time::local_date;

/// Fresh state of a habit, derived from its event log. Never persisted as
/// ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit_id: String,
    /// Habit-local date the status was evaluated for.
    pub local_date: NaiveDate,
    pub is_due_today: bool,
    /// Today's bucket already holds a satisfying check-in.
    pub done_today: bool,
    pub streak: StreakSummary,
    pub longest_streak: u32,
}

pub(crate) struct Prepared {
    pub tz: Tz,
    pub today: NaiveDate,
    pub ledger: Ledger,
}

/// Validate inputs and bucket the log. Shared by every public computation so
/// they all fail (or succeed) the same way.
pub(crate) fn prepare(habit: &Habit, events: &[Event], as_of: DateTime<Utc>) -> Result<Prepared> {
    let tz = habit.validate()?;
    let ledger = Ledger::build(habit, tz, events, as_of)?;
    Ok(Prepared {
        tz,
        today: local_date(as_of, tz),
        ledger,
    })
}

/// Evaluate due-today, current streak and longest streak in one pass.
pub fn evaluate(habit: &Habit, events: &[Event], as_of: DateTime<Utc>) -> Result<HabitStatus> {
    let Prepared { tz, today, ledger } = prepare(habit, events, as_of)?;
    let occurrences = judge(habit, &ledger, today);
    let report = summarize(&occurrences);

    let status = HabitStatus {
        habit_id: habit.id.clone(),
        local_date: today,
        is_due_today: due_on(habit, &ledger, today),
        done_today: ledger.is_satisfied(today),
        streak: report.current,
        longest_streak: report.longest,
    };

    debug!(
        habit_id = %habit.id,
        tz = %tz,
        %today,
        judged = occurrences.len(),
        streak = status.streak.length,
        alive = status.streak.alive,
        "evaluated habit"
    );

    Ok(status)
}
