//! Due-today evaluation.

use chrono::{DateTime, NaiveDate, Utc};

use crate::engine::prepare;
use crate::error::Result;
use crate::event::Event;
use crate::habit::{Habit, Schedule};
use crate::ledger::Ledger;
use crate::occurrence::week_quota;
use crate::time::week_start;

/// Whether `habit` is due on the local date of `as_of`.
///
/// `events` only matter for times-per-week habits, which stop being due once
/// the week's quota is met. The week tracking starts in owes no more than the
/// days left in it, the same quota the streak judges against.
pub fn is_due_today(habit: &Habit, events: &[Event], as_of: DateTime<Utc>) -> Result<bool> {
    let prepared = prepare(habit, events, as_of)?;
    Ok(due_on(habit, &prepared.ledger, prepared.today))
}

pub(crate) fn due_on(habit: &Habit, ledger: &Ledger, today: NaiveDate) -> bool {
    let created = habit.created_date(ledger.tz());
    if today < created {
        return false;
    }

    match &habit.schedule {
        Schedule::Daily => true,
        Schedule::Weekly { .. } => habit.schedule.falls_on(today),
        Schedule::TimesPerWeek { count } => {
            let monday = week_start(today);
            let first = ledger.first_activity().unwrap_or(created).max(monday);
            let done = ledger.satisfied_between(monday, today).len();
            done < week_quota(*count, first)
        }
    }
}
