//! Streak calculation over judged occurrences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::prepare;
use crate::error::Result;
use crate::event::Event;
use crate::habit::Habit;
use crate::occurrence::{judge, Occurrence};

/// Current streak: consecutive satisfied-or-graced occurrences ending at the
/// most recent judged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub length: u32,
    /// False when the most recent judged occurrence broke the streak.
    pub alive: bool,
}

impl Default for StreakSummary {
    fn default() -> Self {
        Self {
            length: 0,
            alive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakReport {
    pub current: StreakSummary,
    pub longest: u32,
}

/// Fold ascending occurrences into the current and longest runs.
pub fn summarize(occurrences: &[Occurrence]) -> StreakReport {
    let mut run = 0u32;
    let mut longest = 0u32;

    for occ in occurrences {
        if occ.standing.keeps_streak() {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    let alive = occurrences
        .last()
        .is_none_or(|occ| occ.standing.keeps_streak());

    StreakReport {
        current: StreakSummary { length: run, alive },
        longest,
    }
}

/// Current streak of `habit` as of `as_of`, recomputed from `events`.
pub fn compute_streak(habit: &Habit, events: &[Event], as_of: DateTime<Utc>) -> Result<StreakSummary> {
    let prepared = prepare(habit, events, as_of)?;
    let occurrences = judge(habit, &prepared.ledger, prepared.today);
    Ok(summarize(&occurrences).current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::Standing;
    use chrono::NaiveDate;

    fn occ(day: u32, standing: Standing) -> Occurrence {
        Occurrence {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            standing,
        }
    }

    #[test]
    fn test_empty_history_is_alive_zero() {
        assert_eq!(
            summarize(&[]),
            StreakReport {
                current: StreakSummary { length: 0, alive: true },
                longest: 0
            }
        );
    }

    #[test]
    fn test_graced_occurrences_extend_the_run() {
        let report = summarize(&[
            occ(5, Standing::Satisfied),
            occ(6, Standing::Graced),
            occ(7, Standing::Satisfied),
        ]);
        assert_eq!(report.current, StreakSummary { length: 3, alive: true });
        assert_eq!(report.longest, 3);
    }

    #[test]
    fn test_break_resets_but_longest_survives() {
        let report = summarize(&[
            occ(5, Standing::Satisfied),
            occ(6, Standing::Satisfied),
            occ(7, Standing::Satisfied),
            occ(8, Standing::Broken),
            occ(9, Standing::Satisfied),
        ]);
        assert_eq!(report.current, StreakSummary { length: 1, alive: true });
        assert_eq!(report.longest, 3);
    }

    #[test]
    fn test_latest_break_marks_dead() {
        let report = summarize(&[occ(5, Standing::Satisfied), occ(6, Standing::Broken)]);
        assert_eq!(report.current, StreakSummary { length: 0, alive: false });
        assert_eq!(report.longest, 1);
    }
}
