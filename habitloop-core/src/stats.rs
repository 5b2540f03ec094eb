//! Completion statistics over a trailing window of days.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::prepare;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::habit::{Habit, Schedule};
use crate::occurrence::judge;
use crate::streak::{summarize, StreakSummary};
use crate::time::{iso_weekday, week_end, week_start};

pub const MAX_WINDOW_DAYS: u32 = 365;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub habit_id: String,
    pub window_days: u32,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,

    /// Occurrences the schedule asked for inside the window.
    pub expected_occurrences: u32,
    /// Days in the window with a satisfying check-in.
    pub completions: u32,
    /// `completions / expected_occurrences`, capped at 1.0.
    pub completion_rate: f64,
    /// `completions / window_days`.
    pub average_daily: f64,
    /// 1.0 for an even spread of completions across the window, lower as it gets lumpier.
    pub consistency_score: f64,

    /// Local hour (0-23) of each completion.
    pub hour_distribution: BTreeMap<u32, u32>,
    /// ISO weekday (1 = Mon) of each completion.
    pub weekday_distribution: BTreeMap<u8, u32>,

    pub last_completed: Option<NaiveDate>,
    pub current_streak: StreakSummary,
    pub longest_streak: u32,
}

/// Stats for the `days` local days ending today (clipped to the creation date).
pub fn completion_stats(
    habit: &Habit,
    events: &[Event],
    as_of: DateTime<Utc>,
    days: u32,
) -> Result<CompletionStats> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(EngineError::InvalidWindow(days));
    }

    let prepared = prepare(habit, events, as_of)?;
    let (tz, today, ledger) = (prepared.tz, prepared.today, &prepared.ledger);

    let created = habit.created_date(tz);
    let window_start = (today - Duration::days(i64::from(days) - 1)).max(created);
    let window_end = today;

    let completed = ledger.satisfied_between(window_start, window_end);

    let mut hour_distribution = BTreeMap::new();
    let mut weekday_distribution = BTreeMap::new();
    for date in &completed {
        if let Some(checkin) = ledger.get(*date).and_then(|b| b.checkin) {
            let hour = checkin.at.with_timezone(&tz).hour();
            *hour_distribution.entry(hour).or_insert(0) += 1;
        }
        *weekday_distribution.entry(iso_weekday(*date)).or_insert(0) += 1;
    }

    let expected = expected_occurrences(&habit.schedule, window_start, window_end);
    let completions = completed.len() as u32;
    let completion_rate = if expected == 0 {
        0.0
    } else {
        (f64::from(completions) / f64::from(expected)).min(1.0)
    };

    let average_daily = f64::from(completions) / f64::from(days);
    let daily_counts: Vec<f64> = window_start
        .iter_days()
        .take_while(|d| *d <= window_end)
        .map(|d| if ledger.is_satisfied(d) { 1.0 } else { 0.0 })
        .collect();

    let report = summarize(&judge(habit, ledger, today));

    Ok(CompletionStats {
        habit_id: habit.id.clone(),
        window_days: days,
        window_start,
        window_end,
        expected_occurrences: expected,
        completions,
        completion_rate,
        average_daily,
        consistency_score: consistency_score(&daily_counts),
        hour_distribution,
        weekday_distribution,
        last_completed: ledger.satisfied_between(created, today).last().copied(),
        current_streak: report.current,
        longest_streak: report.longest,
    })
}

/// `max(0, 1 - var / (mean + 1))` over per-day completion counts.
fn consistency_score(daily_counts: &[f64]) -> f64 {
    if daily_counts.iter().all(|n| *n == 0.0) {
        return 0.0;
    }
    let n = daily_counts.len() as f64;
    let mean = daily_counts.iter().sum::<f64>() / n;
    let var = daily_counts.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (1.0 - var / (mean + 1.0)).max(0.0)
}

fn expected_occurrences(schedule: &Schedule, from: NaiveDate, to: NaiveDate) -> u32 {
    if from > to {
        return 0;
    }

    match schedule {
        Schedule::Daily | Schedule::Weekly { .. } => from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| schedule.falls_on(*d))
            .count() as u32,
        Schedule::TimesPerWeek { count } => {
            let mut total = 0u32;
            let mut monday = week_start(from);
            while monday <= to {
                let first = monday.max(from);
                let last = week_end(monday).min(to);
                let open_days = (last - first).num_days() as u32 + 1;
                total += u32::from(*count).min(open_days);
                monday += Duration::weeks(1);
            }
            total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn test_window_bounds_are_validated() {
        let habit = Habit::new("h", "Walk", at(1, 0));
        assert_eq!(
            completion_stats(&habit, &[], at(10, 0), 0),
            Err(EngineError::InvalidWindow(0))
        );
        assert_eq!(
            completion_stats(&habit, &[], at(10, 0), 366),
            Err(EngineError::InvalidWindow(366))
        );
    }

    #[test]
    fn test_daily_window_clipped_to_creation() {
        let habit = Habit::new("h", "Walk", at(5, 0));
        let events = vec![
            Event::checkin("h", at(5, 7)),
            Event::checkin("h", at(6, 7)),
            Event::checkin("h", at(8, 21)),
        ];
        let stats = completion_stats(&habit, &events, at(9, 12), 30).unwrap();
        assert_eq!(stats.window_start, date(5));
        assert_eq!(stats.window_end, date(9));
        assert_eq!(stats.expected_occurrences, 5);
        assert_eq!(stats.completions, 3);
        assert!((stats.completion_rate - 0.6).abs() < 1e-9);
        assert_eq!(stats.hour_distribution.get(&7), Some(&2));
        assert_eq!(stats.hour_distribution.get(&21), Some(&1));
        assert_eq!(stats.weekday_distribution.get(&1), Some(&1));
        assert_eq!(stats.last_completed, Some(date(8)));
        // 3 of 30 requested days.
        assert!((stats.average_daily - 0.1).abs() < 1e-9);
        // Five days, three done: mean 0.6, variance 0.24.
        assert!((stats.consistency_score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_unbroken_window_is_fully_consistent() {
        let habit = Habit::new("h", "Walk", at(5, 0));
        let events: Vec<Event> = (5..=9).map(|d| Event::checkin("h", at(d, 7))).collect();
        let stats = completion_stats(&habit, &events, at(9, 12), 5).unwrap();
        assert!((stats.average_daily - 1.0).abs() < 1e-9);
        assert!((stats.consistency_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_completions_scores_zero() {
        let habit = Habit::new("h", "Walk", at(5, 0));
        let events = vec![Event::miss("h", at(6, 7))];
        let stats = completion_stats(&habit, &events, at(9, 12), 7).unwrap();
        assert_eq!(stats.average_daily, 0.0);
        assert_eq!(stats.consistency_score, 0.0);
        assert_eq!(consistency_score(&[]), 0.0);
    }

    #[test]
    fn test_hours_are_local() {
        let habit = Habit::new("h", "Walk", at(5, 0)).with_timezone("Asia/Tokyo");
        // 23:00 UTC on the 5th is 08:00 on the 6th in Tokyo.
        let events = vec![Event::checkin("h", at(5, 23))];
        let stats = completion_stats(&habit, &events, at(6, 12), 7).unwrap();
        assert_eq!(stats.hour_distribution.get(&8), Some(&1));
        assert_eq!(stats.last_completed, Some(date(6)));
    }

    #[test]
    fn test_times_per_week_expectation() {
        let schedule = Schedule::TimesPerWeek { count: 3 };
        // Mon 5th .. Sun 18th: two full weeks.
        assert_eq!(expected_occurrences(&schedule, date(5), date(18)), 6);
        // Sat 10th .. Tue 13th: two days, then two days.
        assert_eq!(expected_occurrences(&schedule, date(10), date(13)), 4);
    }

    #[test]
    fn test_weekly_expectation() {
        let schedule = Schedule::Weekly { days: vec![1, 3, 5] };
        assert_eq!(expected_occurrences(&schedule, date(5), date(11)), 3);
        assert_eq!(expected_occurrences(&schedule, date(6), date(6)), 0);
    }
}
