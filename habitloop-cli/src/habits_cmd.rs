use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::Args;
use habitloop_core::{
    completion_stats, evaluate, insight_feed, resolve_tz, Event, EventKind, ExternalInsights,
    Goal, Habit, HabitStatus, Schedule,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{HabitRecord, Store};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Display name
    #[arg(long)]
    pub title: String,

    /// Optional free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// check | count | duration
    #[arg(long, default_value = "check")]
    pub goal: String,

    /// Target per occurrence for count/duration goals (minutes for duration)
    #[arg(long)]
    pub target: Option<f64>,

    /// daily | weekly | times-per-week
    #[arg(long, default_value = "daily")]
    pub schedule: String,

    /// ISO weekdays for weekly schedules (1=Mon .. 7=Sun), comma separated
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<u8>,

    /// Occurrences per week for times-per-week schedules
    #[arg(long)]
    pub count: Option<u8>,

    /// Misses per week that do not break the streak (default from config)
    #[arg(long)]
    pub grace: Option<u32>,

    /// IANA timezone (default from config)
    #[arg(long)]
    pub timezone: Option<String>,
}

pub fn add(args: AddArgs, cfg: &Config) -> Result<()> {
    let habit = Habit {
        id: uuid::Uuid::new_v4().to_string(),
        title: args.title.trim().to_string(),
        notes: args.notes.filter(|n| !n.trim().is_empty()),
        goal: Goal::parse(&args.goal, args.target)?,
        grace_per_week: args.grace.unwrap_or(cfg.defaults.grace_per_week),
        timezone: args
            .timezone
            .unwrap_or_else(|| cfg.defaults.timezone.clone()),
        schedule: Schedule::from_parts(&args.schedule, &args.days, args.count)?,
        created_at: Utc::now(),
    };
    if habit.title.is_empty() {
        bail!("--title must not be empty");
    }
    habit.validate()?;

    let store = Store::open_default()?;
    store.add_habit(habit.clone())?;
    info!(habit_id = %habit.id, title = %habit.title, "created habit");

    println!("Created {} ({})", habit.title, habit.id);
    let status = evaluate(&habit, &[], habit.created_at)?;
    print_status(
        &HabitRecord {
            habit,
            insights: ExternalInsights::default(),
        },
        &status,
    );
    Ok(())
}

pub fn status(at: Option<String>, json: bool, cfg: &Config) -> Result<()> {
    let store = Store::open_default()?;
    let records = store.load_habits()?;
    if records.is_empty() {
        println!("No habits yet. Add one: habitloop add --title \"Drink water\"");
        return Ok(());
    }

    let as_of = status_as_of(at.as_deref(), cfg)?;

    let mut rows = Vec::new();
    for record in &records {
        let events = store.events_for(&record.habit.id)?;
        match evaluate(&record.habit, &events, as_of) {
            Ok(status) => rows.push((record, status)),
            Err(e) => {
                warn!(habit_id = %record.habit.id, error = %e, "habit could not be evaluated");
                if !json {
                    println!("[err ] {} | {} | id={}", record.habit.title, e, short_id(&record.habit.id));
                }
            }
        }
    }

    if json {
        let statuses: Vec<&HabitStatus> = rows.iter().map(|(_, s)| s).collect();
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    // Due first, then longest current streak.
    rows.sort_by(|(_, a), (_, b)| {
        (b.is_due_today && !b.done_today)
            .cmp(&(a.is_due_today && !a.done_today))
            .then(b.streak.length.cmp(&a.streak.length))
    });
    for (record, status) in &rows {
        print_status(record, status);
    }
    Ok(())
}

/// Append a check-in or miss, then report freshly computed state.
pub fn record(
    key: &str,
    kind: EventKind,
    value: Option<f64>,
    at: Option<String>,
    json: bool,
) -> Result<()> {
    let store = Store::open_default()?;
    let record = store.find(key)?;
    let tz = record.habit.validate()?;
    let timestamp = resolve_at(at.as_deref(), tz)?;

    let status = record_event(&store, &record.habit, kind, value, timestamp)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let verb = match kind {
            EventKind::Checkin => "Checked in",
            EventKind::Miss => "Marked missed",
        };
        println!("{verb}: {}", record.habit.title);
        print_status(&record, &status);
    }
    Ok(())
}

/// Evaluate the log with the new event included and append it only if that succeeds.
fn record_event(
    store: &Store,
    habit: &Habit,
    kind: EventKind,
    value: Option<f64>,
    timestamp: DateTime<Utc>,
) -> Result<HabitStatus> {
    let event = Event {
        habit_id: habit.id.clone(),
        timestamp,
        kind,
        value,
    };

    let mut events = store.events_for(&habit.id)?;
    events.push(event.clone());
    let as_of = timestamp.max(Utc::now());
    let status = evaluate(habit, &events, as_of)
        .with_context(|| format!("rejected {kind:?} for {}", habit.title))?;

    store.append_event(&event)?;
    info!(habit_id = %habit.id, ?kind, %timestamp, "appended event");
    Ok(status)
}

pub fn stats(key: &str, days: u32, at: Option<String>, json: bool) -> Result<()> {
    let store = Store::open_default()?;
    let record = store.find(key)?;
    let habit = &record.habit;
    let tz = habit.validate()?;
    let as_of = resolve_at(at.as_deref(), tz)?;
    let events = store.events_for(&habit.id)?;
    let stats = completion_stats(habit, &events, as_of, days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("# {} ({} .. {})\n", habit.title, stats.window_start, stats.window_end);
    println!(
        "Completions: {}/{} ({:.0}%)",
        stats.completions,
        stats.expected_occurrences,
        stats.completion_rate * 100.0
    );
    println!(
        "Average per day: {:.2} | Consistency: {:.2}",
        stats.average_daily, stats.consistency_score
    );
    println!(
        "Current streak: {}{}",
        stats.current_streak.length,
        if stats.current_streak.alive { "" } else { " (broken)" }
    );
    println!("Longest streak: {}", stats.longest_streak);
    match stats.last_completed {
        Some(d) => println!("Last completed: {d}"),
        None => println!("Last completed: never"),
    }

    if !stats.hour_distribution.is_empty() {
        println!("\nBy hour:");
        for (hour, n) in &stats.hour_distribution {
            println!("  {hour:02}:00  {}", "#".repeat(*n as usize));
        }
    }
    if !stats.weekday_distribution.is_empty() {
        const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        println!("\nBy weekday:");
        for (day, n) in &stats.weekday_distribution {
            let name = NAMES.get(usize::from(*day) - 1).copied().unwrap_or("?");
            println!("  {name}  {}", "#".repeat(*n as usize));
        }
    }
    Ok(())
}

pub fn feed(key: &str, at: Option<String>) -> Result<()> {
    let store = Store::open_default()?;
    let record = store.find(key)?;
    let tz = record.habit.validate()?;
    let as_of = resolve_at(at.as_deref(), tz)?;
    let events = store.events_for(&record.habit.id)?;
    let feed = insight_feed(&record.habit, &events, as_of)?;
    println!("{}", serde_json::to_string_pretty(&feed)?);
    Ok(())
}

pub fn insights(
    key: &str,
    best_hour: Option<u8>,
    prediction: Option<String>,
    clear: bool,
) -> Result<()> {
    let store = Store::open_default()?;
    let record = store.find(key)?;

    let insights = if clear {
        ExternalInsights::default()
    } else {
        let mut merged = record.insights.clone();
        if best_hour.is_some() {
            merged.best_hour = best_hour;
        }
        if prediction.is_some() {
            merged.prediction = prediction;
        }
        ExternalInsights::new(merged.best_hour, merged.prediction)?
    };

    let updated = store.set_insights(&record.habit.id, insights)?;
    info!(habit_id = %updated.habit.id, "updated external insights");
    println!("Updated insights for {}", updated.habit.title);
    print_insights(&updated.insights);
    Ok(())
}

/// `--at` accepts RFC 3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD" (local noon) in `tz`.
pub fn parse_at(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let ndt = match NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        Ok(ndt) => ndt,
        Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid --at '{s}': {e}"))?
            .and_hms_opt(12, 0, 0)
            .context("invalid --at date")?,
    };

    let local = tz
        .from_local_datetime(&ndt)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("local time does not exist (DST gap?): {s} {tz}"))?;
    Ok(local.with_timezone(&Utc))
}

/// Habits in a listing may each have their own zone, so a local `status --at`
/// is read in the configured default zone. Without `--at` no zone is needed.
fn status_as_of(at: Option<&str>, cfg: &Config) -> Result<DateTime<Utc>> {
    match at {
        Some(s) => parse_at(s, resolve_tz(&cfg.defaults.timezone)?),
        None => Ok(Utc::now()),
    }
}

fn resolve_at(at: Option<&str>, tz: Tz) -> Result<DateTime<Utc>> {
    match at {
        Some(s) => parse_at(s, tz),
        None => Ok(Utc::now()),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn describe_goal(goal: &Goal) -> String {
    match goal {
        Goal::Check => "check".to_string(),
        Goal::Count { target_value } => format!("count >= {target_value}"),
        Goal::Duration { target_value } => format!("{target_value} min"),
    }
}

fn print_status(record: &HabitRecord, status: &HabitStatus) {
    let habit = &record.habit;
    let marker = if status.done_today {
        "done"
    } else if status.is_due_today {
        "due "
    } else {
        "    "
    };
    let streak = if status.streak.alive {
        format!("streak {}", status.streak.length)
    } else {
        format!("streak {} (broken)", status.streak.length)
    };

    println!(
        "[{marker}] {} | {} | {} | {streak} | longest {} | id={}",
        habit.title,
        describe_goal(&habit.goal),
        habit.schedule.describe(),
        status.longest_streak,
        short_id(&habit.id)
    );
    print_insights(&record.insights);
}

fn print_insights(insights: &ExternalInsights) {
    if insights.is_empty() {
        return;
    }
    let hour = insights
        .best_hour
        .map(|h| format!("best hour {h:02}:00"))
        .unwrap_or_default();
    let prediction = insights
        .prediction
        .as_deref()
        .map(|p| format!("prediction {p}"))
        .unwrap_or_default();
    let parts: Vec<String> = [hour, prediction].into_iter().filter(|s| !s.is_empty()).collect();
    println!("       {}", parts.join(" | "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at_local_time() {
        // Feb is CST (UTC-6)
        let utc = parse_at("2026-02-20 23:59", chrono_tz::America::Chicago).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn test_parse_at_rfc3339_ignores_zone() {
        let utc = parse_at("2026-10-05T08:00:00+02:00", chrono_tz::Asia::Tokyo).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-10-05T06:00:00+00:00");
    }

    #[test]
    fn test_parse_at_date_is_local_noon() {
        let utc = parse_at("2026-10-05", chrono_tz::Europe::London).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-10-05T11:00:00+00:00");
    }

    #[test]
    fn test_parse_at_rejects_garbage() {
        assert!(parse_at("next tuesday", chrono_tz::UTC).is_err());
    }

    #[test]
    fn test_status_at_uses_config_zone_only_when_given() {
        let mut cfg = Config::default();
        cfg.defaults.timezone = "Mars/Olympus".to_string();
        assert!(status_as_of(None, &cfg).is_ok());
        assert!(status_as_of(Some("2026-10-05 09:00"), &cfg).is_err());

        cfg.defaults.timezone = "Asia/Tokyo".to_string();
        let utc = status_as_of(Some("2026-10-05 09:00"), &cfg).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-10-05T00:00:00+00:00");
    }

    fn count_habit() -> Habit {
        Habit::new("h1", "Water", Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap())
            .with_goal(Goal::Count { target_value: 8.0 })
    }

    #[test]
    fn test_rejected_event_is_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let habit = count_habit();
        store.add_habit(habit.clone()).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 5, 9, 0, 0).unwrap();

        // Count goals need a value.
        assert!(record_event(&store, &habit, EventKind::Checkin, None, at).is_err());
        assert!(store.events_for("h1").unwrap().is_empty());
        assert!(!dir.path().join("events.jsonl").exists());

        let status = record_event(&store, &habit, EventKind::Checkin, Some(8.0), at).unwrap();
        assert_eq!(status.habit_id, "h1");
        assert_eq!(store.events_for("h1").unwrap().len(), 1);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
