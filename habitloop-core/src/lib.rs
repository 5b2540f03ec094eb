//! habitloop-core: habit scheduling and streak engine.
//!
//! Everything here is a pure function of (habit config, event log, as-of
//! instant). Nothing is cached; callers re-evaluate on every read.

pub mod due;
pub mod engine;
pub mod error;
pub mod event;
pub mod feed;
pub mod habit;
pub mod ledger;
pub mod occurrence;
pub mod stats;
pub mod streak;
pub mod time;

pub use due::is_due_today;
pub use engine::{evaluate, HabitStatus};
pub use error::{EngineError, Result};
pub use event::{Event, EventKind};
pub use feed::{insight_feed, ExternalInsights, FeedDay, InsightFeed};
pub use habit::{Goal, Habit, Schedule, ScheduleKind};
pub use ledger::{CheckinEntry, DayBucket, Ledger};
pub use occurrence::{judge, Occurrence, Standing};
pub use stats::{completion_stats, CompletionStats, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
pub use streak::{compute_streak, summarize, StreakReport, StreakSummary};
pub use time::{iso_weekday, local_date, resolve_tz, week_end, week_start};
