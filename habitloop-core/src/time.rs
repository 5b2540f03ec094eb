//! Time utilities: zone resolution and local-day bucketing.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Resolve an IANA identifier like "America/Chicago".
pub fn resolve_tz(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| EngineError::TimezoneResolution(tz.to_string()))
}

/// The calendar date `at` falls on in `tz`.
pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Sunday of the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// ISO weekday number, 1 = Monday .. 7 = Sunday.
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
