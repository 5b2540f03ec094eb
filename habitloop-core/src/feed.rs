//! Boundary with the external analytics service.
//!
//! The engine does not compute reminder hours or success predictions. It hands
//! the service a stable snapshot of config + bucketed history, and carries the
//! service's answers around untouched.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::prepare;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::habit::Habit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDay {
    pub date: NaiveDate,
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Local hour of the check-in, 0-23.
    pub local_hour: Option<u32>,
    pub value: Option<f64>,
    pub satisfied: bool,
    /// Explicit miss with no check-in that day.
    pub missed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightFeed {
    pub generated_at: DateTime<Utc>,
    pub habit: Habit,
    pub days: Vec<FeedDay>,
}

/// Build the analytics snapshot for `habit` as of `as_of`.
pub fn insight_feed(habit: &Habit, events: &[Event], as_of: DateTime<Utc>) -> Result<InsightFeed> {
    let prepared = prepare(habit, events, as_of)?;
    let tz = prepared.tz;

    let days = prepared
        .ledger
        .buckets()
        .map(|bucket| FeedDay {
            date: bucket.date,
            checked_in_at: bucket.checkin.map(|c| c.at),
            local_hour: bucket.checkin.map(|c| c.at.with_timezone(&tz).hour()),
            value: bucket.checkin.and_then(|c| c.value),
            satisfied: bucket.is_satisfied(&habit.goal),
            missed: bucket.missed && bucket.checkin.is_none(),
        })
        .collect();

    Ok(InsightFeed {
        generated_at: as_of,
        habit: habit.clone(),
        days,
    })
}

/// Values produced by the analytics service, shown as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInsights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
}

impl ExternalInsights {
    pub fn new(best_hour: Option<u8>, prediction: Option<String>) -> Result<Self> {
        if let Some(hour) = best_hour {
            if hour > 23 {
                return Err(EngineError::InvalidInsight(format!(
                    "best hour must be 0-23, got {hour}"
                )));
            }
        }
        Ok(Self {
            best_hour,
            prediction: prediction
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.best_hour.is_none() && self.prediction.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Goal;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_feed_shape() {
        let habit = Habit::new("h", "Water", at(5, 0))
            .with_goal(Goal::Count { target_value: 8.0 })
            .with_timezone("Europe/Paris");
        let events = vec![
            Event::checkin("h", at(5, 7)).with_value(8.0),
            Event::miss("h", at(6, 20)),
            Event::checkin("h", at(7, 18)).with_value(5.0),
        ];
        let feed = insight_feed(&habit, &events, at(8, 0)).unwrap();
        assert_eq!(feed.days.len(), 3);

        // 07:00 UTC is 09:00 in Paris (CEST).
        assert_eq!(feed.days[0].local_hour, Some(9));
        assert!(feed.days[0].satisfied);
        assert!(feed.days[1].missed);
        assert!(!feed.days[2].satisfied);
        assert_eq!(feed.days[2].value, Some(5.0));

        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["habit"]["goal_type"], "count");
        assert_eq!(json["days"][0]["date"], "2026-10-05");
    }

    #[test]
    fn test_external_insights_validation() {
        assert!(ExternalInsights::new(Some(24), None).is_err());
        let insights = ExternalInsights::new(Some(9), Some("  ".into())).unwrap();
        assert_eq!(insights.best_hour, Some(9));
        assert_eq!(insights.prediction, None);
        assert!(ExternalInsights::default().is_empty());
    }
}
