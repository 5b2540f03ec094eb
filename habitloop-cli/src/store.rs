//! File-backed habit store.
//!
//! `habits.json` holds habit definitions (rewritten on change), `events.jsonl`
//! is an append-only log. No streak state is ever written.

use anyhow::{bail, Context, Result};
use habitloop_core::{Event, ExternalInsights, Habit};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_habitloop_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub habit: Habit,
    #[serde(default, skip_serializing_if = "ExternalInsights::is_empty")]
    pub insights: ExternalInsights,
}

pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&ensure_habitloop_home()?)
    }

    fn habits_path(&self) -> PathBuf {
        self.dir.join("habits.json")
    }

    fn events_path(&self) -> PathBuf {
        self.dir.join("events.jsonl")
    }

    pub fn load_habits(&self) -> Result<Vec<HabitRecord>> {
        let p = self.habits_path();
        if !p.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    fn save_habits(&self, records: &[HabitRecord]) -> Result<()> {
        let p = self.habits_path();
        let tmp = p.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &p).with_context(|| format!("replace {}", p.display()))?;
        Ok(())
    }

    pub fn add_habit(&self, habit: Habit) -> Result<()> {
        let mut records = self.load_habits()?;
        if records.iter().any(|r| r.habit.id == habit.id) {
            bail!("habit {} already exists", habit.id);
        }
        records.push(HabitRecord {
            habit,
            insights: ExternalInsights::default(),
        });
        self.save_habits(&records)
    }

    /// Look a habit up by full id or unique id prefix.
    pub fn find(&self, key: &str) -> Result<HabitRecord> {
        let records = self.load_habits()?;
        if let Some(exact) = records.iter().find(|r| r.habit.id == key) {
            return Ok(exact.clone());
        }

        let matches: Vec<&HabitRecord> = records
            .iter()
            .filter(|r| r.habit.id.starts_with(key))
            .collect();
        match matches.as_slice() {
            [one] => Ok((*one).clone()),
            [] => bail!("no habit matches '{key}' (see: habitloop list)"),
            _ => bail!("'{key}' matches {} habits; use a longer id", matches.len()),
        }
    }

    pub fn set_insights(&self, habit_id: &str, insights: ExternalInsights) -> Result<HabitRecord> {
        let mut records = self.load_habits()?;
        let record = records
            .iter_mut()
            .find(|r| r.habit.id == habit_id)
            .with_context(|| format!("habit {habit_id} not found"))?;
        record.insights = insights;
        let updated = record.clone();
        self.save_habits(&records)?;
        Ok(updated)
    }

    pub fn append_event(&self, event: &Event) -> Result<()> {
        let p = self.events_path();
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .with_context(|| format!("open {}", p.display()))?;
        let line = serde_json::to_string(event)?;
        writeln!(f, "{line}").with_context(|| format!("append {}", p.display()))?;
        Ok(())
    }

    pub fn events_for(&self, habit_id: &str) -> Result<Vec<Event>> {
        let p = self.events_path();
        if !p.exists() {
            return Ok(Vec::new());
        }
        let f = fs::File::open(&p).with_context(|| format!("open {}", p.display()))?;

        let mut out = Vec::new();
        for (i, line) in BufReader::new(f).lines().enumerate() {
            let line = line.with_context(|| format!("read {}", p.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("parse {} line {}", p.display(), i + 1))?;
            if event.habit_id == habit_id {
                out.push(event);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn habit(id: &str) -> Habit {
        Habit::new(id, "Stretch", Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_habits_persist_and_resolve_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.add_habit(habit("abc123")).unwrap();
        store.add_habit(habit("abd456")).unwrap();

        assert_eq!(store.load_habits().unwrap().len(), 2);
        assert_eq!(store.find("abc").unwrap().habit.id, "abc123");
        assert!(store.find("ab").is_err());
        assert!(store.find("zzz").is_err());
        assert!(store.add_habit(habit("abc123")).is_err());
    }

    #[test]
    fn test_events_are_appended_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 5, 8, 0, 0).unwrap();

        store.append_event(&Event::checkin("a", at)).unwrap();
        store.append_event(&Event::miss("b", at)).unwrap();
        store.append_event(&Event::checkin("a", at).with_value(3.0)).unwrap();

        let events = store.events_for("a").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].value, Some(3.0));
        assert_eq!(store.events_for("b").unwrap().len(), 1);
    }

    #[test]
    fn test_insights_are_stored_with_habit() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.add_habit(habit("h1")).unwrap();

        let insights = ExternalInsights::new(Some(7), Some("high".into())).unwrap();
        store.set_insights("h1", insights.clone()).unwrap();
        assert_eq!(store.find("h1").unwrap().insights, insights);
    }
}
