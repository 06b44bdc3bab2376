use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HabitError, Result};
use crate::evaluate::{evaluate, LogValue, RawValue};
use crate::habit::Habit;
use crate::ids::IdSource;

/// One evaluated entry for one habit on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: String,
    pub habit_id: String,
    pub date: NaiveDate,
    pub done: bool,
    #[serde(rename = "numericValue", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LogValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HabitLog {
    pub fn matches(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.habit_id == habit_id && self.date == date
    }
}

/// Calendar day key of an instant, taken from its UTC date.
pub fn date_key(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Evaluates `raw` for `habit` and builds a fresh record for `date`.
///
/// Every call mints a new id. When the habit allows notes the note of `prior`
/// is carried forward, otherwise the note is dropped.
pub fn build_log(
    habit: &Habit,
    date: NaiveDate,
    raw: &RawValue,
    prior: Option<&HabitLog>,
    ids: &dyn IdSource,
) -> HabitLog {
    let evaluation = evaluate(habit, raw);
    let note = habit
        .allow_notes
        .then(|| prior.and_then(|log| log.note.clone()).unwrap_or_default());
    HabitLog {
        id: ids.new_id(),
        habit_id: habit.id.clone(),
        date,
        done: evaluation.done,
        value: evaluation.stored,
        note,
    }
}

/// Rebuilds `log` with a new note, keeping its evaluated state.
pub fn with_note(habit: &Habit, log: &HabitLog, note: &str, ids: &dyn IdSource) -> Result<HabitLog> {
    if !habit.allow_notes {
        return Err(HabitError::NotesDisabled(habit.id.clone()));
    }
    Ok(HabitLog {
        id: ids.new_id(),
        note: Some(note.to_string()),
        ..log.clone()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced { index: usize },
}

/// Flat log collection holding at most one record per `(habit_id, date)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogStore {
    logs: Vec<HabitLog>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapses duplicate natural keys: the last record wins and keeps the
    /// first record's position.
    pub fn from_logs(logs: Vec<HabitLog>) -> Self {
        let mut slots: HashMap<(String, NaiveDate), usize> = HashMap::new();
        let mut kept: Vec<HabitLog> = Vec::with_capacity(logs.len());
        for log in logs {
            let key = (log.habit_id.clone(), log.date);
            match slots.get(&key) {
                Some(&index) => {
                    warn!(
                        habit_id = %log.habit_id,
                        date = %log.date,
                        dropped = %kept[index].id,
                        "collapsing duplicate log"
                    );
                    kept[index] = log;
                }
                None => {
                    slots.insert(key, kept.len());
                    kept.push(log);
                }
            }
        }
        Self { logs: kept }
    }

    pub fn get_log(&self, habit_id: &str, date: NaiveDate) -> Option<&HabitLog> {
        self.logs.iter().find(|log| log.matches(habit_id, date))
    }

    /// Replaces the record with the same id, or else the record with the same
    /// natural key, in place. Appends when neither exists.
    pub fn upsert(&mut self, log: HabitLog) -> Upsert {
        let position = self
            .logs
            .iter()
            .position(|existing| existing.id == log.id)
            .or_else(|| {
                self.logs
                    .iter()
                    .position(|existing| existing.matches(&log.habit_id, log.date))
            });
        match position {
            Some(index) => {
                self.logs[index] = log;
                Upsert::Replaced { index }
            }
            None => {
                self.logs.push(log);
                Upsert::Inserted
            }
        }
    }

    pub fn logs_for_habit<'a>(&'a self, habit_id: &'a str) -> impl Iterator<Item = &'a HabitLog> {
        self.logs.iter().filter(move |log| log.habit_id == habit_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HabitLog> {
        self.logs.iter()
    }

    pub fn as_slice(&self) -> &[HabitLog] {
        &self.logs
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{HabitType, NumericUpdate};
    use crate::ids::SequentialIdSource;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn water() -> Habit {
        let mut habit = Habit::new("water", "Water", HabitType::Numeric).unwrap();
        habit
            .update_numeric(NumericUpdate {
                threshold: Some(8.0),
                ..NumericUpdate::default()
            })
            .unwrap();
        habit
    }

    #[test]
    fn date_key_uses_utc_calendar_day() {
        let late = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        assert_eq!(date_key(late), day(2024, 3, 15));
        let serialized = serde_json::to_value(date_key(late)).unwrap();
        assert_eq!(serialized, "2024-03-15");
    }

    #[test]
    fn rebuilt_logs_get_fresh_ids_and_replace_in_place() {
        let ids = SequentialIdSource::new("log");
        let habit = water();
        let mut store = LogStore::new();
        let other = Habit::new("read", "Read", HabitType::Boolean).unwrap();
        store.upsert(build_log(&other, day(2024, 3, 15), &RawValue::Flag(true), None, &ids));

        let first = build_log(&habit, day(2024, 3, 15), &RawValue::Number(3.0), None, &ids);
        assert_eq!(store.upsert(first.clone()), Upsert::Inserted);

        let prior = store.get_log("water", day(2024, 3, 15));
        let second = build_log(&habit, day(2024, 3, 15), &RawValue::Number(9.0), prior, &ids);
        assert_ne!(first.id, second.id);
        assert_eq!(store.upsert(second), Upsert::Replaced { index: 1 });

        assert_eq!(store.len(), 2);
        let current = store.get_log("water", day(2024, 3, 15)).unwrap();
        assert!(current.done);
        assert_eq!(current.value, Some(LogValue::Number(9.0)));
    }

    #[test]
    fn different_days_do_not_collide() {
        let ids = SequentialIdSource::new("log");
        let habit = water();
        let mut store = LogStore::new();
        store.upsert(build_log(&habit, day(2024, 3, 15), &RawValue::Number(8.0), None, &ids));
        store.upsert(build_log(&habit, day(2024, 3, 16), &RawValue::Number(1.0), None, &ids));
        assert_eq!(store.logs_for_habit("water").count(), 2);
        assert!(store.get_log("water", day(2024, 3, 15)).unwrap().done);
        assert!(!store.get_log("water", day(2024, 3, 16)).unwrap().done);
    }

    #[test]
    fn notes_carry_forward_only_when_allowed() {
        let ids = SequentialIdSource::new("log");
        let mut habit = water();
        let date = day(2024, 3, 15);

        let plain = build_log(&habit, date, &RawValue::Number(1.0), None, &ids);
        assert_eq!(plain.note, None);
        assert!(with_note(&habit, &plain, "thirsty", &ids).is_err());

        habit.set_allow_notes(true);
        let fresh = build_log(&habit, date, &RawValue::Number(1.0), None, &ids);
        assert_eq!(fresh.note.as_deref(), Some(""));

        let noted = with_note(&habit, &fresh, "thirsty", &ids).unwrap();
        assert_eq!(noted.done, fresh.done);
        assert_ne!(noted.id, fresh.id);
        let next = build_log(&habit, date, &RawValue::Number(8.0), Some(&noted), &ids);
        assert_eq!(next.note.as_deref(), Some("thirsty"));
        assert!(next.done);
    }

    #[test]
    fn loading_collapses_duplicate_natural_keys() {
        let stale = HabitLog {
            id: "a".into(),
            habit_id: "water".into(),
            date: day(2024, 3, 15),
            done: false,
            value: Some(LogValue::Number(2.0)),
            note: None,
        };
        let orphan = HabitLog {
            id: "b".into(),
            habit_id: "deleted".into(),
            ..stale.clone()
        };
        let latest = HabitLog {
            id: "c".into(),
            done: true,
            value: Some(LogValue::Number(8.0)),
            ..stale.clone()
        };
        let store = LogStore::from_logs(vec![stale, orphan, latest]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.as_slice()[0].id, "c");
        assert!(store.get_log("water", day(2024, 3, 15)).unwrap().done);
        assert!(store.get_log("deleted", day(2024, 3, 15)).is_some());
    }

    #[test]
    fn serialized_shape_uses_numeric_value_slot() {
        let ids = SequentialIdSource::new("log");
        let habit = Habit::new("mood", "Mood", HabitType::MultiChoice).unwrap();
        let log = build_log(
            &habit,
            day(2024, 3, 15),
            &RawValue::Selections(vec!["Option 1".into(), "Calm".into()]),
            None,
            &ids,
        );
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["habitId"], "mood");
        assert_eq!(value["date"], "2024-03-15");
        assert_eq!(value["numericValue"], "Option 1,Calm");
        assert!(value.get("note").is_none());
    }
}
