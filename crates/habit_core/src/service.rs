use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::{
    calendar::{self, DayWindow, MonthWindow, WeekWindow},
    error::{HabitError, Result},
    evaluate::RawValue,
    habit::{Habit, HabitType, NumericUpdate},
    ids::{IdSource, UuidIdSource},
    log::{self, HabitLog, LogStore, Upsert},
    storage::{self, KeyValueStore, MemoryStore, HABITS_KEY, LOGS_KEY},
};

/// Owned copy of both collections for building calendar windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitSnapshot {
    pub habits: Vec<Habit>,
    pub logs: Vec<HabitLog>,
}

impl HabitSnapshot {
    pub fn day_window(&self, date: NaiveDate) -> DayWindow<'_> {
        calendar::day_window(&self.habits, &self.logs, date)
    }

    pub fn week_window(&self, reference: NaiveDate) -> WeekWindow<'_> {
        calendar::week_window(&self.habits, &self.logs, reference)
    }

    pub fn month_window(&self, reference: NaiveDate) -> MonthWindow {
        calendar::month_window(&self.habits, &self.logs, reference)
    }
}

/// Single owner of the habit and log collections. Every mutation is saved
/// before it returns.
pub struct HabitService {
    store: Box<dyn KeyValueStore>,
    ids: Box<dyn IdSource>,
    habits: RwLock<Vec<Habit>>,
    logs: RwLock<LogStore>,
}

pub struct HabitServiceBuilder {
    store: Option<Box<dyn KeyValueStore>>,
    ids: Option<Box<dyn IdSource>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            ids: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> HabitService {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let ids = self.ids.unwrap_or_else(|| Box::new(UuidIdSource));
        let habits: Vec<Habit> = storage::load_collection(&*store, HABITS_KEY);
        let logs = LogStore::from_logs(storage::load_collection(&*store, LOGS_KEY));
        info!(
            habit_count = habits.len(),
            log_count = logs.len(),
            "habit state loaded"
        );
        HabitService {
            store,
            ids,
            habits: RwLock::new(habits),
            logs: RwLock::new(logs),
        }
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.habits.read().clone()
    }

    pub fn habit(&self, id: &str) -> Result<Habit> {
        self.habits
            .read()
            .iter()
            .find(|habit| habit.id == id)
            .cloned()
            .ok_or_else(|| HabitError::HabitNotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub fn add_habit(&self, name: &str, habit_type: HabitType) -> Result<Habit> {
        let habit = Habit::new(self.ids.new_id(), name, habit_type)?;
        let mut habits = self.habits.write();
        let mut next = habits.clone();
        next.push(habit.clone());
        storage::save_collection(self.store.as_ref(), HABITS_KEY, &next)?;
        *habits = next;
        info!(id = %habit.id, "habit added");
        Ok(habit)
    }

    pub fn rename_habit(&self, id: &str, name: &str) -> Result<Habit> {
        self.edit_habit(id, |habit| habit.rename(name))
    }

    pub fn set_allow_notes(&self, id: &str, allow: bool) -> Result<Habit> {
        self.edit_habit(id, |habit| {
            habit.set_allow_notes(allow);
            Ok(())
        })
    }

    pub fn update_numeric(&self, id: &str, update: NumericUpdate) -> Result<Habit> {
        self.edit_habit(id, |habit| habit.update_numeric(update))
    }

    pub fn add_option(&self, id: &str) -> Result<Habit> {
        self.edit_habit(id, |habit| habit.add_option().map(|_| ()))
    }

    pub fn set_option(&self, id: &str, index: usize, value: &str) -> Result<Habit> {
        self.edit_habit(id, |habit| habit.set_option(index, value))
    }

    pub fn logs(&self) -> Vec<HabitLog> {
        self.logs.read().as_slice().to_vec()
    }

    pub fn get_log(&self, habit_id: &str, date: NaiveDate) -> Option<HabitLog> {
        self.logs.read().get_log(habit_id, date).cloned()
    }

    /// Evaluates `raw` against the habit and upserts the resulting log for `date`.
    #[instrument(skip_all, fields(habit_id = %habit_id, date = %date))]
    pub fn record(&self, habit_id: &str, date: NaiveDate, raw: RawValue) -> Result<HabitLog> {
        let habit = self.habit(habit_id)?;
        let mut logs = self.logs.write();
        let entry = log::build_log(
            &habit,
            date,
            &raw,
            logs.get_log(habit_id, date),
            self.ids.as_ref(),
        );
        self.commit_log(&mut logs, entry)
    }

    #[instrument(skip_all, fields(habit_id = %habit_id, date = %date))]
    pub fn set_note(&self, habit_id: &str, date: NaiveDate, note: &str) -> Result<HabitLog> {
        let habit = self.habit(habit_id)?;
        let mut logs = self.logs.write();
        let current = logs
            .get_log(habit_id, date)
            .ok_or_else(|| HabitError::LogNotFound {
                habit_id: habit_id.to_string(),
                date: date.to_string(),
            })?;
        let entry = log::with_note(&habit, current, note, self.ids.as_ref())?;
        self.commit_log(&mut logs, entry)
    }

    pub fn snapshot(&self) -> HabitSnapshot {
        HabitSnapshot {
            habits: self.habits(),
            logs: self.logs(),
        }
    }
}

// Mutations are applied to a copy and swapped in only once the save succeeds.
impl HabitService {
    fn edit_habit(&self, id: &str, edit: impl FnOnce(&mut Habit) -> Result<()>) -> Result<Habit> {
        let mut habits = self.habits.write();
        let mut next = habits.clone();
        let habit = next
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or_else(|| HabitError::HabitNotFound(id.to_string()))?;
        edit(habit)?;
        let updated = habit.clone();
        storage::save_collection(self.store.as_ref(), HABITS_KEY, &next)?;
        *habits = next;
        debug!(id, "habit updated");
        Ok(updated)
    }

    fn commit_log(&self, logs: &mut LogStore, entry: HabitLog) -> Result<HabitLog> {
        let mut next = logs.clone();
        let outcome = next.upsert(entry.clone());
        storage::save_collection(self.store.as_ref(), LOGS_KEY, next.as_slice())?;
        *logs = next;
        match outcome {
            Upsert::Inserted => debug!(log_id = %entry.id, done = entry.done, "log inserted"),
            Upsert::Replaced { index } => {
                debug!(log_id = %entry.id, index, done = entry.done, "log replaced")
            }
        }
        Ok(entry)
    }
}
