use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit::Habit;
use crate::log::HabitLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Day,
    Week,
    Month,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Day => "day",
            ViewMode::Week => "week",
            ViewMode::Month => "month",
        })
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(ViewMode::Day),
            "week" => Ok(ViewMode::Week),
            "month" => Ok(ViewMode::Month),
            other => Err(format!("unknown view mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

/// Moves `date` one step of `mode` in `direction`. Month steps clamp the
/// day-of-month to the length of the target month.
pub fn step(mode: ViewMode, date: NaiveDate, direction: Direction) -> NaiveDate {
    let shifted = match (mode, direction) {
        (ViewMode::Day, Direction::Back) => date.checked_sub_signed(Duration::days(1)),
        (ViewMode::Day, Direction::Forward) => date.checked_add_signed(Duration::days(1)),
        (ViewMode::Week, Direction::Back) => date.checked_sub_signed(Duration::days(7)),
        (ViewMode::Week, Direction::Forward) => date.checked_add_signed(Duration::days(7)),
        (ViewMode::Month, Direction::Back) => date.checked_sub_months(Months::new(1)),
        (ViewMode::Month, Direction::Forward) => date.checked_add_months(Months::new(1)),
    };
    shifted.unwrap_or(date)
}

/// Most recent Sunday on or before `date`, clamped to the earliest representable day.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    date.checked_sub_signed(back).unwrap_or(NaiveDate::MIN)
}

/// Up to `count` consecutive days from `start`, stopping at the last representable day.
fn days_from(start: NaiveDate, count: usize) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |date| date.succ_opt()).take(count)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// First log recorded for `habit_id` on `date`.
pub fn find_log<'a>(logs: &'a [HabitLog], habit_id: &str, date: NaiveDate) -> Option<&'a HabitLog> {
    logs.iter().find(|log| log.matches(habit_id, date))
}

/// Number of habits with a completed log on `date`. Habits without a log do not count.
pub fn done_count(habits: &[Habit], logs: &[HabitLog], date: NaiveDate) -> usize {
    habits
        .iter()
        .filter(|habit| {
            logs.iter()
                .any(|log| log.matches(&habit.id, date) && log.done)
        })
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayEntry<'a> {
    pub habit: &'a Habit,
    pub log: Option<&'a HabitLog>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayWindow<'a> {
    pub date: NaiveDate,
    pub entries: Vec<DayEntry<'a>>,
}

impl DayWindow<'_> {
    pub fn done_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.log.is_some_and(|log| log.done))
            .count()
    }
}

pub fn day_window<'a>(habits: &'a [Habit], logs: &'a [HabitLog], date: NaiveDate) -> DayWindow<'a> {
    let entries = habits
        .iter()
        .map(|habit| DayEntry {
            habit,
            log: find_log(logs, &habit.id, date),
        })
        .collect();
    DayWindow { date, entries }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay<'a> {
    pub date: NaiveDate,
    pub done_count: usize,
    pub day: DayWindow<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekWindow<'a> {
    pub start: NaiveDate,
    pub days: Vec<WeekDay<'a>>,
}

impl WeekWindow<'_> {
    pub fn end(&self) -> NaiveDate {
        self.days.last().map_or(self.start, |day| day.date)
    }
}

pub fn week_window<'a>(
    habits: &'a [Habit],
    logs: &'a [HabitLog],
    reference: NaiveDate,
) -> WeekWindow<'a> {
    let start = week_start(reference);
    let days = days_from(start, 7)
        .map(|date| WeekDay {
            date,
            done_count: done_count(habits, logs, date),
            day: day_window(habits, logs, date),
        })
        .collect();
    WeekWindow { start, days }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthCell {
    Blank,
    Day { date: NaiveDate, done_count: usize },
}

/// Seven-column grid of a calendar month, padded at the front so the first
/// day lands on its Sunday-based weekday column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    cells: Vec<MonthCell>,
}

impl MonthWindow {
    pub fn cells(&self) -> &[MonthCell] {
        &self.cells
    }

    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|cell| matches!(cell, MonthCell::Blank))
            .count()
    }

    pub fn day_count(&self) -> usize {
        self.cells.len() - self.leading_blanks()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[MonthCell]> {
        self.cells.chunks(7)
    }
}

pub fn month_window(habits: &[Habit], logs: &[HabitLog], reference: NaiveDate) -> MonthWindow {
    let (year, month) = (reference.year(), reference.month());
    let first = reference.with_day(1).unwrap_or(reference);
    let blanks = first.weekday().num_days_from_sunday() as usize;
    let total = days_in_month(year, month) as usize;

    let mut cells = Vec::with_capacity(blanks + total);
    cells.extend(std::iter::repeat(MonthCell::Blank).take(blanks));
    cells.extend(days_from(first, total).map(|date| MonthCell::Day {
        date,
        done_count: done_count(habits, logs, date),
    }));

    MonthWindow { year, month, cells }
}
