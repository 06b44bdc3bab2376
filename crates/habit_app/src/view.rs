use chrono::NaiveDate;
use habit_core::{
    calendar::{self, DayWindow, Direction, MonthWindow, ViewMode, WeekWindow},
    ids::Clock,
    log::date_key,
    HabitSnapshot,
};
use tracing::debug;

/// Viewports narrower than this render the month view as a week.
pub const DEFAULT_COMPACT_WIDTH_PX: u32 = 640;

#[derive(Debug, Clone, PartialEq)]
pub enum WindowView<'a> {
    Day(DayWindow<'a>),
    Week(WeekWindow<'a>),
    Month(MonthWindow),
}

/// Navigation state over the calendar windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewController {
    selected_date: NaiveDate,
    mode: ViewMode,
    viewport_width: Option<u32>,
    compact_width: u32,
}

impl ViewController {
    pub fn new(selected_date: NaiveDate, mode: ViewMode) -> Self {
        Self {
            selected_date,
            mode,
            viewport_width: None,
            compact_width: DEFAULT_COMPACT_WIDTH_PX,
        }
    }

    pub fn starting_today(clock: &dyn Clock, mode: ViewMode) -> Self {
        Self::new(date_key(clock.now()), mode)
    }

    pub fn with_compact_width(mut self, width: u32) -> Self {
        self.compact_width = width;
        self
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Mode chosen by the user, regardless of viewport.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn select_day(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    pub fn set_viewport_width(&mut self, width: Option<u32>) {
        self.viewport_width = width;
    }

    pub fn prev(&mut self) {
        self.shift(Direction::Back);
    }

    pub fn next(&mut self) {
        self.shift(Direction::Forward);
    }

    pub fn today(&mut self, clock: &dyn Clock) {
        self.selected_date = date_key(clock.now());
    }

    pub fn effective_mode(&self) -> ViewMode {
        match (self.mode, self.viewport_width) {
            (ViewMode::Month, Some(width)) if width < self.compact_width => ViewMode::Week,
            (mode, _) => mode,
        }
    }

    pub fn render<'a>(&self, snapshot: &'a HabitSnapshot) -> WindowView<'a> {
        match self.effective_mode() {
            ViewMode::Day => WindowView::Day(snapshot.day_window(self.selected_date)),
            ViewMode::Week => WindowView::Week(snapshot.week_window(self.selected_date)),
            ViewMode::Month => WindowView::Month(snapshot.month_window(self.selected_date)),
        }
    }

    fn shift(&mut self, direction: Direction) {
        let from = self.selected_date;
        self.selected_date = calendar::step(self.mode, from, direction);
        debug!(%from, to = %self.selected_date, mode = %self.mode, "navigated");
    }
}
