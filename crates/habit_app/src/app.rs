use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use habit_core::{
    calendar::{MonthCell, ViewMode},
    ids::{Clock, SystemClock},
    storage::FileStore,
    HabitService,
};
use tracing::{info, warn};

use crate::view::{ViewController, WindowView, DEFAULT_COMPACT_WIDTH_PX};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) default_view: ViewMode,
    pub(crate) compact_width_px: u32,
    pub(crate) viewport_width_px: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("HABIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(view) = std::env::var("HABIT_DEFAULT_VIEW") {
            match view.parse::<ViewMode>() {
                Ok(mode) => config.default_view = mode,
                Err(err) => warn!(%err, "ignoring HABIT_DEFAULT_VIEW"),
            }
        }
        if let Ok(width) = std::env::var("HABIT_COMPACT_WIDTH_PX") {
            match width.trim().parse::<u32>() {
                Ok(value) if value > 0 => config.compact_width_px = value,
                _ => warn!(value = %width, "ignoring HABIT_COMPACT_WIDTH_PX"),
            }
        }
        if let Ok(width) = std::env::var("HABIT_VIEWPORT_WIDTH_PX") {
            match width.trim().parse::<u32>() {
                Ok(value) => config.viewport_width_px = Some(value),
                Err(_) => warn!(value = %width, "ignoring HABIT_VIEWPORT_WIDTH_PX"),
            }
        }
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".habit-tracker"),
            default_view: ViewMode::Day,
            compact_width_px: DEFAULT_COMPACT_WIDTH_PX,
            viewport_width_px: None,
        }
    }
}

pub struct HabitApp {
    service: HabitService,
    view: ViewController,
}

impl HabitApp {
    pub fn open(config: &AppConfig, clock: &dyn Clock) -> Result<Self> {
        info!(path = %config.data_dir.display(), "opening habit store");
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("unable to prepare data directory {}", config.data_dir.display())
        })?;
        let service = HabitService::builder()
            .with_store(Box::new(FileStore::new(&config.data_dir)))
            .build();
        let mut view = ViewController::starting_today(clock, config.default_view)
            .with_compact_width(config.compact_width_px);
        view.set_viewport_width(config.viewport_width_px);
        Ok(Self { service, view })
    }

    pub fn service(&self) -> &HabitService {
        &self.service
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewController {
        &mut self.view
    }

    /// One line per calendar cell of the current window.
    pub fn summary(&self) -> Vec<String> {
        let snapshot = self.service.snapshot();
        let total = snapshot.habits.len();
        match self.view.render(&snapshot) {
            WindowView::Day(day) => day
                .entries
                .iter()
                .map(|entry| {
                    let mark = if entry.log.is_some_and(|log| log.done) {
                        'x'
                    } else {
                        ' '
                    };
                    format!("{} [{}] {}", day.date, mark, entry.habit.name)
                })
                .collect(),
            WindowView::Week(week) => week
                .days
                .iter()
                .map(|day| format!("{} {}/{}", day.date.format("%a %Y-%m-%d"), day.done_count, total))
                .collect(),
            WindowView::Month(month) => month
                .cells()
                .iter()
                .filter_map(|cell| match cell {
                    MonthCell::Day { date, done_count } => Some(format!("{date} {done_count}/{total}")),
                    MonthCell::Blank => None,
                })
                .collect(),
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let start = Instant::now();
    let app = HabitApp::open(&config, &SystemClock).context("failed to open habit store")?;
    let view = app.view();
    info!(
        date = %view.selected_date(),
        mode = %view.mode(),
        effective = %view.effective_mode(),
        habit_count = app.service().habits().len(),
        elapsed_ms = %start.elapsed().as_millis(),
        "habit tracker ready"
    );
    for line in app.summary() {
        info!("{line}");
    }
    Ok(())
}
