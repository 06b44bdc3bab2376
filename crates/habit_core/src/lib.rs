pub mod calendar;
pub mod error;
pub mod evaluate;
pub mod habit;
pub mod ids;
pub mod log;
pub mod service;
pub mod storage;

pub use crate::error::{HabitError, Result};
pub use crate::service::{HabitService, HabitServiceBuilder, HabitSnapshot};
