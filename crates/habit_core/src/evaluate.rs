use serde::{Deserialize, Serialize};

use crate::habit::{Habit, HabitKind, NumericConfig, ThresholdMode};

/// Input as it arrives from an entry widget, before any habit rule is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Selections(Vec<String>),
    Empty,
}

impl RawValue {
    /// Parses comma-separated selections, dropping blank segments.
    pub fn from_comma_list(input: &str) -> Self {
        let selections = input
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        RawValue::Selections(selections)
    }

    fn truthy(&self) -> bool {
        match self {
            RawValue::Flag(flag) => *flag,
            RawValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RawValue::Text(text) => !text.is_empty(),
            RawValue::Selections(_) => true,
            RawValue::Empty => false,
        }
    }

    fn to_stored(&self) -> Option<LogValue> {
        match self {
            RawValue::Flag(flag) => Some(LogValue::Flag(*flag)),
            RawValue::Number(n) => Some(LogValue::Number(*n)),
            RawValue::Text(text) => Some(LogValue::Text(text.clone())),
            RawValue::Selections(selections) => Some(LogValue::Text(selections.join(","))),
            RawValue::Empty => None,
        }
    }
}

/// Loosely typed value slot persisted alongside a log (`numericValue` on disk).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LogValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl LogValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LogValue::Number(n) => Some(*n),
            LogValue::Flag(_) | LogValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub done: bool,
    pub stored: Option<LogValue>,
}

pub fn evaluate(habit: &Habit, raw: &RawValue) -> Evaluation {
    match habit.kind() {
        HabitKind::Boolean => Evaluation {
            done: raw.truthy(),
            stored: None,
        },
        HabitKind::Numeric(config) => Evaluation {
            done: numeric_done(config, raw),
            stored: raw.to_stored(),
        },
        HabitKind::SingleChoice { options } => {
            let done = match raw {
                RawValue::Text(selected) => options.iter().any(|option| option == selected),
                _ => false,
            };
            Evaluation {
                done,
                stored: raw.to_stored(),
            }
        }
        // Selections are not checked against the configured options.
        HabitKind::MultiChoice { options } => {
            let done = match raw {
                RawValue::Selections(selected) => !selected.is_empty() && !options.is_empty(),
                _ => false,
            };
            Evaluation {
                done,
                stored: raw.to_stored(),
            }
        }
    }
}

fn numeric_done(config: &NumericConfig, raw: &RawValue) -> bool {
    let (RawValue::Number(value), Some(threshold)) = (raw, config.threshold) else {
        return false;
    };
    match config.threshold_mode {
        ThresholdMode::AtLeast => *value >= threshold,
        ThresholdMode::AtMost => *value <= threshold,
        ThresholdMode::Equal => (*value - threshold).abs() <= config.tolerance,
    }
}
