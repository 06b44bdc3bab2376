use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdMode {
    #[default]
    AtLeast,
    AtMost,
    Equal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NumericConfig {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub threshold_mode: ThresholdMode,
    /// Only consulted for [`ThresholdMode::Equal`].
    #[serde(default)]
    pub tolerance: f64,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            unit: "units".to_string(),
            threshold: Some(1.0),
            threshold_mode: ThresholdMode::AtLeast,
            tolerance: 0.0,
        }
    }
}

/// Type-specific half of a habit. The serialized discriminant lives under `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HabitKind {
    Boolean,
    Numeric(NumericConfig),
    SingleChoice { options: Vec<String> },
    MultiChoice { options: Vec<String> },
}

impl HabitKind {
    pub fn habit_type(&self) -> HabitType {
        match self {
            HabitKind::Boolean => HabitType::Boolean,
            HabitKind::Numeric(_) => HabitType::Numeric,
            HabitKind::SingleChoice { .. } => HabitType::SingleChoice,
            HabitKind::MultiChoice { .. } => HabitType::MultiChoice,
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            HabitKind::SingleChoice { options } | HabitKind::MultiChoice { options } => {
                Some(options)
            }
            HabitKind::Boolean | HabitKind::Numeric(_) => None,
        }
    }
}

/// Tag used to pick the shape of a new habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitType {
    Boolean,
    Numeric,
    SingleChoice,
    MultiChoice,
}

impl HabitType {
    pub fn as_str(self) -> &'static str {
        match self {
            HabitType::Boolean => "boolean",
            HabitType::Numeric => "numeric",
            HabitType::SingleChoice => "singleChoice",
            HabitType::MultiChoice => "multiChoice",
        }
    }

    fn default_kind(self) -> HabitKind {
        match self {
            HabitType::Boolean => HabitKind::Boolean,
            HabitType::Numeric => HabitKind::Numeric(NumericConfig::default()),
            HabitType::SingleChoice => HabitKind::SingleChoice {
                options: vec![option_label(0)],
            },
            HabitType::MultiChoice => HabitKind::MultiChoice {
                options: vec![option_label(0)],
            },
        }
    }
}

impl fmt::Display for HabitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HabitType {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "boolean" => Ok(HabitType::Boolean),
            "numeric" => Ok(HabitType::Numeric),
            "singleChoice" => Ok(HabitType::SingleChoice),
            "multiChoice" => Ok(HabitType::MultiChoice),
            other => Err(HabitError::UnknownHabitType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub allow_notes: bool,
    #[serde(flatten)]
    kind: HabitKind,
}

/// Partial edit of a numeric habit's configuration. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericUpdate {
    pub unit: Option<String>,
    pub threshold: Option<f64>,
    pub threshold_mode: Option<ThresholdMode>,
    pub tolerance: Option<f64>,
}

impl Habit {
    pub fn new(id: impl Into<String>, name: &str, habit_type: HabitType) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HabitError::EmptyName);
        }
        Ok(Self {
            id: id.into(),
            name: name.to_string(),
            allow_notes: false,
            kind: habit_type.default_kind(),
        })
    }

    pub fn with_kind(id: impl Into<String>, name: &str, kind: HabitKind) -> Result<Self> {
        let mut habit = Self::new(id, name, kind.habit_type())?;
        habit.kind = kind;
        Ok(habit)
    }

    pub fn kind(&self) -> &HabitKind {
        &self.kind
    }

    pub fn habit_type(&self) -> HabitType {
        self.kind.habit_type()
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HabitError::EmptyName);
        }
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_allow_notes(&mut self, allow: bool) {
        self.allow_notes = allow;
    }

    pub fn update_numeric(&mut self, update: NumericUpdate) -> Result<()> {
        let HabitKind::Numeric(config) = &mut self.kind else {
            return Err(wrong_kind(&self.id, "numeric"));
        };
        if let Some(unit) = update.unit {
            config.unit = unit;
        }
        if let Some(threshold) = update.threshold {
            config.threshold = Some(threshold);
        }
        if let Some(mode) = update.threshold_mode {
            config.threshold_mode = mode;
        }
        if let Some(tolerance) = update.tolerance {
            config.tolerance = tolerance.abs();
        }
        Ok(())
    }

    /// Appends a placeholder option labelled after its position.
    pub fn add_option(&mut self) -> Result<&str> {
        let options = self.options_mut()?;
        options.push(option_label(options.len()));
        Ok(options.last().map(String::as_str).unwrap_or_default())
    }

    pub fn set_option(&mut self, index: usize, value: &str) -> Result<()> {
        let options = self.options_mut()?;
        let len = options.len();
        let slot = options
            .get_mut(index)
            .ok_or(HabitError::OptionOutOfRange { index, len })?;
        *slot = value.to_string();
        Ok(())
    }

    fn options_mut(&mut self) -> Result<&mut Vec<String>> {
        match &mut self.kind {
            HabitKind::SingleChoice { options } | HabitKind::MultiChoice { options } => {
                Ok(options)
            }
            HabitKind::Boolean | HabitKind::Numeric(_) => Err(wrong_kind(&self.id, "choice")),
        }
    }
}

fn wrong_kind(id: &str, expected: &'static str) -> HabitError {
    HabitError::WrongKind {
        id: id.to_string(),
        expected,
    }
}

fn option_label(index: usize) -> String {
    format!("Option {}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_habit_fills_type_defaults() {
        let numeric = Habit::new("h1", "Water", HabitType::Numeric).unwrap();
        let HabitKind::Numeric(config) = numeric.kind() else {
            panic!("expected numeric kind");
        };
        assert_eq!(config.unit, "units");
        assert_eq!(config.threshold, Some(1.0));
        assert_eq!(config.threshold_mode, ThresholdMode::AtLeast);
        assert_eq!(config.tolerance, 0.0);
        assert!(!numeric.allow_notes);

        let choice = Habit::new("h2", "Mood", HabitType::SingleChoice).unwrap();
        assert_eq!(choice.kind().options(), Some(&["Option 1".to_string()][..]));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let err = "checklist".parse::<HabitType>().unwrap_err();
        assert!(matches!(err, HabitError::UnknownHabitType(tag) if tag == "checklist"));
        assert_eq!("multiChoice".parse::<HabitType>().unwrap(), HabitType::MultiChoice);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            Habit::new("h1", "   ", HabitType::Boolean),
            Err(HabitError::EmptyName)
        ));
    }

    #[test]
    fn options_grow_and_replace_by_index() {
        let mut habit = Habit::new("h1", "Lunch", HabitType::MultiChoice).unwrap();
        assert_eq!(habit.add_option().unwrap(), "Option 2");
        habit.set_option(0, "Salad").unwrap();
        assert_eq!(
            habit.kind().options().unwrap(),
            &["Salad".to_string(), "Option 2".to_string()]
        );
        assert!(matches!(
            habit.set_option(5, "Soup"),
            Err(HabitError::OptionOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn edits_never_change_kind() {
        let mut habit = Habit::new("h1", "Walk", HabitType::Boolean).unwrap();
        assert!(habit.add_option().is_err());
        assert!(habit.update_numeric(NumericUpdate::default()).is_err());
        assert_eq!(habit.habit_type(), HabitType::Boolean);
    }

    #[test]
    fn serializes_with_type_discriminant() {
        let mut habit = Habit::new("h1", "Water", HabitType::Numeric).unwrap();
        habit
            .update_numeric(NumericUpdate {
                unit: Some("glasses".into()),
                threshold: Some(8.0),
                ..NumericUpdate::default()
            })
            .unwrap();
        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["type"], "numeric");
        assert_eq!(value["thresholdMode"], "atLeast");
        assert_eq!(value["allowNotes"], false);

        let raw = r#"{"id":"h9","name":"Mood","type":"singleChoice","options":["Yes","No"]}"#;
        let parsed: Habit = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.habit_type(), HabitType::SingleChoice);
        assert!(!parsed.allow_notes);
    }
}
