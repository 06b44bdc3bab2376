use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HabitError>;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("unknown habit type `{0}`")]
    UnknownHabitType(String),

    #[error("habit name must not be empty")]
    EmptyName,

    #[error("habit `{0}` not found")]
    HabitNotFound(String),

    #[error("habit `{id}` is not a {expected} habit")]
    WrongKind { id: String, expected: &'static str },

    #[error("option index {index} out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("habit `{0}` does not allow notes")]
    NotesDisabled(String),

    #[error("no log for habit `{habit_id}` on {date}")]
    LogNotFound { habit_id: String, date: String },

    #[error("storage failure for key `{key}`")]
    Storage {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize `{key}`")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
