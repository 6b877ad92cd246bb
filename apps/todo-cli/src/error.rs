//! Error types for the todo list.

use crate::models::TaskId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while running a todo command.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Rejected input: empty text, bad priority, bad date.
    #[error("{0}")]
    Validation(String),

    /// No task with this id.
    #[error("task [{0}] not found")]
    NotFound(TaskId),

    /// The store exists but its content cannot be read back.
    #[error("task store at {} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    /// Conflicting or malformed command-line usage.
    #[error("{0}")]
    Usage(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error.
    #[error("TOML error: {0}")]
    Toml(String),
}

impl From<toml::ser::Error> for TodoError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl TodoError {
    pub fn corrupt(path: &Path, reason: impl ToString) -> Self {
        Self::CorruptStore {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TodoError::Usage(_) => 2,
            TodoError::CorruptStore { .. } => 3,
            _ => 1,
        }
    }

    /// Whether the error belongs to the expected, user-facing kinds.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            TodoError::Validation(_)
                | TodoError::NotFound(_)
                | TodoError::CorruptStore { .. }
                | TodoError::Usage(_)
        )
    }
}

/// Result type for todo operations.
pub type TodoResult<T> = Result<T, TodoError>;
