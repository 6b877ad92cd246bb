//! Data models for the todo list.

use crate::error::{TodoError, TodoResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique task identifier.
pub type TaskId = i64;

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort weight used by `list --sort priority`; lower sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(TodoError::Validation(format!(
                "invalid priority '{}', expected one of: low, medium, high",
                other
            ))),
        }
    }
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub done: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            priority: Priority::default(),
            due: None,
            tags: Vec::new(),
            done: false,
            created: Utc::now(),
            completed_at: None,
        }
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    pub fn mark_done(&mut self) {
        if !self.done {
            self.done = true;
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Utc::now().date_naive())
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.due {
            Some(due) => !self.done && due < today,
            None => false,
        }
    }
}

/// Fields for a task about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for `edit`. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    /// Apply onto `task`, validating the resulting text.
    pub fn apply_to(&self, task: &mut Task) -> TodoResult<()> {
        if let Some(text) = &self.text {
            task.text = validate_text(text)?;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due {
            task.due = Some(due);
        }
        if let Some(tags) = &self.tags {
            task.tags = normalize_tags(tags);
        }
        Ok(())
    }
}

/// Statistics for a set of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let today = Utc::now().date_naive();
        let mut stats = Self::default();
        for task in tasks {
            stats.total += 1;
            if task.done {
                stats.done += 1;
            } else {
                stats.pending += 1;
            }
            if task.is_overdue_on(today) {
                stats.overdue += 1;
            }
        }
        stats
    }
}

/// Trim task text and reject it when nothing is left.
pub fn validate_text(text: &str) -> TodoResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation("task text cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due(s: &str) -> TodoResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        TodoError::Validation(format!("invalid due date '{}', expected YYYY-MM-DD", s.trim()))
    })
}

/// Trim tags, drop empty ones and collapse case-insensitive duplicates,
/// keeping the first spelling.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            continue;
        }
        let lowered = tag.to_lowercase();
        if !out.iter().any(|t| t.to_lowercase() == lowered) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split a comma-separated tag list as given on the command line.
pub fn split_tags(raw: &str) -> Vec<String> {
    normalize_tags(&raw.split(',').collect::<Vec<_>>())
}
