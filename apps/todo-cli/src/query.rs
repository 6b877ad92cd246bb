//! Filtering and sorting for task listings.

use crate::error::{TodoError, TodoResult};
use crate::models::{normalize_tags, Priority, Task};

/// Completion-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Undone,
}

impl StatusFilter {
    /// Build from the `--done` / `--undone` flags; both at once is a usage error.
    pub fn from_flags(done: bool, undone: bool) -> TodoResult<Self> {
        match (done, undone) {
            (true, true) => Err(TodoError::Usage(
                "you can't use --done and --undone together, choose one of them".to_string(),
            )),
            (true, false) => Ok(StatusFilter::Done),
            (false, true) => Ok(StatusFilter::Undone),
            (false, false) => Ok(StatusFilter::All),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Done => task.done,
            StatusFilter::Undone => !task.done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Priority,
}

/// A listing request. Filters run in a fixed order: status, priority, tags,
/// then the optional sort.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub sort: Option<SortKey>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
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

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    /// Run the query over a snapshot. The input is never modified.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let wanted: Vec<String> = normalize_tags(&self.tags)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        let mut result: Vec<Task> = tasks
            .iter()
            .filter(|t| self.status.matches(t))
            .filter(|t| self.priority.map_or(true, |p| t.priority == p))
            .filter(|t| wanted.is_empty() || wanted.iter().any(|tag| t.has_tag(tag)))
            .cloned()
            .collect();

        if let Some(SortKey::Priority) = self.sort {
            // `sort_by_key` is stable, so equal priorities keep insertion order.
            result.sort_by_key(|t| t.priority.rank());
        }

        result
    }
}
