//! Storage backends for the task repository.
//!
//! A backend persists the whole [`StoreState`] at once. `save` must either
//! commit the complete state or leave the previous one in place.

use crate::error::{TodoError, TodoResult};
use crate::models::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything the repository persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    /// Highest id ever issued. Survives delete and clear.
    #[serde(default)]
    pub last_id: TaskId,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl StoreState {
    /// Raise `last_id` to cover every stored task.
    pub fn reconcile(mut self) -> Self {
        let max_id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.last_id = self.last_id.max(max_id);
        self
    }
}

/// Persistent backing store for a repository.
pub trait Storage {
    /// Read the stored state. A missing or empty store is an empty state.
    fn load(&mut self) -> TodoResult<StoreState>;

    /// Durably replace the stored state.
    fn save(&mut self, state: &StoreState) -> TodoResult<()>;

    /// Human-readable location, used in messages.
    fn describe(&self) -> String;
}

/// Which on-disk format to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
}

impl Backend {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "tasks.db",
            Backend::Json => "tasks.json",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            other => Err(TodoError::Validation(format!(
                "unknown storage backend '{}', expected sqlite or json",
                other
            ))),
        }
    }
}

/// Open the configured backend at `path`.
pub fn open_backend(backend: Backend, path: &Path) -> TodoResult<Box<dyn Storage>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(match backend {
        Backend::Sqlite => Box::new(crate::db::SqliteStorage::open(path)?),
        Backend::Json => Box::new(JsonFileStorage::new(path)),
    })
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&mut self) -> TodoResult<StoreState> {
        (**self).load()
    }

    fn save(&mut self, state: &StoreState) -> TodoResult<()> {
        (**self).save(state)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Pretty-printed JSON document, replaced atomically on every save.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for JsonFileStorage {
    fn load(&mut self) -> TodoResult<StoreState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no task file yet");
                return Ok(StoreState::default());
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(TodoError::corrupt(&self.path, e));
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(StoreState::default());
        }

        let state: StoreState =
            serde_json::from_str(&content).map_err(|e| TodoError::corrupt(&self.path, e))?;
        debug!(path = %self.path.display(), tasks = state.tasks.len(), "loaded task file");
        Ok(state.reconcile())
    }

    fn save(&mut self, state: &StoreState) -> TodoResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let content = serde_json::to_string_pretty(state)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        sync_dir(&dir)?;

        debug!(path = %self.path.display(), tasks = state.tasks.len(), "saved task file");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Flush a directory entry so a rename inside it survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: StoreState,
    fail_saves: bool,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Make every following `save` fail with an IO error.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self) -> TodoResult<StoreState> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &StoreState) -> TodoResult<()> {
        if self.fail_saves {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "save disabled").into());
        }
        self.state = state.clone();
        self.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
