//! SQLite storage for the todo list.

use crate::error::{TodoError, TodoResult};
use crate::models::{Priority, Task, TaskId};
use crate::storage::{Storage, StoreState};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

const TASK_COLUMNS: &[&str] = &[
    "id", "position", "text", "priority", "due", "tags", "done", "created", "completed_at",
];
const META_COLUMNS: &[&str] = &["key", "value"];

/// Task store backed by a single SQLite file.
pub struct SqliteStorage {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStorage {
    /// Open or create the database at path. The schema is created lazily.
    pub fn open(path: &Path) -> TodoResult<Self> {
        let conn = Connection::open(path).map_err(|e| classify(path, e))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Create in-memory database (for testing).
    pub fn in_memory() -> TodoResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        })
    }

    fn init_schema(&self) -> TodoResult<()> {
        self.check_table("tasks", TASK_COLUMNS)?;
        self.check_table("store_meta", META_COLUMNS)?;
        self.conn
            .execute_batch(
                r#"
            PRAGMA synchronous = FULL;

            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                due TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                done INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_position ON tasks(position);
            "#,
            )
            .map_err(|e| classify(&self.path, e))
    }

    /// A table that exists but lacks our columns belongs to some other
    /// program. Report it as corrupt before the schema touches the file.
    fn check_table(&self, table: &str, expected: &[&str]) -> TodoResult<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .map_err(|e| classify(&self.path, e))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| classify(&self.path, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify(&self.path, e))?;
        if columns.is_empty() {
            return Ok(());
        }

        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|name| !columns.iter().any(|c| c.as_str() == *name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TodoError::corrupt(
                &self.path,
                format!("table {} is missing columns: {}", table, missing.join(", ")),
            ))
        }
    }

    fn read_last_id(&self) -> TodoResult<TaskId> {
        let last_id: Option<TaskId> = self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'last_id'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| classify(&self.path, e))?;
        Ok(last_id.unwrap_or(0))
    }

    fn read_tasks(&self) -> TodoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, text, priority, due, tags, done, created, completed_at
                 FROM tasks ORDER BY position",
            )
            .map_err(|e| classify(&self.path, e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TaskRow {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    priority: row.get(2)?,
                    due: row.get(3)?,
                    tags: row.get(4)?,
                    done: row.get(5)?,
                    created: row.get(6)?,
                    completed_at: row.get(7)?,
                })
            })
            .map_err(|e| classify(&self.path, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify(&self.path, e))?;

        rows.into_iter()
            .map(|row| row.into_task().map_err(|reason| TodoError::corrupt(&self.path, reason)))
            .collect()
    }
}

impl Storage for SqliteStorage {
    fn load(&mut self) -> TodoResult<StoreState> {
        self.init_schema()?;
        let state = StoreState {
            last_id: self.read_last_id()?,
            tasks: self.read_tasks()?,
        };
        debug!(path = %self.path.display(), tasks = state.tasks.len(), "loaded task database");
        Ok(state.reconcile())
    }

    fn save(&mut self, state: &StoreState) -> TodoResult<()> {
        self.init_schema()?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM tasks", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO tasks (id, position, text, priority, due, tags, done, created, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, task) in state.tasks.iter().enumerate() {
                insert.execute(params![
                    task.id,
                    position as i64,
                    task.text,
                    task.priority.label(),
                    task.due.map(|d| d.to_string()),
                    serde_json::to_string(&task.tags)?,
                    task.done,
                    task.created.to_rfc3339(),
                    task.completed_at.map(|d| d.to_rfc3339()),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES ('last_id', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [state.last_id],
        )?;
        tx.commit()?;

        debug!(path = %self.path.display(), tasks = state.tasks.len(), "saved task database");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Raw column values, validated by `into_task`.
struct TaskRow {
    id: TaskId,
    text: String,
    priority: String,
    due: Option<String>,
    tags: String,
    done: bool,
    created: String,
    completed_at: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, String> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| format!("task {}: {}", self.id, e))?;
        let due = self
            .due
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| format!("task {}: bad due date: {}", self.id, e))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| format!("task {}: bad tags: {}", self.id, e))?;
        let created = parse_timestamp(&self.created)
            .map_err(|e| format!("task {}: bad created timestamp: {}", self.id, e))?;
        let completed_at = self
            .completed_at
            .map(|s| parse_timestamp(&s))
            .transpose()
            .map_err(|e| format!("task {}: bad completion timestamp: {}", self.id, e))?;

        Ok(Task {
            id: self.id,
            text: self.text,
            priority,
            due,
            tags,
            done: self.done,
            created,
            completed_at,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Map SQLite failures that mean "this is not a readable task store" to
/// `CorruptStore`; everything else stays a plain SQLite error.
fn classify(path: &Path, e: rusqlite::Error) -> TodoError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) =>
        {
            TodoError::corrupt(path, e)
        }
        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            TodoError::corrupt(path, e)
        }
        _ => TodoError::Sqlite(e),
    }
}
