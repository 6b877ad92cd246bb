//! Todo - a minimalist command-line todo manager.
//!
//! Features:
//! - Tasks with priority, due dates, and tags
//! - Filtering by status, priority, and tags; stable sort by priority
//! - Ids that are never reused, even after delete or clear
//! - SQLite or JSON persistence with atomic commits

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod storage;
pub mod ui;

pub use error::{TodoError, TodoResult};
pub use models::{NewTask, Priority, Task, TaskId, TaskPatch};
pub use query::{ListQuery, SortKey, StatusFilter};
pub use repository::Repository;
pub use storage::{Backend, JsonFileStorage, MemoryStorage, Storage, StoreState};
