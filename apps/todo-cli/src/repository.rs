//! The task repository: owns the task list and its persistence.
//!
//! Every mutation is applied to a copy of the current state and committed
//! through [`Storage::save`]. Only after the save succeeds does the copy
//! become the repository's state, so a failed write leaves both the store
//! and the in-memory view as they were.

use crate::error::{TodoError, TodoResult};
use crate::models::{normalize_tags, validate_text, NewTask, Task, TaskId, TaskPatch};
use crate::storage::{Storage, StoreState};
use chrono::Utc;
use tracing::{debug, info};

pub struct Repository<S: Storage> {
    storage: S,
    state: StoreState,
}

impl<S: Storage> Repository<S> {
    /// Load the current state from `storage`.
    pub fn open(mut storage: S) -> TodoResult<Self> {
        let state = storage.load()?;
        debug!(
            store = %storage.describe(),
            tasks = state.tasks.len(),
            last_id = state.last_id,
            "opened task repository"
        );
        Ok(Self { storage, state })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All tasks in insertion order.
    pub fn list(&self) -> Vec<Task> {
        self.state.tasks.clone()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.state.tasks.iter().find(|t| t.id == id)
    }

    pub fn last_id(&self) -> TaskId {
        self.state.last_id
    }

    pub fn add(&mut self, new: NewTask) -> TodoResult<Task> {
        let text = validate_text(&new.text)?;

        let mut next = self.state.clone();
        next.last_id += 1;
        let task = Task {
            id: next.last_id,
            text,
            priority: new.priority,
            due: new.due,
            tags: normalize_tags(&new.tags),
            done: false,
            created: Utc::now(),
            completed_at: None,
        };
        next.tasks.push(task.clone());

        self.commit(next)?;
        info!(id = task.id, "added task");
        Ok(task)
    }

    /// Mark a task done. Completing a done task succeeds without a write.
    pub fn complete(&mut self, id: TaskId) -> TodoResult<Task> {
        let index = self.index_of(id)?;
        if self.state.tasks[index].done {
            return Ok(self.state.tasks[index].clone());
        }

        let mut next = self.state.clone();
        next.tasks[index].mark_done();
        let task = next.tasks[index].clone();

        self.commit(next)?;
        info!(id, "completed task");
        Ok(task)
    }

    pub fn edit(&mut self, id: TaskId, patch: &TaskPatch) -> TodoResult<Task> {
        let index = self.index_of(id)?;

        let mut next = self.state.clone();
        patch.apply_to(&mut next.tasks[index])?;
        let task = next.tasks[index].clone();

        if task == self.state.tasks[index] {
            return Ok(task);
        }

        self.commit(next)?;
        info!(id, "edited task");
        Ok(task)
    }

    pub fn delete(&mut self, id: TaskId) -> TodoResult<Task> {
        let index = self.index_of(id)?;

        let mut next = self.state.clone();
        let task = next.tasks.remove(index);

        self.commit(next)?;
        info!(id, "deleted task");
        Ok(task)
    }

    /// Remove every task. The id counter keeps counting from the highest id
    /// ever issued. Returns how many tasks were removed.
    pub fn clear(&mut self) -> TodoResult<usize> {
        let removed = self.state.tasks.len();

        let next = StoreState {
            last_id: self.state.last_id,
            tasks: Vec::new(),
        };

        self.commit(next)?;
        info!(removed, "cleared tasks");
        Ok(removed)
    }

    fn index_of(&self, id: TaskId) -> TodoResult<usize> {
        self.state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))
    }

    fn commit(&mut self, next: StoreState) -> TodoResult<()> {
        self.storage.save(&next)?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::storage::{JsonFileStorage, MemoryStorage};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn repo() -> Repository<MemoryStorage> {
        Repository::open(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut repo = repo();
        let a = repo.add(NewTask::new("Buy milk").priority(Priority::High)).unwrap();
        let b = repo.add(NewTask::new("Call Bob")).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.priority, Priority::High);
        assert_eq!(b.priority, Priority::Medium);
        assert!(!b.done);
        assert_eq!(repo.storage().saves(), 2);
    }

    #[test]
    fn test_add_rejects_empty_text() {
        let mut repo = repo();
        assert!(matches!(repo.add(NewTask::new("  ")), Err(TodoError::Validation(_))));
        assert!(repo.list().is_empty());
        assert_eq!(repo.last_id(), 0);
        assert_eq!(repo.storage().saves(), 0);
    }

    #[test]
    fn test_add_normalizes_tags() {
        let mut repo = repo();
        let task = repo
            .add(NewTask::new("x").tags(["Work", " urgent ", "work", ""]))
            .unwrap();
        assert_eq!(task.tags, vec!["Work", "urgent"]);
    }

    #[test]
    fn test_delete_never_reuses_ids() {
        let mut repo = repo();
        repo.add(NewTask::new("a")).unwrap();
        let b = repo.add(NewTask::new("b")).unwrap();
        let deleted = repo.delete(b.id).unwrap();
        assert_eq!(deleted.text, "b");

        let c = repo.add(NewTask::new("c")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_clear_keeps_counter() {
        let mut repo = repo();
        for text in ["a", "b", "c"] {
            repo.add(NewTask::new(text)).unwrap();
        }
        assert_eq!(repo.clear().unwrap(), 3);
        assert!(repo.list().is_empty());

        let next = repo.add(NewTask::new("d")).unwrap();
        assert_eq!(next.id, 4);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut repo = repo();
        let task = repo.add(NewTask::new("a")).unwrap();

        let done = repo.complete(task.id).unwrap();
        assert!(done.done);
        let again = repo.complete(task.id).unwrap();
        assert_eq!(again, done);
    }

    #[test]
    fn test_complete_missing_leaves_store_unchanged() {
        let mut repo = repo();
        repo.add(NewTask::new("a")).unwrap();
        let before = repo.list();
        let saves = repo.storage().saves();

        assert!(matches!(repo.complete(42), Err(TodoError::NotFound(42))));
        assert_eq!(repo.list(), before);
        assert_eq!(repo.storage().saves(), saves);
    }

    #[test]
    fn test_edit_applies_only_given_fields() {
        let mut repo = repo();
        let task = repo
            .add(NewTask::new("Old").tags(["home"]).due(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .unwrap();

        let patch = TaskPatch {
            text: Some("New".to_string()),
            priority: Some(Priority::Low),
            ..TaskPatch::default()
        };
        let edited = repo.edit(task.id, &patch).unwrap();

        assert_eq!(edited.text, "New");
        assert_eq!(edited.priority, Priority::Low);
        assert_eq!(edited.tags, task.tags);
        assert_eq!(edited.due, task.due);
        assert_eq!(edited.created, task.created);
    }

    #[test]
    fn test_edit_empty_patch_keeps_task_identical() {
        let mut repo = repo();
        let task = repo.add(NewTask::new("Same").tags(["x"])).unwrap();

        let edited = repo.edit(task.id, &TaskPatch::default()).unwrap();
        assert_eq!(edited, task);
        assert_eq!(repo.get(task.id), Some(&task));
    }

    #[test]
    fn test_edit_errors() {
        let mut repo = repo();
        let task = repo.add(NewTask::new("keep")).unwrap();

        let blank = TaskPatch {
            text: Some(String::new()),
            ..TaskPatch::default()
        };
        assert!(matches!(repo.edit(task.id, &blank), Err(TodoError::Validation(_))));
        assert_eq!(repo.get(task.id).unwrap().text, "keep");

        assert!(matches!(repo.edit(99, &TaskPatch::default()), Err(TodoError::NotFound(99))));
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let mut repo = repo();
        let task = repo.add(NewTask::new("a")).unwrap();
        repo.storage.fail_saves(true);

        assert!(repo.add(NewTask::new("b")).is_err());
        assert!(repo.delete(task.id).is_err());
        assert!(repo.clear().is_err());

        assert_eq!(repo.list(), vec![task]);
        assert_eq!(repo.last_id(), 1);
        assert_eq!(repo.storage().state().tasks.len(), 1);
    }

    #[test]
    fn test_reopen_continues_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let mut repo = Repository::open(JsonFileStorage::new(&path)).unwrap();
        repo.add(NewTask::new("a")).unwrap();
        repo.add(NewTask::new("b")).unwrap();
        repo.clear().unwrap();
        drop(repo);

        let mut repo = Repository::open(JsonFileStorage::new(&path)).unwrap();
        assert!(repo.list().is_empty());
        assert_eq!(repo.add(NewTask::new("c")).unwrap().id, 3);
    }

    #[test]
    fn test_every_mutation_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let mut repo = Repository::open(crate::db::SqliteStorage::open(&path).unwrap()).unwrap();
        let a = repo.add(NewTask::new("a").priority(Priority::High)).unwrap();
        let b = repo.add(NewTask::new("b")).unwrap();
        repo.complete(a.id).unwrap();
        repo.delete(b.id).unwrap();
        let expected = repo.list();
        drop(repo);

        let reopened = Repository::open(crate::db::SqliteStorage::open(&path).unwrap()).unwrap();
        assert_eq!(reopened.list(), expected);
        assert_eq!(reopened.last_id(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Delete(usize),
        Complete(usize),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => "[a-z]{1,8}".prop_map(Op::Add),
            2 => any::<usize>().prop_map(Op::Delete),
            1 => any::<usize>().prop_map(Op::Complete),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn test_ids_strictly_increase(ops in prop::collection::vec(op(), 1..40)) {
            let mut repo = repo();
            let mut issued: Vec<TaskId> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(text) => {
                        let task = repo.add(NewTask::new(text)).unwrap();
                        if let Some(last) = issued.last() {
                            prop_assert!(task.id > *last);
                        }
                        issued.push(task.id);
                    }
                    Op::Delete(i) => {
                        let tasks = repo.list();
                        if !tasks.is_empty() {
                            let id = tasks[i % tasks.len()].id;
                            repo.delete(id).unwrap();
                        }
                    }
                    Op::Complete(i) => {
                        let tasks = repo.list();
                        if !tasks.is_empty() {
                            let id = tasks[i % tasks.len()].id;
                            prop_assert!(repo.complete(id).unwrap().done);
                        }
                    }
                    Op::Clear => {
                        repo.clear().unwrap();
                    }
                }
            }

            let mut unique = issued.clone();
            unique.dedup();
            prop_assert_eq!(unique.len(), issued.len());
            prop_assert_eq!(repo.last_id(), issued.last().copied().unwrap_or(0));
        }
    }
}
