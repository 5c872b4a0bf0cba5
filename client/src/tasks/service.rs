//! Task operations.
//!
//! Every operation validates its input before touching the store, so a bad
//! title or id never costs a write.

#[cfg(test)]
#[path = "service_test.rs"]
mod service_test;

use std::sync::Arc;

use super::model::{Task, TaskError, TaskId, validate_id, validate_title};
use super::store::{TaskList, TaskStore};
use crate::state::storage::StorageError;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Add an incomplete task under the next id.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank title or a storage failure.
    pub fn add_task(&self, title: &str) -> Result<Task, TaskError> {
        let title = validate_title(title)?;
        let task = self.apply(|list| list.insert(title.clone()))?;
        tracing::debug!(task_id = task.id, "task added");
        Ok(task)
    }

    /// All tasks in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn tasks(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.snapshot()?.tasks().cloned().collect())
    }

    /// Whether `id` is a positive id naming an existing task.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn exists(&self, id: TaskId) -> Result<bool, TaskError> {
        if validate_id(id).is_err() {
            return Ok(false);
        }
        Ok(self.store.snapshot()?.contains(id))
    }

    /// Replace a task's title, keeping its completion status.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id (checked first), a blank title, or a
    /// storage failure.
    pub fn update_task(&self, id: TaskId, title: &str) -> Result<Task, TaskError> {
        self.require(id)?;
        let title = validate_title(title)?;
        self.edit(id, |task| task.title.clone_from(&title))
    }

    /// # Errors
    ///
    /// Returns an error for an unknown id or a storage failure.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskError> {
        validate_id(id)?;
        if !self.apply(|list| list.remove(id))? {
            return Err(TaskError::NotFound(id));
        }
        tracing::debug!(task_id = id, "task deleted");
        Ok(())
    }

    /// Mark a task completed. Completing a completed task is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a storage failure.
    pub fn mark_completed(&self, id: TaskId) -> Result<Task, TaskError> {
        self.require(id)?;
        self.edit(id, |task| task.completed = true)
    }

    fn require(&self, id: TaskId) -> Result<(), TaskError> {
        validate_id(id)?;
        if !self.exists(id)? {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }

    fn edit(&self, id: TaskId, mut change: impl FnMut(&mut Task)) -> Result<Task, TaskError> {
        self.apply(|list| {
            list.get_mut(id).map(|task| {
                change(task);
                task.clone()
            })
        })?
        .ok_or(TaskError::NotFound(id))
    }

    /// Run `edit` through the store and hand back its result.
    fn apply<R>(&self, mut edit: impl FnMut(&mut TaskList) -> R) -> Result<R, TaskError> {
        let mut out = None;
        self.store.modify(&mut |list: &mut TaskList| out = Some(edit(list)))?;
        out.ok_or_else(|| StorageError::Io(std::io::Error::other("task store skipped the edit")).into())
    }
}
