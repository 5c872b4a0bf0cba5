//! Task persistence.
//!
//! DESIGN
//! ======
//! `TaskList` is the whole collection plus the id counter. Stores hand out
//! snapshots and apply edits under their own lock, so id assignment stays
//! sequential even with several callers. `FileTaskStore` keeps the list as
//! one JSON document next to the token file.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::model::{Task, TaskId};
use crate::state::storage::{StorageError, write_json_file};

/// Tasks keyed by id, with the next id to hand out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    next_id: TaskId,
    tasks: BTreeMap<TaskId, Task>,
}

impl Default for TaskList {
    fn default() -> Self {
        Self { next_id: 1, tasks: BTreeMap::new() }
    }
}

impl TaskList {
    /// Tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    #[must_use]
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append a task under the next id. `title` must already be validated.
    pub fn insert(&mut self, title: String) -> Task {
        let id = self.next_id;
        self.next_id += 1;
        let task = Task { id, title, completed: false };
        self.tasks.insert(id, task.clone());
        task
    }

    /// Mutable access to an existing task.
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Remove a task. Its id is not handed out again.
    pub fn remove(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }
}

pub trait TaskStore: Send + Sync {
    /// Current list.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted tasks cannot be read.
    fn snapshot(&self) -> Result<TaskList, StorageError>;

    /// Apply `edit` to the list and persist the result atomically with
    /// respect to other callers of this store.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read or written back.
    fn modify(&self, edit: &mut dyn FnMut(&mut TaskList)) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    list: Mutex<TaskList>,
}

impl MemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn snapshot(&self) -> Result<TaskList, StorageError> {
        Ok(self.list.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn modify(&self, edit: &mut dyn FnMut(&mut TaskList)) -> Result<(), StorageError> {
        let mut list = self.list.lock().unwrap_or_else(PoisonError::into_inner);
        edit(&mut *list);
        Ok(())
    }
}

/// JSON-file store. A missing file is an empty list; a corrupt one is an
/// error rather than silently discarded.
#[derive(Debug)]
pub struct FileTaskStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTaskStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<TaskList, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(TaskList::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TaskList::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TaskStore for FileTaskStore {
    fn snapshot(&self) -> Result<TaskList, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
    }

    fn modify(&self, edit: &mut dyn FnMut(&mut TaskList)) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list = self.read()?;
        edit(&mut list);
        write_json_file(&self.path, &list)
    }
}
