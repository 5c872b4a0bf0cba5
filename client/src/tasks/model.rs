//! Task model and validation.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::{Deserialize, Serialize};

use crate::state::storage::StorageError;

/// Store-assigned task identifier. Ids start at 1 and are never reused.
pub type TaskId = u64;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task title cannot be empty or contain only whitespace")]
    EmptyTitle,
    #[error("task ID must be a positive integer")]
    InvalidId,
    #[error("task with ID {0} does not exist")]
    NotFound(TaskId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Build a task, trimming the title.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero id or a blank title.
    pub fn new(id: TaskId, title: &str) -> Result<Self, TaskError> {
        Ok(Self { id: validate_id(id)?, title: validate_title(title)?, completed: false })
    }

    /// `"3. [x] Buy milk"`.
    #[must_use]
    pub fn render_line(&self) -> String {
        let status = if self.completed { "[x]" } else { "[ ]" };
        format!("{}. {status} {}", self.id, self.title)
    }
}

/// Trim `title`, rejecting blank input.
///
/// # Errors
///
/// Returns [`TaskError::EmptyTitle`] when nothing is left after trimming.
pub fn validate_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

/// # Errors
///
/// Returns [`TaskError::InvalidId`] for 0.
pub fn validate_id(id: TaskId) -> Result<TaskId, TaskError> {
    if id == 0 {
        return Err(TaskError::InvalidId);
    }
    Ok(id)
}
