//! Board entity records.
//!
//! # Responsibility
//! - Define `Project` and `Task` with their wire encoding.
//! - Provide constructor helpers that assign ids, order keys and
//!   creation timestamps consistently across backends.
//!
//! # Invariants
//! - `id` is stable and never reused for another entity.
//! - `created_at` is a client-assigned epoch-millisecond timestamp and is
//!   authoritative for display; any server-side timestamp is fallback only.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque project identifier: backend-assigned or locally generated.
pub type ProjectId = String;

/// Opaque task identifier: backend-assigned or locally generated.
pub type TaskId = String;

/// One project column on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Stable opaque id.
    pub id: ProjectId,
    /// User-facing title. May be empty; input guards live in the view layer.
    pub title: String,
    /// Numeric sort key. Gaps of 1000 allow cheap insertion.
    pub order: i64,
    /// Client-assigned creation time in epoch milliseconds.
    pub created_at: i64,
}

/// One task row, owned by a project through `project_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable opaque id.
    pub id: TaskId,
    /// Owning project. Deleting that project cascades to this task.
    pub project_id: ProjectId,
    /// User-facing title.
    pub title: String,
    /// Free-text comment; empty by default.
    pub comment: String,
    /// Numeric sort key, scoped to `project_id`.
    pub order: i64,
    /// Client-assigned creation time in epoch milliseconds.
    pub created_at: i64,
}

/// Partial update for a task: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl TaskPatch {
    /// Patch that only replaces the title.
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            comment: None,
        }
    }

    /// Patch that only replaces the comment.
    pub fn comment(value: impl Into<String>) -> Self {
        Self {
            title: None,
            comment: Some(value.into()),
        }
    }

    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.comment.is_none()
    }
}

impl Project {
    /// Creates a project record with a caller-provided id and order key.
    pub fn new(id: ProjectId, title: impl Into<String>, order: i64, created_at: i64) -> Self {
        Self {
            id,
            title: title.into(),
            order,
            created_at,
        }
    }
}

impl Task {
    /// Creates a task record with an empty comment.
    pub fn new(
        id: TaskId,
        project_id: ProjectId,
        title: impl Into<String>,
        order: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            project_id,
            title: title.into(),
            comment: String::new(),
            order,
            created_at,
        }
    }
}

/// Generates a fresh entity id for backends without server-side ids.
pub fn generate_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{generate_entity_id, Project, Task, TaskPatch};

    #[test]
    fn generated_ids_are_unique() {
        let first = generate_entity_id();
        let second = generate_entity_id();
        assert_ne!(first, second);
    }

    #[test]
    fn task_patch_reports_emptiness() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::title("t").is_empty());
        assert!(!TaskPatch::comment("").is_empty());
    }

    #[test]
    fn wire_encoding_uses_camel_case_names() {
        let project = Project::new("p1".to_string(), "inbox", 1000, 42);
        let encoded = serde_json::to_value(&project).expect("project should encode");
        assert_eq!(encoded["createdAt"], 42);

        let task = Task::new("t1".to_string(), "p1".to_string(), "first", 1000, 42);
        let encoded = serde_json::to_value(&task).expect("task should encode");
        assert_eq!(encoded["projectId"], "p1");
        assert_eq!(encoded["comment"], "");
    }
}
