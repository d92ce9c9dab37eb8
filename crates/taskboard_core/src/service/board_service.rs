//! Board use-case service.
//!
//! # Responsibility
//! - Own the backend selected at startup and expose the board operations
//!   the view layer consumes.
//! - Turn drag-end gestures (index moves) into explicit reorder calls.
//!
//! # Invariants
//! - Every mutation goes through the store contract; nothing bypasses it.
//! - Index moves that change nothing (same index, out of range) are
//!   reported as no-ops without touching the backend.

use crate::config::BoardConfig;
use crate::model::board::{Project, ProjectId, Task, TaskId, TaskPatch};
use crate::model::ordering::array_move;
use crate::store::{open_store, BoardStore, SnapshotHandler, StorageKind, StoreResult};
use crate::subscription::Subscription;
use std::sync::{Arc, Mutex, PoisonError};

/// Use-case wrapper around the active [`BoardStore`].
pub struct BoardService {
    store: Box<dyn BoardStore>,
}

impl BoardService {
    /// Wraps an already-opened store.
    pub fn new(store: Box<dyn BoardStore>) -> Self {
        Self { store }
    }

    /// Selects and opens the backend the configuration calls for.
    pub fn open(config: &BoardConfig) -> StoreResult<Self> {
        Ok(Self::new(open_store(config)?))
    }

    /// Which backend this service talks to.
    pub fn kind(&self) -> StorageKind {
        self.store.kind()
    }

    pub fn subscribe_projects(&self, handler: SnapshotHandler<Project>) -> Subscription {
        self.store.subscribe_projects(handler)
    }

    pub fn subscribe_tasks(&self, handler: SnapshotHandler<Task>) -> Subscription {
        self.store.subscribe_tasks(handler)
    }

    /// One-shot projects read built on replay-on-subscribe.
    pub fn snapshot_projects(&self) -> Vec<Project> {
        capture_snapshot(|handler| self.store.subscribe_projects(handler))
    }

    /// One-shot tasks read across all projects.
    pub fn snapshot_tasks(&self) -> Vec<Task> {
        capture_snapshot(|handler| self.store.subscribe_tasks(handler))
    }

    /// Tasks of one project, in board order.
    pub fn tasks_of(&self, project_id: &str) -> Vec<Task> {
        self.snapshot_tasks()
            .into_iter()
            .filter(|task| task.project_id == project_id)
            .collect()
    }

    pub fn create_project(&self, title: &str) -> StoreResult<ProjectId> {
        self.store.create_project(title)
    }

    pub fn rename_project(&self, id: &str, title: &str) -> StoreResult<()> {
        self.store.rename_project(id, title)
    }

    pub fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.store.delete_project(id)
    }

    pub fn reorder_projects(&self, ids_in_order: &[ProjectId]) -> StoreResult<()> {
        self.store.reorder_projects(ids_in_order)
    }

    pub fn create_task(&self, project_id: &str, title: &str) -> StoreResult<TaskId> {
        self.store.create_task(project_id, title)
    }

    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> StoreResult<()> {
        self.store.update_task(id, patch)
    }

    pub fn delete_task(&self, id: &str) -> StoreResult<()> {
        self.store.delete_task(id)
    }

    pub fn reorder_tasks(&self, project_id: &str, ids_in_order: &[TaskId]) -> StoreResult<()> {
        self.store.reorder_tasks(project_id, ids_in_order)
    }

    /// Drag-end for the project column: moves the project at `old_index`
    /// to `new_index` and persists the resulting order.
    ///
    /// Returns `false` when the gesture changes nothing.
    pub fn move_project(&self, old_index: usize, new_index: usize) -> StoreResult<bool> {
        let mut ids: Vec<ProjectId> = self
            .snapshot_projects()
            .into_iter()
            .map(|project| project.id)
            .collect();
        if !apply_move(&mut ids, old_index, new_index) {
            return Ok(false);
        }
        self.store.reorder_projects(&ids)?;
        Ok(true)
    }

    /// Drag-end inside one project: moves the task at `old_index` to
    /// `new_index` within that project's ordered task list.
    pub fn move_task(
        &self,
        project_id: &str,
        old_index: usize,
        new_index: usize,
    ) -> StoreResult<bool> {
        let mut ids: Vec<TaskId> = self.tasks_of(project_id).into_iter().map(|t| t.id).collect();
        if !apply_move(&mut ids, old_index, new_index) {
            return Ok(false);
        }
        self.store.reorder_tasks(project_id, &ids)?;
        Ok(true)
    }
}

fn apply_move(ids: &mut Vec<String>, old_index: usize, new_index: usize) -> bool {
    if old_index == new_index || old_index >= ids.len() || new_index >= ids.len() {
        return false;
    }
    array_move(ids, old_index, new_index);
    true
}

/// Grabs the immediate snapshot a subscription replays, then cancels it.
fn capture_snapshot<T, F>(subscribe: F) -> Vec<T>
where
    T: Send + 'static,
    F: FnOnce(SnapshotHandler<T>) -> Subscription,
{
    let captured = Arc::new(Mutex::new(Vec::new()));
    let slot = Arc::clone(&captured);
    let subscription = subscribe(Box::new(move |items| {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = items;
    }));
    subscription.cancel();

    let mut guard = captured.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *guard)
}
