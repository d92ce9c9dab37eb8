//! Local fallback backend over the key-value database.
//!
//! # Responsibility
//! - Emulate a minimal real-time document store: whole-state reads and
//!   writes under one fixed key plus manual change notification.
//!
//! # Invariants
//! - Every mutation writes the full state, then notifies every listener
//!   synchronously in registration order.
//! - A missing or malformed state record is recovered as the empty board,
//!   never surfaced as an error.
//! - Each instance owns its connection and listener registry; two
//!   instances never share hidden state.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::board::{
    epoch_millis_now, generate_entity_id, Project, ProjectId, Task, TaskId, TaskPatch,
};
use crate::model::ordering::{next_order, position_order, sort_by_order};
use crate::store::{BoardStore, SnapshotHandler, StorageKind, StoreError, StoreResult};
use crate::subscription::{ListenerSet, Subscription};
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Fixed key the whole board state lives under. The version suffix leaves
/// room for a future layout change without clobbering old data.
pub const LOCAL_STATE_KEY: &str = "todo.projects_tasks.v1";

/// Whole persisted board state: one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardState {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

struct LocalInner {
    conn: Mutex<Connection>,
    listeners: ListenerSet,
}

/// Key-value-backed board store with manual publish/subscribe.
pub struct LocalStore {
    inner: Arc<LocalInner>,
}

impl LocalStore {
    /// Opens (and migrates) the fallback database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens an isolated in-memory instance, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(LocalInner {
                conn: Mutex::new(conn),
                listeners: ListenerSet::new(),
            }),
        }
    }

    /// Loads, mutates and persists the whole state, then notifies.
    ///
    /// The connection lock is released before listeners run, so listeners
    /// are free to read back through the store.
    fn mutate<R>(&self, apply: impl FnOnce(&mut BoardState) -> StoreResult<R>) -> StoreResult<R> {
        let result = {
            let conn = self.inner.lock_conn();
            let mut state = load_state(&conn)?;
            let result = apply(&mut state)?;
            write_state(&conn, &state)?;
            result
        };
        self.inner.listeners.notify();
        Ok(result)
    }

    fn subscribe_with<T, F>(&self, handler: SnapshotHandler<T>, select: F) -> Subscription
    where
        T: 'static,
        F: Fn(BoardState) -> Vec<T> + Send + Sync + 'static,
    {
        let inner: Weak<LocalInner> = Arc::downgrade(&self.inner);
        let emit = move || {
            if let Some(inner) = inner.upgrade() {
                handler(select(inner.snapshot_state()));
            }
        };
        // Replay-on-subscribe: the current snapshot goes out before the
        // listener joins the registry.
        emit();
        self.inner.listeners.subscribe(emit)
    }
}

impl LocalInner {
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// State for the emit path, where errors cannot propagate.
    fn snapshot_state(&self) -> BoardState {
        match load_state(&self.lock_conn()) {
            Ok(state) => state,
            Err(err) => {
                error!("event=local_read module=store status=error error={err}");
                BoardState::default()
            }
        }
    }
}

impl BoardStore for LocalStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    fn subscribe_projects(&self, handler: SnapshotHandler<Project>) -> Subscription {
        self.subscribe_with(handler, |state| {
            let mut projects = state.projects;
            sort_by_order(&mut projects);
            projects
        })
    }

    fn subscribe_tasks(&self, handler: SnapshotHandler<Task>) -> Subscription {
        self.subscribe_with(handler, |state| {
            let mut tasks = state.tasks;
            sort_by_order(&mut tasks);
            tasks
        })
    }

    fn create_project(&self, title: &str) -> StoreResult<ProjectId> {
        let title = title.to_string();
        self.mutate(move |state| {
            let order = next_order(state.projects.iter().map(|p| p.order));
            let id = generate_entity_id();
            state
                .projects
                .push(Project::new(id.clone(), title, order, epoch_millis_now()));
            Ok(id)
        })
    }

    fn rename_project(&self, id: &str, title: &str) -> StoreResult<()> {
        self.mutate(|state| {
            let project = state
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            project.title = title.to_string();
            Ok(())
        })
    }

    fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.mutate(|state| {
            if !state.projects.iter().any(|p| p.id == id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            state.projects.retain(|p| p.id != id);
            state.tasks.retain(|t| t.project_id != id);
            Ok(())
        })
    }

    fn reorder_projects(&self, ids_in_order: &[ProjectId]) -> StoreResult<()> {
        let order_map = position_map(ids_in_order);
        self.mutate(move |state| {
            for project in &mut state.projects {
                if let Some(order) = order_map.get(project.id.as_str()) {
                    project.order = *order;
                }
            }
            Ok(())
        })
    }

    fn create_task(&self, project_id: &str, title: &str) -> StoreResult<TaskId> {
        let title = title.to_string();
        self.mutate(move |state| {
            if !state.projects.iter().any(|p| p.id == project_id) {
                return Err(StoreError::UnknownProject(project_id.to_string()));
            }
            let order = next_order(
                state
                    .tasks
                    .iter()
                    .filter(|t| t.project_id == project_id)
                    .map(|t| t.order),
            );
            let id = generate_entity_id();
            state.tasks.push(Task::new(
                id.clone(),
                project_id.to_string(),
                title,
                order,
                epoch_millis_now(),
            ));
            Ok(id)
        })
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.mutate(|state| {
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(comment) = &patch.comment {
                task.comment = comment.clone();
            }
            Ok(())
        })
    }

    fn delete_task(&self, id: &str) -> StoreResult<()> {
        self.mutate(|state| {
            if !state.tasks.iter().any(|t| t.id == id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            state.tasks.retain(|t| t.id != id);
            Ok(())
        })
    }

    fn reorder_tasks(&self, project_id: &str, ids_in_order: &[TaskId]) -> StoreResult<()> {
        let order_map = position_map(ids_in_order);
        self.mutate(move |state| {
            for task in &mut state.tasks {
                if task.project_id != project_id {
                    continue;
                }
                if let Some(order) = order_map.get(task.id.as_str()) {
                    task.order = *order;
                }
            }
            Ok(())
        })
    }
}

fn position_map(ids_in_order: &[String]) -> HashMap<String, i64> {
    ids_in_order
        .iter()
        .enumerate()
        .map(|(index, id)| (id.clone(), position_order(index)))
        .collect()
}

fn load_state(conn: &Connection) -> DbResult<BoardState> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM local_state WHERE key = ?1;",
            [LOCAL_STATE_KEY],
            |row| row.get(0),
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(BoardState::default());
    };

    match serde_json::from_str(&raw) {
        Ok(state) => Ok(state),
        Err(err) => {
            // Recover as the empty board, but leave a trace instead of
            // swallowing the corruption silently.
            warn!("event=local_read module=store status=recovered reason=malformed_state error={err}");
            Ok(BoardState::default())
        }
    }
}

fn write_state(conn: &Connection, state: &BoardState) -> StoreResult<()> {
    let encoded = serde_json::to_string(state)
        .map_err(|err| StoreError::InvalidData(format!("state failed to encode: {err}")))?;
    conn.execute(
        "INSERT INTO local_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![LOCAL_STATE_KEY, encoded],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BoardState, LocalStore, LOCAL_STATE_KEY};
    use crate::store::BoardStore;

    #[test]
    fn state_round_trips_through_json() {
        let store = LocalStore::open_in_memory().expect("store should open");
        let project_id = store.create_project("alpha").expect("create project");
        store.create_task(&project_id, "first").expect("create task");

        let raw: String = {
            let conn = store.inner.lock_conn();
            conn.query_row(
                "SELECT value FROM local_state WHERE key = ?1;",
                [LOCAL_STATE_KEY],
                |row| row.get(0),
            )
            .expect("state row should exist")
        };

        let decoded: BoardState = serde_json::from_str(&raw).expect("state should decode");
        assert_eq!(decoded.projects.len(), 1);
        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.tasks[0].project_id, project_id);
    }

    #[test]
    fn persisted_state_uses_wire_field_names() {
        let store = LocalStore::open_in_memory().expect("store should open");
        let project_id = store.create_project("alpha").expect("create project");
        store.create_task(&project_id, "first").expect("create task");

        let raw: String = {
            let conn = store.inner.lock_conn();
            conn.query_row(
                "SELECT value FROM local_state WHERE key = ?1;",
                [LOCAL_STATE_KEY],
                |row| row.get(0),
            )
            .expect("state row should exist")
        };

        assert!(raw.contains("\"projectId\""));
        assert!(raw.contains("\"createdAt\""));
    }
}
