//! Remote backend over the hosted document database.
//!
//! # Responsibility
//! - Implement the uniform store contract with document CRUD, batch
//!   commits and ordered queries.
//! - Emulate the live listener feed by polling the ordered query and
//!   emitting only changed snapshots.
//!
//! # Invariants
//! - Reorder and cascade delete are each one atomic batch commit.
//! - Failures propagate to the caller unchanged; the poller logs and
//!   keeps going.

mod client;
mod values;

use crate::config::RemoteSettings;
use crate::model::board::{epoch_millis_now, Project, ProjectId, Task, TaskId, TaskPatch};
use crate::model::ordering::{next_order, position_order, sort_by_order};
use crate::store::{BoardStore, SnapshotHandler, StorageKind, StoreError, StoreResult};
use crate::subscription::Subscription;
use client::{
    delete_write, ordered_query, project_tasks_query, server_timestamp_write, update_write,
    DocumentClient,
};
use log::{debug, info, warn};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the subscription feed re-reads the ordered query.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const PROJECTS: &str = "projects";
const TASKS: &str = "tasks";
const SERVER_TIMESTAMP_FIELD: &str = "createdAtServer";

/// Document-database-backed board store.
pub struct RemoteStore {
    client: Arc<DocumentClient>,
    poll_interval: Duration,
}

impl RemoteStore {
    /// Builds the HTTP client for the configured database.
    pub fn connect(settings: RemoteSettings) -> StoreResult<Self> {
        let client = DocumentClient::new(&settings)?;
        info!(
            "event=remote_connect module=store status=ok project_id={}",
            settings.project_id
        );
        Ok(Self {
            client: Arc::new(client),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Overrides the listener poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn stamp_server_time(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.client.commit(vec![server_timestamp_write(
            &self.client.document_name(collection, id),
            SERVER_TIMESTAMP_FIELD,
        )])
    }
}

impl BoardStore for RemoteStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Remote
    }

    fn subscribe_projects(&self, handler: SnapshotHandler<Project>) -> Subscription {
        spawn_snapshot_poll(
            Arc::clone(&self.client),
            self.poll_interval,
            fetch_projects,
            handler,
            PROJECTS,
        )
    }

    fn subscribe_tasks(&self, handler: SnapshotHandler<Task>) -> Subscription {
        spawn_snapshot_poll(
            Arc::clone(&self.client),
            self.poll_interval,
            fetch_tasks,
            handler,
            TASKS,
        )
    }

    fn create_project(&self, title: &str) -> StoreResult<ProjectId> {
        let order = next_order(max_order(&self.client, PROJECTS, None)?);
        let fields = values::project_fields(title, order, epoch_millis_now());
        let id = self.client.create_document(PROJECTS, fields)?;
        self.stamp_server_time(PROJECTS, &id)?;
        Ok(id)
    }

    fn rename_project(&self, id: &str, title: &str) -> StoreResult<()> {
        self.client.patch_document(
            PROJECTS,
            id,
            json!({ "title": values::string_value(title) }),
            &["title"],
        )
    }

    fn delete_project(&self, id: &str) -> StoreResult<()> {
        if self.client.get_document(PROJECTS, id)?.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let tasks = self.client.run_query(project_tasks_query(id))?;
        let mut writes = vec![delete_write(&self.client.document_name(PROJECTS, id))];
        for (task_id, _) in &tasks {
            writes.push(delete_write(&self.client.document_name(TASKS, task_id)));
        }
        debug!(
            "event=remote_cascade_delete module=store project_id={id} tasks={}",
            tasks.len()
        );
        self.client.commit(writes)
    }

    fn reorder_projects(&self, ids_in_order: &[ProjectId]) -> StoreResult<()> {
        self.commit_reorder(PROJECTS, ids_in_order)
    }

    fn create_task(&self, project_id: &str, title: &str) -> StoreResult<TaskId> {
        if self.client.get_document(PROJECTS, project_id)?.is_none() {
            return Err(StoreError::UnknownProject(project_id.to_string()));
        }

        let order = next_order(max_order(&self.client, TASKS, Some(project_id))?);
        let fields = values::task_fields(project_id, title, order, epoch_millis_now());
        let id = self.client.create_document(TASKS, fields)?;
        self.stamp_server_time(TASKS, &id)?;
        Ok(id)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut fields = serde_json::Map::new();
        let mut mask = Vec::new();
        if let Some(title) = &patch.title {
            fields.insert("title".to_string(), values::string_value(title));
            mask.push("title");
        }
        if let Some(comment) = &patch.comment {
            fields.insert("comment".to_string(), values::string_value(comment));
            mask.push("comment");
        }
        self.client
            .patch_document(TASKS, id, serde_json::Value::Object(fields), &mask)
    }

    fn delete_task(&self, id: &str) -> StoreResult<()> {
        self.client.delete_document(TASKS, id)
    }

    fn reorder_tasks(&self, project_id: &str, ids_in_order: &[TaskId]) -> StoreResult<()> {
        // The batch addresses tasks by id; the scope only matters for the
        // position computation the caller already did.
        debug!(
            "event=remote_reorder module=store scope={project_id} count={}",
            ids_in_order.len()
        );
        self.commit_reorder(TASKS, ids_in_order)
    }
}

impl RemoteStore {
    fn commit_reorder(&self, collection: &str, ids_in_order: &[String]) -> StoreResult<()> {
        if ids_in_order.is_empty() {
            return Ok(());
        }
        let writes = ids_in_order
            .iter()
            .enumerate()
            .map(|(index, id)| {
                update_write(
                    &self.client.document_name(collection, id),
                    json!({ "order": values::integer_value(position_order(index)) }),
                    &["order"],
                )
            })
            .collect();
        self.client.commit(writes)
    }
}

fn fetch_projects(client: &DocumentClient) -> StoreResult<Vec<Project>> {
    let rows = client.run_query(ordered_query(PROJECTS, false, None, None))?;
    let mut projects: Vec<Project> = rows
        .iter()
        .map(|(id, fields)| values::decode_project(id, fields))
        .collect();
    sort_by_order(&mut projects);
    Ok(projects)
}

fn fetch_tasks(client: &DocumentClient) -> StoreResult<Vec<Task>> {
    let rows = client.run_query(ordered_query(TASKS, false, None, None))?;
    let mut tasks: Vec<Task> = rows
        .iter()
        .map(|(id, fields)| values::decode_task(id, fields))
        .collect();
    sort_by_order(&mut tasks);
    Ok(tasks)
}

/// Highest order key currently in scope, `None` for an empty scope.
fn max_order(
    client: &DocumentClient,
    collection: &str,
    project_filter: Option<&str>,
) -> StoreResult<Option<i64>> {
    let rows = client.run_query(ordered_query(collection, true, Some(1), project_filter))?;
    Ok(rows
        .first()
        .and_then(|(_, fields)| values::field_i64(fields, "order")))
}

/// Fetches one immediate snapshot, then keeps polling from a background
/// thread, emitting whenever the snapshot differs from the last one sent.
///
/// Cancellation flips a flag; the poller notices at its next wake-up and
/// exits without emitting again.
fn spawn_snapshot_poll<T>(
    client: Arc<DocumentClient>,
    interval: Duration,
    fetch: fn(&DocumentClient) -> StoreResult<Vec<T>>,
    handler: SnapshotHandler<T>,
    scope: &'static str,
) -> Subscription
where
    T: Clone + PartialEq + Send + 'static,
{
    let mut last = match fetch(&client) {
        Ok(items) => {
            let snapshot = items.clone();
            handler(items);
            Some(snapshot)
        }
        Err(err) => {
            warn!("event=remote_subscribe module=store status=deferred scope={scope} error={err}");
            None
        }
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    thread::spawn(move || {
        while !flag.load(Ordering::Relaxed) {
            thread::sleep(interval);
            if flag.load(Ordering::Relaxed) {
                break;
            }
            match fetch(&client) {
                Ok(items) => {
                    if last.as_ref() != Some(&items) {
                        last = Some(items.clone());
                        handler(items);
                    }
                }
                Err(err) => {
                    debug!(
                        "event=remote_poll module=store status=error scope={scope} error={err}"
                    );
                }
            }
        }
    });

    Subscription::new(move || cancelled.store(true, Ordering::Relaxed))
}
