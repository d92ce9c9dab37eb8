//! Uniform store contract over the remote document database and the local
//! fallback.
//!
//! # Responsibility
//! - Define the subscribe/create/rename/delete/reorder surface both
//!   backends implement.
//! - Select one backend at startup based on configuration completeness.
//!
//! # Invariants
//! - Snapshots delivered to subscribers are sorted ascending by order key.
//! - Backend selection happens once; there is no runtime re-evaluation.
//! - Backend failures propagate unchanged; no operation retries.

use crate::config::BoardConfig;
use crate::db::DbError;
use crate::model::board::{Project, ProjectId, Task, TaskId, TaskPatch};
use crate::subscription::Subscription;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod local;
pub mod remote;

pub use local::LocalStore;
pub use remote::RemoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Callback receiving each snapshot of one entity collection.
pub type SnapshotHandler<T> = Box<dyn Fn(Vec<T>) + Send + Sync>;

/// Errors from store operations on either backend.
#[derive(Debug)]
pub enum StoreError {
    /// Local fallback database failure.
    Db(DbError),
    /// HTTP transport failure against the remote store.
    Http(reqwest::Error),
    /// Remote store rejected the request.
    Backend { status: u16, message: String },
    /// Remote payload could not be converted into a domain record.
    InvalidData(String),
    /// The addressed entity does not exist.
    NotFound(String),
    /// Task creation referenced a project that does not exist.
    UnknownProject(ProjectId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Http(err) => write!(f, "{err}"),
            Self::Backend { status, message } => {
                write!(f, "remote store rejected request ({status}): {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid remote document: {message}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::UnknownProject(id) => write!(f, "task references unknown project: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Http(err) => Some(err),
            Self::Backend { .. } => None,
            Self::InvalidData(_) => None,
            Self::NotFound(_) => None,
            Self::UnknownProject(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Which backend a store instance talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Hosted document database.
    Remote,
    /// Local key-value fallback, no cross-device sync.
    Local,
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote document store"),
            Self::Local => write!(f, "local fallback store"),
        }
    }
}

/// Storage-agnostic board operations.
///
/// Two implementations exist: [`RemoteStore`] over the hosted document
/// database and [`LocalStore`] over the key-value fallback. The view layer
/// only ever sees this trait.
pub trait BoardStore: Send + Sync {
    /// Reports which backend is active.
    fn kind(&self) -> StorageKind;

    /// Delivers an immediate projects snapshot, then one per change,
    /// ascending by order key.
    fn subscribe_projects(&self, handler: SnapshotHandler<Project>) -> Subscription;

    /// Delivers an immediate tasks snapshot (all projects), then one per
    /// change, ascending by order key.
    fn subscribe_tasks(&self, handler: SnapshotHandler<Task>) -> Subscription;

    /// Creates a project at the end of the board and returns its id.
    fn create_project(&self, title: &str) -> StoreResult<ProjectId>;

    /// Replaces the title of one project.
    fn rename_project(&self, id: &str, title: &str) -> StoreResult<()>;

    /// Removes one project and every task that references it.
    fn delete_project(&self, id: &str) -> StoreResult<()>;

    /// Rewrites project order keys to match `ids_in_order`.
    /// Ids outside the collection are ignored.
    fn reorder_projects(&self, ids_in_order: &[ProjectId]) -> StoreResult<()>;

    /// Creates a task at the end of the given project and returns its id.
    fn create_task(&self, project_id: &str, title: &str) -> StoreResult<TaskId>;

    /// Applies a partial update to one task. An empty patch is a no-op.
    fn update_task(&self, id: &str, patch: &TaskPatch) -> StoreResult<()>;

    /// Removes one task.
    fn delete_task(&self, id: &str) -> StoreResult<()>;

    /// Rewrites order keys of the project's tasks to match `ids_in_order`.
    /// Ids outside the project are ignored.
    fn reorder_tasks(&self, project_id: &str, ids_in_order: &[TaskId]) -> StoreResult<()>;
}

/// Opens the backend the configuration selects.
///
/// Complete remote settings pick the remote store; anything less downgrades
/// to the local fallback with a diagnostic warning.
pub fn open_store(config: &BoardConfig) -> StoreResult<Box<dyn BoardStore>> {
    match config.remote.settings() {
        Some(settings) => {
            info!(
                "event=store_select module=store status=remote project_id={}",
                settings.project_id
            );
            Ok(Box::new(RemoteStore::connect(settings)?))
        }
        None => {
            warn!(
                "event=store_select module=store status=fallback reason=incomplete_remote_config \
                 path={}",
                config.local_db_path.display()
            );
            Ok(Box::new(LocalStore::open(&config.local_db_path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{open_store, StorageKind};
    use crate::config::BoardConfig;

    #[test]
    fn incomplete_remote_config_selects_the_fallback() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = BoardConfig::local_only(dir.path().join("board.db"));
        let store = open_store(&config).expect("store should open");
        assert_eq!(store.kind(), StorageKind::Local);
    }

    #[test]
    fn storage_kind_display_names_are_stable() {
        assert_eq!(StorageKind::Remote.to_string(), "remote document store");
        assert_eq!(StorageKind::Local.to_string(), "local fallback store");
    }
}
