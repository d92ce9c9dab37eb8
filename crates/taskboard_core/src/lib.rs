//! Core data layer for the taskboard.
//! This crate is the single source of truth for board invariants: order
//! keys, cascade delete, and the dual-backend store contract.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod subscription;

pub use config::{BoardConfig, RemoteConfig, RemoteSettings};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::{Project, ProjectId, Task, TaskId, TaskPatch};
pub use model::ordering::{array_move, next_order, position_order, sort_by_order, ORDER_STEP};
pub use service::board_service::BoardService;
pub use store::{
    open_store, BoardStore, LocalStore, RemoteStore, SnapshotHandler, StorageKind, StoreError,
    StoreResult,
};
pub use subscription::{ListenerSet, Subscription};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
