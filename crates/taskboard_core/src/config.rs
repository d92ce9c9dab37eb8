//! Startup configuration and backend selection inputs.
//!
//! # Responsibility
//! - Carry the fixed set of remote-store settings and the fallback
//!   database location.
//! - Decide completeness once; selection never re-evaluates at runtime.
//!
//! # Invariants
//! - The remote backend is eligible only when every remote setting is
//!   present and non-empty.
//! - Values read from the environment are trimmed; whitespace-only values
//!   count as absent.

use std::path::PathBuf;

pub const ENV_API_KEY: &str = "TASKBOARD_API_KEY";
pub const ENV_AUTH_DOMAIN: &str = "TASKBOARD_AUTH_DOMAIN";
pub const ENV_PROJECT_ID: &str = "TASKBOARD_PROJECT_ID";
pub const ENV_STORAGE_BUCKET: &str = "TASKBOARD_STORAGE_BUCKET";
pub const ENV_SENDER_ID: &str = "TASKBOARD_SENDER_ID";
pub const ENV_APP_ID: &str = "TASKBOARD_APP_ID";
pub const ENV_DB_PATH: &str = "TASKBOARD_DB_PATH";

const DEFAULT_DB_FILE: &str = "taskboard.db";

/// Possibly-incomplete remote-store settings, one field per named value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl RemoteConfig {
    /// Reads every remote setting from `TASKBOARD_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(ENV_API_KEY),
            auth_domain: env_value(ENV_AUTH_DOMAIN),
            project_id: env_value(ENV_PROJECT_ID),
            storage_bucket: env_value(ENV_STORAGE_BUCKET),
            sender_id: env_value(ENV_SENDER_ID),
            app_id: env_value(ENV_APP_ID),
        }
    }

    /// Returns validated settings when every value is present.
    pub fn settings(&self) -> Option<RemoteSettings> {
        Some(RemoteSettings {
            api_key: self.api_key.clone()?,
            auth_domain: self.auth_domain.clone()?,
            project_id: self.project_id.clone()?,
            storage_bucket: self.storage_bucket.clone()?,
            sender_id: self.sender_id.clone()?,
            app_id: self.app_id.clone()?,
        })
    }

    /// Whether the remote backend can be selected.
    pub fn is_complete(&self) -> bool {
        self.settings().is_some()
    }
}

/// Complete remote-store settings, guaranteed non-empty per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub sender_id: String,
    pub app_id: String,
}

/// Everything the store factory needs to pick and open a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub remote: RemoteConfig,
    /// Fallback database file, used only when `remote` is incomplete.
    pub local_db_path: PathBuf,
}

impl BoardConfig {
    /// Builds the startup configuration from the process environment.
    pub fn from_env() -> Self {
        let local_db_path = env_value(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
        Self {
            remote: RemoteConfig::from_env(),
            local_db_path,
        }
    }

    /// Configuration forced into fallback mode at the given path.
    pub fn local_only(local_db_path: impl Into<PathBuf>) -> Self {
        Self {
            remote: RemoteConfig::default(),
            local_db_path: local_db_path.into(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
