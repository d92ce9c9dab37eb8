//! Logging bootstrap for the board core.
//!
//! # Responsibility
//! - Initialize the process-wide logger exactly once.
//! - Keep diagnostics on stderr so the board rendering stays clean.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and never panics.
//! - Re-initialization with a different level is rejected.

use flexi_logger::{LogSpecification, Logger, LoggerHandle};
use once_cell::sync::OnceCell;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    _logger: LoggerHandle,
}

/// Initializes stderr logging at the given level.
///
/// # Errors
/// - Returns an error when `level` is unsupported.
/// - Returns an error when logging is already active at another level.
/// - Returns an error when the logger backend fails to start.
pub fn init_logging(level: &str) -> Result<(), String> {
    let normalized = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let spec = LogSpecification::parse(normalized)
            .map_err(|err| format!("invalid log level `{normalized}`: {err}"))?;
        let logger = Logger::with(spec)
            .log_to_stderr()
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;
        Ok(LoggingState {
            level: normalized,
            _logger: logger,
        })
    })?;

    if state.level != normalized {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{normalized}`",
            state.level
        ));
    }

    Ok(())
}

/// Returns the active log level, or `None` before initialization.
pub fn logging_status() -> Option<&'static str> {
    LOGGING_STATE.get().map(|state| state.level)
}

/// Returns the default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{default_log_level, init_logging, logging_status, normalize_level};

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(
            normalize_level("INFO").expect("INFO should normalize"),
            "info"
        );
        assert_eq!(
            normalize_level(" warning ").expect("warning should normalize"),
            "warn"
        );
        assert!(normalize_level("loud").is_err());
    }

    #[test]
    fn default_level_matches_build_mode() {
        let level = default_log_level();
        assert!(level == "debug" || level == "info");
    }

    #[test]
    fn init_is_idempotent_for_same_level_and_rejects_conflicts() {
        init_logging("info").expect("first init should succeed");
        init_logging("info").expect("same level should be idempotent");

        let conflict = init_logging("debug").expect_err("level conflict should fail");
        assert!(conflict.contains("refusing to switch"));

        assert_eq!(logging_status(), Some("info"));
    }
}
