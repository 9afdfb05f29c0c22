//! Built-in action executors for Gyro.
//!
//! Six filesystem capabilities: read, write, edit, create directory, list
//! directory, delete. Expected failures come back as classified
//! `Outcome::Failure` values — the fallback policy keys on those reason
//! codes, so the mapping from io errors matters as much as the happy path.

pub mod dir_create;
pub mod dir_list;
pub mod file_delete;
pub mod file_edit;
pub mod file_read;
pub mod file_write;

use gyro_core::registry::ActionRegistry;
use gyro_core::{ExecutorPanic, FailureReason, Outcome};

/// Create a default registry with all built-in executors.
pub fn default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(file_read::FileRead));
    registry.register(Box::new(file_write::FileWrite));
    registry.register(Box::new(file_edit::FileEdit));
    registry.register(Box::new(dir_create::DirCreate));
    registry.register(Box::new(dir_list::DirList));
    registry.register(Box::new(file_delete::FileDelete));
    registry
}

/// Fetch a validated string parameter.
///
/// The registry has already validated presence and type against the
/// capability; a miss here is an invariant violation, not a user error.
pub(crate) fn require_str<'a>(
    params: &'a serde_json::Map<String, serde_json::Value>,
    name: &str,
    executor: &str,
) -> Result<&'a str, ExecutorPanic> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ExecutorPanic::new(executor, format!("validated parameter '{name}' missing")))
}

/// Map an io error onto the failure taxonomy.
pub(crate) fn io_failure(path: &str, verb: &str, err: std::io::Error) -> Outcome {
    let reason = match err.kind() {
        std::io::ErrorKind::NotFound => FailureReason::NotFound,
        std::io::ErrorKind::PermissionDenied => FailureReason::PermissionDenied,
        std::io::ErrorKind::IsADirectory => FailureReason::WrongType,
        std::io::ErrorKind::NotADirectory => FailureReason::WrongType,
        std::io::ErrorKind::TimedOut => FailureReason::Timeout,
        _ => FailureReason::Unknown,
    };
    Outcome::failure(reason, format!("Error {verb} {path}: {err}"))
}
