//! Error types for the Gyro domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Ordinary action
//! failures are NOT errors — they are `Outcome::Failure` values the
//! control core recovers from. These types cover the conditions that
//! abort a run.

use thiserror::Error;

use crate::oracle::OracleError;

/// An unrecoverable executor condition.
///
/// Distinct from `Outcome::Failure`: a panic means the executor or the
/// registry itself violated an invariant, and the run terminates
/// immediately without retry or substitution.
#[derive(Debug, Clone, Error)]
#[error("Executor '{executor}' raised an unrecoverable condition: {detail}")]
pub struct ExecutorPanic {
    pub executor: String,
    pub detail: String,
}

impl ExecutorPanic {
    pub fn new(executor: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            executor: executor.into(),
            detail: detail.into(),
        }
    }
}

/// The top-level error type for all Gyro operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorPanic),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
