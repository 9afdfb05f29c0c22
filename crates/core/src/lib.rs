//! # Gyro Core
//!
//! Domain types, traits, and error definitions for the Gyro task runner.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external seam (the reasoning oracle, the action executors, the
//! goal check) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod error;
pub mod event;
pub mod oracle;
pub mod registry;
pub mod step;

// Re-export key types at crate root for ergonomics
pub use action::{Action, FailureReason, Outcome};
pub use error::{Error, ExecutorPanic, Result};
pub use event::{EventBus, RunEvent};
pub use oracle::{Oracle, OracleError, Turn, TurnRole};
pub use registry::{ActionExecutor, ActionRegistry, Capability, ParamKind, ParamSpec};
pub use step::{HistoryLedger, Step};
