//! Action registry — the closed capability set.
//!
//! Every action the oracle may propose is registered at process init as a
//! name → (typed parameter schema, executor) pair. Lookup is by name, but
//! there is no runtime reflection: parameters are validated against the
//! declared schema before the executor runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::action::{Action, FailureReason, Outcome};
use crate::error::ExecutorPanic;

/// The scalar kinds a parameter may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Integer,
    Number,
    Flag,
}

impl ParamKind {
    /// Does this JSON value satisfy the kind?
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamKind::Text => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Flag => value.is_boolean(),
        }
    }
}

/// One declared parameter of a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// The descriptor for one registered action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl Capability {
    /// Validate a parameter map against this capability.
    ///
    /// Returns the first violation as a message, or None if valid.
    pub fn check_params(&self, params: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
        for spec in &self.params {
            match params.get(&spec.name) {
                None if spec.required => {
                    return Some(format!("missing required parameter '{}'", spec.name));
                }
                Some(value) if !spec.kind.matches(value) => {
                    return Some(format!(
                        "parameter '{}' has the wrong type (expected {:?})",
                        spec.name, spec.kind
                    ));
                }
                _ => {}
            }
        }
        None
    }
}

/// An executor behind one capability.
///
/// Ordinary, expected failures come back as `Outcome::Failure` with a
/// classified reason so the fallback policy can act on them. `Err` is
/// reserved for unrecoverable invariant violations and terminates the
/// whole run.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// The capability descriptor for this executor.
    fn capability(&self) -> Capability;

    /// Execute with already-validated parameters.
    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<Outcome, ExecutorPanic>;
}

/// A registry of available actions.
///
/// Immutable after init-time registration; many concurrent runs may share
/// one registry behind an `Arc` without synchronization.
pub struct ActionRegistry {
    executors: HashMap<String, Box<dyn ActionExecutor>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor. Replaces any existing executor with the same name.
    pub fn register(&mut self, executor: Box<dyn ActionExecutor>) {
        let name = executor.capability().name;
        self.executors.insert(name, executor);
    }

    /// Look up the descriptor for an action name.
    pub fn resolve(&self, name: &str) -> Option<Capability> {
        self.executors.get(name).map(|e| e.capability())
    }

    /// All registered capabilities, sorted by name.
    pub fn capabilities(&self) -> Vec<Capability> {
        let mut caps: Vec<Capability> = self.executors.values().map(|e| e.capability()).collect();
        caps.sort_by(|a, b| a.name.cmp(&b.name));
        caps
    }

    /// All registered action names.
    pub fn names(&self) -> Vec<&str> {
        self.executors.keys().map(|s| s.as_str()).collect()
    }

    /// Execute an action: resolve, validate parameters, dispatch.
    ///
    /// Unknown names and invalid parameters are ordinary `Failure`
    /// outcomes — only an executor's own invariant violation escapes as
    /// `ExecutorPanic`.
    pub async fn invoke(&self, action: &Action) -> std::result::Result<Outcome, ExecutorPanic> {
        let Some(executor) = self.executors.get(&action.name) else {
            return Ok(Outcome::failure(
                FailureReason::NotFound,
                format!("Unknown action: {}", action.name),
            ));
        };

        if let Some(violation) = executor.capability().check_params(&action.params) {
            return Ok(Outcome::failure(
                FailureReason::Unknown,
                format!("Invalid parameters for {}: {violation}", action.name),
            ));
        }

        executor.execute(&action.params).await
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test executor for unit tests.
    struct EchoExecutor;

    #[async_trait]
    impl ActionExecutor for EchoExecutor {
        fn capability(&self) -> Capability {
            Capability {
                name: "echo".into(),
                description: "Echoes back the input".into(),
                params: vec![ParamSpec::required("text", ParamKind::Text)],
            }
        }

        async fn execute(
            &self,
            params: &serde_json::Map<String, serde_json::Value>,
        ) -> std::result::Result<Outcome, ExecutorPanic> {
            let text = params["text"].as_str().unwrap_or_default();
            Ok(Outcome::success(text))
        }
    }

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(EchoExecutor));
        registry
    }

    #[test]
    fn resolve_registered_and_unknown() {
        let registry = registry();
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("nonexistent").is_none());
    }

    #[tokio::test]
    async fn invoke_dispatches_to_executor() {
        let registry = registry();
        let action = Action::new("echo").with_param("text", "hello world");
        let outcome = registry.invoke(&action).await.unwrap();
        assert_eq!(outcome, Outcome::success("hello world"));
    }

    #[tokio::test]
    async fn invoke_unknown_action_is_not_found_failure() {
        let registry = registry();
        let outcome = registry.invoke(&Action::new("nonexistent")).await.unwrap();
        assert_eq!(outcome.failure_reason(), Some(FailureReason::NotFound));
    }

    #[tokio::test]
    async fn invoke_rejects_missing_required_param() {
        let registry = registry();
        let outcome = registry.invoke(&Action::new("echo")).await.unwrap();
        match outcome {
            Outcome::Failure { reason, message } => {
                assert_eq!(reason, FailureReason::Unknown);
                assert!(message.contains("text"));
            }
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_rejects_wrong_param_type() {
        let registry = registry();
        let action = Action::new("echo").with_param("text", 42);
        let outcome = registry.invoke(&action).await.unwrap();
        match outcome {
            Outcome::Failure { message, .. } => assert!(message.contains("wrong type")),
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[test]
    fn param_kind_matching() {
        assert!(ParamKind::Text.matches(&serde_json::json!("s")));
        assert!(ParamKind::Integer.matches(&serde_json::json!(3)));
        assert!(ParamKind::Number.matches(&serde_json::json!(1.5)));
        assert!(ParamKind::Flag.matches(&serde_json::json!(true)));
        assert!(!ParamKind::Text.matches(&serde_json::json!(3)));
        assert!(!ParamKind::Integer.matches(&serde_json::json!(1.5)));
    }
}
