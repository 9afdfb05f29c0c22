//! Action and Outcome domain types.
//!
//! An Action is what the oracle proposes: a named operation plus scalar
//! parameters. An Outcome is what executing it produced. These are the
//! value objects the whole control core trades in.

use serde::{Deserialize, Serialize};

/// A named operation with JSON scalar parameters, proposed by the oracle
/// and executed by the action registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The action name (e.g., "file_read", "file_write")
    pub name: String,

    /// Parameters as a JSON object
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    /// Create an action with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Builder-style parameter addition.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a string parameter, if present and a string.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for (k, v) in &self.params {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        write!(f, ")")
    }
}

/// Machine-readable reason codes for action failures.
///
/// The fallback policy keys its decision table on these, so executors must
/// map their error conditions onto this taxonomy rather than inventing
/// free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// The target does not exist (file, directory, action name)
    NotFound,
    /// The target exists but has the wrong kind (e.g., path is a directory)
    WrongType,
    /// The operation conflicts with current state (e.g., search text absent)
    Conflict,
    /// The operation did not complete in time
    Timeout,
    /// The operation was denied by the platform
    PermissionDenied,
    /// Anything outside the known taxonomy
    Unknown,
}

impl FailureReason {
    /// Transient failures are eligible for backoff-and-retry instead of
    /// substitution.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureReason::Timeout)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::NotFound => "not-found",
            FailureReason::WrongType => "wrong-type",
            FailureReason::Conflict => "conflict",
            FailureReason::Timeout => "timeout",
            FailureReason::PermissionDenied => "permission-denied",
            FailureReason::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// The result of executing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    /// The action completed; `content` is the observation text handed back
    /// to the oracle.
    Success {
        content: String,
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        metadata: serde_json::Map<String, serde_json::Value>,
    },
    /// The action failed in an expected, classified way.
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl Outcome {
    /// A success outcome with no metadata.
    pub fn success(content: impl Into<String>) -> Self {
        Outcome::Success {
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// A failure outcome.
    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Outcome::Failure {
            reason,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The failure reason, if this is a failure.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Outcome::Failure { reason, .. } => Some(*reason),
            Outcome::Success { .. } => None,
        }
    }
}
