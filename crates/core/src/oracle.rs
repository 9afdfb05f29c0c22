//! Oracle trait — the abstraction over the reasoning backend.
//!
//! An Oracle takes the conversation so far and returns the next raw text
//! turn. Transport concerns (HTTP, retries, timeouts) live behind this
//! trait; text the control core cannot parse is a *malformed response*
//! handled by the clarification escalator, never a transport error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// System instructions (action format, capability listing)
    System,
    /// The task, observations, and corrective guidance
    User,
    /// The oracle's output
    Assistant,
}

/// A single turn in the oracle conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Errors from the oracle transport.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by oracle, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

impl OracleError {
    /// Whether the transport layer should retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimited { .. } | OracleError::Timeout(_) | OracleError::Network(_)
        )
    }
}

/// The reasoning oracle seam.
///
/// Given the conversation so far, return the next raw text turn. The
/// control core owns parsing; an implementation must not attempt to
/// interpret or validate the text it relays.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// A human-readable name for this oracle (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Ask for the next turn.
    async fn ask(&self, turns: &[Turn]) -> std::result::Result<String, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_constructors_set_roles() {
        assert_eq!(Turn::system("s").role, TurnRole::System);
        assert_eq!(Turn::user("u").role, TurnRole::User);
        assert_eq!(Turn::assistant("a").role, TurnRole::Assistant);
    }

    #[test]
    fn retryable_classification() {
        assert!(OracleError::Timeout("30s".into()).is_retryable());
        assert!(OracleError::Network("reset".into()).is_retryable());
        assert!(
            OracleError::RateLimited {
                retry_after_secs: 5
            }
            .is_retryable()
        );
        assert!(!OracleError::AuthenticationFailed("bad key".into()).is_retryable());
        assert!(
            !OracleError::ApiError {
                status_code: 500,
                message: "boom".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn turn_serialization_uses_lowercase_roles() {
        let json = serde_json::to_string(&Turn::user("hello")).unwrap();
        assert!(json.contains("\"user\""));
    }
}
