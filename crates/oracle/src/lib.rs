//! OpenAI-compatible oracle transport.
//!
//! Works with: Ollama, OpenAI, OpenRouter, vLLM, and any endpoint exposing
//! a `/v1/chat/completions` surface. The transport owns timeouts and
//! bounded retry with doubling delay; it never interprets the text it
//! relays — parsing is the control core's job.

use async_trait::async_trait;
use gyro_config::OracleConfig;
use gyro_core::oracle::{Oracle, OracleError, Turn, TurnRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible reasoning oracle.
pub struct HttpOracle {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Create an oracle from configuration.
    pub fn from_config(config: &OracleConfig) -> Self {
        Self::new(
            "oracle",
            &config.base_url,
            &config.model,
            config.api_key.clone(),
            config.timeout_secs,
            config.max_retries,
        )
    }

    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            max_retries,
            client,
        }
    }

    /// Create an Ollama oracle (convenience constructor).
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            model,
            None,
            120,
            3,
        )
    }

    /// Create an OpenAI oracle (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            model,
            Some(api_key.into()),
            120,
            3,
        )
    }

    fn to_api_messages(turns: &[Turn]) -> Vec<ApiMessage> {
        turns
            .iter()
            .map(|t| ApiMessage {
                role: match t.role {
                    TurnRole::System => "system".into(),
                    TurnRole::User => "user".into(),
                    TurnRole::Assistant => "assistant".into(),
                },
                content: t.content.clone(),
            })
            .collect()
    }

    async fn ask_once(&self, turns: &[Turn]) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: self.model.clone(),
            messages: Self::to_api_messages(turns),
            stream: false,
        };

        debug!(oracle = %self.name, model = %self.model, turns = turns.len(), "Sending completion request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(e.to_string())
            } else {
                OracleError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(OracleError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(OracleError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Oracle returned error");
            return Err(OracleError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| OracleError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, turns: &[Turn]) -> Result<String, OracleError> {
        let mut delay = Duration::from_secs(1);
        let mut last_error = OracleError::NotConfigured("No attempts made".into());

        for attempt in 0..self.max_retries.max(1) {
            match self.ask_once(turns).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries.max(1) => {
                    warn!(
                        oracle = %self.name,
                        attempt = attempt + 1,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Oracle request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let oracle = HttpOracle::new("test", "http://localhost:11434/v1/", "m", None, 30, 1);
        assert_eq!(oracle.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn turns_map_to_api_roles() {
        let turns = vec![
            Turn::system("rules"),
            Turn::user("task"),
            Turn::assistant("thought"),
        ];
        let api = HttpOracle::to_api_messages(&turns);
        let roles: Vec<&str> = api.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(api[1].content, "task");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Port 9 (discard) should refuse immediately
        let oracle = HttpOracle::new("test", "http://127.0.0.1:9/v1", "m", None, 2, 1);
        let err = oracle.ask(&[Turn::user("hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            OracleError::Network(_) | OracleError::Timeout(_)
        ));
    }
}
