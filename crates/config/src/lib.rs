//! Configuration loading, validation, and management for Gyro.
//!
//! Loads configuration from `~/.gyro/config.toml` with environment
//! variable overrides. Every control-core tunable lives in [`Limits`]
//! and is handed to the loop controller by value at construction —
//! there is no process-global mutable state, so a run is reproducible
//! from its inputs alone.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.gyro/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct GyroConfig {
    /// Oracle transport configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Control-core limits and thresholds
    #[serde(default)]
    pub limits: Limits,
}

/// Oracle transport settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key, if the endpoint requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport-level retry attempts for transient failures
    #[serde(default = "default_oracle_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "qwen2.5-coder:7b".into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_oracle_retries() -> u32 {
    3
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_oracle_retries(),
        }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl std::fmt::Debug for GyroConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GyroConfig")
            .field("oracle", &self.oracle)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Every tunable of the control core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Base iteration budget for a simple task
    #[serde(default = "default_base_iterations")]
    pub base_iterations: usize,

    /// The budget granted to a complex task, and the classification cap
    #[serde(default = "default_max_budget")]
    pub max_budget: usize,

    /// Consecutive failures / fallback-only steps before the phase flips to stuck
    #[serde(default = "default_stuck_after")]
    pub stuck_after: usize,

    /// Consecutive identical signatures before the next identical proposal loops
    #[serde(default = "default_identical_threshold")]
    pub identical_threshold: usize,

    /// Consecutive malformed oracle responses before abandoning
    #[serde(default = "default_max_malformed")]
    pub max_malformed: usize,

    /// Size of the one-time budget extension
    #[serde(default = "default_extension_step")]
    pub extension_step: usize,

    /// Remaining-iteration margin that makes an extension considered
    #[serde(default = "default_extension_margin")]
    pub extension_margin: usize,

    /// Base delay for transient-failure backoff, in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Cap on the doubling backoff delay, in milliseconds
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Same-action retries allowed for transient failures
    #[serde(default = "default_transient_max_retries")]
    pub transient_max_retries: usize,

    /// Truncation length for parameter values inside loop signatures
    #[serde(default = "default_signature_value_limit")]
    pub signature_value_limit: usize,
}

fn default_base_iterations() -> usize {
    10
}
fn default_max_budget() -> usize {
    25
}
fn default_stuck_after() -> usize {
    3
}
fn default_identical_threshold() -> usize {
    2
}
fn default_max_malformed() -> usize {
    3
}
fn default_extension_step() -> usize {
    5
}
fn default_extension_margin() -> usize {
    5
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_backoff_cap_ms() -> u64 {
    16_000
}
fn default_transient_max_retries() -> usize {
    3
}
fn default_signature_value_limit() -> usize {
    40
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            base_iterations: default_base_iterations(),
            max_budget: default_max_budget(),
            stuck_after: default_stuck_after(),
            identical_threshold: default_identical_threshold(),
            max_malformed: default_max_malformed(),
            extension_step: default_extension_step(),
            extension_margin: default_extension_margin(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            transient_max_retries: default_transient_max_retries(),
            signature_value_limit: default_signature_value_limit(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl GyroConfig {
    /// The config directory (`~/.gyro`).
    pub fn config_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gyro")
    }

    /// Load from `~/.gyro/config.toml` (if present) with env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = if path.is_file() {
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, then apply env overrides.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Environment variables take precedence over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("GYRO_BASE_URL") {
            self.oracle.base_url = url;
        }
        if let Ok(model) = std::env::var("GYRO_MODEL") {
            self.oracle.model = model;
        }
        if let Ok(key) = std::env::var("GYRO_API_KEY") {
            self.oracle.api_key = Some(key);
        }
        if let Ok(iters) = std::env::var("GYRO_MAX_ITERATIONS")
            && let Ok(n) = iters.parse::<usize>()
        {
            self.limits.base_iterations = n;
        }
    }

    /// Reject configurations the control core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.base_iterations == 0 {
            return Err(ConfigError::Invalid("base_iterations must be > 0".into()));
        }
        if self.limits.max_budget < self.limits.base_iterations {
            return Err(ConfigError::Invalid(
                "max_budget must be >= base_iterations".into(),
            ));
        }
        if self.limits.max_malformed == 0 {
            return Err(ConfigError::Invalid("max_malformed must be > 0".into()));
        }
        if self.limits.stuck_after == 0 {
            return Err(ConfigError::Invalid("stuck_after must be > 0".into()));
        }
        if self.oracle.base_url.is_empty() {
            return Err(ConfigError::Invalid("oracle.base_url must be set".into()));
        }
        Ok(())
    }
}
