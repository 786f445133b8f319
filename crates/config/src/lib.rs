//! Configuration loading, validation, and management for Huddle.
//!
//! Loads configuration from `~/.huddle/config.toml` with environment
//! variable overrides. Validates all settings at startup: a bad config is
//! fatal before any log file is touched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.huddle/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (for Azure: the deployment name)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Turn-taking and termination settings
    #[serde(default)]
    pub group_chat: GroupChatConfig,

    /// Where the log files come from and where they are processed
    #[serde(default)]
    pub logs: LogsConfig,
}

fn default_provider() -> String {
    "azure".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("group_chat", &self.group_chat)
            .field("logs", &self.logs)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("use_bearer", &self.use_bearer)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL. For Azure this is the resource endpoint
    /// (`https://<resource>.openai.azure.com`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Azure `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Send `Authorization: Bearer` instead of the `api-key` header (Azure only)
    #[serde(default)]
    pub use_bearer: bool,
}

/// Settings for the two-party group chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChatConfig {
    /// Turn ceiling per input unit
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Clear the message log after each finished input unit
    #[serde(default = "default_true")]
    pub automatic_reset: bool,

    /// Cooldown before retrying a rate-limited turn
    #[serde(default = "default_rate_limit_backoff_secs")]
    pub rate_limit_backoff_secs: u64,

    /// Pause before each input unit to stay under the tokens-per-minute budget
    #[serde(default = "default_unit_delay_secs")]
    pub unit_delay_secs: u64,

    /// Phrase that ends a session when it appears in the last utterance
    #[serde(default = "default_termination_marker")]
    pub termination_marker: String,

    /// If non-empty, only these participants may end a session
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_terminators: Vec<String>,

    /// Tool-call round-trips a participant may make within one turn
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_rate_limit_backoff_secs() -> u64 {
    60
}
fn default_unit_delay_secs() -> u64 {
    30
}
fn default_termination_marker() -> String {
    "no action needed".into()
}
fn default_max_tool_iterations() -> u32 {
    8
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            automatic_reset: true,
            rate_limit_backoff_secs: default_rate_limit_backoff_secs(),
            unit_delay_secs: default_unit_delay_secs(),
            termination_marker: default_termination_marker(),
            authorized_terminators: vec![],
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Pristine sample logs, copied into `work_dir` before a run
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory the participants read from and append to
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("sample_logs")
}
fn default_work_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            work_dir: default_work_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.huddle/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// - `HUDDLE_API_KEY`, `AZURE_OPENAI_API_KEY`, `OPENAI_API_KEY` (first wins,
    ///   only if no key is configured)
    /// - `HUDDLE_PROVIDER`, `HUDDLE_MODEL`
    /// - `AZURE_OPENAI_ENDPOINT` sets the `azure` provider URL
    /// - `AZURE_OPENAI_DEPLOYMENT` sets the model
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("HUDDLE_API_KEY")
                .or_else(|| lookup("AZURE_OPENAI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("HUDDLE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            self.providers.entry("azure".into()).or_default().api_url = Some(endpoint);
        }

        if let Some(model) = lookup("HUDDLE_MODEL").or_else(|| lookup("AZURE_OPENAI_DEPLOYMENT")) {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".huddle")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.group_chat.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "group_chat.max_iterations must be at least 1".into(),
            ));
        }

        if self.group_chat.rate_limit_backoff_secs == 0 {
            return Err(ConfigError::ValidationError(
                "group_chat.rate_limit_backoff_secs must be at least 1".into(),
            ));
        }

        if self.group_chat.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "group_chat.max_tool_iterations must be at least 1".into(),
            ));
        }

        if self.group_chat.termination_marker.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "group_chat.termination_marker must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available for the default provider.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// A copy with every API key masked, safe to print.
    pub fn redacted(&self) -> Self {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]".to_string());
        let mut config = self.clone();
        config.api_key = mask(&self.api_key);
        for provider in config.providers.values_mut() {
            provider.api_key = mask(&provider.api_key);
        }
        config
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            group_chat: GroupChatConfig::default(),
            logs: LogsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
