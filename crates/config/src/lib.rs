//! Configuration loading, validation, and management for TravelGuide.
//!
//! Loads configuration from `~/.travelguide/config.toml` (optional) with
//! environment variable overrides. The LLM backend URL and API key are
//! required; a missing one is a startup error, never a per-request one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable for the backend base URL.
pub const ENV_BASE_URL: &str = "TRAVELGUIDE_BASE_URL";
/// Environment variable for the backend API key.
pub const ENV_API_KEY: &str = "TRAVELGUIDE_API_KEY";

/// Accepted as fallbacks when the primary variables are unset.
const FALLBACK_BASE_URL_VARS: &[&str] = &["OLLAMA_BASE_URL"];
const FALLBACK_API_KEY_VARS: &[&str] = &["GROQ_API_KEY", "OPENAI_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.travelguide/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared LLM backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Model profile for structured travel guides
    #[serde(default = "ModelProfile::guide")]
    pub guide: ModelProfile,

    /// Model profile for the streaming travel chat
    #[serde(default = "ModelProfile::chat")]
    pub chat: ModelProfile,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend", &self.backend)
            .field("guide", &self.guide)
            .field("chat", &self.chat)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Label used in logs (e.g. "groq", "ollama")
    #[serde(default = "default_provider_name")]
    pub provider: String,

    /// OpenAI-compatible base URL, e.g. `https://api.groq.com/openai/v1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_provider_name() -> String {
    "openai-compatible".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider_name(),
            base_url: None,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Per-use-case model settings. Immutable once the process has started.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model: String,

    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-attempt request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Overrides `backend.base_url` for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Overrides `backend.api_key` for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    2
}

impl ModelProfile {
    /// Deterministic profile for structured JSON guides.
    pub fn guide() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            api_url: None,
            api_key: None,
        }
    }

    /// Conversational profile for Markdown chat.
    pub fn chat() -> Self {
        Self {
            model: "llama3.2:1b".into(),
            temperature: 0.9,
            ..Self::guide()
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ModelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProfile")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Request body limit for the guide endpoint
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Backend coordinates for one profile, after overrides are applied.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedBackend {
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.travelguide/config.toml),
    /// apply environment overrides, and require backend credentials.
    ///
    /// Environment variables:
    /// - `TRAVELGUIDE_BASE_URL` (fallback: `OLLAMA_BASE_URL`)
    /// - `TRAVELGUIDE_API_KEY` (fallbacks: `GROQ_API_KEY`, `OPENAI_API_KEY`)
    /// - `TRAVELGUIDE_GUIDE_MODEL`, `TRAVELGUIDE_CHAT_MODEL`, `TRAVELGUIDE_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        config.require_backend()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. No environment lookups.
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

    /// Apply environment overrides through `lookup` (injected for tests).
    ///
    /// Credentials from the environment win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |primary: &str, fallbacks: &[&str]| {
            std::iter::once(primary)
                .chain(fallbacks.iter().copied())
                .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        };

        if let Some(url) = first(ENV_BASE_URL, FALLBACK_BASE_URL_VARS) {
            self.backend.base_url = Some(url);
        }
        if let Some(key) = first(ENV_API_KEY, FALLBACK_API_KEY_VARS) {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = lookup("TRAVELGUIDE_GUIDE_MODEL") {
            self.guide.model = model;
        }
        if let Some(model) = lookup("TRAVELGUIDE_CHAT_MODEL") {
            self.chat.model = model;
        }
        if let Some(port) = lookup("TRAVELGUIDE_PORT").and_then(|p| p.parse().ok()) {
            self.gateway.port = port;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".travelguide")
    }

    /// Validate ranges and retry budgets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in [("guide", &self.guide), ("chat", &self.chat)] {
            if !(0.0..=2.0).contains(&profile.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if profile.max_retries < 2 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.max_retries must be at least 2"
                )));
            }
            if profile.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.timeout_secs must be greater than 0"
                )));
            }
            if profile.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.model must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Fail unless both profiles can resolve a base URL and an API key.
    pub fn require_backend(&self) -> Result<(), ConfigError> {
        self.resolve(&self.guide)?;
        self.resolve(&self.chat)?;
        Ok(())
    }

    /// Resolve backend coordinates for a profile (profile overrides win).
    pub fn resolve(&self, profile: &ModelProfile) -> Result<ResolvedBackend, ConfigError> {
        let base_url = profile
            .api_url
            .clone()
            .or_else(|| self.backend.base_url.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSetting {
                setting: "backend.base_url",
                env: ENV_BASE_URL,
            })?;
        let api_key = profile
            .api_key
            .clone()
            .or_else(|| self.backend.api_key.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSetting {
                setting: "backend.api_key",
                env: ENV_API_KEY,
            })?;

        Ok(ResolvedBackend {
            provider: self.backend.provider.clone(),
            base_url,
            api_key,
        })
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            guide: ModelProfile::guide(),
            chat: ModelProfile::chat(),
            gateway: GatewayConfig::default(),
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

    #[error("Missing required setting {setting} (set {env} or add it to config.toml)")]
    MissingSetting {
        setting: &'static str,
        env: &'static str,
    },
}
