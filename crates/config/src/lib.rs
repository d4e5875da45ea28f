//! Configuration loading, validation, and management for CardSense.
//!
//! Loads configuration from `./cardsense.toml` (or `$CARDSENSE_CONFIG`),
//! then the `.env` file, then environment variable overrides. Validates all
//! settings at startup.

pub mod store;

pub use store::EnvFileStore;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the provisioned knowledge-base handle.
pub const VECTOR_STORE_ID_KEY: &str = "VECTOR_STORE_ID";

/// The root configuration structure.
///
/// Maps directly to `cardsense.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the hosted service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for answers
    #[serde(default = "default_model")]
    pub model: String,

    /// Where the process runs, which decides whether a handle may be created
    #[serde(default)]
    pub deployment: DeploymentMode,

    /// Knowledge base provisioning
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    /// Assistant prompt settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
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
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("deployment", &self.deployment)
            .field("knowledge_base", &self.knowledge_base)
            .field("assistant", &self.assistant)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Local deployments may create and persist a knowledge base; managed
/// (hosted) deployments must be handed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Local,
    Managed,
}

impl DeploymentMode {
    pub fn allows_provisioning(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Managed => f.write_str("managed"),
        }
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "managed" | "production" => Ok(Self::Managed),
            other => Err(ConfigError::ValidationError(format!(
                "unknown deployment mode '{other}' (expected 'local' or 'managed')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Pre-provisioned handle; usually comes from `VECTOR_STORE_ID`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store_id: Option<String>,

    /// Display name for a newly created knowledge base
    #[serde(default = "default_kb_name")]
    pub name: String,

    /// Directory of `.txt` documents uploaded on creation
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// `.env` file the created handle is written back to
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// How often to poll an upload batch, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_kb_name() -> String {
    "Bank Information".into()
}
fn default_documents_dir() -> PathBuf {
    PathBuf::from("txt_docs")
}
fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            vector_store_id: None,
            name: default_kb_name(),
            documents_dir: default_documents_dir(),
            env_file: default_env_file(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Markdown file holding the system instructions
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("cardsense_system_prompt.md")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: default_system_prompt_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path and the process environment.
    ///
    /// Order (later wins): defaults, TOML file, `.env` file, environment:
    /// - `OPENAI_API_KEY`, `CARDSENSE_API_URL`, `CARDSENSE_MODEL`
    /// - `VECTOR_STORE_ID`
    /// - `CARDSENSE_DEPLOYMENT`, `VERCEL=1` (forces managed mode)
    /// - `CARDSENSE_HOST`, `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;

        // Variables already set in the process take precedence over .env
        match dotenvy::from_path(&config.knowledge_base.env_file) {
            Ok(()) => tracing::debug!(
                path = %config.knowledge_base.env_file.display(),
                "Loaded environment file"
            ),
            Err(e) if e.not_found() => tracing::debug!(
                path = %config.knowledge_base.env_file.display(),
                "No environment file found"
            ),
            Err(e) => tracing::warn!(
                path = %config.knowledge_base.env_file.display(),
                error = %e,
                "Failed to load environment file"
            ),
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
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

    /// Path of the configuration file.
    pub fn config_path() -> PathBuf {
        std::env::var("CARDSENSE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cardsense.toml"))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = get("OPENAI_API_KEY");
        }
        if let Some(url) = get("CARDSENSE_API_URL") {
            self.api_url = url;
        }
        if let Some(model) = get("CARDSENSE_MODEL") {
            self.model = model;
        }
        if let Some(id) = get(VECTOR_STORE_ID_KEY) {
            self.knowledge_base.vector_store_id = Some(id);
        }
        if let Some(mode) = get("CARDSENSE_DEPLOYMENT") {
            self.deployment = mode.parse()?;
        }
        // Vercel marks its runtime with VERCEL=1
        if get("VERCEL").as_deref() == Some("1") {
            self.deployment = DeploymentMode::Managed;
        }
        if let Some(host) = get("CARDSENSE_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.knowledge_base.documents_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "knowledge_base.documents_dir must not be empty".into(),
            ));
        }

        if self.knowledge_base.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge_base.poll_interval_ms must be > 0".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be > 0".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The handle store matching this configuration, if the deployment may
    /// persist one.
    pub fn handle_store(&self) -> Option<EnvFileStore> {
        self.deployment.allows_provisioning().then(|| {
            EnvFileStore::new(self.knowledge_base.env_file.clone(), VECTOR_STORE_ID_KEY)
        })
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            deployment: DeploymentMode::default(),
            knowledge_base: KnowledgeBaseConfig::default(),
            assistant: AssistantConfig::default(),
            gateway: GatewayConfig::default(),
        }
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
