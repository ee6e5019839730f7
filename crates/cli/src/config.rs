//! Configuration loading from penman.toml.

use runtime::{OpenAiAuth, OpenAiBackend, OrchestratorConfig, RetryPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "penman.toml";
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Completion endpoint configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Loop limits.
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
}

/// Which flavour of chat-completions service to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Azure,
    OpenAi,
}

/// Completion endpoint configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Azure resource endpoint, or the base URL of an OpenAI-compatible
    /// service. Falls back to AZURE_OPENAI_ENDPOINT.
    pub endpoint: Option<String>,

    /// Falls back to AZURE_OPENAI_API_KEY.
    pub api_key: Option<String>,

    /// Model, or deployment name on Azure.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            endpoint: None,
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            temperature: default_temperature(),
        }
    }
}

/// Loop limits.
#[derive(Debug, Deserialize)]
pub struct OrchestratorSection {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            round_timeout_secs: default_round_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_version() -> String {
    "2024-08-01-preview".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.2)
}

fn default_max_rounds() -> u32 {
    16
}

fn default_round_timeout_secs() -> u64 {
    120
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every run fail.
    fn validate(&self) -> Result<(), ConfigError> {
        let section = &self.orchestrator;
        let zero = [
            ("max_rounds", u64::from(section.max_rounds)),
            ("round_timeout_secs", section.round_timeout_secs),
            ("tool_timeout_secs", section.tool_timeout_secs),
        ];
        match zero.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Invalid(format!(
                "orchestrator.{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }

    /// Load `path` if given, else `penman.toml` if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Fill unset credentials from the environment.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.backend.endpoint.is_none() {
            self.backend.endpoint = lookup(ENDPOINT_VAR);
        }
        if self.backend.api_key.is_none() {
            self.backend.api_key = lookup(API_KEY_VAR);
        }
        self
    }

    /// Build the completion backend.
    ///
    /// Azure requires both an endpoint and a key; OpenAI only a key.
    pub fn backend(&self) -> Result<OpenAiBackend, ConfigError> {
        let backend = &self.backend;
        let key = backend.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let auth = match backend.provider {
            Provider::Azure => OpenAiAuth::AzureKey(key),
            Provider::OpenAi => OpenAiAuth::Bearer(key),
        };

        let mut builder = OpenAiBackend::builder(auth, &backend.model)
            .api_version(&backend.api_version)
            .temperature(backend.temperature);
        match (&backend.endpoint, backend.provider) {
            (Some(endpoint), _) => builder = builder.base_url(endpoint),
            (None, Provider::Azure) => return Err(ConfigError::MissingEndpoint),
            (None, Provider::OpenAi) => {}
        }
        Ok(builder.build())
    }

    /// Loop limits for the orchestrator.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let section = &self.orchestrator;
        OrchestratorConfig {
            max_rounds: section.max_rounds,
            round_timeout: Duration::from_secs(section.round_timeout_secs),
            tool_timeout: Duration::from_secs(section.tool_timeout_secs),
            retry: RetryPolicy {
                max_retries: section.max_retries,
                ..RetryPolicy::default()
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("endpoint not configured: set backend.endpoint or {ENDPOINT_VAR}")]
    MissingEndpoint,

    #[error("API key not configured: set backend.api_key or {API_KEY_VAR}")]
    MissingApiKey,
}
