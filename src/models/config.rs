//! Configuration models for second-opinion.
//!
//! Settings come from the environment, optionally layered over a TOML file.
//! The credential is the only required value; every other knob has a
//! fallback, and malformed optional defaults are dropped rather than clamped.

use crate::models::BackendTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment key holding the OpenRouter credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Comma-separated override for the default target list.
pub const MODELS_ENV: &str = "SECOND_OPINION_MODELS";
/// Per-call timeout override, in milliseconds.
pub const TIMEOUT_ENV: &str = "SECOND_OPINION_TIMEOUT";
/// Default sampling temperature, accepted only within [0, 2].
pub const TEMPERATURE_ENV: &str = "SECOND_OPINION_TEMPERATURE";
/// Default max output tokens, accepted only when positive.
pub const MAX_TOKENS_ENV: &str = "SECOND_OPINION_MAX_TOKENS";
/// Alternate OpenAI-compatible base URL.
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";

pub const DEFAULT_MODELS: [&str; 4] = [
    "openai/gpt-5.2",
    "google/gemini-3-pro-preview",
    "x-ai/grok-4.1-fast",
    "perplexity/sonar-reasoning-pro",
];

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Resolved, immutable runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// OpenRouter credential, forwarded as a bearer token
    pub api_key: String,

    /// Base URL for the OpenAI-compatible API
    pub base_url: String,

    /// Targets queried when a request carries no override
    pub models: Vec<BackendTarget>,

    /// Timeout applied to each individual remote call
    pub timeout_ms: u64,

    /// Temperature used when a request does not set one
    pub default_temperature: Option<f64>,

    /// Max output tokens used when a request does not set one
    pub default_max_tokens: Option<u32>,
}

/// On-disk configuration layer.
///
/// Every field is optional; the environment wins wherever both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub openrouter: OpenRouterSection,

    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// `[openrouter]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterSection {
    /// API key, may contain `${VAR}` placeholders
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_api_key_env() -> String {
    API_KEY_ENV.to_string()
}

impl Default for OpenRouterSection {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_ms: None,
        }
    }
}

/// `[defaults]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsSection {
    #[serde(default)]
    pub models: Option<Vec<String>>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub max_tokens: Option<i64>,
}

impl ConfigFile {
    /// Load the file layer from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }
}

impl Config {
    /// Load from an optional TOML file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Resolve a file layer against an environment lookup.
    ///
    /// Empty environment values count as unset.
    pub fn resolve<F>(file: ConfigFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let api_key = env(&file.openrouter.api_key_env)
            .or_else(|| file.openrouter.api_key.as_deref().map(expand_env_vars))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: file.openrouter.api_key_env.clone(),
            })?;

        let base_url = env(BASE_URL_ENV)
            .or(file.openrouter.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let models = match env(MODELS_ENV) {
            Some(raw) => parse_models(&raw),
            None => match file.defaults.models {
                Some(list) => list
                    .iter()
                    .map(|m| m.trim())
                    .filter(|m| !m.is_empty())
                    .map(BackendTarget::from)
                    .collect(),
                None => DEFAULT_MODELS.iter().copied().map(BackendTarget::from).collect(),
            },
        };

        let timeout_ms = match env(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Ignoring invalid {TIMEOUT_ENV}, using default");
                DEFAULT_TIMEOUT_MS
            }),
            None => file
                .openrouter
                .timeout_ms
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        };

        let default_temperature = match env(TEMPERATURE_ENV) {
            Some(raw) => {
                let parsed = parse_temperature(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "Ignoring invalid {TEMPERATURE_ENV}");
                }
                parsed
            }
            None => file.defaults.temperature.and_then(validate_temperature),
        };

        let default_max_tokens = match env(MAX_TOKENS_ENV) {
            Some(raw) => {
                let parsed = parse_max_tokens(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "Ignoring invalid {MAX_TOKENS_ENV}");
                }
                parsed
            }
            None => file.defaults.max_tokens.and_then(validate_max_tokens),
        };

        Ok(Self {
            api_key,
            base_url,
            models,
            timeout_ms,
            default_temperature,
            default_max_tokens,
        })
    }

    /// Per-call timeout as a `Duration`.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Read-only view published as the `second-opinion://config` resource.
    ///
    /// The credential is never part of it.
    pub fn resource_json(&self) -> serde_json::Value {
        serde_json::json!({
            "models": self.models,
            "timeout": self.timeout_ms,
            "defaultTemperature": self.default_temperature,
            "defaultMaxTokens": self.default_max_tokens,
        })
    }
}

/// Split a comma-separated target list, trimming each entry.
pub fn parse_models(raw: &str) -> Vec<BackendTarget> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(BackendTarget::from)
        .collect()
}

fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|t| *t > 0)
}

/// Parse a temperature, dropping anything outside [0, 2].
pub fn parse_temperature(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().and_then(validate_temperature)
}

/// NaN and infinities fail the range check too.
pub fn validate_temperature(value: f64) -> Option<f64> {
    (0.0..=2.0).contains(&value).then_some(value)
}

/// Parse a max-token count, dropping zero and negatives.
pub fn parse_max_tokens(raw: &str) -> Option<u32> {
    raw.trim().parse::<i64>().ok().and_then(validate_max_tokens)
}

fn validate_max_tokens(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

    re.replace_all(s, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{env_var} environment variable is required. Get one at https://openrouter.ai/keys")]
    MissingApiKey { env_var: String },

    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
