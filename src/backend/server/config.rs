/**
 * Server Configuration
 *
 * Loads `ServerConfig` in three layers, each overriding the previous one:
 *
 * 1. Built-in defaults
 * 2. An optional TOML file (`MOEHUB_CONFIG`, or `moehub.toml` when present)
 * 3. Environment variables (after `.env` has been loaded by the binary)
 *
 * # Environment Variables
 *
 * | Variable | Default |
 * |----------|---------|
 * | `SERVER_PORT` | `3000` |
 * | `JWT_SECRET` | required |
 * | `DATABASE_URL` | unset (in-memory persistence) |
 * | `OLLAMA_BASE_URL` | `http://127.0.0.1:11434` |
 * | `OLLAMA_TIMEOUT_SECONDS` | `60` |
 * | `OLLAMA_STREAM_TIMEOUT_SECONDS` | `300` |
 * | `OLLAMA_MODELS_TIMEOUT_SECONDS` | `10` |
 * | `OLLAMA_MEMORY_MODEL` | request model |
 * | `OLLAMA_MEMORY_SUMMARY_PROMPT` | built-in |
 * | `OLLAMA_MEMORY_EXTRACT_PROMPT` | built-in |
 * | `CONTEXT_MAX_TOKENS` | `4096` |
 * | `CONTEXT_SAFE_RATIO` | `0.7` |
 * | `CONTEXT_MAX_HISTORY` | `40` |
 * | `CONTEXT_KEEP_RECENT` | `16` |
 *
 * # TOML Layout
 *
 * ```toml
 * port = 3000
 * jwt_secret = "change-me"
 *
 * [ollama]
 * base_url = "http://127.0.0.1:11434"
 * timeout_seconds = 60
 * memory_model = "qwen2.5:3b"
 *
 * [context]
 * max_tokens = 4096
 * safe_ratio = 0.7
 * ```
 *
 * Non-positive timeouts, from the file or the environment, fall back to
 * their defaults.
 */

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::llm::context::ContextLimits;
use crate::backend::llm::service::{ChatSettings, DEFAULT_SYSTEM_PROMPT};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_CONFIG_FILE: &str = "moehub.toml";
pub const DEFAULT_HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(300);

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MODELS_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("{0}")]
    Constraint(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Generation service settings
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub stream_timeout: Duration,
    pub models_timeout: Duration,
    pub memory_model: Option<String>,
    pub memory_summary_prompt: Option<String>,
    pub memory_extract_prompt: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
            models_timeout: Duration::from_secs(DEFAULT_MODELS_TIMEOUT_SECS),
            memory_model: None,
            memory_summary_prompt: None,
            memory_extract_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub ollama: OllamaConfig,
    pub context: ContextLimits,
    pub housekeeping_interval: Duration,
}

impl ServerConfig {
    /// Defaults with the given signing secret; handy for tests
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: jwt_secret.into(),
            database_url: None,
            ollama: OllamaConfig::default(),
            context: ContextLimits::default(),
            housekeeping_interval: DEFAULT_HOUSEKEEPING_INTERVAL,
        }
    }

    /// Load from the config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("MOEHUB_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let file = if explicit.is_some() || Path::new(&path).exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!("[Server] Loaded config file {}", path);
            Some(text)
        } else {
            None
        };

        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from optional TOML text and an environment lookup
    pub fn from_sources<F>(toml_text: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut port = DEFAULT_PORT;
        let mut jwt_secret = None;
        let mut database_url = None;
        let mut ollama = OllamaConfig::default();
        let mut context = ContextLimits::default();

        if let Some(text) = toml_text {
            let file: FileConfig = toml::from_str(text)?;
            if let Some(p) = file.port {
                port = p;
            }
            jwt_secret = file.jwt_secret.or(jwt_secret);
            database_url = file.database_url.or(database_url);
            file.ollama.apply(&mut ollama);
            file.context.apply(&mut context);
        }

        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = env("SERVER_PORT") {
            port = parse("SERVER_PORT", &v)?;
        }
        jwt_secret = env("JWT_SECRET").or(jwt_secret);
        database_url = env("DATABASE_URL").or(database_url);

        if let Some(v) = env("OLLAMA_BASE_URL") {
            ollama.base_url = v;
        }
        if let Some(v) = env("OLLAMA_TIMEOUT_SECONDS") {
            ollama.timeout = seconds_or(Some(parse("OLLAMA_TIMEOUT_SECONDS", &v)?), ollama.timeout);
        }
        if let Some(v) = env("OLLAMA_STREAM_TIMEOUT_SECONDS") {
            ollama.stream_timeout = seconds_or(Some(parse("OLLAMA_STREAM_TIMEOUT_SECONDS", &v)?), ollama.stream_timeout);
        }
        if let Some(v) = env("OLLAMA_MODELS_TIMEOUT_SECONDS") {
            ollama.models_timeout = seconds_or(Some(parse("OLLAMA_MODELS_TIMEOUT_SECONDS", &v)?), ollama.models_timeout);
        }
        ollama.memory_model = env("OLLAMA_MEMORY_MODEL").or(ollama.memory_model);
        ollama.memory_summary_prompt = env("OLLAMA_MEMORY_SUMMARY_PROMPT").or(ollama.memory_summary_prompt);
        ollama.memory_extract_prompt = env("OLLAMA_MEMORY_EXTRACT_PROMPT").or(ollama.memory_extract_prompt);

        if let Some(v) = env("CONTEXT_MAX_TOKENS") {
            context.max_tokens = parse("CONTEXT_MAX_TOKENS", &v)?;
        }
        if let Some(v) = env("CONTEXT_SAFE_RATIO") {
            context.safe_ratio = parse("CONTEXT_SAFE_RATIO", &v)?;
        }
        if let Some(v) = env("CONTEXT_MAX_HISTORY") {
            context.max_history = parse("CONTEXT_MAX_HISTORY", &v)?;
        }
        if let Some(v) = env("CONTEXT_KEEP_RECENT") {
            context.keep_recent = parse("CONTEXT_KEEP_RECENT", &v)?;
        }

        let config = Self {
            port,
            jwt_secret: jwt_secret.ok_or(ConfigError::Missing("JWT_SECRET"))?,
            database_url,
            ollama,
            context,
            housekeeping_interval: DEFAULT_HOUSEKEEPING_INTERVAL,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ctx = &self.context;
        if !(ctx.safe_ratio > 0.0 && ctx.safe_ratio <= 1.0) {
            return Err(ConfigError::Constraint(format!(
                "context safe_ratio must be in (0, 1], got {}",
                ctx.safe_ratio
            )));
        }
        if ctx.max_tokens == 0 {
            return Err(ConfigError::Constraint("context max_tokens must be positive".into()));
        }
        if ctx.keep_recent >= ctx.max_history {
            return Err(ConfigError::Constraint(format!(
                "context keep_recent ({}) must be below max_history ({})",
                ctx.keep_recent, ctx.max_history
            )));
        }
        let timeouts = [
            self.ollama.timeout,
            self.ollama.stream_timeout,
            self.ollama.models_timeout,
        ];
        if timeouts.iter().any(Duration::is_zero) {
            return Err(ConfigError::Constraint("ollama timeouts must be positive".into()));
        }
        Ok(())
    }

    /// Settings for the chat service
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            limits: self.context,
            timeout: self.ollama.timeout,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            memory_model: self.ollama.memory_model.clone(),
            summary_prompt: self.ollama.memory_summary_prompt.clone(),
            extract_prompt: self.ollama.memory_extract_prompt.clone(),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    port: Option<u16>,
    jwt_secret: Option<String>,
    database_url: Option<String>,
    #[serde(default)]
    ollama: FileOllama,
    #[serde(default)]
    context: FileContext,
}

#[derive(Debug, Default, Deserialize)]
struct FileOllama {
    base_url: Option<String>,
    timeout_seconds: Option<i64>,
    stream_timeout_seconds: Option<i64>,
    models_timeout_seconds: Option<i64>,
    memory_model: Option<String>,
    memory_summary_prompt: Option<String>,
    memory_extract_prompt: Option<String>,
}

impl FileOllama {
    fn apply(self, into: &mut OllamaConfig) {
        if let Some(url) = self.base_url.filter(|u| !u.trim().is_empty()) {
            into.base_url = url;
        }
        into.timeout = seconds_or(self.timeout_seconds, into.timeout);
        into.stream_timeout = seconds_or(self.stream_timeout_seconds, into.stream_timeout);
        into.models_timeout = seconds_or(self.models_timeout_seconds, into.models_timeout);
        into.memory_model = self.memory_model.or(into.memory_model.take());
        into.memory_summary_prompt = self.memory_summary_prompt.or(into.memory_summary_prompt.take());
        into.memory_extract_prompt = self.memory_extract_prompt.or(into.memory_extract_prompt.take());
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileContext {
    max_tokens: Option<usize>,
    safe_ratio: Option<f64>,
    max_history: Option<usize>,
    keep_recent: Option<usize>,
}

impl FileContext {
    fn apply(self, into: &mut ContextLimits) {
        into.max_tokens = self.max_tokens.unwrap_or(into.max_tokens);
        into.safe_ratio = self.safe_ratio.unwrap_or(into.safe_ratio);
        into.max_history = self.max_history.unwrap_or(into.max_history);
        into.keep_recent = self.keep_recent.unwrap_or(into.keep_recent);
    }
}

fn seconds_or(value: Option<i64>, default: Duration) -> Duration {
    match value {
        Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
        _ => default,
    }
}
