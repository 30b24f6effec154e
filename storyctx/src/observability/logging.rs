//! Structured logging setup.
//!
//! The crate itself only emits `tracing` events. Binaries and test harnesses
//! that want to see them call [`init_logging`] once at startup.

use crate::config::parse_bool;
use crate::errors::{ConfigError, StoryContextError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding an `EnvFilter` directive string.
pub const ENV_LOG: &str = "STORYCTX_LOG";
/// Environment variable selecting the output format.
pub const ENV_LOG_FORMAT: &str = "STORYCTX_LOG_FORMAT";
/// Environment variable toggling ANSI colors in text output.
pub const ENV_LOG_ANSI: &str = "STORYCTX_LOG_ANSI";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid_value(
                ENV_LOG_FORMAT,
                format!("must be 'text' or 'json', got '{other}'"),
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives, e.g. `info` or `storyctx=debug`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Colored text output.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            ansi: default_ansi(),
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter directives.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Applies overrides from `lookup`, a key to value function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a value is unusable.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG).filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(ansi) = lookup(ENV_LOG_ANSI) {
            self.ansi = parse_bool(ENV_LOG_ANSI, &ansi)?;
        }
        Ok(self)
    }
}

/// Builds the event filter for `config`.
///
/// # Errors
///
/// Returns `StoryContextError::Logging` if the directives do not parse.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, StoryContextError> {
    EnvFilter::try_new(&config.level)
        .map_err(|e| StoryContextError::Logging(format!("invalid filter '{}': {e}", config.level)))
}

/// Installs a global `tracing` subscriber for `config`.
///
/// # Errors
///
/// Returns `StoryContextError::Logging` if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), StoryContextError> {
    let filter = build_env_filter(config)?;

    let (json, text) = match config.format {
        LogFormat::Json => (Some(fmt_layer::layer().json()), None),
        LogFormat::Text => (None, Some(fmt_layer::layer().with_ansi(config.ansi))),
    };

    Registry::default()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .map_err(|e| StoryContextError::Logging(e.to_string()))
}
