//! Configuration for context registries and logging.

use crate::errors::ConfigError;
use crate::observability::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable for [`RegistryConfig::discard_on_release`].
pub const ENV_DISCARD_ON_RELEASE: &str = "STORYCTX_DISCARD_ON_RELEASE";
/// Environment variable for [`RegistryConfig::resolve_timeout_seconds`].
pub const ENV_RESOLVE_TIMEOUT_SECS: &str = "STORYCTX_RESOLVE_TIMEOUT_SECS";

/// Configuration for a [`ContextRegistry`](crate::context::ContextRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Drop a context's pending entries when its worker binding is released.
    #[serde(default)]
    pub discard_on_release: bool,
    /// Deadline for resolving the whole pending view, in seconds.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_seconds: f64,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_resolve_timeout() -> f64 {
    30.0
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            discard_on_release: false,
            resolve_timeout_seconds: default_resolve_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
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
        if let Some(raw) = lookup(ENV_DISCARD_ON_RELEASE) {
            self.discard_on_release = parse_bool(ENV_DISCARD_ON_RELEASE, &raw)?;
        }

        if let Some(raw) = lookup(ENV_RESOLVE_TIMEOUT_SECS) {
            let seconds: f64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid_value(ENV_RESOLVE_TIMEOUT_SECS, format!("'{raw}' is not a number"))
            })?;
            if let Err(err) = Duration::try_from_secs_f64(seconds) {
                return Err(ConfigError::invalid_value(
                    ENV_RESOLVE_TIMEOUT_SECS,
                    format!("'{raw}' is not a usable number of seconds: {err}"),
                ));
            }
            self.resolve_timeout_seconds = seconds;
        }

        self.logging = self.logging.with_env_overrides(&lookup)?;
        Ok(self)
    }

    /// Sets whether released workers drop their pending entries.
    #[must_use]
    pub fn with_discard_on_release(mut self, discard: bool) -> Self {
        self.discard_on_release = discard;
        self
    }

    /// Sets the resolve timeout.
    #[must_use]
    pub fn with_resolve_timeout(mut self, seconds: f64) -> Self {
        self.resolve_timeout_seconds = seconds;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Gets the resolve timeout as a Duration.
    ///
    /// Values too large for a `Duration` saturate to `Duration::MAX`, which
    /// waits without a deadline. Negative or NaN values mean no wait.
    #[must_use]
    pub fn resolve_timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.resolve_timeout_seconds) {
            Ok(timeout) => timeout,
            Err(_) if self.resolve_timeout_seconds > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }
}

pub(crate) fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::new();
        assert!(!config.discard_on_release);
        assert_eq!(config.resolve_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let config = RegistryConfig::default()
            .with_env_overrides(lookup(&[
                (ENV_DISCARD_ON_RELEASE, "yes"),
                (ENV_RESOLVE_TIMEOUT_SECS, "2.5"),
            ]))
            .unwrap();

        assert!(config.discard_on_release);
        assert_eq!(config.resolve_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_env_values() {
        let err = RegistryConfig::default()
            .with_env_overrides(lookup(&[(ENV_RESOLVE_TIMEOUT_SECS, "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_RESOLVE_TIMEOUT_SECS));

        let err = RegistryConfig::default()
            .with_env_overrides(lookup(&[(ENV_DISCARD_ON_RELEASE, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_timeout_outside_duration_range_is_rejected() {
        for raw in ["1e20", "inf", "NaN"] {
            let err = RegistryConfig::default()
                .with_env_overrides(lookup(&[(ENV_RESOLVE_TIMEOUT_SECS, raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_RESOLVE_TIMEOUT_SECS));
        }
    }

    #[test]
    fn test_resolve_timeout_saturates() {
        assert_eq!(RegistryConfig::new().with_resolve_timeout(1e20).resolve_timeout(), Duration::MAX);
        assert_eq!(RegistryConfig::new().with_resolve_timeout(-1.0).resolve_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{"discard_on_release": true}"#).unwrap();
        assert!(config.discard_on_release);
        assert!((config.resolve_timeout_seconds - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::new()
            .with_discard_on_release(true)
            .with_resolve_timeout(1.0);
        assert_eq!(config.resolve_timeout(), Duration::from_secs(1));
    }
}
