//! Error types for story context tracking.
//!
//! Nearly every operation in this crate is total. The errors below cover the
//! few contract violations (an example cursor outside its table), failures of
//! deferred identifier resolution, and the ambient configuration/logging
//! setup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for storyctx operations.
#[derive(Debug, Error)]
pub enum StoryContextError {
    /// An example row was requested outside the table bounds.
    #[error("{0}")]
    ExampleOutOfRange(#[from] ExampleOutOfRangeError),

    /// A deferred identifier could not be resolved.
    #[error("{0}")]
    Identifier(#[from] IdentifierError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// An item status name was not recognized.
    #[error("{0}")]
    UnknownStatus(#[from] UnknownStatusError),

    /// The logging subscriber could not be installed.
    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

/// Error raised when an example row index is outside the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Example row {index} is out of range for a table with {row_count} rows")]
pub struct ExampleOutOfRangeError {
    /// The requested row index (may be -1 when no row was selected).
    pub index: i64,
    /// The number of rows in the table.
    pub row_count: usize,
}

impl ExampleOutOfRangeError {
    /// Creates a new out-of-range error.
    #[must_use]
    pub fn new(index: i64, row_count: usize) -> Self {
        Self { index, row_count }
    }
}

/// Error raised when parsing an unrecognized item status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown item status '{value}'")]
pub struct UnknownStatusError {
    /// The name that failed to parse.
    pub value: String,
}

impl UnknownStatusError {
    /// Creates a new unknown status error.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// Errors produced while resolving a deferred identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdentifierError {
    /// The reporting side reported a failure instead of an identifier.
    #[error("Identifier resolution failed: {reason}")]
    Failed {
        /// The failure reason.
        reason: String,
    },

    /// The resolver was dropped before it produced a value.
    #[error("Identifier resolver dropped before resolving")]
    Abandoned,

    /// A blocking wait gave up.
    #[error("Timed out after {timeout_ms}ms waiting for identifier")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },
}

impl IdentifierError {
    /// Creates a resolution failure.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Returns true if waiting longer could still produce a value.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Failed { reason } => {
                map.insert("type".to_string(), serde_json::json!("failed"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Abandoned => {
                map.insert("type".to_string(), serde_json::json!("abandoned"));
            }
            Self::Timeout { timeout_ms } => {
                map.insert("type".to_string(), serde_json::json!("timeout"));
                map.insert("timeout_ms".to_string(), serde_json::json!(timeout_ms));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_out_of_range_message() {
        let err = ExampleOutOfRangeError::new(-1, 3);
        assert_eq!(
            err.to_string(),
            "Example row -1 is out of range for a table with 3 rows"
        );
    }

    #[test]
    fn test_story_context_error_from_identifier() {
        let err: StoryContextError = IdentifierError::Abandoned.into();
        assert!(matches!(err, StoryContextError::Identifier(IdentifierError::Abandoned)));
        assert_eq!(err.to_string(), "Identifier resolver dropped before resolving");
    }

    #[test]
    fn test_identifier_error_to_dict() {
        let dict = IdentifierError::failed("launch finished").to_dict();
        assert_eq!(dict.get("type").unwrap(), "failed");
        assert_eq!(dict.get("reason").unwrap(), "launch finished");

        let dict = IdentifierError::Timeout { timeout_ms: 250 }.to_dict();
        assert_eq!(dict.get("timeout_ms").unwrap(), 250);
    }

    #[test]
    fn test_identifier_error_serialize() {
        let json = serde_json::to_string(&IdentifierError::Abandoned).unwrap();
        assert_eq!(json, r#"{"type":"abandoned"}"#);

        let restored: IdentifierError = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, IdentifierError::Abandoned);
    }

    #[test]
    fn test_unknown_status_converts() {
        let err: StoryContextError = UnknownStatusError::new("pending").into();
        assert_eq!(err.to_string(), "Unknown item status 'pending'");
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::invalid_value("STORYCTX_RESOLVE_TIMEOUT_SECS", "must be positive");
        assert!(err.to_string().contains("STORYCTX_RESOLVE_TIMEOUT_SECS"));
        assert!(!IdentifierError::Abandoned.is_timeout());
    }
}
