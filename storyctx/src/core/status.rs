//! Reported item status and kind enums.

use crate::errors::UnknownStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The level of the story hierarchy an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A story (one feature file).
    Story,
    /// A scenario inside a story.
    Scenario,
    /// A step inside a scenario, possibly composed inside another step.
    Step,
}

impl ItemKind {
    /// Returns true if identifiers of this kind live in the step queue.
    #[must_use]
    pub fn is_step(&self) -> bool {
        matches!(self, Self::Step)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Story => write!(f, "story"),
            Self::Scenario => write!(f, "scenario"),
            Self::Step => write!(f, "step"),
        }
    }
}

/// The outcome recorded for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// The step passed.
    Passed,
    /// The step failed.
    Failed,
    /// The step was skipped.
    Skipped,
    /// The step was stopped before completion.
    Stopped,
    /// The step was interrupted.
    Interrupted,
    /// The step was cancelled.
    Cancelled,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Interrupted => write!(f, "INTERRUPTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PASSED" => Ok(Self::Passed),
            "FAILED" => Ok(Self::Failed),
            "SKIPPED" => Ok(Self::Skipped),
            "STOPPED" => Ok(Self::Stopped),
            "INTERRUPTED" => Ok(Self::Interrupted),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownStatusError::new(s)),
        }
    }
}

impl ItemStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed | Self::Skipped)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Interrupted | Self::Cancelled)
    }
}
