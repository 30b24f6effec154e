//! Serializable snapshots of a story context.

use super::ContextId;
use crate::core::ItemStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time view of a [`StoryContext`](super::StoryContext) for
/// diagnostics and logs.
///
/// Identifiers appear only once resolved; pending or failed handles show as
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySnapshot {
    /// The context identity.
    pub context_id: ContextId,
    /// The enclosing story's context, for nested stories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ContextId>,
    /// Resolved story identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    /// Resolved scenario identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Resolved identifier of the innermost open step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Status recorded for the current step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_status: Option<ItemStatus>,
    /// Example cursor, when the scenario has an example set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_example: Option<i64>,
    /// Depth of this context's step stack.
    pub pending_steps: usize,
    /// Depth of this context's story/scenario stack.
    pub pending_items: usize,
    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,
}

impl StorySnapshot {
    /// Returns true if the context still has open items.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_steps + self.pending_items > 0
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
