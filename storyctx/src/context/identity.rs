//! Identities for story contexts and the workers that own them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread::ThreadId;
use uuid::Uuid;

/// Unique identity of a [`StoryContext`](super::StoryContext).
///
/// Pending caches are keyed by this value, so two contexts never share a
/// pending stack even if their visible state is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key under which a [`ContextRegistry`](super::ContextRegistry) binds a context.
///
/// Most callers use the calling thread. Executors that multiplex scenarios
/// over tasks can bind contexts to their own names instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkerId {
    /// An OS thread.
    Thread(ThreadId),
    /// A caller-chosen worker name.
    Named(String),
}

impl WorkerId {
    /// Returns the worker ID of the calling thread.
    #[must_use]
    pub fn current_thread() -> Self {
        Self::Thread(std::thread::current().id())
    }

    /// Creates a named worker ID.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread(id) => write!(f, "thread:{id:?}"),
            Self::Named(name) => write!(f, "named:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_are_unique() {
        assert_ne!(ContextId::new(), ContextId::new());
    }

    #[test]
    fn test_context_id_serialization() {
        let id = ContextId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let restored: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn test_worker_id_current_thread() {
        let here = WorkerId::current_thread();
        assert_eq!(here, WorkerId::current_thread());

        let there = std::thread::spawn(WorkerId::current_thread).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId::named("pool-3").to_string(), "named:pool-3");
        assert!(WorkerId::current_thread().to_string().starts_with("thread:"));
    }
}
