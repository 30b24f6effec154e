//! Per-context LIFO stacks of pending identifiers.

use crate::context::ContextId;
use crate::identifier::IdentifierHandle;
use dashmap::DashMap;
use std::collections::VecDeque;

/// A shared map from context identity to that context's pending stack.
///
/// The front of each stack is the most recently opened item. Entries are
/// created on first push and survive becoming empty until pruned, discarded
/// or cleared. Removal never creates an entry.
///
/// Stacks change only through [`StoryContext`](crate::context::StoryContext)
/// accessors and the administrative calls on
/// [`PendingCaches`](super::PendingCaches). Outside the crate a queue is a
/// read-only view:
///
/// ```compile_fail
/// use storyctx::cache::PendingCaches;
/// use storyctx::context::ContextId;
/// use storyctx::identifier::IdentifierHandle;
///
/// let caches = PendingCaches::new();
/// caches.steps().push(ContextId::new(), IdentifierHandle::resolved("outside"));
/// ```
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: DashMap<ContextId, VecDeque<IdentifierHandle>>,
}

impl PendingQueue {
    /// Creates an empty queue map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `handle` onto the front of `owner`'s stack and returns the new depth.
    pub(crate) fn push(&self, owner: ContextId, handle: IdentifierHandle) -> usize {
        let mut entry = self.entries.entry(owner).or_default();
        entry.push_front(handle);
        entry.len()
    }

    /// Removes the first occurrence of `handle` from `owner`'s stack.
    ///
    /// Returns false, leaving the map untouched, if the owner has no entry or
    /// the handle is not on its stack.
    pub(crate) fn remove(&self, owner: ContextId, handle: &IdentifierHandle) -> bool {
        let Some(mut entry) = self.entries.get_mut(&owner) else {
            return false;
        };
        match entry.iter().position(|pending| pending == handle) {
            Some(index) => entry.remove(index).is_some(),
            None => false,
        }
    }

    /// Returns the most recently pushed handle still on `owner`'s stack.
    #[must_use]
    pub fn front(&self, owner: ContextId) -> Option<IdentifierHandle> {
        self.entries
            .get(&owner)
            .and_then(|entry| entry.front().cloned())
    }

    /// Returns a copy of `owner`'s stack, most recent first.
    #[must_use]
    pub fn entry(&self, owner: ContextId) -> Vec<IdentifierHandle> {
        self.entries
            .get(&owner)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true if `owner` has an entry, even an empty one.
    #[must_use]
    pub fn has_entry(&self, owner: ContextId) -> bool {
        self.entries.contains_key(&owner)
    }

    /// Returns the depth of `owner`'s stack.
    #[must_use]
    pub fn depth(&self, owner: ContextId) -> usize {
        self.entries.get(&owner).map_or(0, |entry| entry.len())
    }

    /// Flattens every stack, each one most recent first.
    ///
    /// Stacks appear in map iteration order, which is unspecified.
    #[must_use]
    pub fn flatten(&self) -> Vec<IdentifierHandle> {
        let mut merged = Vec::new();
        for entry in &self.entries {
            merged.extend(entry.value().iter().cloned());
        }
        merged
    }

    /// Returns the number of handles across all stacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns true if no handles are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| entry.value().is_empty())
    }

    /// Returns the number of contexts with an entry.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.entries.len()
    }

    /// Drops `owner`'s entry and returns whatever was still pending on it.
    pub(crate) fn discard(&self, owner: ContextId) -> Vec<IdentifierHandle> {
        self.entries
            .remove(&owner)
            .map(|(_, entry)| entry.into_iter().collect())
            .unwrap_or_default()
    }

    /// Drops all empty entries and returns how many were dropped.
    pub(crate) fn prune_empty(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_empty());
        before.saturating_sub(self.entries.len())
    }

    /// Clears all entries.
    pub(crate) fn clear(&self) {
        self.entries.clear();
    }
}
