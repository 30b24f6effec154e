//! The step and item pending caches and their merged view.

use super::PendingQueue;
use crate::context::ContextId;
use crate::core::ItemKind;
use crate::errors::IdentifierError;
use crate::identifier::IdentifierHandle;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The pair of pending caches shared by every story context of a run.
///
/// Steps (including composed steps nested in composite ones) live in the
/// step queue; stories and scenarios live in the item queue. A reporting
/// collaborator reads [`aggregated_pending`](Self::aggregated_pending) to find
/// which items are still open, most deeply nested first.
#[derive(Debug, Default)]
pub struct PendingCaches {
    steps: PendingQueue,
    items: PendingQueue,
}

impl PendingCaches {
    /// Creates empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the step queue.
    #[must_use]
    pub fn steps(&self) -> &PendingQueue {
        &self.steps
    }

    /// Returns the story/scenario queue.
    #[must_use]
    pub fn items(&self) -> &PendingQueue {
        &self.items
    }

    /// Returns the queue that holds identifiers of `kind`.
    #[must_use]
    pub(crate) fn queue_for(&self, kind: ItemKind) -> &PendingQueue {
        if kind.is_step() {
            &self.steps
        } else {
            &self.items
        }
    }

    /// Returns every pending handle: all step stacks, then all item stacks.
    ///
    /// Within one context's stack the order is most recent first; the order
    /// between contexts is unspecified.
    #[must_use]
    pub fn aggregated_pending(&self) -> Vec<IdentifierHandle> {
        let mut merged = self.steps.flatten();
        merged.extend(self.items.flatten());
        merged
    }

    /// Returns the number of pending handles across both caches.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.steps.len() + self.items.len()
    }

    /// Returns true if nothing is pending in either cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.items.is_empty()
    }

    /// Drops both cache entries of one context and returns how many handles
    /// were still pending.
    pub fn discard(&self, owner: ContextId) -> usize {
        let dropped = self.steps.discard(owner).len() + self.items.discard(owner).len();
        if dropped > 0 {
            debug!(context_id = %owner, dropped, "Discarded pending identifiers");
        }
        dropped
    }

    /// Drops entries that no longer hold any handle.
    pub fn prune_empty(&self) -> usize {
        self.steps.prune_empty() + self.items.prune_empty()
    }

    /// Empties both caches. Intended for isolation between independent runs.
    pub fn reset(&self) {
        let dropped = self.pending_len();
        self.steps.clear();
        self.items.clear();
        info!(dropped, "Pending caches reset");
    }

    /// Resolves every pending handle in aggregated order, sharing one deadline.
    ///
    /// Handles still unresolved when the deadline passes report
    /// [`IdentifierError::Timeout`].
    pub fn resolve_pending(&self, timeout: Duration) -> Vec<Result<String, IdentifierError>> {
        let deadline = Instant::now().checked_add(timeout);
        self.aggregated_pending()
            .iter()
            .map(|handle| {
                let remaining =
                    deadline.map_or(timeout, |deadline| deadline.saturating_duration_since(Instant::now()));
                handle.blocking_get_timeout(remaining)
            })
            .collect()
    }
}

// Global singleton
static GLOBAL_CACHES: RwLock<Option<Arc<PendingCaches>>> = RwLock::new(None);

/// Gets the process-wide pending caches, creating them on first use.
pub fn get_pending_caches() -> Arc<PendingCaches> {
    if let Some(caches) = GLOBAL_CACHES.read().as_ref() {
        return caches.clone();
    }

    GLOBAL_CACHES
        .write()
        .get_or_insert_with(|| Arc::new(PendingCaches::new()))
        .clone()
}

/// Replaces the process-wide pending caches.
pub fn set_pending_caches(caches: Arc<PendingCaches>) {
    *GLOBAL_CACHES.write() = Some(caches);
}

/// Forgets the process-wide pending caches; the next access creates new ones.
pub fn clear_pending_caches() {
    *GLOBAL_CACHES.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_steps_flatten_before_items() {
        let caches = PendingCaches::new();
        let owner = ContextId::new();
        let story = IdentifierHandle::resolved("story");
        let step = IdentifierHandle::resolved("step");

        caches.queue_for(ItemKind::Story).push(owner, story.clone());
        caches.queue_for(ItemKind::Step).push(owner, step.clone());

        assert_eq!(caches.aggregated_pending(), vec![step, story]);
        assert_eq!(caches.pending_len(), 2);
    }

    #[test]
    fn test_discard_and_reset() {
        let caches = PendingCaches::new();
        let a = ContextId::new();
        let b = ContextId::new();
        caches.items().push(a, IdentifierHandle::resolved("a-story"));
        caches.steps().push(a, IdentifierHandle::resolved("a-step"));
        caches.items().push(b, IdentifierHandle::resolved("b-story"));

        assert_eq!(caches.discard(a), 2);
        assert_eq!(caches.pending_len(), 1);

        caches.reset();
        assert!(caches.is_empty());
        assert_eq!(caches.items().context_count(), 0);
    }

    #[test]
    fn test_resolve_pending_reports_timeouts() {
        let caches = PendingCaches::new();
        let owner = ContextId::new();
        let (pending, _resolver) = IdentifierHandle::pending();
        caches.items().push(owner, IdentifierHandle::resolved("done"));
        caches.steps().push(owner, pending);

        let outcomes = caches.resolve_pending(Duration::from_millis(5));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].as_ref().is_err_and(IdentifierError::is_timeout));
        assert_eq!(outcomes[1], Ok("done".to_string()));
    }

    #[test]
    fn test_resolve_pending_with_unbounded_timeout() {
        let caches = PendingCaches::new();
        let owner = ContextId::new();
        caches.items().push(owner, IdentifierHandle::resolved("story"));
        caches.steps().push(owner, IdentifierHandle::resolved("step"));

        let outcomes = caches.resolve_pending(Duration::MAX);
        assert_eq!(outcomes, vec![Ok("step".to_string()), Ok("story".to_string())]);
    }

    #[test]
    fn test_global_caches_set_and_clear() {
        let mine = Arc::new(PendingCaches::new());
        set_pending_caches(mine.clone());
        assert!(Arc::ptr_eq(&get_pending_caches(), &mine));

        clear_pending_caches();
        assert!(!Arc::ptr_eq(&get_pending_caches(), &mine));
    }
}
