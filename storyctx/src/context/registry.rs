//! Worker-scoped registry of story contexts.

use super::{StoryContext, WorkerId};
use crate::cache::{get_pending_caches, PendingCaches};
use crate::config::RegistryConfig;
use crate::errors::IdentifierError;
use crate::identifier::IdentifierHandle;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Binds each execution worker to its own [`StoryContext`].
///
/// A worker's context is created on first access and lives until the
/// binding is released or the registry is cleared. Contexts created by a
/// registry mirror into the registry's [`PendingCaches`].
pub struct ContextRegistry {
    bindings: DashMap<WorkerId, Arc<StoryContext>>,
    caches: Arc<PendingCaches>,
    config: RegistryConfig,
}

impl ContextRegistry {
    /// Creates a registry over the process-wide pending caches.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates a registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            bindings: DashMap::new(),
            caches: get_pending_caches(),
            config,
        }
    }

    /// Uses the given caches instead of the process-wide ones.
    #[must_use]
    pub fn with_caches(mut self, caches: Arc<PendingCaches>) -> Self {
        self.caches = caches;
        self
    }

    /// Returns the calling thread's context, creating it on first call.
    pub fn current(&self) -> Arc<StoryContext> {
        self.context_for(WorkerId::current_thread())
    }

    /// Binds `context` to the calling thread.
    pub fn set_current(&self, context: Arc<StoryContext>) {
        self.bind(WorkerId::current_thread(), context);
    }

    /// Returns the context bound to `worker`, creating it on first call.
    pub fn context_for(&self, worker: WorkerId) -> Arc<StoryContext> {
        if let Some(context) = self.bindings.get(&worker) {
            return context.clone();
        }

        self.bindings
            .entry(worker.clone())
            .or_insert_with(|| {
                let context = Arc::new(StoryContext::with_caches(self.caches.clone()));
                debug!(%worker, context_id = %context.id(), "Story context created");
                context
            })
            .clone()
    }

    /// Binds `context` to `worker`, returning the previous binding.
    pub fn bind(&self, worker: WorkerId, context: Arc<StoryContext>) -> Option<Arc<StoryContext>> {
        debug!(%worker, context_id = %context.id(), "Story context bound");
        self.bindings.insert(worker, context)
    }

    /// Removes the binding of `worker`.
    ///
    /// With `discard_on_release` set, the released context's pending entries
    /// are dropped as well.
    pub fn release(&self, worker: &WorkerId) -> Option<Arc<StoryContext>> {
        let (worker, context) = self.bindings.remove(worker)?;

        if self.config.discard_on_release {
            let discarded = self.caches.discard(context.id());
            debug!(%worker, context_id = %context.id(), discarded, "Story context released");
        } else {
            debug!(%worker, context_id = %context.id(), "Story context released");
        }
        Some(context)
    }

    /// Drops every binding and resets the pending caches.
    pub fn clear(&self) {
        let released = self.bindings.len();
        self.bindings.clear();
        self.caches.reset();
        info!(released, "Context registry cleared");
    }

    /// Returns the number of bound workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no worker is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns the pending caches contexts of this registry mirror into.
    #[must_use]
    pub fn caches(&self) -> &Arc<PendingCaches> {
        &self.caches
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the merged pending view, steps first.
    #[must_use]
    pub fn aggregated_pending(&self) -> Vec<IdentifierHandle> {
        self.caches.aggregated_pending()
    }

    /// Resolves the merged pending view within the configured timeout.
    pub fn resolve_pending(&self) -> Vec<Result<String, IdentifierError>> {
        self.caches.resolve_pending(self.config.resolve_timeout())
    }

    /// Binds a child of the calling thread's context and returns it.
    pub fn enter_nested_story(&self) -> Arc<StoryContext> {
        let child = self.current().fork_for_nested_story();
        self.set_current(child.clone());
        child
    }

    /// Rebinds the parent of the calling thread's context.
    ///
    /// Returns the restored parent, or `None` when the current context is
    /// not nested.
    pub fn exit_nested_story(&self) -> Option<Arc<StoryContext>> {
        let current = self.current();
        let parent = current.parent()?;
        self.set_current(parent.clone());
        debug!(context_id = %current.id(), parent_id = %parent.id(), "Nested story exited");
        Some(parent)
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("bindings", &self.bindings.len())
            .field("pending", &self.caches.pending_len())
            .field("config", &self.config)
            .finish()
    }
}

static GLOBAL_REGISTRY: RwLock<Option<Arc<ContextRegistry>>> = RwLock::new(None);

/// Gets the process-wide context registry, creating it on first use.
pub fn get_context_registry() -> Arc<ContextRegistry> {
    if let Some(registry) = GLOBAL_REGISTRY.read().as_ref() {
        return registry.clone();
    }

    GLOBAL_REGISTRY
        .write()
        .get_or_insert_with(|| Arc::new(ContextRegistry::new()))
        .clone()
}

/// Replaces the process-wide context registry.
pub fn set_context_registry(registry: Arc<ContextRegistry>) {
    *GLOBAL_REGISTRY.write() = Some(registry);
}

/// Forgets the process-wide context registry.
pub fn clear_context_registry() {
    *GLOBAL_REGISTRY.write() = None;
}

/// Returns the calling thread's context from the process-wide registry.
pub fn current_story() -> Arc<StoryContext> {
    get_context_registry().current()
}

/// Binds `context` to the calling thread in the process-wide registry.
pub fn set_current_story(context: Arc<StoryContext>) {
    get_context_registry().set_current(context);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn isolated() -> ContextRegistry {
        ContextRegistry::new().with_caches(Arc::new(PendingCaches::new()))
    }

    #[test]
    fn test_current_is_stable_per_thread() {
        let registry = isolated();
        let first = registry.current();
        let second = registry.current();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(first.caches(), registry.caches()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_threads_get_distinct_contexts() {
        let registry = Arc::new(isolated());
        let main = registry.current();

        let other = {
            let registry = registry.clone();
            thread::spawn(move || registry.current().id()).join().unwrap()
        };

        assert_ne!(main.id(), other);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_named_workers() {
        let registry = isolated();
        let a = registry.context_for(WorkerId::named("worker-a"));
        let again = registry.context_for(WorkerId::named("worker-a"));
        let b = registry.context_for(WorkerId::named("worker-b"));

        assert!(Arc::ptr_eq(&a, &again));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_bind_returns_previous() {
        let registry = isolated();
        let worker = WorkerId::named("w");
        let original = registry.context_for(worker.clone());
        let replacement = Arc::new(StoryContext::with_caches(registry.caches().clone()));

        let previous = registry.bind(worker.clone(), replacement.clone());
        assert_eq!(previous.map(|c| c.id()), Some(original.id()));
        assert_eq!(registry.context_for(worker).id(), replacement.id());
    }

    #[test]
    fn test_release_keeps_entries_by_default() {
        let registry = isolated();
        let worker = WorkerId::named("w");
        registry
            .context_for(worker.clone())
            .set_current_step(Some(IdentifierHandle::resolved("step")));

        let released = registry.release(&worker);
        assert!(released.is_some());
        assert!(registry.is_empty());
        assert_eq!(registry.caches().pending_len(), 1);
        assert!(registry.release(&worker).is_none());
    }

    #[test]
    fn test_release_discards_when_configured() {
        let registry = ContextRegistry::with_config(RegistryConfig::new().with_discard_on_release(true))
            .with_caches(Arc::new(PendingCaches::new()));
        let worker = WorkerId::named("w");
        let context = registry.context_for(worker.clone());
        context.set_current_story_id(Some(IdentifierHandle::resolved("story")));
        context.set_current_step(Some(IdentifierHandle::resolved("step")));

        registry.release(&worker);
        assert_eq!(registry.caches().pending_len(), 0);
    }

    #[test]
    fn test_clear_resets_bindings_and_caches() {
        let registry = isolated();
        registry
            .current()
            .set_current_step(Some(IdentifierHandle::resolved("step")));

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.aggregated_pending().is_empty());
    }

    #[test]
    fn test_nested_story_enter_and_exit() {
        let registry = isolated();
        let outer = registry.current();

        let inner = registry.enter_nested_story();
        assert_eq!(inner.parent().map(|p| p.id()), Some(outer.id()));
        assert_eq!(registry.current().id(), inner.id());

        let restored = registry.exit_nested_story();
        assert_eq!(restored.map(|p| p.id()), Some(outer.id()));
        assert_eq!(registry.current().id(), outer.id());

        assert!(registry.exit_nested_story().is_none());
        assert_eq!(registry.current().id(), outer.id());
    }

    #[test]
    fn test_resolve_pending_uses_config_timeout() {
        let registry = ContextRegistry::with_config(RegistryConfig::new().with_resolve_timeout(0.01))
            .with_caches(Arc::new(PendingCaches::new()));
        let (pending, _resolver) = IdentifierHandle::pending();
        let context = registry.current();
        context.set_current_story_id(Some(IdentifierHandle::resolved("story")));
        context.set_current_step(Some(pending));

        let results = registry.resolve_pending();
        assert_eq!(results.len(), 2);
        assert!(results[0].as_ref().is_err_and(IdentifierError::is_timeout));
        assert_eq!(results[1], Ok("story".to_string()));
    }

    #[test]
    fn test_resolve_pending_with_huge_configured_timeout() {
        let config = RegistryConfig::new()
            .with_env_overrides(|key| {
                (key == crate::config::ENV_RESOLVE_TIMEOUT_SECS).then(|| "1e19".to_string())
            })
            .unwrap();
        let registry = ContextRegistry::with_config(config).with_caches(Arc::new(PendingCaches::new()));
        registry
            .current()
            .set_current_step(Some(IdentifierHandle::resolved("done")));

        assert_eq!(registry.resolve_pending(), vec![Ok("done".to_string())]);
    }

    #[test]
    fn test_concurrent_workers_see_own_step() {
        const TASKS: usize = 500;
        const PUSHES: usize = 50;
        const THREADS: usize = 16;

        let registry = Arc::new(isolated());
        let next = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = registry.clone();
                let next = next.clone();
                thread::spawn(move || {
                    let mut mismatches = 0;
                    while next.fetch_add(1, Ordering::SeqCst) < TASKS {
                        let handle = IdentifierHandle::resolved(format!("{:?}", thread::current().id()));
                        let context = registry.current();
                        for _ in 0..PUSHES {
                            context.set_current_step(Some(handle.clone()));
                        }
                        if context.current_step() != Some(handle) {
                            mismatches += 1;
                        }
                    }
                    mismatches
                })
            })
            .collect();

        let mismatches: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(mismatches, 0);
        assert!(registry.len() <= THREADS);
        assert_eq!(registry.caches().pending_len(), TASKS * PUSHES);
    }

    #[test]
    fn test_global_registry() {
        let registry = Arc::new(isolated());
        set_context_registry(registry.clone());

        let context = current_story();
        assert!(Arc::ptr_eq(&context, &registry.current()));

        let replacement = Arc::new(StoryContext::with_caches(registry.caches().clone()));
        set_current_story(replacement.clone());
        assert_eq!(current_story().id(), replacement.id());

        clear_context_registry();
        assert!(!Arc::ptr_eq(&get_context_registry(), &registry));
        clear_context_registry();
    }
}
