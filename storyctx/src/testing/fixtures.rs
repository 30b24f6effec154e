//! Test fixtures for story contexts.

use std::sync::Arc;

use crate::cache::PendingCaches;
use crate::config::RegistryConfig;
use crate::context::{ContextRegistry, StoryContext};
use crate::identifier::IdentifierHandle;

/// Creates a context over its own private caches.
#[must_use]
pub fn isolated_context() -> Arc<StoryContext> {
    Arc::new(StoryContext::with_caches(Arc::new(PendingCaches::new())))
}

/// Creates a registry over its own private caches.
#[must_use]
pub fn isolated_registry() -> ContextRegistry {
    ContextRegistry::new().with_caches(Arc::new(PendingCaches::new()))
}

/// Creates one resolved handle per identifier.
#[must_use]
pub fn resolved_handles(ids: &[&str]) -> Vec<IdentifierHandle> {
    ids.iter().map(|id| IdentifierHandle::resolved(*id)).collect()
}

/// Drives one story through a context, the way a runner's reporter would.
#[derive(Debug)]
pub struct TestRun {
    context: Arc<StoryContext>,
}

impl TestRun {
    /// Starts a run on an isolated context.
    #[must_use]
    pub fn new() -> Self {
        Self::on(isolated_context())
    }

    /// Starts a run on `context`.
    #[must_use]
    pub fn on(context: Arc<StoryContext>) -> Self {
        Self { context }
    }

    /// Creates a run on an isolated registry's current context with `config`.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> (ContextRegistry, Self) {
        let registry = ContextRegistry::with_config(config).with_caches(Arc::new(PendingCaches::new()));
        let run = Self::on(registry.current());
        (registry, run)
    }

    /// Returns the driven context.
    #[must_use]
    pub fn context(&self) -> &Arc<StoryContext> {
        &self.context
    }

    /// Opens a story with a resolved identifier.
    #[must_use]
    pub fn story(self, id: &str) -> Self {
        self.context.set_current_story_id(Some(IdentifierHandle::resolved(id)));
        self
    }

    /// Opens a scenario with a resolved identifier.
    #[must_use]
    pub fn scenario(self, id: &str) -> Self {
        self.context.set_current_scenario(Some(IdentifierHandle::resolved(id)));
        self
    }

    /// Opens a step with a resolved identifier.
    #[must_use]
    pub fn step(self, id: &str) -> Self {
        self.context.set_current_step(Some(IdentifierHandle::resolved(id)));
        self
    }

    /// Closes the innermost step.
    #[must_use]
    pub fn end_step(self) -> Self {
        self.context.set_current_step(None);
        self
    }

    /// Closes the scenario.
    #[must_use]
    pub fn end_scenario(self) -> Self {
        self.context.set_current_scenario(None);
        self
    }

    /// Closes the story.
    #[must_use]
    pub fn end_story(self) -> Self {
        self.context.set_current_story_id(None);
        self
    }
}

impl Default for TestRun {
    fn default() -> Self {
        Self::new()
    }
}
