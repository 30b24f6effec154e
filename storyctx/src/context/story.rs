//! The per-worker story execution context.

use super::{ContextId, ExampleSet, Meta, StorySnapshot};
use crate::cache::{get_pending_caches, PendingCaches};
use crate::core::{ItemKind, ItemStatus};
use crate::identifier::IdentifierHandle;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Default)]
struct StoryState {
    current_story_id: Option<IdentifierHandle>,
    current_scenario: Option<IdentifierHandle>,
    current_step: Option<IdentifierHandle>,
    current_step_status: Option<ItemStatus>,
    examples: Option<Arc<ExampleSet>>,
    scenario_meta: Option<Meta>,
    story_meta: Option<Meta>,
    parent: Option<Arc<StoryContext>>,
}

/// The execution context of one worker: which story, scenario and step it is
/// running, and which example row.
///
/// Every identifier set on the context is mirrored into the shared
/// [`PendingCaches`] under this context's [`ContextId`], so the reporting side
/// can see all open items of every worker. Only the owning worker is expected
/// to mutate a context.
///
/// `current_step` always equals the front of this context's step stack.
/// Story and scenario slots hold whatever was last assigned: clearing them
/// removes the handle from the item stack but the slot keeps that handle.
pub struct StoryContext {
    id: ContextId,
    caches: Arc<PendingCaches>,
    state: RwLock<StoryState>,
}

impl StoryContext {
    /// Creates a context bound to the process-wide pending caches.
    #[must_use]
    pub fn new() -> Self {
        Self::with_caches(get_pending_caches())
    }

    /// Creates a context bound to the given pending caches.
    #[must_use]
    pub fn with_caches(caches: Arc<PendingCaches>) -> Self {
        Self {
            id: ContextId::new(),
            caches,
            state: RwLock::new(StoryState::default()),
        }
    }

    /// Creates a child context for a nested story, sharing this context's caches.
    #[must_use]
    pub fn fork_for_nested_story(self: &Arc<Self>) -> Arc<Self> {
        let child = Self::with_caches(self.caches.clone());
        child.state.write().parent = Some(self.clone());
        debug!(context_id = %child.id, parent_id = %self.id, "Nested story context created");
        Arc::new(child)
    }

    /// Returns the context identity.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Returns the pending caches this context mirrors into.
    #[must_use]
    pub fn caches(&self) -> &Arc<PendingCaches> {
        &self.caches
    }

    /// Returns the current story identifier.
    #[must_use]
    pub fn current_story_id(&self) -> Option<IdentifierHandle> {
        self.state.read().current_story_id.clone()
    }

    /// Opens (`Some`) or closes (`None`) the current story.
    pub fn set_current_story_id(&self, story_id: Option<IdentifierHandle>) {
        let mut state = self.state.write();
        self.mirror_item(ItemKind::Story, story_id.as_ref(), state.current_story_id.as_ref());
        if story_id.is_some() {
            state.current_story_id = story_id;
        }
    }

    /// Returns the current scenario identifier.
    #[must_use]
    pub fn current_scenario(&self) -> Option<IdentifierHandle> {
        self.state.read().current_scenario.clone()
    }

    /// Opens (`Some`) or closes (`None`) the current scenario.
    pub fn set_current_scenario(&self, scenario: Option<IdentifierHandle>) {
        let mut state = self.state.write();
        self.mirror_item(ItemKind::Scenario, scenario.as_ref(), state.current_scenario.as_ref());
        if scenario.is_some() {
            state.current_scenario = scenario;
        }
    }

    /// Returns the innermost open step.
    #[must_use]
    pub fn current_step(&self) -> Option<IdentifierHandle> {
        self.state.read().current_step.clone()
    }

    /// Opens (`Some`) or closes (`None`) a step.
    ///
    /// Opening stacks the step above any step still open, so composed steps
    /// nest inside their composite step. Closing removes the step that is
    /// currently visible and exposes the next open one.
    pub fn set_current_step(&self, step: Option<IdentifierHandle>) {
        let mut state = self.state.write();
        self.mirror_item(ItemKind::Step, step.as_ref(), state.current_step.as_ref());
        state.current_step = self.caches.steps().front(self.id);
    }

    /// Returns the status recorded for the current step.
    #[must_use]
    pub fn current_step_status(&self) -> Option<ItemStatus> {
        self.state.read().current_step_status
    }

    /// Records the status of the current step.
    pub fn set_current_step_status(&self, status: Option<ItemStatus>) {
        self.state.write().current_step_status = status;
    }

    /// Returns the example set of the running scenario.
    #[must_use]
    pub fn examples(&self) -> Option<Arc<ExampleSet>> {
        self.state.read().examples.clone()
    }

    /// Sets or clears the example set of the running scenario.
    pub fn set_examples(&self, examples: Option<ExampleSet>) {
        self.state.write().examples = examples.map(Arc::new);
    }

    /// Returns true if an example set with at least one row is present.
    #[must_use]
    pub fn has_examples(&self) -> bool {
        self.state
            .read()
            .examples
            .as_ref()
            .is_some_and(|examples| !examples.table().is_empty())
    }

    /// Returns the scenario metadata.
    #[must_use]
    pub fn scenario_meta(&self) -> Option<Meta> {
        self.state.read().scenario_meta.clone()
    }

    /// Sets the scenario metadata.
    pub fn set_scenario_meta(&self, meta: Option<Meta>) {
        self.state.write().scenario_meta = meta;
    }

    /// Returns the story metadata.
    #[must_use]
    pub fn story_meta(&self) -> Option<Meta> {
        self.state.read().story_meta.clone()
    }

    /// Sets the story metadata.
    pub fn set_story_meta(&self, meta: Option<Meta>) {
        self.state.write().story_meta = meta;
    }

    /// Returns true if this context runs a nested story.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.state.read().parent.is_some()
    }

    /// Returns the context of the enclosing story, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<StoryContext>> {
        self.state.read().parent.clone()
    }

    /// Sets the context of the enclosing story.
    pub fn set_parent(&self, parent: Option<Arc<StoryContext>>) {
        self.state.write().parent = parent;
    }

    /// Captures a serializable view of the context.
    #[must_use]
    pub fn snapshot(&self) -> StorySnapshot {
        let state = self.state.read();
        let resolved = |handle: &Option<IdentifierHandle>| {
            handle
                .as_ref()
                .and_then(IdentifierHandle::try_get)
                .and_then(Result::ok)
        };

        StorySnapshot {
            context_id: self.id,
            parent_id: state.parent.as_ref().map(|parent| parent.id),
            story_id: resolved(&state.current_story_id),
            scenario: resolved(&state.current_scenario),
            step: resolved(&state.current_step),
            step_status: state.current_step_status,
            current_example: state.examples.as_ref().map(|e| e.current_example()),
            pending_steps: self.caches.steps().depth(self.id),
            pending_items: self.caches.items().depth(self.id),
            captured_at: chrono::Utc::now(),
        }
    }

    /// Mirrors an open or close of `kind` into the matching pending stack.
    ///
    /// Opening pushes `opened`; closing removes `current`, the handle the
    /// slot holds right now, if any.
    fn mirror_item(
        &self,
        kind: ItemKind,
        opened: Option<&IdentifierHandle>,
        current: Option<&IdentifierHandle>,
    ) {
        let queue = self.caches.queue_for(kind);
        match (opened, current) {
            (Some(handle), _) => {
                let depth = queue.push(self.id, handle.clone());
                debug!(context_id = %self.id, %kind, depth, "Item opened");
            }
            (None, Some(handle)) => {
                let removed = queue.remove(self.id, handle);
                debug!(
                    context_id = %self.id,
                    %kind,
                    removed,
                    depth = queue.depth(self.id),
                    "Item closed"
                );
            }
            (None, None) => {
                trace!(context_id = %self.id, %kind, "Close with nothing open");
            }
        }
    }
}

impl Default for StoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StoryContext {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StoryContext {}

impl Hash for StoryContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for StoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("StoryContext")
            .field("id", &self.id)
            .field("current_story_id", &state.current_story_id)
            .field("current_scenario", &state.current_scenario)
            .field("current_step", &state.current_step)
            .field("current_step_status", &state.current_step_status)
            .field("parent", &state.parent.as_ref().map(|parent| parent.id))
            .finish_non_exhaustive()
    }
}
