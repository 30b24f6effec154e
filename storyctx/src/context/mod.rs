//! Story execution contexts.
//!
//! This module provides:
//! - [`StoryContext`]: the current story, scenario, step and example row of
//!   one worker, mirrored into the shared pending caches
//! - [`ExampleSet`] and [`ExamplesTable`] for parameterized scenarios
//! - [`ContextRegistry`]: worker-scoped binding of contexts
//! - Serializable snapshots for diagnostics

mod examples;
mod identity;
mod meta;
mod registry;
mod snapshot;
mod story;

pub use examples::{ExampleSet, ExamplesTable};
pub use identity::{ContextId, WorkerId};
pub use meta::Meta;
pub use registry::{
    clear_context_registry, current_story, get_context_registry, set_context_registry,
    set_current_story, ContextRegistry,
};
pub use snapshot::StorySnapshot;
pub use story::StoryContext;
