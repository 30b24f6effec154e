//! # Storyctx
//!
//! Execution-context tracking for BDD test runs.
//!
//! A runner executes stories, which contain scenarios, which contain steps.
//! Reporters open an item when it starts and only learn its identifier later,
//! so every open item is tracked as a deferred [`IdentifierHandle`]. Storyctx
//! provides:
//!
//! - **Per-worker contexts**: the story, scenario, step and example row each
//!   worker is running
//! - **Pending caches**: per-context LIFO stacks of open items, shared across
//!   workers, with a merged most-recent-first view
//! - **Nested stories**: child contexts linked to their enclosing story
//! - **Deferred identifiers**: handles filled in by a resolver, readable
//!   blocking or as a future
//!
//! ## Quick Start
//!
//! ```rust
//! use storyctx::prelude::*;
//!
//! let registry = ContextRegistry::new();
//! let context = registry.current();
//!
//! context.set_current_story_id(Some(IdentifierHandle::resolved("story-1")));
//! let (step, resolver) = IdentifierHandle::pending();
//! context.set_current_step(Some(step));
//!
//! resolver.resolve("step-7");
//! assert_eq!(context.current_step().unwrap().to_string(), "step-7");
//!
//! context.set_current_step(None);
//! context.set_current_story_id(None);
//! ```
//!
//! [`IdentifierHandle`]: identifier::IdentifierHandle

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod identifier;
pub mod observability;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{get_pending_caches, PendingCaches, PendingQueue};
    pub use crate::config::RegistryConfig;
    pub use crate::context::{
        current_story, get_context_registry, set_current_story, ContextId, ContextRegistry,
        ExampleSet, ExamplesTable, Meta, StoryContext, StorySnapshot, WorkerId,
    };
    pub use crate::core::{ItemKind, ItemStatus};
    pub use crate::errors::{
        ConfigError, ExampleOutOfRangeError, IdentifierError, StoryContextError,
        UnknownStatusError,
    };
    pub use crate::identifier::{IdentifierHandle, IdentifierResolver};
    pub use crate::observability::{init_logging, LogFormat, LoggingConfig};
}
