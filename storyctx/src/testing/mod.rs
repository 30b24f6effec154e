//! Testing utilities for code that drives story contexts.
//!
//! This module provides:
//! - Fixtures: contexts and registries over private caches
//! - Assertions over the pending view

mod assertions;
mod fixtures;

pub use assertions::{
    assert_current_step, assert_no_pending, assert_pending_ids, assert_pending_len,
};
pub use fixtures::{isolated_context, isolated_registry, resolved_handles, TestRun};
