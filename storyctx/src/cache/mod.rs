//! Shared caches of pending reported-item identifiers.
//!
//! This module provides:
//! - [`PendingQueue`]: a concurrent map from context identity to that
//!   context's LIFO stack of open identifiers
//! - [`PendingCaches`]: the step and item queues of a run and their merged view
//! - process-wide default caches

mod caches;
mod pending;

pub use caches::{clear_pending_caches, get_pending_caches, set_pending_caches, PendingCaches};
pub use pending::PendingQueue;
