//! Deferred identifiers for reported items.
//!
//! The reporting side starts an item (story, scenario, step) and receives its
//! server-assigned identifier later. An [`IdentifierHandle`] stands in for that
//! identifier from the moment the item is opened; the matching
//! [`IdentifierResolver`] fills it in.

mod handle;

pub use handle::{IdentifierHandle, IdentifierResolver, Resolve};
