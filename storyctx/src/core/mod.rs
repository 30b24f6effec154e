//! Core domain enums shared by the context and cache modules.

mod status;

pub use status::{ItemKind, ItemStatus};
