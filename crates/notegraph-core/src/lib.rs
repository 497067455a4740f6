//! # notegraph-core
//!
//! Core types, traits, and abstractions for notegraph.
//!
//! This crate provides the data model (tags, genealogy edges, note/tag links,
//! notes, types, documents), the error taxonomy, and the repository traits
//! that the storage crate implements.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{EntityKind, Error, Result};
pub use models::*;
pub use traits::*;
