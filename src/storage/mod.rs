//! Backend loaders executing compiled request trees

#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "in-memory")]
pub use in_memory::InMemoryBackend;

pub use crate::core::loader::{BackendLoader, KeyCondition, Row};
