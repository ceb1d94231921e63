//! Storage abstractions and implementations
//!
//! The kinship engine reads and writes a tree only through the
//! [`GraphStore`] adapter trait. [`InMemoryGraphStore`] is the bundled
//! implementation; database-backed adapters implement the same trait.

pub mod errors;
pub mod memory;
pub mod models;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use memory::InMemoryGraphStore;
pub use models::TreeSnapshot;
pub use traits::GraphStore;

#[cfg(test)]
pub use traits::MockGraphStore;
