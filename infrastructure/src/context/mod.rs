//! Workspace context persistence
//!
//! Implementations of the [`ContextStore`] port:
//!
//! - [`FileContextStore`] - One JSON file per workspace under a root directory
//! - [`InMemoryContextStore`] - Process-local map, for dry runs and tests
//!
//! [`ContextStore`]: swarm_application::ContextStore

mod file_store;
mod memory_store;

pub use file_store::FileContextStore;
pub use memory_store::InMemoryContextStore;
