//! Concrete [`statict_core`] storage backends: in-memory implementations for
//! tests and ephemeral deployments, and a durable file-backed key/value store
//! for a single-process deployment.

mod file;
mod memory;

pub use file::{FileAppender, FileDedupStore, FileIssuerStore, FileStoreError};
pub use memory::{MemoryAppender, MemoryDedupStore, MemoryIssuerStore};
