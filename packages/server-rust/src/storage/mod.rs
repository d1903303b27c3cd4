//! Persistence stack for translation files.
//!
//! Two layers:
//!
//! - **Layer 1** ([`ContentRepository`]): versioned get/put-by-path object
//!   store (GitHub in production, in-memory for tests)
//! - **Layer 2** ([`PersistentStore`]): path convention, JSON encoding,
//!   optimistic-concurrency writes, and the degrade-to-empty failure policy

pub mod persistent_store;
pub mod repositories;
pub mod repository;

pub use persistent_store::*;
pub use repositories::{GitHubRepository, MemoryRepository};
pub use repository::*;
