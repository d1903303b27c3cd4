//! `ContentRepository` implementations.
//!
//! [`GitHubRepository`] talks to the GitHub contents API and is the durable
//! backend. [`MemoryRepository`] keeps objects in process for tests and
//! local dry runs.

mod github;
mod memory;

pub use github::GitHubRepository;
pub use memory::{content_version, MemoryRepository};
