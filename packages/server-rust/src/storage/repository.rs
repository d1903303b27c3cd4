//! External content repository trait.
//!
//! Defines [`ContentRepository`], the lowest layer of the persistence stack:
//! a get/put-by-path object store whose objects carry a [`VersionToken`].
//! [`PersistentStore`](super::PersistentStore) sits on top and converts every
//! [`RepositoryError`] into an empty file or a `false` write result.

use async_trait::async_trait;
use rosetta_core::VersionToken;

/// A stored object and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

/// Failures reported by a [`ContentRepository`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The object does not exist. Expected for units with no translations yet.
    #[error("object not found: {path}")]
    NotFound { path: String },
    /// The expected version did not match the object's current version.
    #[error("version conflict writing {path}")]
    Conflict { path: String },
    /// Network failure, timeout, rate limit, or server-side error.
    #[error("transient repository error: {0}")]
    Transient(String),
    /// The repository answered with a payload that could not be decoded.
    #[error("malformed repository response: {0}")]
    Decode(String),
}

/// Versioned object store addressed by path.
///
/// Used as `Arc<dyn ContentRepository>`.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Short backend name for log fields.
    fn name(&self) -> &'static str;

    /// Reads the object at `path`, optionally at a specific branch or commit.
    async fn fetch(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<RemoteObject, RepositoryError>;

    /// Current version of the object at `path`, `None` if it does not exist.
    async fn version(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<VersionToken>, RepositoryError> {
        match self.fetch(path, git_ref).await {
            Ok(object) => Ok(Some(object.version)),
            Err(RepositoryError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Conditionally writes `bytes` to `path`.
    ///
    /// With `expected == None` the object must not exist yet (create).
    /// Otherwise `expected` must equal the object's current version (update).
    /// Returns the new version on success and
    /// [`RepositoryError::Conflict`] when the precondition fails.
    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
        git_ref: Option<&str>,
    ) -> Result<VersionToken, RepositoryError>;
}
