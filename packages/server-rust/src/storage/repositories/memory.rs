//! In-memory [`ContentRepository`] implementation.
//!
//! Versions are the hex SHA-256 of the stored bytes, so identical content
//! always carries an identical token. Conditional writes are an atomic
//! compare-and-set under a single lock.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rosetta_core::VersionToken;
use sha2::{Digest, Sha256};

use crate::storage::repository::{ContentRepository, RemoteObject, RepositoryError};

/// Process-local versioned object store.
///
/// `git_ref` is accepted and ignored: there is a single branch.
#[derive(Default)]
pub struct MemoryRepository {
    objects: Mutex<HashMap<String, RemoteObject>>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` unconditionally, returning the new version.
    pub fn seed(&self, path: &str, bytes: Vec<u8>) -> VersionToken {
        let version = content_version(&bytes);
        self.objects.lock().insert(
            path.to_string(),
            RemoteObject {
                bytes,
                version: version.clone(),
            },
        );
        version
    }

    /// Raw bytes currently stored at `path`.
    #[must_use]
    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(path).map(|o| o.bytes.clone())
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

/// Hex SHA-256 of `bytes`.
#[must_use]
pub fn content_version(bytes: &[u8]) -> VersionToken {
    VersionToken::new(hex::encode(Sha256::digest(bytes)))
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(
        &self,
        path: &str,
        _git_ref: Option<&str>,
    ) -> Result<RemoteObject, RepositoryError> {
        self.objects
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                path: path.to_string(),
            })
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        _message: &str,
        expected: Option<&VersionToken>,
        _git_ref: Option<&str>,
    ) -> Result<VersionToken, RepositoryError> {
        let mut objects = self.objects.lock();
        let current = objects.get(path).map(|o| &o.version);
        if current != expected {
            return Err(RepositoryError::Conflict {
                path: path.to_string(),
            });
        }
        let version = content_version(bytes);
        objects.insert(
            path.to_string(),
            RemoteObject {
                bytes: bytes.to_vec(),
                version: version.clone(),
            },
        );
        Ok(version)
    }
}
