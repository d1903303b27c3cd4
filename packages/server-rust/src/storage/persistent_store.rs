//! Translation file store on top of a [`ContentRepository`].
//!
//! [`PersistentStore`] owns the path convention, JSON encoding, the
//! optimistic-concurrency write path and the failure policy. `get` never
//! fails (it degrades to an empty file), `read` reports failures so that
//! merges are only ever based on what is really stored, and `put` reports a
//! plain `bool`.

use std::sync::Arc;
use std::time::Duration;

use rosetta_core::{Locale, PersistedFile, StorageUnit, StringFile};
use tracing::{debug, error, info, warn};

use crate::storage::repository::{ContentRepository, RepositoryError};

/// Number of write attempts for one `put`: the first plus one retry after a
/// version conflict.
const MAX_WRITE_ATTEMPTS: u32 = 2;

/// Repository path of the file for `unit` in `locale`.
#[must_use]
pub fn file_path(unit: &StorageUnit, locale: &Locale) -> String {
    format!("{unit}/{unit}-strings_{locale}.json")
}

/// Commit message recorded with each write.
#[must_use]
pub fn commit_message(unit: &StorageUnit, locale: &Locale) -> String {
    format!("automated commit from rosetta for unit '{unit}', locale '{locale}'")
}

/// Sole owner of durable translation state.
pub struct PersistentStore {
    repository: Arc<dyn ContentRepository>,
    writes_enabled: bool,
    conflict_retry_delay: Duration,
}

impl PersistentStore {
    /// Creates a store over `repository`.
    ///
    /// With `writes_enabled == false` every `put` is skipped (dry run).
    #[must_use]
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        writes_enabled: bool,
        conflict_retry_delay: Duration,
    ) -> Self {
        Self {
            repository,
            writes_enabled,
            conflict_retry_delay,
        }
    }

    /// Whether `put` actually writes.
    #[must_use]
    pub fn writes_enabled(&self) -> bool {
        self.writes_enabled
    }

    /// Reads and parses the file for (`unit`, `locale`).
    ///
    /// A missing object is the normal "not translated yet" case and yields an
    /// empty file with no version.
    ///
    /// # Errors
    ///
    /// Any repository failure other than not-found, and undecodable content
    /// as [`RepositoryError::Decode`].
    pub async fn read(
        &self,
        unit: &StorageUnit,
        locale: &Locale,
        git_ref: Option<&str>,
    ) -> Result<PersistedFile, RepositoryError> {
        let path = file_path(unit, locale);
        match self.repository.fetch(&path, git_ref).await {
            Ok(object) => {
                let content = StringFile::from_json_slice(&object.bytes)
                    .map_err(|e| RepositoryError::Decode(format!("{path}: {e}")))?;
                Ok(PersistedFile {
                    content,
                    version: Some(object.version),
                })
            }
            Err(RepositoryError::NotFound { .. }) => {
                debug!(unit = %unit, locale = %locale, "no translation file yet");
                Ok(PersistedFile::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`read`](Self::read), but every failure is logged and yields an
    /// empty file. For readers that can live with "appears untranslated";
    /// a result obtained this way must never be merged and written back.
    pub async fn get(
        &self,
        unit: &StorageUnit,
        locale: &Locale,
        git_ref: Option<&str>,
    ) -> PersistedFile {
        match self.read(unit, locale, git_ref).await {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    unit = %unit,
                    locale = %locale,
                    backend = self.repository.name(),
                    error = %e,
                    "failed to read translation file; treating as empty"
                );
                PersistedFile::empty()
            }
        }
    }

    /// Writes `file.content` as the file for (`unit`, `locale`), provided
    /// the stored object is still at `file.version`, the version the content
    /// was derived from (`None` meaning the object must not exist yet).
    ///
    /// Skipped (returns `false`) when the content is empty or writes are
    /// disabled. Otherwise fetches the current version and refuses the write
    /// if it moved away from `file.version`, then issues one conditional
    /// write. A version conflict is retried once after a delay, and only if
    /// the object is still at `file.version`. Returns `true` only when the
    /// repository confirmed the write.
    pub async fn put(
        &self,
        unit: &StorageUnit,
        locale: &Locale,
        file: &PersistedFile,
        git_ref: Option<&str>,
    ) -> bool {
        if file.content.is_empty() {
            warn!(unit = %unit, locale = %locale, "refusing to write empty translation file");
            return false;
        }
        if !self.writes_enabled {
            warn!(
                unit = %unit,
                locale = %locale,
                "writes disabled; skipping translation file write"
            );
            return false;
        }

        let bytes = match file.content.to_json_vec() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    unit = %unit,
                    locale = %locale,
                    error = %e,
                    "failed to encode translation file"
                );
                return false;
            }
        };
        let path = file_path(unit, locale);
        let message = commit_message(unit, locale);
        let base = file.version.as_ref();

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = match self.repository.version(&path, git_ref).await {
                Ok(version) => version,
                Err(e) => {
                    error!(
                        unit = %unit,
                        locale = %locale,
                        backend = self.repository.name(),
                        error = %e,
                        "failed to fetch current version before write"
                    );
                    return false;
                }
            };
            if current.as_ref() != base {
                error!(
                    unit = %unit,
                    locale = %locale,
                    expected = ?base,
                    current = ?current,
                    "translation file changed since it was read; refusing to overwrite"
                );
                return false;
            }

            match self
                .repository
                .write(&path, &bytes, &message, base, git_ref)
                .await
            {
                Ok(version) => {
                    info!(
                        unit = %unit,
                        locale = %locale,
                        version = %version,
                        created = base.is_none(),
                        "translation file written"
                    );
                    return true;
                }
                Err(RepositoryError::Conflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                    let retry_in_ms =
                        u64::try_from(self.conflict_retry_delay.as_millis()).unwrap_or(u64::MAX);
                    warn!(
                        unit = %unit,
                        locale = %locale,
                        retry_in_ms,
                        "version conflict writing translation file; retrying"
                    );
                    tokio::time::sleep(self.conflict_retry_delay).await;
                }
                Err(e) => {
                    error!(
                        unit = %unit,
                        locale = %locale,
                        backend = self.repository.name(),
                        attempt,
                        error = %e,
                        "failed to write translation file"
                    );
                    return false;
                }
            }
        }
        false
    }
}
