//! Write-set selection.
//!
//! Given the merged content of every candidate unit, re-reads what is
//! persisted right now and keeps only the units whose content actually
//! differs. This is a best-effort staleness check; the per-unit write
//! locks and the version-conditional `put` are what guarantee correctness.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rosetta_core::{Locale, PersistedFile, StorageUnit, StringFile};
use tracing::{debug, warn};

use crate::storage::PersistentStore;

/// Whether `merged` differs from `persisted`.
///
/// A key-count difference in either direction always needs a write; a
/// decrease happens when a release removed strings while a translation
/// was in progress.
#[must_use]
pub fn needs_write(persisted: &StringFile, merged: &StringFile) -> bool {
    if persisted.len() != merged.len() {
        return true;
    }
    merged
        .iter()
        .any(|(key, record)| persisted.get(key) != Some(record))
}

/// Picks the units whose merged content must be written.
pub struct WriteSetSelector {
    store: Arc<PersistentStore>,
}

impl WriteSetSelector {
    #[must_use]
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    /// Returns the subset of `candidates` that differ from the freshly read
    /// persisted files for `locale`.
    ///
    /// A unit whose file cannot be re-read is kept: the conditional `put`
    /// makes the final call on it.
    pub async fn select_units_to_write(
        &self,
        candidates: &BTreeMap<StorageUnit, PersistedFile>,
        locale: &Locale,
    ) -> BTreeSet<StorageUnit> {
        let mut selected = BTreeSet::new();
        for (unit, merged) in candidates {
            match self.store.read(unit, locale, None).await {
                Ok(persisted) if !needs_write(&persisted.content, &merged.content) => {
                    debug!(
                        unit = %unit,
                        locale = %locale,
                        "persisted file already matches; no write needed"
                    );
                }
                Ok(_) => {
                    selected.insert(unit.clone());
                }
                Err(e) => {
                    warn!(
                        unit = %unit,
                        locale = %locale,
                        error = %e,
                        "could not re-read before write"
                    );
                    selected.insert(unit.clone());
                }
            }
        }
        selected
    }
}
