//! Submission coordinator: the transaction boundary of a translation save.
//!
//! For one [`SubmittedTranslation`] it locks every touched (unit, locale)
//! pair, merges the submitted values into each unit's persisted file,
//! selects the units that really changed, writes them, marks their derived
//! stats dirty, and finally decides whether a rebuild may be requested.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rosetta_core::{
    merge, ContractViolation, MergeOutcome, PersistedFile, StorageUnit, SubmittedTranslation,
};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::build_trigger::BuildTrigger;
use super::selector::WriteSetSelector;
use super::write_locks::UnitWriteLocks;
use crate::stats::{DerivedStatsCache, TranslationStats};
use crate::storage::PersistentStore;

/// Errors that reject a submission outright.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid submission: {0}")]
    Contract(#[from] ContractViolation),
}

/// What the translator is told about their save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionOutcome {
    StoredAndBuildRequested,
    StoredBuildNotRequested,
    /// Only reachable when writes are disabled.
    NotStoredBuildRequested,
    NeitherStoredNorRequested,
}

/// Result of one [`SubmissionCoordinator::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    /// Units whose content differed from the persisted file, plus units with
    /// submitted values whose file could not be read.
    pub units_to_write: BTreeSet<StorageUnit>,
    /// Units the store confirmed writing.
    pub units_written: BTreeSet<StorageUnit>,
    /// Every unit in `units_to_write` was written. Vacuously true when
    /// nothing needed writing.
    pub all_requested_units_written: bool,
    pub build_requested: bool,
}

impl SubmissionReport {
    #[must_use]
    pub fn outcome(&self) -> SubmissionOutcome {
        match (self.all_requested_units_written, self.build_requested) {
            (true, true) => SubmissionOutcome::StoredAndBuildRequested,
            (true, false) => SubmissionOutcome::StoredBuildNotRequested,
            (false, true) => SubmissionOutcome::NotStoredBuildRequested,
            (false, false) => SubmissionOutcome::NeitherStoredNorRequested,
        }
    }
}

/// Orchestrates merge, write-set selection, writes and cache invalidation.
pub struct SubmissionCoordinator<S = TranslationStats> {
    store: Arc<PersistentStore>,
    selector: WriteSetSelector,
    locks: UnitWriteLocks,
    stats_cache: Arc<DerivedStatsCache<S>>,
    build_trigger: Arc<dyn BuildTrigger>,
    include_a11y_keys: bool,
}

impl<S: Clone + Send + Sync> SubmissionCoordinator<S> {
    #[must_use]
    pub fn new(
        store: Arc<PersistentStore>,
        stats_cache: Arc<DerivedStatsCache<S>>,
        build_trigger: Arc<dyn BuildTrigger>,
        include_a11y_keys: bool,
    ) -> Self {
        Self {
            selector: WriteSetSelector::new(Arc::clone(&store)),
            store,
            locks: UnitWriteLocks::new(),
            stats_cache,
            build_trigger,
            include_a11y_keys,
        }
    }

    /// Persists one submission.
    ///
    /// Failures of individual unit writes are logged and reflected in the
    /// report; they do not stop the remaining units from being written.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Contract`] for malformed submissions. Nothing
    /// is written in that case.
    pub async fn submit(
        &self,
        mut translation: SubmittedTranslation,
    ) -> Result<SubmissionReport, SubmitError> {
        translation.validate()?;
        if !self.include_a11y_keys {
            translation.strip_a11y_keys();
        }

        let span = info_span!(
            "submission",
            unit = %translation.primary_unit,
            locale = %translation.locale,
            submitter = %translation.submitter_id,
        );
        self.submit_validated(&translation).instrument(span).await
    }

    async fn submit_validated(
        &self,
        translation: &SubmittedTranslation,
    ) -> Result<SubmissionReport, SubmitError> {
        let locale = &translation.locale;
        let units = translation.touched_units();

        // Held across read, merge and write so a concurrent submission on
        // the same unit sees this one's committed file.
        let guards = self.locks.acquire_all(&units, locale).await;

        // Merges are only ever based on a successful read; a unit whose file
        // cannot be read is reported as not written rather than merged
        // against an empty file.
        let mut merged: BTreeMap<StorageUnit, PersistedFile> = BTreeMap::new();
        let mut unreadable = BTreeSet::new();
        for unit in &units {
            let values = translation.values_for(unit);
            if values.is_empty() {
                continue;
            }
            let old = match self.store.read(unit, locale, None).await {
                Ok(old) => old,
                Err(e) => {
                    error!(
                        unit = %unit,
                        error = %e,
                        "cannot read translation file; unit not merged"
                    );
                    unreadable.insert(unit.clone());
                    continue;
                }
            };
            match merge(
                unit,
                Some(&old.content),
                &values,
                &translation.submitter_id,
                translation.timestamp,
            )? {
                MergeOutcome::Unchanged => {
                    debug!(unit = %unit, "submission leaves unit unchanged");
                }
                MergeOutcome::Changed { content, .. } => {
                    merged.insert(
                        unit.clone(),
                        PersistedFile {
                            content,
                            version: old.version,
                        },
                    );
                }
            }
        }

        let mut units_to_write = self.selector.select_units_to_write(&merged, locale).await;

        let mut units_written = BTreeSet::new();
        for unit in &units_to_write {
            let Some(file) = merged.get(unit) else {
                continue;
            };
            if self.store.put(unit, locale, file, None).await {
                units_written.insert(unit.clone());
            }
        }
        drop(guards);
        self.locks.prune_idle();
        units_to_write.extend(unreadable);

        let writes_enabled = self.store.writes_enabled();
        let invalidated = if writes_enabled {
            &units_written
        } else {
            &units_to_write
        };
        for unit in invalidated {
            self.stats_cache.mark_dirty(locale, unit);
        }

        let all_requested_units_written = units_written.len() == units_to_write.len();
        let build_requested = if all_requested_units_written || !writes_enabled {
            self.request_build(translation).await
        } else {
            false
        };

        let report = SubmissionReport {
            units_to_write,
            units_written,
            all_requested_units_written,
            build_requested,
        };
        if all_requested_units_written {
            info!(
                written = report.units_written.len(),
                build_requested,
                "submission stored"
            );
        } else {
            warn!(
                to_write = report.units_to_write.len(),
                written = report.units_written.len(),
                build_requested,
                "submission only partially stored"
            );
        }
        Ok(report)
    }

    async fn request_build(&self, translation: &SubmittedTranslation) -> bool {
        match self
            .build_trigger
            .request_build(
                &translation.primary_unit,
                &translation.locale,
                &translation.submitter_id,
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "build request failed");
                false
            }
        }
    }
}
