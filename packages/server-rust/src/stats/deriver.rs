//! Stats derivation on a cache miss.
//!
//! [`StatsDeriver`] is the seam the report path plugs its computation into.
//! [`TranslationStatsDeriver`] is the stock implementation: it reads one
//! translation file through the [`PersistentStore`] and summarises it.

use std::sync::Arc;

use async_trait::async_trait;
use rosetta_core::{Locale, StorageUnit, StringFile};
use serde::Serialize;

use crate::storage::PersistentStore;

/// Computes stats of type `S` for one (locale, unit) pair.
///
/// Used as `&dyn StatsDeriver<S>`.
#[async_trait]
pub trait StatsDeriver<S>: Send + Sync {
    async fn derive(&self, locale: &Locale, unit: &StorageUnit) -> anyhow::Result<S>;
}

/// Summary of one translation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStats {
    /// Records in the file, translated or erased.
    pub total_records: usize,
    /// Records with a non-empty value.
    pub translated: usize,
    /// Records whose value was erased.
    pub erased: usize,
    /// History entries across all records.
    pub history_entries: usize,
    /// Newest history timestamp, millis since Unix epoch.
    pub last_edited: Option<i64>,
}

impl TranslationStats {
    #[must_use]
    pub fn from_file(file: &StringFile) -> Self {
        let mut stats = Self::default();
        for (_, record) in file.iter() {
            stats.total_records += 1;
            if record.is_translated() {
                stats.translated += 1;
            } else {
                stats.erased += 1;
            }
            stats.history_entries += record.history.len();
            let newest = record.history.iter().map(|h| h.timestamp).max();
            stats.last_edited = stats.last_edited.max(newest);
        }
        stats
    }
}

/// Derives [`TranslationStats`] straight from the store.
pub struct TranslationStatsDeriver {
    store: Arc<PersistentStore>,
}

impl TranslationStatsDeriver {
    #[must_use]
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatsDeriver<TranslationStats> for TranslationStatsDeriver {
    async fn derive(
        &self,
        locale: &Locale,
        unit: &StorageUnit,
    ) -> anyhow::Result<TranslationStats> {
        let file = self.store.get(unit, locale, None).await;
        Ok(TranslationStats::from_file(&file.content))
    }
}
