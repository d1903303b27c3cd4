//! Dirty-aware cache of derived per-(locale, unit) statistics.
//!
//! Entry state machine: absent -> clean -> dirty -> absent. A dirty entry is
//! still served for a grace window after it was cached, which keeps a burst
//! of report requests right after a write from all recomputing at once.

use std::time::Duration;

use dashmap::DashMap;
use rosetta_core::{Locale, StorageUnit};

use super::deriver::StatsDeriver;

/// Default grace window for dirty entries.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Observable state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Clean,
    Dirty,
}

#[derive(Debug, Clone)]
struct CachedStats<S> {
    stats: S,
    is_dirty: bool,
    /// Millis since Unix epoch.
    cached_at: i64,
}

/// Process-local stats cache. Construct one per process and share it by
/// `Arc` between the submission path and the report path.
///
/// Never a source of truth: dropping it loses nothing.
pub struct DerivedStatsCache<S> {
    entries: DashMap<(Locale, StorageUnit), CachedStats<S>>,
    staleness_window_ms: i64,
}

impl<S: Clone + Send + Sync> DerivedStatsCache<S> {
    /// Creates an empty cache that serves dirty entries for `staleness_window`.
    #[must_use]
    pub fn new(staleness_window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            staleness_window_ms: i64::try_from(staleness_window.as_millis()).unwrap_or(i64::MAX),
        }
    }

    fn key(locale: &Locale, unit: &StorageUnit) -> (Locale, StorageUnit) {
        (locale.clone(), unit.clone())
    }

    fn is_expired(&self, entry: &CachedStats<S>, now: i64) -> bool {
        entry.is_dirty && now.saturating_sub(entry.cached_at) >= self.staleness_window_ms
    }

    /// Stores freshly computed stats as a clean entry.
    pub fn set(&self, locale: &Locale, unit: &StorageUnit, stats: S, now: i64) {
        self.entries.insert(
            Self::key(locale, unit),
            CachedStats {
                stats,
                is_dirty: false,
                cached_at: now,
            },
        );
    }

    /// Flags the entry as possibly stale. Returns `false` if there was no entry.
    pub fn mark_dirty(&self, locale: &Locale, unit: &StorageUnit) -> bool {
        match self.entries.get_mut(&Self::key(locale, unit)) {
            Some(mut entry) => {
                entry.is_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Cached stats if the entry is clean, or dirty but still inside the
    /// grace window. `None` means the caller must recompute and [`set`](Self::set).
    ///
    /// A dirty entry past its window is evicted by this call.
    pub fn get(&self, locale: &Locale, unit: &StorageUnit, now: i64) -> Option<S> {
        let key = Self::key(locale, unit);
        let hit = self.entries.get(&key).and_then(|entry| {
            if self.is_expired(&entry, now) {
                None
            } else {
                Some(entry.stats.clone())
            }
        });
        if hit.is_none() {
            self.entries.remove_if(&key, |_, entry| self.is_expired(entry, now));
        }
        hit
    }

    /// Current state of the entry for (`locale`, `unit`).
    #[must_use]
    pub fn state(&self, locale: &Locale, unit: &StorageUnit) -> EntryState {
        match self.entries.get(&Self::key(locale, unit)) {
            None => EntryState::Absent,
            Some(entry) if entry.is_dirty => EntryState::Dirty,
            Some(_) => EntryState::Clean,
        }
    }

    /// Drops one entry. Returns `true` if it existed.
    pub fn evict(&self, locale: &Locale, unit: &StorageUnit) -> bool {
        self.entries.remove(&Self::key(locale, unit)).is_some()
    }

    /// Drops every dirty entry past its grace window. Returns how many.
    pub fn sweep_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-through: serves the cached value when [`get`](Self::get) would,
    /// otherwise derives, caches and returns fresh stats.
    ///
    /// # Errors
    ///
    /// Propagates the deriver's error; the cache is left unchanged.
    pub async fn get_or_derive(
        &self,
        locale: &Locale,
        unit: &StorageUnit,
        now: i64,
        deriver: &dyn StatsDeriver<S>,
    ) -> anyhow::Result<S> {
        if let Some(stats) = self.get(locale, unit, now) {
            return Ok(stats);
        }
        let stats = deriver.derive(locale, unit).await?;
        self.set(locale, unit, stats.clone(), now);
        Ok(stats)
    }
}

impl<S: Clone + Send + Sync> Default for DerivedStatsCache<S> {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_WINDOW)
    }
}
