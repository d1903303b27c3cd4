//! Per-(unit, locale) write serialization.
//!
//! Each pair maps to a fair async mutex, so waiters are served FIFO with a
//! concurrency of exactly one. Multi-unit acquisitions always lock in sorted
//! order, which rules out lock-order deadlocks between submissions.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use rosetta_core::{Locale, StorageUnit};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held while a submission owns a (unit, locale) pair.
pub type UnitWriteGuard = OwnedMutexGuard<()>;

/// Keyed FIFO locks for translation files.
///
/// Entries are created on first use. [`prune_idle`](Self::prune_idle) drops
/// the ones nobody holds or waits on, so the map tracks in-flight pairs
/// rather than every pair ever written.
#[derive(Default)]
pub struct UnitWriteLocks {
    locks: DashMap<(StorageUnit, Locale), Arc<Mutex<()>>>,
}

impl UnitWriteLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, unit: &StorageUnit, locale: &Locale) -> Arc<Mutex<()>> {
        // Clone the Arc out so no map shard guard is held across an await.
        self.locks
            .entry((unit.clone(), locale.clone()))
            .or_default()
            .value()
            .clone()
    }

    /// Waits for exclusive ownership of (`unit`, `locale`).
    pub async fn acquire(&self, unit: &StorageUnit, locale: &Locale) -> UnitWriteGuard {
        self.lock_for(unit, locale).lock_owned().await
    }

    /// Waits for exclusive ownership of every unit in `units` for `locale`.
    pub async fn acquire_all(
        &self,
        units: &BTreeSet<StorageUnit>,
        locale: &Locale,
    ) -> Vec<UnitWriteGuard> {
        let mut guards = Vec::with_capacity(units.len());
        for unit in units {
            guards.push(self.acquire(unit, locale).await);
        }
        guards
    }

    /// Removes locks that are neither held nor awaited.
    ///
    /// The map's own `Arc` is the only reference to such a lock. Both this
    /// check and `lock_for` run under the shard lock, so a pair cannot be
    /// pruned between being looked up and being locked.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of (unit, locale) pairs currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
