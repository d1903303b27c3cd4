//! Periodic eviction of expired dirty stats entries.
//!
//! [`StatsCacheSweeper`] runs on a [`BackgroundWorker`] so dirty entries
//! that nobody reads again do not linger past their grace window.

use std::sync::Arc;

use async_trait::async_trait;
use rosetta_core::{ClockSource, Locale, StorageUnit};
use tracing::debug;

use super::cache::DerivedStatsCache;
use crate::service::worker::BackgroundRunnable;

/// On-demand work for the sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepTask {
    /// Sweep now instead of waiting for the next tick.
    Sweep,
    /// Drop one entry regardless of state.
    Evict { locale: Locale, unit: StorageUnit },
    /// Drop every entry.
    Clear,
}

/// Cache maintenance runnable.
pub struct StatsCacheSweeper<S> {
    cache: Arc<DerivedStatsCache<S>>,
    clock: Arc<dyn ClockSource>,
}

impl<S: Clone + Send + Sync> StatsCacheSweeper<S> {
    #[must_use]
    pub fn new(cache: Arc<DerivedStatsCache<S>>, clock: Arc<dyn ClockSource>) -> Self {
        Self { cache, clock }
    }

    fn sweep(&self) {
        let removed = self.cache.sweep_expired(self.clock.now_millis());
        if removed > 0 {
            debug!(removed, remaining = self.cache.len(), "swept expired stats entries");
        }
    }
}

#[async_trait]
impl<S: Clone + Send + Sync + 'static> BackgroundRunnable for StatsCacheSweeper<S> {
    type Task = SweepTask;

    async fn run(&mut self, task: SweepTask) {
        match task {
            SweepTask::Sweep => self.sweep(),
            SweepTask::Evict { locale, unit } => {
                self.cache.evict(&locale, &unit);
            }
            SweepTask::Clear => self.cache.clear(),
        }
    }

    async fn on_tick(&mut self) {
        self.sweep();
    }
}
