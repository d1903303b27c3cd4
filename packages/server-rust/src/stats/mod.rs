//! Derived statistics: the dirty-aware cache, the deriver seam, and the
//! background sweeper.

pub mod cache;
pub mod deriver;
pub mod sweeper;

pub use cache::{DerivedStatsCache, EntryState, DEFAULT_STALENESS_WINDOW};
pub use deriver::{StatsDeriver, TranslationStats, TranslationStatsDeriver};
pub use sweeper::{StatsCacheSweeper, SweepTask};
