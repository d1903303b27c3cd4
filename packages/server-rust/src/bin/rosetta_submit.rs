//! Persists one translation submission read from a JSON file and prints the
//! resulting report.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rosetta_core::{ClockSource, SubmittedTranslation, SystemClock};
use rosetta_server::service::{BackgroundWorker, LoggingBuildTrigger, SubmissionCoordinator};
use rosetta_server::stats::{
    DerivedStatsCache, StatsCacheSweeper, TranslationStats, TranslationStatsDeriver,
};
use rosetta_server::storage::{
    ContentRepository, GitHubRepository, MemoryRepository, PersistentStore,
};
use rosetta_server::{telemetry, CliArgs};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    telemetry::init_tracing(args.log_format)?;

    let raw = tokio::fs::read(&args.submission)
        .await
        .with_context(|| format!("reading {}", args.submission.display()))?;
    let translation = SubmittedTranslation::from_json_slice(&raw)
        .with_context(|| format!("parsing {}", args.submission.display()))?;
    let locale = translation.locale.clone();
    let primary_unit = translation.primary_unit.clone();

    let repository: Arc<dyn ContentRepository> = if args.in_memory {
        Arc::new(MemoryRepository::new())
    } else {
        Arc::new(GitHubRepository::new(
            args.github.clone(),
            args.engine.http_timeout(),
        )?)
    };
    info!(
        repository = repository.name(),
        dry_run = args.engine.dry_run,
        "starting submission"
    );

    let store = Arc::new(PersistentStore::new(
        repository,
        !args.engine.dry_run,
        args.engine.conflict_retry_delay(),
    ));
    let clock: Arc<dyn ClockSource> = Arc::new(SystemClock);
    let cache: Arc<DerivedStatsCache<TranslationStats>> =
        Arc::new(DerivedStatsCache::new(args.engine.stats_staleness()));
    let mut sweeper = BackgroundWorker::start(
        StatsCacheSweeper::new(Arc::clone(&cache), Arc::clone(&clock)),
        args.engine.stats_sweep_interval(),
        16,
    );

    let coordinator = SubmissionCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        Arc::new(LoggingBuildTrigger),
        args.engine.include_a11y_keys,
    );
    let report = coordinator.submit(translation).await?;

    let deriver = TranslationStatsDeriver::new(store);
    let stats = match cache
        .get_or_derive(&locale, &primary_unit, clock.now_millis(), &deriver)
        .await
    {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "could not derive stats for primary unit");
            None
        }
    };
    sweeper.stop().await;

    let output = serde_json::json!({
        "outcome": report.outcome(),
        "report": report,
        "primaryUnitStats": stats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
