//! Build-request seam.
//!
//! After a submission is durably stored, the simulation is rebuilt and
//! republished in the new locale. That happens outside this crate; the
//! coordinator only calls a [`BuildTrigger`].

use async_trait::async_trait;
use rosetta_core::{Locale, StorageUnit, SubmitterId};
use tracing::info;

/// Requests a rebuild of `unit` for `locale`.
///
/// Used as `Arc<dyn BuildTrigger>`.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    async fn request_build(
        &self,
        unit: &StorageUnit,
        locale: &Locale,
        submitter_id: &SubmitterId,
    ) -> anyhow::Result<()>;
}

/// Trigger that only logs the request. Used for dry runs and local setups
/// with no build server.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBuildTrigger;

#[async_trait]
impl BuildTrigger for LoggingBuildTrigger {
    async fn request_build(
        &self,
        unit: &StorageUnit,
        locale: &Locale,
        submitter_id: &SubmitterId,
    ) -> anyhow::Result<()> {
        info!(unit = %unit, locale = %locale, submitter = %submitter_id, "build requested");
        Ok(())
    }
}
