//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

const DEFAULT_DIRECTIVES: &str = "info";

/// Filter for the given `RUST_LOG`-style directives, falling back to `info`
/// when they are absent or invalid.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber, filtered by `RUST_LOG`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let directives = std::env::var("RUST_LOG").ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}")),
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directives_default_to_info() {
        assert_eq!(env_filter(None).to_string(), "info");
    }

    #[test]
    fn invalid_directives_default_to_info() {
        assert_eq!(env_filter(Some("rosetta_server=loud")).to_string(), "info");
    }

    #[test]
    fn directives_are_applied() {
        let filter = env_filter(Some("warn,rosetta_server=debug")).to_string();
        assert!(filter.contains("rosetta_server=debug"));
        assert!(filter.contains("warn"));
    }
}
