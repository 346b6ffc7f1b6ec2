//! Tracing subscriber setup for the stockpile binary.
//!
//! Logs go to stderr so `stockpile list` output stays pipeable.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `log_level` is an EnvFilter directive. `RUST_LOG` has already been folded into it by the
/// config loader, so it is not consulted again here.
pub fn init(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("invalid log filter {log_level:?}"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("tracing subscriber already installed")?;

    tracing::debug!(filter = %log_level, "logging initialized");
    Ok(())
}
