//! Tracing setup shared by every DGC service binary.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a JSON-formatted `tracing` subscriber driven by `RUST_LOG`
/// (defaulting to `info`) and bridges the `log` facade so dependencies that
/// still emit through `log::*` show up in the same stream.
pub fn init_tracing(service: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(true)
        .init();

    tracing_log::LogTracer::init()?;
    tracing::info!(service, "tracing initialized");
    Ok(())
}
