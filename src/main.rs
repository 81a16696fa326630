//! wattcast — quarter-hour power-demand forecaster.
//!
//! Run with:  `RUST_LOG=info wattcast`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("wattcast v{} starting", env!("CARGO_PKG_VERSION"));

    wattcast_daemon::run(wattcast_config::default_path())
        .await
        .map_err(Into::into)
}
