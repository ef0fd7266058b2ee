//! Sleepy Check - Main Entry Point

use std::path::PathBuf;

use app::{init_logging, run, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional config path; otherwise `sleepy-check.toml` and SLEEPY__* variables
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    init_logging(&config.logging)?;

    info!("=== Sleepy Check v{} ===", env!("CARGO_PKG_VERSION"));

    run(config).await
}
