use std::path::PathBuf;

use anyhow::Result;

use sessionlog::{LoggerAccessor, Settings};

const DEFAULT_SETTINGS_FILE: &str = "appsettings.toml";

fn main() -> Result<()> {
    // Diagnostics about the logger itself go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sessionlog=info".into()),
        )
        .init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let settings = Settings::load_or_default(&settings_path)?;

    let accessor = LoggerAccessor::new(settings);
    let logger = accessor.instance();

    if let Err(e) = logger.init_result() {
        tracing::error!("Logging disabled for this run: {}", e);
    } else if let Some(path) = logger.path() {
        tracing::info!("Logging to: {}", path.display());
    }

    logger.information("Hello");
    logger.error_labeled("Sample error entry", "Demo");

    // Footer and retention sweep run when the accessor is dropped
    Ok(())
}
