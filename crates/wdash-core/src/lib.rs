pub mod config;
pub mod error;

pub use config::{
    Config, LocationConfig, RefreshConfig, RefreshPolicy, TemperatureUnit, ValidationResult,
    WeatherConfig,
};
pub use error::{NetworkError, ReqwestErrorExt, StorageError};

use anyhow::Result;

/// Initialize logging for the process.
///
/// Log lines go to stderr so they never interleave with the rendered panel.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("wdash core initialized");
    Ok(())
}
