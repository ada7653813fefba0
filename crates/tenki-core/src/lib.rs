pub mod config;
pub mod error;
pub mod regions;
pub mod selection_state;

pub use config::{Config, ForecastConfig, RegionConfig, StorageConfig, ValidationResult};
pub use error::{
    AppError, ConfigError, DatabaseError, ForecastError, NetworkError, ReqwestErrorExt,
    RusqliteErrorExt,
};
pub use regions::default_regions;
pub use selection_state::{Generation, SelectionOutcome, SelectionState};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("tenki core initialized");
    Ok(())
}
