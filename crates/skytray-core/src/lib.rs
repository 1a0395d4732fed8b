//! Skytray core: persisted settings, location resolution on apply, the
//! polling scheduler and the state read by the presentation layer.

pub mod app;
pub mod apply_state;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod storage;
pub mod store;

pub use app::App;
pub use config::{AppConfig, ConfigValidationError, ValidationResult};
pub use error::{AppError, ApplyError, ConfigError, StorageError};
pub use scheduler::{PollScheduler, SchedulerStatus};
pub use settings::{Settings, SettingsCandidate, SettingsRecord};
pub use state::WeatherState;
pub use storage::{FileStorage, MemoryStorage, SettingsStorage};
pub use store::{AppliedSettings, LiveSettings, SettingsStore};

pub use skytray_weather as weather;

use anyhow::Result;

/// Initialize logging. Honors `RUST_LOG`, defaulting to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Skytray core initialized");
    Ok(())
}
