//! Error types for the Skytray core.
//!
//! Errors surfaced to the presentation layer carry a `user_message()` that
//! is safe to show as-is; the `Display` form keeps the technical detail for
//! logs.

use std::path::PathBuf;

use skytray_weather::{ClientError, ResolutionError};
use thiserror::Error;

use crate::config::ValidationResult;

/// Startup failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Client(_) => "Could not set up network access. Check your settings.",
            AppError::Storage(e) => e.user_message(),
        }
    }
}

/// Runtime configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Settings persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Settings storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "Settings could not be saved. Check disk space and permissions.",
            StorageError::Serialize(_) => "Settings could not be saved.",
            StorageError::Unavailable(_) => "Settings storage is unavailable. Please try again.",
        }
    }
}

/// A settings update was rejected. Live state is unchanged in every case,
/// and so is the stored record unless the error is `RollbackFailed`.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Invalid settings: {0}")]
    Validation(ValidationResult),

    #[error("Failed to save settings: {0}")]
    PersistFailed(#[source] StorageError),

    #[error("Failed to resolve location: {0}")]
    ResolutionFailed(#[source] ResolutionError),

    /// Resolution failed and the previous record could not be put back, so
    /// storage now holds the rejected settings.
    #[error("Failed to resolve location ({resolution}) and to restore saved settings: {storage}")]
    RollbackFailed {
        resolution: ResolutionError,
        #[source]
        storage: StorageError,
    },

    #[error("Another settings update is in progress")]
    Busy,
}

impl ApplyError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApplyError::Validation(_) => "Some settings are invalid. Check the highlighted fields.",
            ApplyError::PersistFailed(e) => e.user_message(),
            ApplyError::ResolutionFailed(e) => e.user_message(),
            ApplyError::RollbackFailed { .. } => {
                "Location not accepted, and the previous settings could not be restored. Check disk space and permissions."
            }
            ApplyError::Busy => "Settings are already being saved. Please wait.",
        }
    }

    /// Per-field validation messages, empty for other variants.
    pub fn validation_messages(&self) -> Vec<String> {
        match self {
            ApplyError::Validation(result) => result.messages(),
            _ => Vec::new(),
        }
    }
}
