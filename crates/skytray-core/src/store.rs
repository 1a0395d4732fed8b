//! Persisted settings plus the live location derived from them.
//!
//! Updates are all-or-nothing: a rejected apply leaves both the in-memory
//! state and the stored record as they were before the attempt.

use parking_lot::{Mutex, RwLock};
use skytray_weather::{LocationResolver, LocationSpec, ResolvedLocation};

use crate::apply_state::{ApplyGuard, ApplyState};
use crate::config::ValidationResult;
use crate::error::{ApplyError, StorageError};
use crate::settings::{Settings, SettingsCandidate, SettingsRecord};
use crate::storage::SettingsStorage;

/// Settings in effect together with their resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub settings: Settings,
    /// `None` until the location has been resolved at least once
    pub resolved: Option<ResolvedLocation>,
}

/// Outcome of a successful apply.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSettings {
    pub settings: Settings,
    pub resolved: ResolvedLocation,
    pub interval_changed: bool,
}

pub struct SettingsStore {
    storage: Box<dyn SettingsStorage>,
    live: RwLock<LiveSettings>,
    apply_state: Mutex<ApplyState>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("live", &*self.live.read())
            .field("apply_state", &*self.apply_state.lock())
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Load settings from `storage`. Never fails: a missing, unreadable or
    /// invalid record is replaced by the defaults, which are written back.
    pub fn load(storage: Box<dyn SettingsStorage>) -> Self {
        let settings = match read_settings(storage.as_ref()) {
            Ok(Some(settings)) => {
                tracing::info!("Loaded settings: {:?}", settings);
                settings
            }
            Ok(None) => {
                tracing::info!("No stored settings, using defaults");
                write_defaults(storage.as_ref())
            }
            Err(reason) => {
                tracing::warn!("Stored settings unusable ({}), using defaults", reason);
                write_defaults(storage.as_ref())
            }
        };

        Self {
            storage,
            live: RwLock::new(LiveSettings {
                settings,
                resolved: None,
            }),
            apply_state: Mutex::new(ApplyState::Idle),
        }
    }

    pub fn settings(&self) -> Settings {
        self.live.read().settings.clone()
    }

    pub fn resolved(&self) -> Option<ResolvedLocation> {
        self.live.read().resolved.clone()
    }

    pub fn snapshot(&self) -> LiveSettings {
        self.live.read().clone()
    }

    /// Record a resolution of `location`, unless the live location has
    /// changed since it was read. Returns whether it was stored.
    pub fn set_resolved(&self, location: &LocationSpec, resolved: ResolvedLocation) -> bool {
        let mut live = self.live.write();
        if &live.settings.location != location {
            tracing::debug!("Discarding resolution for a location that is no longer active");
            return false;
        }
        live.resolved = Some(resolved);
        true
    }

    /// Check `candidate` against the current settings without applying it.
    pub fn validate(&self, candidate: &SettingsCandidate) -> Result<(), ValidationResult> {
        self.settings().merge(candidate).map(|_| ())
    }

    /// Validate, persist, resolve and commit `candidate`.
    ///
    /// On any failure the live state is untouched and the stored record is
    /// restored to its previous contents. If that restore fails the error is
    /// [`ApplyError::RollbackFailed`].
    pub async fn apply_and_persist(
        &self,
        candidate: &SettingsCandidate,
        resolver: &LocationResolver,
    ) -> Result<AppliedSettings, ApplyError> {
        let _guard = ApplyGuard::try_begin(&self.apply_state).ok_or(ApplyError::Busy)?;

        let snapshot = self.snapshot();
        let merged = snapshot
            .settings
            .merge(candidate)
            .map_err(ApplyError::Validation)?;

        let previous_record = self.storage.read().map_err(ApplyError::PersistFailed)?;
        if let Err(e) = write_settings(self.storage.as_ref(), &merged) {
            tracing::warn!("Failed to persist settings: {}", e);
            return Err(ApplyError::PersistFailed(e));
        }

        let resolved = match resolver.resolve(&merged.location).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Rejecting settings, location did not resolve: {}", e);
                if let Err(storage) = self.restore_record(previous_record.as_deref()) {
                    tracing::error!("Failed to restore previous settings record: {}", storage);
                    return Err(ApplyError::RollbackFailed {
                        resolution: e,
                        storage,
                    });
                }
                return Err(ApplyError::ResolutionFailed(e));
            }
        };

        let interval_changed =
            merged.poll_interval_seconds != snapshot.settings.poll_interval_seconds;

        *self.live.write() = LiveSettings {
            settings: merged.clone(),
            resolved: Some(resolved.clone()),
        };

        tracing::info!(
            "Applied settings: {} every {}s",
            resolved.display_name(),
            merged.poll_interval_seconds
        );

        Ok(AppliedSettings {
            settings: merged,
            resolved,
            interval_changed,
        })
    }

    fn restore_record(&self, previous: Option<&str>) -> Result<(), StorageError> {
        match previous {
            Some(contents) => self.storage.write(contents),
            None => self.storage.clear(),
        }
    }
}

fn read_settings(storage: &dyn SettingsStorage) -> Result<Option<Settings>, String> {
    let contents = match storage.read() {
        Ok(Some(contents)) => contents,
        Ok(None) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    let record: SettingsRecord = serde_json::from_str(&contents).map_err(|e| e.to_string())?;
    Settings::from_record(&record)
        .map(Some)
        .map_err(|result| result.error_summary())
}

fn write_settings(storage: &dyn SettingsStorage, settings: &Settings) -> Result<(), StorageError> {
    let contents = serde_json::to_string_pretty(&settings.to_record())?;
    storage.write(&contents)
}

fn write_defaults(storage: &dyn SettingsStorage) -> Settings {
    let settings = Settings::default();
    if let Err(e) = write_settings(storage, &settings) {
        tracing::warn!("Failed to write default settings: {}", e);
    }
    settings
}
