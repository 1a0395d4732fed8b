use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::RwLock;
use skytray_weather::{ApiErrorRecord, ErrorLog, LocationResolver, RemoteClient, ResolvedLocation};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::error::{AppError, ApplyError};
use crate::scheduler::{PollScheduler, SchedulerStatus, TickHandler};
use crate::settings::{Settings, SettingsCandidate};
use crate::state::WeatherState;
use crate::storage::{FileStorage, SettingsStorage};
use crate::store::SettingsStore;

/// Application state and lifecycle manager.
///
/// This is the only surface the tray/menu/window layer talks to. Cloning is
/// cheap and every clone shares the same state.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    store: SettingsStore,
    resolver: LocationResolver,
    client: Arc<RemoteClient>,
    errors: Arc<ErrorLog>,
    weather: RwLock<WeatherState>,
    scheduler: PollScheduler,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("store", &self.inner.store)
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create the application with settings kept in the configured file.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let storage = FileStorage::new(config.settings_path());
        tracing::info!("Settings file: {}", storage.path().display());
        Self::with_storage(config, Box::new(storage))
    }

    pub fn with_storage(
        config: &AppConfig,
        storage: Box<dyn SettingsStorage>,
    ) -> Result<Self, AppError> {
        let errors = Arc::new(ErrorLog::new());
        let client = Arc::new(RemoteClient::new(config.client.clone(), errors.clone())?);
        let resolver =
            LocationResolver::new(client.clone()).with_reverse_lookup(config.reverse_geocode);
        let store = SettingsStore::load(storage);

        Ok(Self {
            inner: Arc::new(AppInner {
                store,
                resolver,
                client,
                errors,
                weather: RwLock::new(WeatherState::default()),
                scheduler: PollScheduler::new(),
            }),
        })
    }

    /// Resolve the stored location and start polling.
    ///
    /// A resolution failure here is not fatal; each tick retries it.
    pub async fn start(&self) {
        if self.inner.resolve_current().await.is_none() {
            tracing::warn!("Starting without a resolved location, will retry on each tick");
        }

        let interval = self.inner.store.settings().poll_interval();
        self.inner.scheduler.start(interval, self.tick_handler());
        tracing::info!("Skytray started");
    }

    /// Stop polling. Fetches already in flight may still complete.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.inner.scheduler.stop();
    }

    pub fn weather_state(&self) -> WeatherState {
        self.inner.weather.read().clone()
    }

    /// Recent failed remote calls, oldest first.
    pub fn error_history(&self) -> Vec<ApiErrorRecord> {
        self.inner.errors.list_all()
    }

    pub fn current_settings(&self) -> Settings {
        self.inner.store.settings()
    }

    pub fn resolved_location(&self) -> Option<ResolvedLocation> {
        self.inner.store.resolved()
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.inner.scheduler.status()
    }

    /// Apply a settings update. On success the poll interval is rearmed if
    /// it changed and one refresh is started straight away.
    pub async fn request_settings_apply(
        &self,
        candidate: SettingsCandidate,
    ) -> Result<Settings, ApplyError> {
        let applied = self
            .inner
            .store
            .apply_and_persist(&candidate, &self.inner.resolver)
            .await?;

        if applied.interval_changed {
            self.inner.scheduler.rearm(applied.settings.poll_interval());
        }
        self.request_immediate_refresh();

        Ok(applied.settings)
    }

    /// Start one out-of-band refresh. Must be called inside a tokio runtime.
    pub fn request_immediate_refresh(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.refresh().await })
    }

    fn tick_handler(&self) -> TickHandler {
        // Weak, so the scheduler owned by `inner` does not keep `inner` alive.
        let weak: Weak<AppInner> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                tokio::spawn(async move { inner.refresh().await });
            }
        })
    }
}

impl AppInner {
    /// One refresh: make sure the location is resolved, then fetch.
    ///
    /// Failures are already recorded in the error log by the client.
    async fn refresh(&self) {
        let location = match self.store.resolved() {
            Some(location) => location,
            None => match self.resolve_current().await {
                Some(location) => location,
                None => return,
            },
        };

        match self
            .client
            .fetch_current_weather(location.latitude, location.longitude)
            .await
        {
            Ok(sample) => {
                self.weather.write().update(sample, Utc::now());
                tracing::debug!(
                    "Weather for {}: {}°C (code {})",
                    location.display_name(),
                    sample.temperature_celsius,
                    sample.condition_code
                );
            }
            Err(e) => {
                tracing::debug!("Weather refresh failed, keeping last state: {}", e);
            }
        }
    }

    async fn resolve_current(&self) -> Option<ResolvedLocation> {
        let settings = self.store.settings();
        match self.resolver.resolve(&settings.location).await {
            Ok(resolved) => {
                self.store.set_resolved(&settings.location, resolved.clone());
                Some(resolved)
            }
            Err(e) => {
                tracing::warn!("Could not resolve location: {}", e);
                None
            }
        }
    }
}
