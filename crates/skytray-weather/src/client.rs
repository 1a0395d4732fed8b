//! Outbound HTTP calls to the forecast and geocoding providers.
//!
//! Every failed call is classified into a [`FetchError`] and recorded in the
//! shared [`ErrorLog`] exactly once, before the error is handed back.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{ClientError, FetchError};
use crate::error_log::{ApiErrorRecord, ErrorLog, RequestSource};
use crate::transport::TransportErrorKind;
use crate::types::WeatherSample;

pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const OPEN_METEO_GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

const DEFAULT_GEOCODE_COUNT: u32 = 10;
const DEFAULT_LANGUAGE: &str = "en";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skytray/", env!("CARGO_PKG_VERSION"));
const DETAIL_MAX_CHARS: usize = 200;

/// Endpoints and request parameters for [`RemoteClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub forecast_url: String,
    pub geocode_url: String,
    pub reverse_geocode_url: String,
    /// Maximum number of geocoding candidates requested
    pub geocode_count: u32,
    pub language: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            forecast_url: OPEN_METEO_FORECAST_URL.to_string(),
            geocode_url: OPEN_METEO_GEOCODE_URL.to_string(),
            reverse_geocode_url: NOMINATIM_REVERSE_URL.to_string(),
            geocode_count: DEFAULT_GEOCODE_COUNT,
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeatherBody>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherBody {
    temperature: Option<f64>,
    weathercode: Option<i32>,
}

/// A classified failure plus whatever extra context the response offered.
pub(crate) struct Failure {
    pub(crate) error: FetchError,
    pub(crate) detail: Option<String>,
}

impl From<FetchError> for Failure {
    fn from(error: FetchError) -> Self {
        Self {
            error,
            detail: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    pub(crate) client: Arc<Client>,
    pub(crate) forecast_url: Url,
    pub(crate) geocode_url: Url,
    pub(crate) reverse_geocode_url: Url,
    pub(crate) config: ClientConfig,
    errors: Arc<ErrorLog>,
}

impl RemoteClient {
    pub fn new(config: ClientConfig, errors: Arc<ErrorLog>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            forecast_url: parse_endpoint(&config.forecast_url)?,
            geocode_url: parse_endpoint(&config.geocode_url)?,
            reverse_geocode_url: parse_endpoint(&config.reverse_geocode_url)?,
            config,
            errors,
        })
    }

    pub fn error_log(&self) -> &Arc<ErrorLog> {
        &self.errors
    }

    /// Fetch current conditions for the given coordinates.
    ///
    /// A numeric temperature is required; a missing weather code is read as
    /// 0 ("clear").
    pub async fn fetch_current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSample, FetchError> {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string())
            .append_pair("current_weather", "true");

        self.get_json(RequestSource::Forecast, url, |body: ForecastResponse| {
            let current = body.current_weather.ok_or_else(|| {
                FetchError::MalformedResponse("missing current_weather".to_string())
            })?;
            let temperature = current.temperature.ok_or_else(|| {
                FetchError::MalformedResponse("missing current_weather.temperature".to_string())
            })?;
            if !temperature.is_finite() {
                return Err(FetchError::MalformedResponse(
                    "current_weather.temperature is not a number".to_string(),
                ));
            }
            Ok(WeatherSample {
                temperature_celsius: temperature,
                condition_code: current.weathercode.unwrap_or(0),
            })
        })
        .await
    }

    /// GET `url`, decode the JSON body as `T` and convert it.
    ///
    /// Any failure along the way is recorded once under `source`.
    pub(crate) async fn get_json<T, R, F>(
        &self,
        source: RequestSource,
        url: Url,
        convert: F,
    ) -> Result<R, FetchError>
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> Result<R, FetchError>,
    {
        tracing::debug!(source = source.label(), url = %url, "Sending request");

        let result = match self.get_body(&url).await {
            Ok(body) => serde_json::from_str::<T>(&body)
                .map_err(|e| FetchError::MalformedResponse(e.to_string()))
                .and_then(convert)
                .map_err(Failure::from),
            Err(failure) => Err(failure),
        };

        result.map_err(|failure| {
            self.record_failure(source, &url, &failure);
            failure.error
        })
    }

    async fn get_body(&self, url: &Url) -> Result<String, Failure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Failure::from(transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .ok()
                .map(|body| truncate(body.trim(), DETAIL_MAX_CHARS))
                .filter(|body| !body.is_empty());
            return Err(Failure {
                error: FetchError::HttpStatus(status.as_u16()),
                detail,
            });
        }

        response
            .text()
            .await
            .map_err(|e| Failure::from(transport_error(&e)))
    }

    fn record_failure(&self, source: RequestSource, url: &Url, failure: &Failure) {
        tracing::warn!(
            source = source.label(),
            url = %url,
            error = %failure.error,
            "Remote call failed"
        );

        let mut record = ApiErrorRecord::new(source, failure.error.to_string());
        record.url = Some(url.to_string());
        record.http_status = failure.error.http_status();
        record.transport_error = failure.error.transport_kind();
        record.extra_detail = failure.detail.clone().or_else(|| match &failure.error {
            FetchError::Transport { message, .. } => Some(message.clone()),
            _ => None,
        });
        self.errors.record(record);
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|source| ClientError::InvalidEndpoint {
        url: raw.to_string(),
        source,
    })
}

fn transport_error(error: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        kind: TransportErrorKind::classify(error),
        message: error.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
