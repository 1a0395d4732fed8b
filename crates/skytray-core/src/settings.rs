//! User settings: the location to poll and how often.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use skytray_weather::{Coordinates, LocationSpec, LATITUDE_RANGE, LONGITUDE_RANGE};

use crate::config::ValidationResult;

pub const DEFAULT_CITY: &str = "New York City";
pub const DEFAULT_COUNTRY: &str = "United States";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Intervals above this are accepted with a warning.
const LONG_INTERVAL_SECS: i64 = 24 * 60 * 60;

const FIELD_INTERVAL: &str = "updateIntervalInSeconds";
const FIELD_LATITUDE: &str = "latitude";
const FIELD_LONGITUDE: &str = "longitude";
const FIELD_CITY: &str = "city";
const FIELD_COUNTRY: &str = "country";
const FIELD_LOCATION: &str = "location";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub location: LocationSpec,
    pub poll_interval_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: LocationSpec::by_name(DEFAULT_CITY, DEFAULT_COUNTRY),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// The persisted settings record, also used for partial update candidates.
///
/// Absent fields are omitted on write; `null` reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval_in_seconds: Option<i64>,
}

/// A partial settings update; only the fields present are changed.
pub type SettingsCandidate = SettingsRecord;

impl SettingsRecord {
    fn touches_coordinates(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }

    fn touches_name(&self) -> bool {
        self.city.is_some() || self.country.is_some()
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn to_record(&self) -> SettingsRecord {
        let interval = i64::try_from(self.poll_interval_seconds).unwrap_or(i64::MAX);
        match &self.location {
            LocationSpec::ByCoordinates(coords) => SettingsRecord {
                latitude: Some(coords.latitude),
                longitude: Some(coords.longitude),
                update_interval_in_seconds: Some(interval),
                ..SettingsRecord::default()
            },
            LocationSpec::ByName { place, region } => SettingsRecord {
                city: Some(place.clone()),
                country: Some(region.clone()),
                update_interval_in_seconds: Some(interval),
                ..SettingsRecord::default()
            },
        }
    }

    /// Build settings from a stored record. A missing interval takes the
    /// default; anything else invalid is rejected.
    pub fn from_record(record: &SettingsRecord) -> Result<Self, ValidationResult> {
        let mut result = ValidationResult::default();
        check_fields(record, &mut result);
        let location = location_from_record(record, &mut result);

        match location {
            Some(location) if result.is_valid() => Ok(Self {
                location,
                poll_interval_seconds: interval_from(record.update_interval_in_seconds),
            }),
            _ => Err(result),
        }
    }

    /// Merge `candidate` over these settings, validating every field and the
    /// resulting location. All problems are reported together.
    pub fn merge(&self, candidate: &SettingsCandidate) -> Result<Self, ValidationResult> {
        let mut result = ValidationResult::default();
        check_fields(candidate, &mut result);

        let merged = merge_records(&self.to_record(), candidate);
        let location = location_from_record(&merged, &mut result);

        match location {
            Some(location) if result.is_valid() => {
                result.log_warnings();
                Ok(Self {
                    location,
                    poll_interval_seconds: interval_from(merged.update_interval_in_seconds),
                })
            }
            _ => Err(result),
        }
    }
}

/// Field-level checks on whatever fields are present.
fn check_fields(record: &SettingsRecord, result: &mut ValidationResult) {
    if let Some(interval) = record.update_interval_in_seconds {
        if interval < 1 {
            result.add_error(FIELD_INTERVAL, "Update interval must be at least 1 second");
        } else if interval > LONG_INTERVAL_SECS {
            result.add_warning(FIELD_INTERVAL, "Update interval is more than 24 hours");
        }
    }

    if let Some(latitude) = record.latitude {
        if !latitude.is_finite() || !LATITUDE_RANGE.contains(&latitude) {
            result.add_error(FIELD_LATITUDE, "Latitude must be a number between -90 and 90");
        }
    }

    if let Some(longitude) = record.longitude {
        if !longitude.is_finite() || !LONGITUDE_RANGE.contains(&longitude) {
            result.add_error(
                FIELD_LONGITUDE,
                "Longitude must be a number between -180 and 180",
            );
        }
    }

    if let Some(city) = &record.city {
        if city.trim().is_empty() {
            result.add_error(FIELD_CITY, "City must not be empty");
        }
    }

    if let Some(country) = &record.country {
        if country.trim().is_empty() {
            result.add_error(FIELD_COUNTRY, "Country must not be empty");
        }
    }
}

/// Overlay `candidate` on `current`. Supplying only one kind of location
/// field switches the location to that kind.
fn merge_records(current: &SettingsRecord, candidate: &SettingsCandidate) -> SettingsRecord {
    let mut merged = current.clone();

    match (candidate.touches_coordinates(), candidate.touches_name()) {
        (true, false) => {
            merged.city = None;
            merged.country = None;
        }
        (false, true) => {
            merged.latitude = None;
            merged.longitude = None;
        }
        _ => {}
    }

    if candidate.city.is_some() {
        merged.city = candidate.city.clone();
    }
    if candidate.country.is_some() {
        merged.country = candidate.country.clone();
    }
    if candidate.latitude.is_some() {
        merged.latitude = candidate.latitude;
    }
    if candidate.longitude.is_some() {
        merged.longitude = candidate.longitude;
    }
    if candidate.update_interval_in_seconds.is_some() {
        merged.update_interval_in_seconds = candidate.update_interval_in_seconds;
    }

    merged
}

/// Pick the active location shape; coordinates win when both are complete.
fn location_from_record(
    record: &SettingsRecord,
    result: &mut ValidationResult,
) -> Option<LocationSpec> {
    match (
        record.latitude,
        record.longitude,
        record.city.as_deref(),
        record.country.as_deref(),
    ) {
        (Some(latitude), Some(longitude), _, _) => {
            Some(LocationSpec::ByCoordinates(Coordinates::new(latitude, longitude)))
        }
        (_, _, Some(city), Some(country)) => {
            Some(LocationSpec::by_name(city.trim(), country.trim()))
        }
        _ => {
            result.add_error(
                FIELD_LOCATION,
                "Provide both latitude and longitude, or both city and country",
            );
            None
        }
    }
}

fn interval_from(raw: Option<i64>) -> u64 {
    raw.and_then(|v| u64::try_from(v).ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_coordinates() -> Settings {
        Settings {
            location: LocationSpec::by_coordinates(55.7558, 37.6173),
            poll_interval_seconds: 120,
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(
            settings.location,
            LocationSpec::by_name("New York City", "United States")
        );
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_default_record_json() {
        let json = serde_json::to_value(Settings::default().to_record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "city": "New York City",
                "country": "United States",
                "updateIntervalInSeconds": 60
            })
        );
    }

    #[test]
    fn test_record_reads_nulls_as_absent() {
        let record: SettingsRecord = serde_json::from_str(
            r#"{"city":null,"country":null,"latitude":1.5,"longitude":2.5,"updateIntervalInSeconds":30}"#,
        )
        .unwrap();
        let settings = Settings::from_record(&record).unwrap();
        assert_eq!(settings.location, LocationSpec::by_coordinates(1.5, 2.5));
        assert_eq!(settings.poll_interval_seconds, 30);
    }

    #[test]
    fn test_record_without_location_is_rejected() {
        let record = SettingsRecord {
            update_interval_in_seconds: Some(60),
            ..SettingsRecord::default()
        };
        let err = Settings::from_record(&record).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "location"));
    }

    #[test]
    fn test_record_without_interval_uses_default() {
        let record = SettingsRecord {
            city: Some("Oslo".into()),
            country: Some("Norway".into()),
            ..SettingsRecord::default()
        };
        let settings = Settings::from_record(&record).unwrap();
        assert_eq!(settings.poll_interval_seconds, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_zero_interval_yields_exactly_one_error() {
        let candidate = SettingsCandidate {
            update_interval_in_seconds: Some(0),
            ..SettingsCandidate::default()
        };
        let err = Settings::default().merge(&candidate).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "updateIntervalInSeconds");
    }

    #[test]
    fn test_errors_are_collected() {
        let candidate = SettingsCandidate {
            latitude: Some(120.0),
            longitude: Some(-200.0),
            update_interval_in_seconds: Some(-5),
            ..SettingsCandidate::default()
        };
        let err = Settings::default().merge(&candidate).unwrap_err();
        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"updateIntervalInSeconds"));
        assert!(fields.contains(&"latitude"));
        assert!(fields.contains(&"longitude"));
    }

    #[test]
    fn test_blank_city_rejected() {
        let candidate = SettingsCandidate {
            city: Some("   ".into()),
            country: Some("France".into()),
            ..SettingsCandidate::default()
        };
        let err = Settings::default().merge(&candidate).unwrap_err();
        assert!(err.errors.iter().any(|e| e.field == "city"));
    }

    #[test]
    fn test_coordinates_replace_name() {
        let candidate = SettingsCandidate {
            latitude: Some(55.7558),
            longitude: Some(37.6173),
            ..SettingsCandidate::default()
        };
        let merged = Settings::default().merge(&candidate).unwrap();
        assert_eq!(merged.location, LocationSpec::by_coordinates(55.7558, 37.6173));
        assert_eq!(merged.poll_interval_seconds, 60);
    }

    #[test]
    fn test_lone_latitude_over_name_breaks_location_invariant() {
        let candidate = SettingsCandidate {
            latitude: Some(10.0),
            ..SettingsCandidate::default()
        };
        let err = Settings::default().merge(&candidate).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "location");
    }

    #[test]
    fn test_lone_longitude_updates_existing_coordinates() {
        let candidate = SettingsCandidate {
            longitude: Some(40.0),
            ..SettingsCandidate::default()
        };
        let merged = by_coordinates().merge(&candidate).unwrap();
        assert_eq!(merged.location, LocationSpec::by_coordinates(55.7558, 40.0));
    }

    #[test]
    fn test_name_replaces_coordinates() {
        let candidate = SettingsCandidate {
            city: Some(" Oslo ".into()),
            country: Some("Norway".into()),
            ..SettingsCandidate::default()
        };
        let merged = by_coordinates().merge(&candidate).unwrap();
        assert_eq!(merged.location, LocationSpec::by_name("Oslo", "Norway"));
        assert_eq!(merged.poll_interval_seconds, 120);
    }

    #[test]
    fn test_interval_only_keeps_location() {
        let candidate = SettingsCandidate {
            update_interval_in_seconds: Some(300),
            ..SettingsCandidate::default()
        };
        let merged = by_coordinates().merge(&candidate).unwrap();
        assert_eq!(merged.location, by_coordinates().location);
        assert_eq!(merged.poll_interval_seconds, 300);
    }

    #[test]
    fn test_coordinates_win_when_both_complete() {
        let candidate = SettingsCandidate {
            city: Some("Oslo".into()),
            country: Some("Norway".into()),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..SettingsCandidate::default()
        };
        let merged = Settings::default().merge(&candidate).unwrap();
        assert_eq!(merged.location, LocationSpec::by_coordinates(1.0, 2.0));
    }

    #[test]
    fn test_long_interval_is_a_warning() {
        let candidate = SettingsCandidate {
            update_interval_in_seconds: Some(LONG_INTERVAL_SECS + 1),
            ..SettingsCandidate::default()
        };
        assert!(Settings::default().merge(&candidate).is_ok());
    }

    #[test]
    fn test_empty_candidate_is_identity() {
        let settings = by_coordinates();
        let merged = settings.merge(&SettingsCandidate::default()).unwrap();
        assert_eq!(merged, settings);
    }
}
