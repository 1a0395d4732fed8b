use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skytray_weather::{WeatherCondition, WeatherSample};

/// Last known weather, as shown by the presentation layer.
///
/// Only successful fetches change it; after a failure the previous values
/// stay on display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub temperature_celsius: Option<f64>,
    pub condition_code: i32,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl WeatherState {
    pub fn update(&mut self, sample: WeatherSample, at: DateTime<Utc>) {
        self.temperature_celsius = Some(sample.temperature_celsius);
        self.condition_code = sample.condition_code;
        self.last_success_at = Some(at);
    }

    pub fn has_data(&self) -> bool {
        self.last_success_at.is_some()
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.condition_code)
    }

    /// Temperature rounded for a tray label, e.g. "-3°C".
    pub fn temperature_label(&self) -> Option<String> {
        self.temperature_celsius
            .map(|t| format!("{}°C", t.round() as i64))
    }
}
