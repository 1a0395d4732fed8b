use serde::{Deserialize, Serialize};

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True if both values are finite and inside their geographic range.
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && LATITUDE_RANGE.contains(&self.latitude)
            && LONGITUDE_RANGE.contains(&self.longitude)
    }
}

/// User-supplied description of where to fetch weather for.
///
/// Exactly one shape is active at a time: either explicit coordinates or a
/// named place inside a region (country).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LocationSpec {
    ByCoordinates(Coordinates),
    ByName { place: String, region: String },
}

impl LocationSpec {
    pub fn by_name(place: impl Into<String>, region: impl Into<String>) -> Self {
        Self::ByName {
            place: place.into(),
            region: region.into(),
        }
    }

    pub fn by_coordinates(latitude: f64, longitude: f64) -> Self {
        Self::ByCoordinates(Coordinates::new(latitude, longitude))
    }

    /// True if the active variant carries data a resolver can work with.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::ByCoordinates(coords) => coords.is_in_range(),
            Self::ByName { place, region } => {
                !place.trim().is_empty() && !region.trim().is_empty()
            }
        }
    }
}

/// Concrete location produced by resolving a [`LocationSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub display_place: String,
    pub display_region: String,
}

impl ResolvedLocation {
    /// Location with no display name; coordinates alone are enough to fetch.
    pub fn from_coordinates(coords: Coordinates) -> Self {
        Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            display_place: String::new(),
            display_region: String::new(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Human-readable label, falling back to formatted coordinates.
    pub fn display_name(&self) -> String {
        match (self.display_place.is_empty(), self.display_region.is_empty()) {
            (false, false) => format!("{}, {}", self.display_place, self.display_region),
            (false, true) => self.display_place.clone(),
            (true, false) => self.display_region.clone(),
            (true, true) => format!("{:.2}, {:.2}", self.latitude, self.longitude),
        }
    }
}

/// One forward-geocoding match, in provider ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country: String,
}

/// Current conditions returned by the forecast provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature_celsius: f64,
    pub condition_code: i32,
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 | 66 | 67 => Self::Sleet, // Freezing drizzle / rain
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon name for the tray renderer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(55.7558, 37.6173).is_in_range());
        assert!(Coordinates::new(-90.0, 180.0).is_in_range());
        assert!(!Coordinates::new(90.5, 0.0).is_in_range());
        assert!(!Coordinates::new(0.0, -180.1).is_in_range());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_in_range());
    }

    #[test]
    fn test_blank_name_is_not_usable() {
        assert!(LocationSpec::by_name("Paris", "France").is_usable());
        assert!(!LocationSpec::by_name("  ", "France").is_usable());
        assert!(!LocationSpec::by_name("Paris", "").is_usable());
    }

    #[test]
    fn test_display_name_falls_back_to_coordinates() {
        let resolved = ResolvedLocation::from_coordinates(Coordinates::new(55.7558, 37.6173));
        assert_eq!(resolved.display_name(), "55.76, 37.62");

        let named = ResolvedLocation {
            display_place: "Moscow".into(),
            display_region: "Russia".into(),
            ..resolved
        };
        assert_eq!(named.display_name(), "Moscow, Russia");
    }

    #[test]
    fn test_wmo_codes() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(57), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(81), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_condition_icon_name() {
        assert_eq!(WeatherCondition::Clear.icon_name(), "sun");
        assert_eq!(WeatherCondition::HeavyRain.icon_name(), "cloud_rain");
        assert_eq!(WeatherCondition::Thunderstorm.description(), "Thunderstorm");
    }
}
