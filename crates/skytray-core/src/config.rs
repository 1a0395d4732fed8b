use std::path::PathBuf;
use std::time::Duration;

use skytray_weather::ClientConfig;
use url::Url;

use crate::error::ConfigError;

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of a validation pass. Every check runs; nothing short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// One message per error, in the order they were found.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.messages().join("; ")
    }

    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error_summary())
    }
}

/// Runtime configuration: where settings live and which services to call.
///
/// User-editable settings (location, interval) are in [`crate::Settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_dir: PathBuf,
    pub client: ClientConfig,
    /// Look up a display name for coordinate locations
    pub reverse_geocode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skytray");

        Self {
            config_dir,
            client: ClientConfig::default(),
            reverse_geocode: false,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `SKYTRAY_*` environment variables, validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }
        validation.log_warnings();

        Ok(config)
    }

    /// Build from defaults plus overrides supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("SKYTRAY_CONFIG_DIR") {
            config.config_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("SKYTRAY_FORECAST_URL") {
            config.client.forecast_url = url;
        }
        if let Some(url) = lookup("SKYTRAY_GEOCODE_URL") {
            config.client.geocode_url = url;
        }
        if let Some(url) = lookup("SKYTRAY_REVERSE_GEOCODE_URL") {
            config.client.reverse_geocode_url = url;
        }
        if let Some(language) = lookup("SKYTRAY_LANGUAGE") {
            config.client.language = language;
        }
        if let Some(flag) = lookup("SKYTRAY_REVERSE_GEOCODE") {
            config.reverse_geocode = parse_flag(&flag);
        }

        config
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.client.forecast_url, "client.forecast_url", &mut result);
        validate_url(&self.client.geocode_url, "client.geocode_url", &mut result);
        validate_url(
            &self.client.reverse_geocode_url,
            "client.reverse_geocode_url",
            &mut result,
        );

        if self.client.geocode_count == 0 {
            result.add_error("client.geocode_count", "Must request at least one candidate");
        }

        if self.client.language.trim().is_empty() {
            result.add_error("client.language", "Language must not be empty");
        }

        if self.client.timeout < Duration::from_secs(1) {
            result.add_warning("client.timeout", "Request timeout is under one second");
        }

        result
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_valid_default_config() {
        let config = AppConfig::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(!config.reverse_geocode);
        assert!(config.settings_path().ends_with("skytray/settings.json"));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SKYTRAY_CONFIG_DIR", "/tmp/skytray-test"),
            ("SKYTRAY_FORECAST_URL", "http://localhost:8080/forecast"),
            ("SKYTRAY_REVERSE_GEOCODE", "Yes"),
        ]));

        assert_eq!(config.config_dir, PathBuf::from("/tmp/skytray-test"));
        assert_eq!(config.client.forecast_url, "http://localhost:8080/forecast");
        assert!(config.reverse_geocode);
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/tmp/skytray-test/settings.json")
        );
    }

    #[test]
    fn test_invalid_url_scheme() {
        let config = AppConfig::from_lookup(lookup(&[("SKYTRAY_GEOCODE_URL", "ftp://localhost/x")]));
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "client.geocode_url"));
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_url() {
        let config = AppConfig::from_lookup(lookup(&[("SKYTRAY_FORECAST_URL", "not-a-url")]));
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "client.forecast_url"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        assert_eq!(result.error_summary(), "field1: error1; field2: error2");
        assert_eq!(result.messages().len(), 2);
    }
}
