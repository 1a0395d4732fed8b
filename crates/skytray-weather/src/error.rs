//! Error types for remote calls and location resolution.

use thiserror::Error;

use crate::transport::TransportErrorKind;

/// Failure of a single outbound call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// A response arrived with a non-success status.
    #[error("Request failed with status {0}")]
    HttpStatus(u16),

    /// Success status, but the body lacked a required field or was not JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request never produced a response.
    #[error("Network error: {kind}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
}

impl FetchError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(status) => Some(*status),
            _ => None,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::HttpStatus(status) if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            Self::HttpStatus(_) => "The weather service rejected the request.",
            Self::MalformedResponse(_) => "Received an unexpected response from the weather service.",
            Self::Transport { .. } => "Unable to connect. Check your internet connection.",
        }
    }
}

/// A location could not be turned into coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("No place named '{place}' found in '{region}'")]
    NotFound { place: String, region: String },

    #[error("No usable location was specified")]
    Unspecified,

    #[error("Geocoding failed: {0}")]
    Transport(#[source] FetchError),
}

impl ResolutionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Location not found. Check the city and country and try again.",
            Self::Unspecified => "Enter either a city and country or a latitude and longitude.",
            Self::Transport(_) => "Could not look up the location. Please try again.",
        }
    }
}

/// The HTTP client could not be set up.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_accessors() {
        assert_eq!(FetchError::HttpStatus(500).http_status(), Some(500));
        assert_eq!(FetchError::MalformedResponse("x".into()).http_status(), None);

        let err = FetchError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "timed out".into(),
        };
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::Timeout));
        assert!(err.to_string().contains("ETIMEDOUT"));
    }

    #[test]
    fn test_server_errors_get_distinct_user_message() {
        assert_ne!(
            FetchError::HttpStatus(503).user_message(),
            FetchError::HttpStatus(404).user_message()
        );
    }

    #[test]
    fn test_resolution_error_keeps_source() {
        use std::error::Error as _;
        let err = ResolutionError::Transport(FetchError::HttpStatus(502));
        assert!(err.source().is_some());
        assert!(ResolutionError::Unspecified.source().is_none());
    }
}
