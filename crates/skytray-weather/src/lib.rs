//! Weather and location services for Skytray
//!
//! Provides forecast and geocoding calls via Open-Meteo, resolution of a
//! user location into coordinates, and a bounded history of failed calls.

pub mod client;
pub mod error;
pub mod error_log;
pub mod geocode;
pub mod resolver;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, RemoteClient};
pub use error::{ClientError, FetchError, ResolutionError};
pub use error_log::{ApiErrorRecord, ErrorLog, RequestSource, ERROR_LOG_CAPACITY};
pub use geocode::PlaceName;
pub use resolver::{pick_candidate, LocationResolver};
pub use transport::TransportErrorKind;
pub use types::*;
