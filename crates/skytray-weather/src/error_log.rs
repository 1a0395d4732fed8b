//! Bounded, in-memory history of failed remote calls.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::transport::TransportErrorKind;

/// Number of records kept before the oldest is evicted.
pub const ERROR_LOG_CAPACITY: usize = 20;

/// Which outbound operation a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSource {
    Geocode,
    Forecast,
}

impl RequestSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Geocode => "Geocoding API",
            Self::Forecast => "Weather forecast API",
        }
    }
}

/// One failed remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub source: RequestSource,
    pub message: String,
    pub url: Option<String>,
    pub http_status: Option<u16>,
    pub transport_error: Option<TransportErrorKind>,
    pub extra_detail: Option<String>,
}

impl ApiErrorRecord {
    pub fn new(source: RequestSource, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            message: message.into(),
            url: None,
            http_status: None,
            transport_error: None,
            extra_detail: None,
        }
    }

    pub fn source_label(&self) -> &'static str {
        self.source.label()
    }

    pub fn transport_error_code(&self) -> Option<&'static str> {
        self.transport_error.map(|kind| kind.code())
    }
}

/// Fixed-capacity FIFO of [`ApiErrorRecord`]s, oldest first.
///
/// Shared between every in-flight request; appends happen in completion order.
#[derive(Debug)]
pub struct ErrorLog {
    entries: Mutex<VecDeque<ApiErrorRecord>>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, entry: ApiErrorRecord) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn list_all(&self) -> Vec<ApiErrorRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(n: usize) -> ApiErrorRecord {
        ApiErrorRecord::new(RequestSource::Forecast, format!("failure {}", n))
    }

    #[test]
    fn test_empty_log() {
        let log = ErrorLog::new();
        assert_eq!(log.count(), 0);
        assert!(log.list_all().is_empty());
        assert_eq!(log.capacity(), ERROR_LOG_CAPACITY);
    }

    #[test]
    fn test_keeps_last_twenty_in_order() {
        let log = ErrorLog::new();
        for n in 0..25 {
            log.record(failure(n));
        }

        let all = log.list_all();
        assert_eq!(log.count(), 20);
        assert_eq!(all.len(), 20);
        assert_eq!(all[0].message, "failure 5");
        assert_eq!(all[19].message, "failure 24");
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_below_capacity_keeps_everything() {
        let log = ErrorLog::with_capacity(3);
        log.record(failure(1));
        log.record(failure(2));
        assert_eq!(log.count(), 2);
        log.record(failure(3));
        log.record(failure(4));
        let messages: Vec<_> = log.list_all().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["failure 2", "failure 3", "failure 4"]);
    }

    #[test]
    fn test_source_label() {
        let record = ApiErrorRecord::new(RequestSource::Geocode, "boom");
        assert_eq!(record.source_label(), "Geocoding API");
        assert_eq!(record.transport_error_code(), None);
    }
}
