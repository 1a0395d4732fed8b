//! Transport-level failure classes.
//!
//! Network failures reach us as provider- or OS-specific codes and messages.
//! They are translated here, once, into a closed set of classes so nothing
//! downstream has to string-match error text.

use std::error::Error as StdError;
use std::io;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Host name could not be resolved
    Dns,
    ConnectionRefused,
    ConnectionReset,
    Timeout,
    Tls,
    /// Connection could not be established for another reason
    Connect,
    Other,
}

/// Provider/OS error codes and the class each one belongs to.
const CODE_TABLE: &[(&str, TransportErrorKind)] = &[
    ("ENOTFOUND", TransportErrorKind::Dns),
    ("EAI_AGAIN", TransportErrorKind::Dns),
    ("EAI_NONAME", TransportErrorKind::Dns),
    ("ECONNREFUSED", TransportErrorKind::ConnectionRefused),
    ("ECONNRESET", TransportErrorKind::ConnectionReset),
    ("ECONNABORTED", TransportErrorKind::ConnectionReset),
    ("EPIPE", TransportErrorKind::ConnectionReset),
    ("ETIMEDOUT", TransportErrorKind::Timeout),
    ("ESOCKETTIMEDOUT", TransportErrorKind::Timeout),
    ("EHOSTUNREACH", TransportErrorKind::Connect),
    ("ENETUNREACH", TransportErrorKind::Connect),
];

/// Lower-case message fragments emitted by the HTTP stack, checked in order.
const MESSAGE_TABLE: &[(&str, TransportErrorKind)] = &[
    ("dns error", TransportErrorKind::Dns),
    ("failed to lookup address", TransportErrorKind::Dns),
    ("name or service not known", TransportErrorKind::Dns),
    ("connection refused", TransportErrorKind::ConnectionRefused),
    ("connection reset", TransportErrorKind::ConnectionReset),
    ("broken pipe", TransportErrorKind::ConnectionReset),
    ("timed out", TransportErrorKind::Timeout),
    ("certificate", TransportErrorKind::Tls),
    ("tls", TransportErrorKind::Tls),
    ("ssl", TransportErrorKind::Tls),
];

impl TransportErrorKind {
    /// Canonical code tag stored alongside error records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Dns => "ENOTFOUND",
            Self::ConnectionRefused => "ECONNREFUSED",
            Self::ConnectionReset => "ECONNRESET",
            Self::Timeout => "ETIMEDOUT",
            Self::Tls => "ETLS",
            Self::Connect => "ECONNECT",
            Self::Other => "EOTHER",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dns => "host name lookup failed",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionReset => "connection reset",
            Self::Timeout => "request timed out",
            Self::Tls => "secure connection failed",
            Self::Connect => "could not connect",
            Self::Other => "network error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        CODE_TABLE
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(code))
            .map(|(_, kind)| *kind)
    }

    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_ascii_lowercase();
        MESSAGE_TABLE
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
            .map(|(_, kind)| *kind)
    }

    pub fn from_io_kind(kind: io::ErrorKind) -> Option<Self> {
        match kind {
            io::ErrorKind::ConnectionRefused => Some(Self::ConnectionRefused),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Some(Self::ConnectionReset),
            io::ErrorKind::TimedOut => Some(Self::Timeout),
            io::ErrorKind::NotConnected | io::ErrorKind::AddrNotAvailable => Some(Self::Connect),
            _ => None,
        }
    }

    /// Classify a failed request by walking its error source chain.
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }

        let mut source = error.source();
        while let Some(inner) = source {
            if let Some(io_err) = inner.downcast_ref::<io::Error>() {
                if let Some(kind) = Self::from_io_kind(io_err.kind()) {
                    return kind;
                }
            }
            if let Some(kind) = Self::from_message(&inner.to_string()) {
                return kind;
            }
            source = inner.source();
        }

        if error.is_connect() {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}
