//! Error types for the Intercom API client.
//!
//! # Design
//! Only failures that happen before a request leaves the process are raised
//! as `ApiError`. Anything the remote side or the network does wrong is
//! reported through [`LastError`](crate::transport::LastError) alongside the
//! decoded body, so callers inspect the outcome instead of catching errors.

use thiserror::Error;

/// Local failures returned as `Err` by the client facade.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No field whitelist exists for the named resource type.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// The configured base URL or a derived endpoint URL is not valid.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Broad category of a transport failure.
///
/// The discriminant is the stable `code` reported in `LastError`; `0` is
/// reserved for success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TransportErrorKind {
    /// DNS resolution or TCP/TLS connection setup failed.
    Connection = 1,
    /// The connect or total timeout elapsed.
    Timeout = 2,
    /// The connection broke while sending or reading.
    Io = 3,
    /// The request could not be expressed on the wire (bad URL, header or verb).
    InvalidRequest = 4,
    Other = 99,
}

impl TransportErrorKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_codes_are_non_zero() {
        for kind in [
            TransportErrorKind::Connection,
            TransportErrorKind::Timeout,
            TransportErrorKind::Io,
            TransportErrorKind::InvalidRequest,
            TransportErrorKind::Other,
        ] {
            assert_ne!(kind.code(), 0);
        }
    }

    #[test]
    fn unknown_resource_names_the_type() {
        let err = ApiError::UnknownResource("company".to_string());
        assert_eq!(err.to_string(), "unknown resource type: company");
    }
}
