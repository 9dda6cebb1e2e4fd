//! Error types for the Werkmarkt API client.
//!
//! # Design
//! Four failure classes, matching what callers actually branch on:
//! `Network` ("backend unreachable", no status code), `Http` (the backend
//! rejected the request; carries the status and the best message we could
//! extract from the body), `Validation` (local pre-network rejection, never
//! hit the wire), and `Decode` (the body was not the JSON we expected).
//!
//! Variants are `Clone` so a single in-flight request can hand its outcome
//! to every coalesced waiter.

use thiserror::Error;

/// Fallback shown when a non-2xx body carries no parsable `message`.
pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// Errors surfaced by the HTTP client, resource APIs, and session store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS/connect/transport failure).
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The backend responded with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Local input validation failed before any request was made.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A 2xx response body could not be decoded as the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of the rejection, if the backend responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Human-readable message suitable for inline form display.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_extracted_message() {
        let err = ApiError::Http {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert!(err.is_network());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "backend unreachable: connection refused");
    }

    #[test]
    fn validation_error_keeps_field() {
        let err = ApiError::validation("password", "Password must be at least 8 characters");
        assert_eq!(err.status(), None);
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field, "password"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
