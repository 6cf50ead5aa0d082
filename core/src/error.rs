//! Error types for the request executor.
//!
//! # Design
//! `InvalidRequest` is raised while building a `RequestDescriptor`, before any
//! network activity. Everything the transport reports lands in `Network` with
//! the transport's own message. A response body that fails to parse as JSON
//! is not an error: the executor falls back to `{ "text": <body> }`.

use thiserror::Error;

/// Errors returned by `RequestExecutor::execute` and the client helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The URL is missing or malformed, the method is unknown, or a header
    /// cannot be put on the wire.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// DNS, connect, read/write or protocol failure reported by the transport.
    #[error("{0}")]
    Network(String),

    /// The request body could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl RequestError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RequestError::InvalidRequest(reason.into())
    }
}

impl From<ureq::Error> for RequestError {
    fn from(err: ureq::Error) -> Self {
        RequestError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_displays_cause_verbatim() {
        let err = RequestError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn invalid_request_is_prefixed() {
        let err = RequestError::invalid("URL is required");
        assert_eq!(err.to_string(), "invalid request: URL is required");
    }
}
