//! Error types for eventsock
//!
//! The event client heals transport failures on its own, so this error type
//! only shows up at the edges a caller can actually observe:
//!
//! - **Codec errors**: `Parse`, `MalformedFrame`, `Serialization`
//! - **Configuration errors**: `InvalidUrl`
//! - **Caller-facing failures**: `Timeout`, `ClientClosed`, `Runtime`
//! - **Transport errors**: `WebSocket` (logged by the client, never returned
//!   from `on`/`emit`)
//!
//! # Examples
//!
//! ```rust
//! use eventsock_core::Error;
//!
//! let error = Error::InvalidUrl("ftp://example.com".into());
//! assert_eq!(error.to_string(), "Invalid endpoint url: ftp://example.com");
//! ```

use thiserror::Error;

/// Result type for eventsock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for eventsock operations
///
/// `Clone` so a single failure can be handed to several waiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Inbound text was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Inbound JSON was valid but carried neither an `event` nor an `id`
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// A payload could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport layer error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The endpoint could not be resolved from the given url or origin
    #[error("Invalid endpoint url: {0}")]
    InvalidUrl(String),

    /// An awaited reply did not arrive in time
    #[error("Request timeout")]
    Timeout,

    /// The client task has stopped; the handle can no longer be used
    #[error("Client closed")]
    ClientClosed,

    /// No async runtime was available to drive the client
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_display_formatting() {
        assert_eq!(Error::Timeout.to_string(), "Request timeout");
        assert_eq!(Error::ClientClosed.to_string(), "Client closed");
        assert_eq!(
            Error::MalformedFrame("[]".into()).to_string(),
            "Malformed frame: []"
        );
        assert_eq!(
            Error::WebSocket("connection refused".into()).to_string(),
            "WebSocket error: connection refused"
        );
    }

    #[test]
    fn test_error_is_cloneable() {
        let err = Error::Parse("expected value".into());
        assert_eq!(err.clone(), err);
    }
}
