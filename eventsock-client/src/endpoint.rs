//! Endpoint resolution
//!
//! A client is normally given a full `ws://` or `wss://` url. When the url is
//! empty, it is derived from the origin the client is serving: a secure
//! origin gets `wss`, anything else `ws`, and the path is always
//! [`DEFAULT_PATH`].
//!
//! ```rust
//! use eventsock_client::endpoint::{resolve, Origin};
//!
//! let origin = Origin::parse("https://app.example.com").unwrap();
//! assert_eq!(
//!     resolve(None, Some(&origin)).unwrap(),
//!     "wss://app.example.com/ws/events"
//! );
//! ```

use eventsock_core::{Error, Result};

/// Path of the event endpoint on the origin host
pub const DEFAULT_PATH: &str = "/ws/events";

/// Scheme and host of the page or service the client belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// True for `https` origins
    pub secure: bool,
    /// Host, including the port if any
    pub host: String,
}

impl Origin {
    /// Create an origin from its parts
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Parse `http://host[:port]` or `https://host[:port]`
    ///
    /// Any path, query or fragment after the host is ignored.
    pub fn parse(origin: &str) -> Result<Self> {
        let (scheme, rest) = origin
            .split_once("://")
            .ok_or_else(|| Error::InvalidUrl(origin.to_string()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            _ => return Err(Error::InvalidUrl(origin.to_string())),
        };

        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        if host.is_empty() {
            return Err(Error::InvalidUrl(origin.to_string()));
        }

        Ok(Self::new(secure, host))
    }

    /// Event endpoint url for this origin
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, DEFAULT_PATH)
    }
}

/// Pick the url the client connects to
///
/// A non-empty `url` wins and must use the `ws` or `wss` scheme. Otherwise
/// the url is derived from `origin`.
pub fn resolve(url: Option<&str>, origin: Option<&Origin>) -> Result<String> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let lower = url.to_ascii_lowercase();
            if lower.starts_with("ws://") || lower.starts_with("wss://") {
                Ok(url.to_string())
            } else {
                Err(Error::InvalidUrl(url.to_string()))
            }
        }
        None => origin
            .map(Origin::endpoint)
            .ok_or_else(|| Error::InvalidUrl("no url and no origin to derive one from".into())),
    }
}
