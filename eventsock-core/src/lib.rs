//! Core frame types and codec for eventsock
//!
//! This crate holds the transport-agnostic half of the event client:
//!
//! - **Frames**: typed client→server and server→client messages
//! - **Codec**: JSON encoding/decoding with frame classification
//! - **Error handling**: the shared error type
//! - **Observability**: tracing subscriber and OpenTelemetry bootstrap
//!
//! The `eventsock-client` crate builds the reconnecting WebSocket client on
//! top of these pieces.
//!
//! # Example
//!
//! ```rust
//! use eventsock_core::{codec, InboundFrame, OutboundFrame};
//! use serde_json::json;
//!
//! let frame = OutboundFrame::request("load", Some(json!({"page": 1})), "42");
//! let text = codec::encode(&frame).unwrap();
//! assert_eq!(text, r#"{"event":"load","data":{"page":1},"id":"42"}"#);
//!
//! let reply = codec::decode(r#"{"id":"42","data":[1,2,3]}"#).unwrap();
//! assert!(matches!(reply, InboundFrame::Reply { .. }));
//! ```

pub mod codec;
pub mod error;
pub mod frame;
pub mod observability;

pub use error::{Error, Result};
pub use frame::{InboundFrame, OutboundFrame};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
