//! Codec for eventsock frames
//!
//! Thin layer over serde_json that maps failures onto the crate error type
//! and classifies inbound frames.
//!
//! - Invalid JSON → `Error::Parse`
//! - Valid JSON that is not a frame → `Error::MalformedFrame`
//! - Payload conversion failures → `Error::Serialization`
//!
//! # Examples
//!
//! ```rust
//! use eventsock_core::{codec, InboundFrame, OutboundFrame};
//!
//! let text = codec::encode(&OutboundFrame::subscribe("notice")).unwrap();
//! assert_eq!(text, r#"{"subscribe":"notice"}"#);
//!
//! let frame = codec::decode(r#"{"event":"notice","data":{"id":7}}"#).unwrap();
//! assert!(frame.is_event());
//! ```

use crate::error::{Error, Result};
use crate::frame::{InboundFrame, OutboundFrame};
use serde::Serialize;
use serde_json::Value;

/// Encode an outbound frame to JSON text
pub fn encode(frame: &OutboundFrame) -> Result<String> {
    serde_json::to_string(frame).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode JSON text into an inbound frame
pub fn decode(text: &str) -> Result<InboundFrame> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
    InboundFrame::from_value(value)
}

/// Convert an optional caller payload into a JSON value
///
/// `None` stays `None` so the `data` field is omitted from the frame.
pub fn payload<P: Serialize>(data: Option<P>) -> Result<Option<Value>> {
    data.map(|d| serde_json::to_value(d).map_err(|e| Error::Serialization(e.to_string())))
        .transpose()
}
