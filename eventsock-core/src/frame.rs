//! Wire frames exchanged with the event endpoint
//!
//! Every frame is a single JSON object sent as one WebSocket text message.
//!
//! # Client → Server
//!
//! - `{"subscribe": <topic>}` declares interest in a topic
//! - `{"event": <topic>, "data"?: <any>, "id"?: <string>}` publishes to a
//!   topic, optionally asking for a correlated reply
//!
//! # Server → Client
//!
//! - `{"event": <topic>, "data": <any>}` delivers a topic message
//! - `{"id": <string>, "data": <any>}` answers a correlated request
//!
//! Inbound frames are classified by field presence: a non-null `event`
//! takes precedence over `id`. A frame with neither is malformed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame sent from the client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    /// Topic interest, replayed on every reconnect
    Subscribe {
        /// Topic name
        subscribe: String,
    },
    /// Publish to a topic
    Event {
        /// Topic name
        event: String,
        /// Optional payload
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        /// Correlation identifier when a reply is expected
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl OutboundFrame {
    /// Build a `subscribe` frame
    pub fn subscribe(topic: impl Into<String>) -> Self {
        OutboundFrame::Subscribe {
            subscribe: topic.into(),
        }
    }

    /// Build an `event` frame without a correlation id
    pub fn event(topic: impl Into<String>, data: Option<Value>) -> Self {
        OutboundFrame::Event {
            event: topic.into(),
            data,
            id: None,
        }
    }

    /// Build an `event` frame that expects a reply under `id`
    pub fn request(topic: impl Into<String>, data: Option<Value>, id: impl Into<String>) -> Self {
        OutboundFrame::Event {
            event: topic.into(),
            data,
            id: Some(id.into()),
        }
    }

    /// The topic this frame refers to
    pub fn topic(&self) -> &str {
        match self {
            OutboundFrame::Subscribe { subscribe } => subscribe,
            OutboundFrame::Event { event, .. } => event,
        }
    }

    /// Correlation id, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            OutboundFrame::Subscribe { .. } => None,
            OutboundFrame::Event { id, .. } => id.as_deref(),
        }
    }
}

/// Frame received from the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InboundFrame {
    /// Delivery for a subscribed topic
    Event {
        /// Topic name
        event: String,
        /// Payload (`null` when absent)
        data: Value,
    },
    /// Reply to a correlated request
    Reply {
        /// Correlation identifier
        id: String,
        /// Payload (`null` when absent)
        data: Value,
    },
}

impl InboundFrame {
    /// Classify an already-parsed JSON value
    ///
    /// Numeric ids are accepted and normalised to their decimal string form.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::MalformedFrame("frame is not a JSON object".into()));
        };

        let data = map.remove("data").unwrap_or(Value::Null);

        match map.remove("event") {
            None | Some(Value::Null) => {}
            Some(Value::String(event)) => return Ok(InboundFrame::Event { event, data }),
            Some(other) => {
                return Err(Error::MalformedFrame(format!(
                    "event field must be a string, got {}",
                    other
                )))
            }
        }

        match map.remove("id") {
            Some(Value::String(id)) => Ok(InboundFrame::Reply { id, data }),
            Some(Value::Number(n)) => Ok(InboundFrame::Reply {
                id: n.to_string(),
                data,
            }),
            None | Some(Value::Null) => Err(Error::MalformedFrame(
                "frame carries neither event nor id".into(),
            )),
            Some(other) => Err(Error::MalformedFrame(format!(
                "id field must be a string or number, got {}",
                other
            ))),
        }
    }

    /// Payload carried by the frame
    pub fn data(&self) -> &Value {
        match self {
            InboundFrame::Event { data, .. } | InboundFrame::Reply { data, .. } => data,
        }
    }

    /// Returns true if this is a topic delivery
    pub fn is_event(&self) -> bool {
        matches!(self, InboundFrame::Event { .. })
    }

    /// Returns true if this is a correlated reply
    pub fn is_reply(&self) -> bool {
        matches!(self, InboundFrame::Reply { .. })
    }
}
