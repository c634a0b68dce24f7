//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by the event loop when observability
//! is enabled through `ClientBuilder::with_observability()`.
//!
//! # Metrics Collected
//!
//! - **connection.state**: 0=disconnected, 1=open (gauge)
//! - **frames.sent**: frames written to the socket, by kind (counter)
//! - **frames.buffered**: frames parked while disconnected (counter)
//! - **events.received**: topic deliveries, by topic (counter)
//! - **replies.received**: correlated replies, by outcome (counter)
//! - **frames.malformed**: inbound frames discarded (counter)
//! - **reconnect.attempts** / **opens**: connection churn (counters)
//! - **heartbeats**: keep-alive events emitted (counter)

use crate::ConnectionState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state gauge
    pub connection_state: Gauge<i64>,
    /// Frames written to the socket
    pub frames_sent: Counter<u64>,
    /// Frames buffered while disconnected
    pub frames_buffered: Counter<u64>,
    /// Topic deliveries received
    pub events_received: Counter<u64>,
    /// Correlated replies received
    pub replies_received: Counter<u64>,
    /// Inbound frames discarded as malformed
    pub frames_malformed: Counter<u64>,
    /// Reconnect attempts started
    pub reconnect_attempts: Counter<u64>,
    /// Successful opens
    pub opens: Counter<u64>,
    /// Heartbeats emitted
    pub heartbeats: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("eventsock.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=open)")
                .build(),
            frames_sent: meter
                .u64_counter("eventsock.client.frames.sent")
                .with_description("Frames written to the socket")
                .build(),
            frames_buffered: meter
                .u64_counter("eventsock.client.frames.buffered")
                .with_description("Frames buffered while disconnected")
                .build(),
            events_received: meter
                .u64_counter("eventsock.client.events.received")
                .with_description("Topic deliveries received")
                .build(),
            replies_received: meter
                .u64_counter("eventsock.client.replies.received")
                .with_description("Correlated replies received")
                .build(),
            frames_malformed: meter
                .u64_counter("eventsock.client.frames.malformed")
                .with_description("Inbound frames discarded as malformed")
                .build(),
            reconnect_attempts: meter
                .u64_counter("eventsock.client.reconnect.attempts")
                .with_description("Reconnect attempts started")
                .build(),
            opens: meter
                .u64_counter("eventsock.client.opens")
                .with_description("Successful connection opens")
                .build(),
            heartbeats: meter
                .u64_counter("eventsock.client.heartbeats")
                .with_description("Heartbeat events emitted")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: ConnectionState) {
        self.connection_state.record(state.as_gauge(), &[]);
    }

    /// Record a frame written to the socket
    pub fn record_sent(&self, kind: &'static str) {
        self.frames_sent.add(1, &[KeyValue::new("kind", kind)]);
    }

    /// Record a frame parked in the buffer
    pub fn record_buffered(&self) {
        self.frames_buffered.add(1, &[]);
    }

    /// Record a topic delivery
    pub fn record_event(&self, topic: &str, handlers: usize) {
        let attributes = &[
            KeyValue::new("topic", topic.to_string()),
            KeyValue::new("handled", handlers > 0),
        ];
        self.events_received.add(1, attributes);
    }

    /// Record a correlated reply
    pub fn record_reply(&self, matched: bool) {
        self.replies_received
            .add(1, &[KeyValue::new("matched", matched)]);
    }

    /// Record a discarded inbound frame
    pub fn record_malformed(&self) {
        self.frames_malformed.add(1, &[]);
    }

    /// Record a reconnect attempt
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.add(1, &[]);
    }

    /// Record a successful open
    pub fn record_open(&self) {
        self.opens.add(1, &[]);
    }

    /// Record a heartbeat
    pub fn record_heartbeat(&self) {
        self.heartbeats.add(1, &[]);
    }
}
