//! Reconnecting event client over a single WebSocket
//!
//! One connection carries many named topics in both directions. The client
//! keeps that connection alive on its own and callers never see transport
//! failures.
//!
//! # Core Features
//!
//! - **Topic Pub/Sub**: `on(topic, handler)` subscribes, `emit(topic, data)` publishes
//! - **Lifecycle Events**: `open` and `close` handlers
//! - **Request/Reply**: correlate a single reply with a callback or an awaited `request`
//! - **Send Buffering**: emits made while disconnected go out on the next open
//! - **Auto-Reconnection**: exponential backoff, 1s doubling up to 32s, reset on open
//! - **Subscription Replay**: every topic is re-subscribed after reconnecting
//! - **Heartbeat**: a `heartbeat` event every 30s while open
//! - **Observability**: OpenTelemetry integration for traces and metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eventsock_client::EventClient;
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EventClient::connect("ws://localhost:8080/ws/events")?;
//!
//!     client.on("open", |_| println!("connected"))?;
//!     client.on("notice", |data| println!("notice: {}", data))?;
//!
//!     // Buffered until the connection opens
//!     client.emit("presence", Some(json!({"status": "online"})))?;
//!
//!     // Correlated reply
//!     let unread: Value = client.request("unread.count", None::<Value>).await?;
//!     println!("unread: {}", unread);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use eventsock_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> eventsock_core::Result<()> {
//! let client = ClientBuilder::new("ws://localhost:8080/ws/events")
//!     .with_backoff(Duration::from_millis(250), Duration::from_secs(8))
//!     .with_heartbeat_interval(Duration::from_secs(15))
//!     .with_request_timeout(Duration::from_secs(5))
//!     .connect()?;
//! # Ok(())
//! # }
//! ```

mod buffer;
mod client;
mod client_builder;
mod connection;
mod connection_state;
mod correlator;
pub mod endpoint;
mod heartbeat;
mod metrics;
mod reconnect;
mod registry;

pub use buffer::SendBuffer;
pub use client::EventClient;
pub use client_builder::{ClientBuilder, ORIGIN_ENV, URL_ENV};
pub use connection_state::ConnectionState;
pub use correlator::{CallbackCorrelator, IdGenerator, ReplyCallback, ReplyTarget};
pub use endpoint::Origin;
pub use heartbeat::{Heartbeat, DEFAULT_HEARTBEAT_INTERVAL, HEARTBEAT_TOPIC, MIN_HEARTBEAT_INTERVAL};
pub use metrics::ClientMetrics;
pub use reconnect::{ExponentialBackoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, MIN_DELAY};
pub use registry::{
    Lifecycle, LifecycleHandler, Subscription, SubscriptionRegistry, TopicHandler, CLOSE, OPEN,
};
