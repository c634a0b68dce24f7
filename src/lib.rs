//! eventsock - multiplexed event channel over one WebSocket
//!
//! This is the convenience crate that re-exports the eventsock sub-crates.
//! Use it when you want a single dependency.
//!
//! # Architecture
//!
//! - **eventsock-core**: frame types, codec, error handling, observability
//! - **eventsock-client**: reconnecting client with buffering, subscription
//!   replay, reply correlation and heartbeat
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eventsock::EventClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EventClient::connect("ws://localhost:8080/ws/events")?;
//!
//!     client.on("notice", |data| println!("notice: {}", data))?;
//!     client.emit_with_callback("inbox.load", Some(json!({"page": 1})), |items| {
//!         println!("inbox: {}", items);
//!     })?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub use eventsock_client as client;
pub use eventsock_core as core;

pub use eventsock_client::{ClientBuilder, EventClient};
pub use eventsock_core::{Error, Result};
