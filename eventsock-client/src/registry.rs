//! Subscription registry
//!
//! Maps topic names to ordered handler lists and keeps the two lifecycle
//! lists (`open` and `close`) apart from message topics.
//!
//! # Ordering
//!
//! - Topics are remembered in first-registration order; that order drives the
//!   `subscribe` replay after every reconnect.
//! - Handlers for one topic run in registration order for every delivery.
//!
//! Registrations are permanent for the lifetime of the client. The registry
//! is owned by the client's event loop, so it needs no locking.

use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Handler for topic deliveries
pub type TopicHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Handler for `open` / `close` lifecycle events
pub type LifecycleHandler = Arc<dyn Fn() + Send + Sync>;

/// Reserved name for the open lifecycle event
pub const OPEN: &str = "open";

/// Reserved name for the close lifecycle event
pub const CLOSE: &str = "close";

/// Lifecycle events a handler can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Connection opened
    Open,
    /// Connection closed or failed after having been open
    Close,
}

/// What a name passed to `on` refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// One of the reserved lifecycle names
    Lifecycle(Lifecycle),
    /// A message topic
    Topic(String),
}

impl Subscription {
    /// Classify a name: `open` and `close` are lifecycle, anything else a topic
    pub fn parse(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            OPEN => Subscription::Lifecycle(Lifecycle::Open),
            CLOSE => Subscription::Lifecycle(Lifecycle::Close),
            _ => Subscription::Topic(name),
        }
    }
}

/// Ordered topic and lifecycle handlers
#[derive(Default)]
pub struct SubscriptionRegistry {
    order: Vec<String>,
    topics: HashMap<String, Vec<TopicHandler>>,
    openers: Vec<LifecycleHandler>,
    closers: Vec<LifecycleHandler>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to a topic
    ///
    /// Returns true if this is the first handler for the topic.
    pub fn add_topic(&mut self, topic: impl Into<String>, handler: TopicHandler) -> bool {
        let topic = topic.into();
        match self.topics.get_mut(&topic) {
            Some(handlers) => {
                handlers.push(handler);
                false
            }
            None => {
                self.order.push(topic.clone());
                self.topics.insert(topic, vec![handler]);
                true
            }
        }
    }

    /// Append a lifecycle handler
    pub fn add_lifecycle(&mut self, event: Lifecycle, handler: LifecycleHandler) {
        match event {
            Lifecycle::Open => self.openers.push(handler),
            Lifecycle::Close => self.closers.push(handler),
        }
    }

    /// Topics in first-registration order
    pub fn topics(&self) -> &[String] {
        &self.order
    }

    /// Returns true if at least one handler is registered for the topic
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Number of handlers registered for a topic
    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    /// Invoke every handler for `topic` in order
    ///
    /// Returns the number of handlers invoked; zero when nobody listens. A
    /// panicking handler is logged and does not stop the ones after it.
    pub fn dispatch(&self, topic: &str, payload: &Value) -> usize {
        let Some(handlers) = self.topics.get(topic) else {
            return 0;
        };
        for handler in handlers {
            guarded(topic, || handler(payload.clone()));
        }
        handlers.len()
    }

    /// Invoke every lifecycle handler for `event` in order
    pub fn fire(&self, event: Lifecycle) -> usize {
        let (name, handlers) = match event {
            Lifecycle::Open => (OPEN, &self.openers),
            Lifecycle::Close => (CLOSE, &self.closers),
        };
        for handler in handlers {
            guarded(name, || handler());
        }
        handlers.len()
    }
}

/// Run a user handler, logging instead of unwinding through the caller
pub(crate) fn guarded<T>(name: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!(handler = %name, "Handler panicked");
            None
        }
    }
}
