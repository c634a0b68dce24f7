//! Event client handle
//!
//! `EventClient` is the surface consumers use: register handlers with `on`,
//! publish with `emit`, and optionally correlate a reply with a callback or
//! an awaited `request`.
//!
//! # Cloning
//!
//! Handles are cheap to clone and all clones drive the same connection. Hand
//! one to every consumer that needs the event channel instead of reaching
//! for a global. The connection stays alive while at least one handle does.
//!
//! # Ordering
//!
//! Calls made from one handle reach the event loop in the order they were
//! made, so `on("a", ..)` followed by `on("b", ..)` subscribes `a` before `b`,
//! and two `emit` calls leave the client in call order.
//!
//! # Handlers
//!
//! Handlers run on the event loop and must not block. To do async work,
//! spawn a task from inside the handler.

use crate::client_builder::ClientBuilder;
use crate::connection::{Command, Snapshot};
use crate::correlator::ReplyTarget;
use crate::registry::{Lifecycle, Subscription};
use crate::ConnectionState;
use eventsock_core::{codec, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Reconnecting event client over WebSocket
#[derive(Clone)]
pub struct EventClient {
    pub(crate) commands: mpsc::UnboundedSender<Command>,
    pub(crate) url: Arc<str>,
    pub(crate) request_timeout: Option<Duration>,
}

impl EventClient {
    /// Start a client for `url` with default settings
    ///
    /// Returns immediately; the first connection attempt runs in the
    /// background. Must be called from within a tokio runtime.
    pub fn connect(url: &str) -> Result<Self> {
        ClientBuilder::new(url).connect()
    }

    /// Endpoint this client connects to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Register a handler for a topic or lifecycle event
    ///
    /// `open` and `close` attach lifecycle handlers (called with `null`);
    /// any other name subscribes to that topic. Topic subscriptions persist
    /// and are replayed after every reconnect.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        match Subscription::parse(name) {
            Subscription::Topic(topic) => self.command(Command::OnTopic {
                topic,
                handler: Arc::new(handler),
            }),
            Subscription::Lifecycle(event) => self.command(Command::OnLifecycle {
                event,
                handler: Arc::new(move || handler(Value::Null)),
            }),
        }
    }

    /// Run `handler` on every open; immediately too if already open
    pub fn on_open<F>(&self, handler: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.command(Command::OnLifecycle {
            event: Lifecycle::Open,
            handler: Arc::new(handler),
        })
    }

    /// Run `handler` each time an open connection is lost
    pub fn on_close<F>(&self, handler: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.command(Command::OnLifecycle {
            event: Lifecycle::Close,
            handler: Arc::new(handler),
        })
    }

    /// Publish to a topic
    ///
    /// Sent right away when open, buffered otherwise. `None` omits the
    /// `data` field.
    pub fn emit<P>(&self, topic: impl Into<String>, data: Option<P>) -> Result<()>
    where
        P: Serialize,
    {
        self.send_emit(topic.into(), codec::payload(data)?, None)
    }

    /// Publish to a topic and call `callback` with the correlated reply
    ///
    /// The callback fires at most once.
    pub fn emit_with_callback<P, F>(
        &self,
        topic: impl Into<String>,
        data: Option<P>,
        callback: F,
    ) -> Result<()>
    where
        P: Serialize,
        F: FnOnce(Value) + Send + 'static,
    {
        self.send_emit(
            topic.into(),
            codec::payload(data)?,
            Some(ReplyTarget::Callback(Box::new(callback))),
        )
    }

    /// Publish to a topic and wait for the correlated reply
    ///
    /// Subject to the request timeout configured on the builder.
    #[tracing::instrument(skip_all, fields(topic = tracing::field::Empty))]
    pub async fn request<P, R>(&self, topic: impl Into<String>, data: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let topic = topic.into();
        tracing::Span::current().record("topic", topic.as_str());

        let (tx, rx) = oneshot::channel();
        self.send_emit(topic, codec::payload(data)?, Some(ReplyTarget::Channel(tx)))?;

        let reply = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, rx)
                .await
                .map_err(|_| Error::Timeout)?,
            None => rx.await,
        }
        .map_err(|_| Error::ClientClosed)?;

        serde_json::from_value(reply).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Current connection state
    pub async fn state(&self) -> Result<ConnectionState> {
        Ok(self.snapshot().await?.state)
    }

    /// Returns true if the connection is open
    pub async fn is_open(&self) -> bool {
        matches!(self.state().await, Ok(ConnectionState::Open))
    }

    /// Number of replies still awaited
    pub async fn pending_callbacks(&self) -> Result<usize> {
        Ok(self.snapshot().await?.pending_callbacks)
    }

    /// Number of frames waiting for the connection to open
    pub async fn buffered_frames(&self) -> Result<usize> {
        Ok(self.snapshot().await?.buffered_frames)
    }

    fn send_emit(&self, topic: String, data: Option<Value>, reply: Option<ReplyTarget>) -> Result<()> {
        tracing::trace!(topic = %topic, correlated = reply.is_some(), "Emitting");
        self.command(Command::Emit { topic, data, reply })
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Inspect(tx))?;
        rx.await.map_err(|_| Error::ClientClosed)
    }

    fn command(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::ClientClosed)
    }
}

impl std::fmt::Debug for EventClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventClient")
            .field("url", &self.url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
