//! Connection manager and event loop
//!
//! A single task owns the socket and every piece of client state: the
//! subscription registry, pending callbacks, the send buffer, the backoff and
//! both timers. It reacts to one thing at a time:
//!
//! - commands from [`EventClient`](crate::EventClient) handles
//! - the outcome of a connection attempt
//! - inbound WebSocket messages
//! - heartbeat, reconnect and callback-sweep timers
//!
//! so handlers always observe a consistent state without any locking.
//!
//! # Open
//!
//! 1. Reset the backoff
//! 2. Flush the send buffer in FIFO order
//! 3. Send `subscribe` for every topic, in first-registration order
//! 4. Mark the connection open and run `open` handlers
//! 5. Start the heartbeat
//!
//! A failure during steps 2 or 3 is handled as a close before the connection
//! ever counted as open, so `close` handlers only follow an `open`.
//!
//! # Close / Error
//!
//! 1. Stop the heartbeat
//! 2. Run `close` handlers if the connection had been open
//! 3. Arm the reconnect timer with the current backoff, then double it
//!
//! Transport failures never reach callers. The loop retries forever and only
//! stops once every client handle has been dropped.

use crate::buffer::SendBuffer;
use crate::correlator::{CallbackCorrelator, ReplyTarget};
use crate::heartbeat::{Heartbeat, HEARTBEAT_TOPIC};
use crate::metrics::ClientMetrics;
use crate::reconnect::ExponentialBackoff;
use crate::registry::{guarded, Lifecycle, LifecycleHandler, SubscriptionRegistry, TopicHandler};
use crate::ConnectionState;
use eventsock_core::{codec, Error, InboundFrame, OutboundFrame};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type ConnectFuture = Pin<Box<dyn Future<Output = Result<WsStream, WsError>> + Send>>;

/// Upper bound on how long an abandoned `request` lingers in the callback table
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Requests from client handles to the event loop
pub(crate) enum Command {
    OnTopic {
        topic: String,
        handler: TopicHandler,
    },
    OnLifecycle {
        event: Lifecycle,
        handler: LifecycleHandler,
    },
    Emit {
        topic: String,
        data: Option<Value>,
        reply: Option<ReplyTarget>,
    },
    Inspect(oneshot::Sender<Snapshot>),
}

/// Point-in-time view of the loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) state: ConnectionState,
    pub(crate) pending_callbacks: usize,
    pub(crate) buffered_frames: usize,
}

/// Tunables handed over by the builder
pub(crate) struct LoopConfig {
    pub(crate) backoff: ExponentialBackoff,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) correlator: CallbackCorrelator,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

pub(crate) struct EventLoop {
    url: String,
    state: ConnectionState,
    registry: SubscriptionRegistry,
    correlator: CallbackCorrelator,
    buffer: SendBuffer,
    backoff: ExponentialBackoff,
    heartbeat: Heartbeat,
    sweep: Interval,
    sink: Option<WsSink>,
    source: Option<WsSource>,
    connecting: Option<ConnectFuture>,
    reconnect: Option<Pin<Box<Sleep>>>,
    commands: mpsc::UnboundedReceiver<Command>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl EventLoop {
    pub(crate) fn new(
        url: String,
        commands: mpsc::UnboundedReceiver<Command>,
        config: LoopConfig,
    ) -> Self {
        let sweep_period = config
            .correlator
            .ttl()
            .map_or(DEFAULT_SWEEP_INTERVAL, |ttl| ttl.min(DEFAULT_SWEEP_INTERVAL))
            .max(Duration::from_millis(1));
        let mut sweep = interval_at(Instant::now() + sweep_period, sweep_period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            url,
            state: ConnectionState::Disconnected,
            registry: SubscriptionRegistry::new(),
            correlator: config.correlator,
            buffer: SendBuffer::new(),
            backoff: config.backoff,
            heartbeat: Heartbeat::new(config.heartbeat_interval),
            sweep,
            sink: None,
            source: None,
            connecting: None,
            reconnect: None,
            commands,
            metrics: config.metrics,
        }
    }

    /// Drive the client until every handle is dropped
    pub(crate) async fn run(mut self) {
        self.start_connect();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                result = poll_connect(&mut self.connecting) => {
                    self.connecting = None;
                    match result {
                        Ok(stream) => self.handle_open(stream).await,
                        Err(e) => {
                            let e = Error::WebSocket(e.to_string());
                            tracing::warn!(url = %self.url, error = %e, "Connection attempt failed");
                            self.connection_lost();
                        }
                    }
                }
                message = next_message(&mut self.source) => self.handle_message(message),
                _ = self.heartbeat.tick() => self.send_heartbeat().await,
                _ = wait_reconnect(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.start_connect();
                }
                _ = self.sweep.tick() => {
                    let dropped = self.correlator.sweep();
                    if dropped > 0 {
                        tracing::debug!(dropped, "Swept pending callbacks");
                    }
                }
            }
        }

        tracing::debug!("All client handles dropped, stopping event loop");
        if let Some(mut sink) = self.sink.take() {
            let _ = sink.close().await;
        }
    }

    fn start_connect(&mut self) {
        tracing::debug!(url = %self.url, "Connecting");
        if let Some(ref m) = self.metrics {
            m.record_reconnect_attempt();
        }
        let url = self.url.clone();
        self.connecting = Some(Box::pin(async move {
            connect_async(url.as_str()).await.map(|(stream, _)| stream)
        }));
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::OnTopic { topic, handler } => {
                self.registry.add_topic(topic.clone(), handler);
                if self.state.is_open() {
                    self.send_subscribe(&topic).await;
                }
            }
            Command::OnLifecycle { event, handler } => {
                self.registry.add_lifecycle(event, Arc::clone(&handler));
                if event == Lifecycle::Open && self.state.is_open() {
                    guarded("open", || handler());
                }
            }
            Command::Emit { topic, data, reply } => {
                let id = reply.map(|target| self.correlator.register(target));
                let frame = OutboundFrame::Event {
                    event: topic,
                    data,
                    id,
                };
                self.send_event(&frame).await;
            }
            Command::Inspect(tx) => {
                let _ = tx.send(Snapshot {
                    state: self.state,
                    pending_callbacks: self.correlator.pending_count(),
                    buffered_frames: self.buffer.len(),
                });
            }
        }
    }

    async fn handle_open(&mut self, stream: WsStream) {
        let (sink, source) = stream.split();
        self.sink = Some(sink);
        self.source = Some(source);
        self.backoff.reset();
        self.open_sequence().await;
    }

    /// Flush, re-subscribe, then announce the open
    ///
    /// The state only becomes `Open` once every buffered frame and subscribe
    /// has been written, so a failure part-way fires neither `open` nor
    /// `close` handlers.
    async fn open_sequence(&mut self) {
        let mut queued = self.buffer.drain().into_iter();
        while let Some(text) = queued.next() {
            tracing::debug!(frame = %text, "Flushing buffered frame");
            if let Err(e) = self.write(text.clone(), "event").await {
                tracing::warn!(error = %e, "Flush interrupted");
                self.buffer.requeue_front(std::iter::once(text).chain(queued));
                self.connection_lost();
                return;
            }
        }

        let topics = self.registry.topics().to_vec();
        for topic in topics {
            if !self.send_subscribe(&topic).await {
                return;
            }
        }

        self.state = ConnectionState::Open;
        tracing::info!(url = %self.url, "Connection open");
        if let Some(ref m) = self.metrics {
            m.record_open();
            m.update_connection_state(self.state);
        }

        self.registry.fire(Lifecycle::Open);
        self.heartbeat.start();
    }

    /// Close or error reported by the transport
    fn connection_lost(&mut self) {
        if self.reconnect.is_some() {
            return;
        }

        self.sink = None;
        self.source = None;
        self.connecting = None;
        if self.heartbeat.stop() {
            tracing::debug!("Heartbeat stopped");
        }

        if self.state.is_open() {
            self.state = ConnectionState::Disconnected;
            tracing::info!(url = %self.url, "Connection closed");
            if let Some(ref m) = self.metrics {
                m.update_connection_state(self.state);
            }
            self.registry.fire(Lifecycle::Close);
        }

        let delay = self.backoff.advance();
        tracing::info!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn handle_message(&mut self, message: Option<Result<Message, WsError>>) {
        match message {
            Some(Ok(Message::Text(text))) => self.dispatch(&text),
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => self.dispatch(&text),
                Err(_) => self.discard("binary frame is not UTF-8"),
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(frame = ?frame, "Connection closed by server");
                self.connection_lost();
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::warn!(error = %Error::WebSocket(e.to_string()), "Transport failed");
                self.connection_lost();
            }
            None => {
                tracing::info!("WebSocket stream ended");
                self.connection_lost();
            }
        }
    }

    fn dispatch(&mut self, text: &str) {
        tracing::trace!(frame = %text, "Frame received");
        match codec::decode(text) {
            Ok(InboundFrame::Event { event, data }) => {
                let invoked = self.registry.dispatch(&event, &data);
                if invoked == 0 {
                    tracing::debug!(topic = %event, "No handlers for topic");
                }
                if let Some(ref m) = self.metrics {
                    m.record_event(&event, invoked);
                }
            }
            Ok(InboundFrame::Reply { id, data }) => {
                let correlator = &mut self.correlator;
                let matched = guarded("reply", || correlator.resolve(&id, data)).unwrap_or(true);
                if !matched {
                    tracing::debug!(id = %id, "Discarding reply for unknown id");
                }
                if let Some(ref m) = self.metrics {
                    m.record_reply(matched);
                }
            }
            Err(e) => self.discard(&e.to_string()),
        }
    }

    fn discard(&self, reason: &str) {
        tracing::warn!(reason = %reason, "Discarding malformed frame");
        if let Some(ref m) = self.metrics {
            m.record_malformed();
        }
    }

    async fn send_heartbeat(&mut self) {
        tracing::debug!("Sending heartbeat");
        if let Some(ref m) = self.metrics {
            m.record_heartbeat();
        }
        self.send_event(&OutboundFrame::event(HEARTBEAT_TOPIC, None)).await;
    }

    /// Write an event frame now, or park it until the next open
    async fn send_event(&mut self, frame: &OutboundFrame) {
        let text = match codec::encode(frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(topic = %frame.topic(), error = %e, "Dropping unencodable frame");
                return;
            }
        };

        if !self.state.is_open() {
            tracing::debug!(frame = %text, "Buffering frame");
            if let Some(ref m) = self.metrics {
                m.record_buffered();
            }
            self.buffer.push(text);
            return;
        }

        if let Err(e) = self.write(text.clone(), "event").await {
            tracing::warn!(error = %e, "Send failed, buffering frame");
            self.buffer.push(text);
            self.connection_lost();
        }
    }

    /// Announce topic interest; returns false if the connection dropped
    ///
    /// Failed subscribes are not buffered since every open replays them.
    async fn send_subscribe(&mut self, topic: &str) -> bool {
        let text = match codec::encode(&OutboundFrame::subscribe(topic)) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Cannot encode subscribe frame");
                return true;
            }
        };
        tracing::debug!(topic = %topic, "Subscribing");
        match self.write(text, "subscribe").await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Subscribe failed");
                self.connection_lost();
                false
            }
        }
    }

    async fn write(&mut self, text: String, kind: &'static str) -> eventsock_core::Result<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| Error::WebSocket(WsError::AlreadyClosed.to_string()))?;
        sink.send(Message::Text(text))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        if let Some(ref m) = self.metrics {
            m.record_sent(kind);
        }
        Ok(())
    }
}

async fn poll_connect(connecting: &mut Option<ConnectFuture>) -> Result<WsStream, WsError> {
    match connecting.as_mut() {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

async fn next_message(source: &mut Option<WsSource>) -> Option<Result<Message, WsError>> {
    match source.as_mut() {
        Some(source) => source.next().await,
        None => pending().await,
    }
}

async fn wait_reconnect(reconnect: &mut Option<Pin<Box<Sleep>>>) {
    match reconnect.as_mut() {
        Some(sleep) => sleep.await,
        None => pending().await,
    }
}
