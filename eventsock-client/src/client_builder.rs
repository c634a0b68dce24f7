//! Client builder
//!
//! The `ClientBuilder` collects the client configuration before the event
//! loop starts:
//! - Endpoint url, or an origin to derive it from
//! - Reconnect backoff bounds
//! - Heartbeat period
//! - Callback expiry and request timeout
//! - Observability (OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use eventsock_client::{ClientBuilder, Origin};
//! use std::time::Duration;
//!
//! # async fn example() -> eventsock_core::Result<()> {
//! // Explicit endpoint
//! let client = ClientBuilder::new("ws://localhost:8080/ws/events")
//!     .with_request_timeout(Duration::from_secs(10))
//!     .connect()?;
//!
//! // Derived from the serving origin: wss://app.example.com/ws/events
//! let client2 = ClientBuilder::new("")
//!     .with_origin(Origin::parse("https://app.example.com")?)
//!     .with_default_observability()
//!     .service_name("notice-inbox")
//!     .connect()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! [`ClientBuilder::from_env`] reads:
//! - `EVENTSOCK_URL`: endpoint url
//! - `EVENTSOCK_ORIGIN`: origin used when the url is unset or empty

use crate::connection::{EventLoop, LoopConfig};
use crate::correlator::{CallbackCorrelator, IdGenerator};
use crate::endpoint::{self, Origin};
use crate::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::reconnect::ExponentialBackoff;
use crate::EventClient;
use eventsock_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Environment variable holding the endpoint url
pub const URL_ENV: &str = "EVENTSOCK_URL";

/// Environment variable holding the origin to derive the endpoint from
pub const ORIGIN_ENV: &str = "EVENTSOCK_ORIGIN";

/// Builder for configuring and starting an EventClient
pub struct ClientBuilder {
    url: Option<String>,
    origin: Option<Origin>,
    backoff: ExponentialBackoff,
    heartbeat_interval: Duration,
    callback_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    id_generator: Option<IdGenerator>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder; an empty url means "derive from the origin"
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: (!url.is_empty()).then_some(url),
            origin: None,
            backoff: ExponentialBackoff::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            callback_ttl: None,
            request_timeout: None,
            id_generator: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Create a builder from `EVENTSOCK_URL` / `EVENTSOCK_ORIGIN`
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(URL_ENV).unwrap_or_default();
        let mut builder = Self::new(url);
        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            builder = builder.with_origin(Origin::parse(&origin)?);
        }
        Ok(builder)
    }

    /// Origin used to derive the endpoint when no url is given
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Reconnect delay bounds (default 1s doubling up to 32s)
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = ExponentialBackoff::new(base, max);
        self
    }

    /// Heartbeat period while open (default 30s)
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Drop pending reply callbacks older than `ttl` (default: never)
    pub fn with_callback_ttl(mut self, ttl: Duration) -> Self {
        self.callback_ttl = Some(ttl);
        self
    }

    /// Fail `request` calls with `Error::Timeout` after `timeout`
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace the random correlation id source
    pub fn with_id_generator<F>(mut self, generate: F) -> Self
    where
        F: FnMut() -> String + Send + 'static,
    {
        self.id_generator = Some(Box::new(generate));
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Endpoint the client would connect to
    pub fn endpoint(&self) -> Result<String> {
        endpoint::resolve(self.url.as_deref(), self.origin.as_ref())
    }

    /// Start the client on the current tokio runtime
    ///
    /// Returns as soon as the event loop is spawned; connecting, buffering
    /// and reconnecting all happen in the background.
    pub fn connect(self) -> Result<EventClient> {
        let url = self.endpoint()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            eventsock_core::init_observability(config.clone()).map_err(|e| {
                Error::Runtime(format!("Failed to initialize observability: {}", e))
            })?;

            Some(Arc::new(crate::ClientMetrics::new(&config.service_name)))
        } else {
            None
        };

        let correlator = match self.id_generator {
            Some(generate) => CallbackCorrelator::with_generator(generate),
            None => CallbackCorrelator::new(),
        }
        .with_ttl(self.callback_ttl);

        let (tx, rx) = mpsc::unbounded_channel();
        let event_loop = EventLoop::new(
            url.clone(),
            rx,
            LoopConfig {
                backoff: self.backoff,
                heartbeat_interval: self.heartbeat_interval,
                correlator,
                metrics,
            },
        );

        let span = tracing::info_span!("eventsock", url = %url);
        runtime.spawn(event_loop.run().instrument(span));
        tracing::info!(url = %url, "Event client started");

        Ok(EventClient {
            commands: tx,
            url: Arc::from(url),
            request_timeout: self.request_timeout,
        })
    }
}
