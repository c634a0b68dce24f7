//! Connection state
//!
//! Only two states matter to the rest of the client: frames are written
//! straight to the socket while `Open` and buffered otherwise. Reconnect
//! attempts in flight count as `Disconnected`.
//!
//! ```text
//! Disconnected ──connect ok──▶ Open
//!      ▲                         │
//!      └──── close / error ──────┘   (reconnect armed after backoff)
//! ```

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected; outbound frames are buffered
    #[default]
    Disconnected,
    /// Connected; outbound frames go straight to the socket
    Open,
}

impl ConnectionState {
    /// Returns true if frames can be written to the socket
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Gauge value recorded by the client metrics (0=disconnected, 1=open)
    pub fn as_gauge(self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Open => 1,
        }
    }
}
