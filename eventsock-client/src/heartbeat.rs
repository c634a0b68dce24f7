//! Heartbeat timer
//!
//! While the connection is open the client emits an empty `heartbeat` event
//! once per period. The timer is owned by the event loop: started on open,
//! dropped on close, and a second `start` while running is ignored.

use std::future::pending;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Topic used for keep-alive events
pub const HEARTBEAT_TOPIC: &str = "heartbeat";

/// Default heartbeat period
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30000);

/// Shortest period the timer accepts; smaller values are raised to it
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Cancellable periodic heartbeat timer
#[derive(Debug)]
pub struct Heartbeat {
    period: Duration,
    timer: Option<Interval>,
}

impl Heartbeat {
    /// Create a stopped heartbeat with the given period
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_HEARTBEAT_INTERVAL),
            timer: None,
        }
    }

    /// Start ticking; the first tick fires one period from now
    ///
    /// Returns false if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.timer.is_some() {
            return false;
        }
        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        true
    }

    /// Stop ticking; returns false if it was not running
    pub fn stop(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Returns true while the timer is armed
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Heartbeat period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick; never completes while stopped
    pub async fn tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => pending::<()>().await,
        }
    }
}
