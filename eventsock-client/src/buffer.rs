//! Outbound frame buffer
//!
//! Frames emitted while the connection is not open wait here in FIFO order.
//! On open the whole buffer is taken at once and written before anything
//! else for that connection. If the socket fails part-way through a flush,
//! the unsent tail goes back to the front in enqueue order.
//!
//! The buffer is unbounded and lives only in memory.

use std::collections::VecDeque;

/// FIFO of encoded frames awaiting an open connection
#[derive(Debug, Default)]
pub struct SendBuffer {
    frames: VecDeque<String>,
}

impl SendBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the back
    pub fn push(&mut self, frame: String) {
        self.frames.push_back(frame);
    }

    /// Take every buffered frame, oldest first, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<String> {
        self.frames.drain(..).collect()
    }

    /// Put unsent frames back ahead of anything buffered since
    pub fn requeue_front(&mut self, frames: impl IntoIterator<Item = String>) {
        let mut frames: Vec<String> = frames.into_iter().collect();
        while let Some(frame) = frames.pop() {
            self.frames.push_front(frame);
        }
    }

    /// Number of buffered frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
