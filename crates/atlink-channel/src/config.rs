//! Channel configuration.

use atlink_protocol::MAX_LINE_LENGTH;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ModemChannel`](crate::ModemChannel).
///
/// Queue capacities are fixed at construction; reconfiguring them requires
/// building a new channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Capacity of the response line queue.
    pub response_queue_capacity: usize,
    /// Capacity of the async event line queue.
    pub async_queue_capacity: usize,
    /// Maximum line length before truncation, in bytes.
    pub max_line_length: usize,
    /// How long the reader worker sleeps when the transport has no data
    /// available, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            response_queue_capacity: 10,
            async_queue_capacity: 10,
            max_line_length: MAX_LINE_LENGTH,
            poll_interval_ms: 10,
        }
    }
}

impl ChannelConfig {
    /// The reader poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
