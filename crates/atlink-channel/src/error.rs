//! Error types for the modem channel.

use thiserror::Error;

/// Errors that can occur when operating a modem channel.
///
/// Response timeouts are not errors: the collector operations report them
/// through `completed = false` / `None` together with whatever partial lines
/// were gathered.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The underlying transport failed during a write.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// `start` was called while the reader worker is already running.
    #[error("reader worker already started")]
    AlreadyStarted,

    /// `start` was called after the channel had been stopped.
    #[error("channel has been stopped")]
    Stopped,
}

/// Result type alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
