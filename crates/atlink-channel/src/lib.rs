//! Command/response correlation engine for AT-style modems.
//!
//! This crate drives an attached modem over a byte-stream [`Transport`]:
//! a background reader worker frames incoming bytes into lines
//! (via [`atlink_protocol`]), classifies each line as command response or
//! unsolicited notification, and feeds two bounded queues. The
//! [`ModemChannel`] front end transmits commands and collects their
//! responses against a fixed deadline, with configurable end-of-response
//! detection and a prompt mode for interactive payload uploads.
//!
//! # Architecture
//!
//! ```text
//! bytes ─→ LineFramer ─→ classify ─┬→ response queue ─→ collector / caller
//!        (reader worker thread)    └→ async queue    ─→ caller
//! ```
//!
//! The reader worker is the sole producer for both queues. Queue overflow
//! drops the newly arriving line rather than blocking the reader; the loss
//! is logged but not reported. Response timeouts are reported through
//! [`ResponseOutcome::completed`], never as errors.

mod channel;
mod config;
mod error;
mod transport;
mod worker;

pub use channel::{ModemChannel, ResponseOutcome};
pub use config::ChannelConfig;
pub use error::{ChannelError, ChannelResult};
pub use transport::{transport_pair, PairedTransport, Transport, TransportHarness};
pub use worker::NotificationHook;
