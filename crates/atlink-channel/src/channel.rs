//! The modem channel: command transmission and response correlation.

use crate::config::ChannelConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::transport::Transport;
use crate::worker::{NotificationHook, ReaderWorker, SharedState};
use atlink_protocol::{EndCriteria, LineFramer};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

// ============================================================================
// Types
// ============================================================================

/// Outcome of a response-collection operation.
///
/// `completed` is true only when the end-of-response matcher fired before
/// the deadline. Partial lines gathered before a timeout stay in `lines`
/// even when `completed` is false, so callers must inspect `lines`
/// regardless of the flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// Response lines, in arrival order.
    pub lines: Vec<String>,
    /// Whether a line satisfying the end criteria (or the prompt byte)
    /// arrived before the deadline.
    pub completed: bool,
}

// ============================================================================
// ModemChannel
// ============================================================================

/// A line-oriented command/response channel to an attached modem.
///
/// The channel correlates each issued command with the lines that make up
/// its response, and routes unsolicited notifications to a separate queue.
/// Which lines are notifications and which line concludes a response are
/// entirely caller-supplied configuration; no command vocabulary is built
/// in.
///
/// At most one command/response correlation may be in flight at a time.
/// Nothing enforces this: two callers concurrently collecting responses
/// will interleave each other's lines.
///
/// # Example
///
/// ```rust,ignore
/// let (transport, _harness) = atlink_channel::transport_pair();
/// let mut channel = ModemChannel::new(Box::new(transport), ChannelConfig::default());
/// channel.configure_end_criteria(vec!["OK".into(), "ERROR".into(), "+CME ERROR:*".into()]);
/// channel.configure_async_prefixes(vec!["+UUPSDA:".into()]);
/// channel.start()?;
///
/// let outcome = channel.send_command_await_responses("AT+CREG?", Duration::from_secs(5))?;
/// if outcome.completed {
///     println!("modem said: {:?}", outcome.lines);
/// }
/// ```
pub struct ModemChannel {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    shared: Arc<SharedState>,
    config: ChannelConfig,
    response_rx: Receiver<String>,
    async_rx: Receiver<String>,
    /// Producer ends, handed to the worker at start. `None` once started.
    senders: Option<(Sender<String>, Sender<String>)>,
    worker: Option<ReaderWorker>,
}

impl ModemChannel {
    /// Create a channel over a ready transport.
    ///
    /// Queue capacities and framing limits come from `config` and are fixed
    /// for the channel's lifetime. The reader worker is not running yet;
    /// call [`start`](Self::start).
    pub fn new(transport: Box<dyn Transport>, config: ChannelConfig) -> Self {
        let (response_tx, response_rx) =
            crossbeam_channel::bounded(config.response_queue_capacity);
        let (async_tx, async_rx) = crossbeam_channel::bounded(config.async_queue_capacity);

        ModemChannel {
            transport: Arc::new(Mutex::new(transport)),
            shared: Arc::new(SharedState::default()),
            config,
            response_rx,
            async_rx,
            senders: Some((response_tx, async_tx)),
            worker: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the background reader worker.
    ///
    /// Returns [`ChannelError::AlreadyStarted`] if the worker is running and
    /// [`ChannelError::Stopped`] if the channel was already stopped; stopping
    /// is terminal for a channel instance.
    pub fn start(&mut self) -> ChannelResult<()> {
        if self.worker.is_some() {
            return Err(ChannelError::AlreadyStarted);
        }
        let (response_tx, async_tx) = self.senders.take().ok_or(ChannelError::Stopped)?;

        let worker = ReaderWorker::spawn(
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            response_tx,
            async_tx,
            self.config.max_line_length,
            self.config.poll_interval(),
        )?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Stop the reader worker and wait for its thread to finish.
    ///
    /// Idempotent; also invoked from `Drop`.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }

    // ------------------------------------------------------------------
    // Transmission
    // ------------------------------------------------------------------

    /// Transmit a command, terminated with CR/LF.
    pub fn send_command(&self, command: &str) -> ChannelResult<()> {
        debug!(command = %command, "TX command");
        let encoded = LineFramer::encode_command(command);
        self.transport.lock().write_all(&encoded)?;
        Ok(())
    }

    /// Transmit payload bytes verbatim, with no terminator.
    ///
    /// Used after a prompt-terminated line to deliver the negotiated
    /// payload.
    pub fn send_payload(&self, payload: &str) -> ChannelResult<()> {
        debug!(len = payload.len(), "TX payload");
        self.transport.lock().write_all(payload.as_bytes())?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Single-line reads
    // ------------------------------------------------------------------

    /// Pop the next response line, waiting up to `timeout`.
    pub fn await_response(&self, timeout: Duration) -> Option<String> {
        self.response_rx.recv_timeout(timeout).ok()
    }

    /// Pop the next unsolicited notification line, waiting up to `timeout`.
    pub fn await_async_event(&self, timeout: Duration) -> Option<String> {
        self.async_rx.recv_timeout(timeout).ok()
    }

    // ------------------------------------------------------------------
    // Response correlation
    // ------------------------------------------------------------------

    /// Transmit a command and collect its response lines.
    ///
    /// Lines are popped from the response queue until one satisfies the
    /// end-of-response criteria (`completed = true`) or the deadline
    /// `issue time + timeout` elapses (`completed = false`). The budget is
    /// never extended per line: every pop is bounded by the wall time
    /// remaining since the command was issued. Partial lines collected
    /// before a timeout are returned to the caller.
    ///
    /// An `Err` is only possible from the transport write; collection
    /// itself cannot fail.
    pub fn send_command_await_responses(
        &self,
        command: &str,
        timeout: Duration,
    ) -> ChannelResult<ResponseOutcome> {
        self.send_command(command)?;
        let deadline = Instant::now() + timeout;
        Ok(self.collect_responses(deadline))
    }

    /// Collect response lines for a command transmitted separately.
    ///
    /// Same polling loop as
    /// [`send_command_await_responses`](Self::send_command_await_responses),
    /// without the transmission. `completed` is false whenever the matcher
    /// never fired before the deadline, however many lines were gathered;
    /// callers must still inspect `lines` on failure.
    pub fn await_responses(&self, timeout: Duration) -> ResponseOutcome {
        self.collect_responses(Instant::now() + timeout)
    }

    fn collect_responses(&self, deadline: Instant) -> ResponseOutcome {
        let mut lines = Vec::new();

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.response_rx.recv_timeout(deadline - now) {
                Ok(line) => {
                    let is_end = {
                        let criteria = self.shared.end_criteria.read();
                        let prompt = *self.shared.prompt.read();
                        criteria.is_end_of_response(&line, prompt)
                    };
                    lines.push(line);
                    if is_end {
                        return ResponseOutcome {
                            lines,
                            completed: true,
                        };
                    }
                }
                // Timed out, or the worker is gone and the queue drained.
                Err(_) => break,
            }
        }

        ResponseOutcome {
            lines,
            completed: false,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replace the active async prefix set.
    ///
    /// Lines starting with any of these prefixes are routed to the async
    /// event queue instead of the response queue. The previous set is
    /// discarded, not merged. Configure before issuing commands that depend
    /// on the new set; the reader consults it line by line.
    pub fn configure_async_prefixes(&self, prefixes: Vec<String>) {
        *self.shared.async_prefixes.write() = prefixes;
    }

    /// Replace the active end-of-response criteria.
    ///
    /// Each criterion is either an exact line (`"OK"`) or a prefix followed
    /// by `*` (`"+CME ERROR:*"`). The previous set is discarded.
    pub fn configure_end_criteria(&self, criteria: Vec<String>) {
        *self.shared.end_criteria.write() = EndCriteria::new(criteria);
    }

    /// Enable prompt mode with the given prompt byte.
    ///
    /// While enabled, the byte terminates framing immediately (no newline
    /// needed) and any line containing it unconditionally ends the current
    /// response. Enable around a single interactive exchange and disable
    /// afterwards.
    pub fn enable_prompt(&self, prompt: u8) {
        *self.shared.prompt.write() = Some(prompt);
    }

    /// Disable prompt mode.
    pub fn disable_prompt(&self) {
        *self.shared.prompt.write() = None;
    }

    /// Register a hook invoked for every async line, replacing any previous
    /// hook.
    ///
    /// The hook runs synchronously on the reader thread before the line is
    /// enqueued; a slow hook stalls framing for the whole channel. The async
    /// event queue itself is the non-blocking alternative.
    pub fn register_notification_hook<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.shared.hook.write() = Some(Box::new(hook) as NotificationHook);
    }

    /// Remove the notification hook.
    pub fn clear_notification_hook(&self) {
        *self.shared.hook.write() = None;
    }
}

impl Drop for ModemChannel {
    fn drop(&mut self) {
        self.stop();
    }
}
