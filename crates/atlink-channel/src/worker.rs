//! Background reader worker.
//!
//! One dedicated thread owns the transport read loop for the lifetime of the
//! channel: it polls the transport for bytes, feeds the line framer, and
//! dispatches each completed line to the response or async event queue. It
//! is the sole producer for both queues and the sole invoker of the
//! notification hook.
//!
//! Unlike a fire-and-forget task, the worker has an explicit lifecycle: it
//! is spawned by [`ModemChannel::start`](crate::ModemChannel::start) and
//! joined by [`stop`](crate::ModemChannel::stop), so tests and short-lived
//! programs do not leak the thread.

use crate::transport::Transport;
use atlink_protocol::{classify, EndCriteria, LineClass, LineFramer};
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, trace, warn};

/// Maximum bytes drained from the transport per lock acquisition, so that
/// command writes are not starved during a burst of modem output.
const READ_BURST: usize = 256;

/// Synchronous callback invoked on the reader thread for every async line,
/// before the line is enqueued. Slow hooks stall framing.
pub type NotificationHook = Box<dyn Fn(&str) + Send + Sync>;

/// Configuration state shared between the reader worker and the caller.
///
/// Callers should configure prefixes, criteria, and prompt mode before
/// issuing any command that depends on the new configuration; the worker
/// consults the sets line by line.
#[derive(Default)]
pub(crate) struct SharedState {
    /// Active async prefix set, replaced wholesale on reconfiguration.
    pub(crate) async_prefixes: RwLock<Vec<String>>,
    /// Active end-of-response criteria, replaced wholesale.
    pub(crate) end_criteria: RwLock<EndCriteria>,
    /// Prompt byte when prompt mode is enabled.
    pub(crate) prompt: RwLock<Option<u8>>,
    /// Optional notification hook for async lines.
    pub(crate) hook: RwLock<Option<NotificationHook>>,
}

/// Handle to the running reader thread.
pub(crate) struct ReaderWorker {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReaderWorker {
    /// Spawn the reader loop on its own thread.
    pub(crate) fn spawn(
        transport: Arc<Mutex<Box<dyn Transport>>>,
        shared: Arc<SharedState>,
        response_tx: Sender<String>,
        async_tx: Sender<String>,
        max_line_length: usize,
        poll_interval: Duration,
    ) -> std::io::Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_flag);

        let handle = thread::Builder::new()
            .name("atlink-reader".to_string())
            .spawn(move || {
                read_loop(
                    transport,
                    shared,
                    response_tx,
                    async_tx,
                    max_line_length,
                    poll_interval,
                    stop,
                );
            })?;

        Ok(ReaderWorker {
            stop_flag,
            handle: Some(handle),
        })
    }

    /// Signal the reader loop to stop and wait for it to finish.
    pub(crate) fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_loop(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    shared: Arc<SharedState>,
    response_tx: Sender<String>,
    async_tx: Sender<String>,
    max_line_length: usize,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
) {
    let mut framer = LineFramer::with_max_line_length(max_line_length);
    let mut burst = Vec::with_capacity(READ_BURST);

    while !stop.load(Ordering::Relaxed) {
        // Drain a bounded burst, then release the lock so command writers
        // can get at the transport.
        burst.clear();
        {
            let mut transport = transport.lock();
            while burst.len() < READ_BURST {
                match transport.read_byte() {
                    Ok(Some(byte)) => burst.push(byte),
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "transport read failed, stopping reader");
                        return;
                    }
                }
            }
        }

        if burst.is_empty() {
            thread::sleep(poll_interval);
            continue;
        }

        for &byte in &burst {
            let prompt = *shared.prompt.read();
            if let Some(line) = framer.push_byte(byte, prompt) {
                dispatch_line(&shared, &response_tx, &async_tx, line);
            }
        }
    }
}

/// Route one completed line to exactly one queue.
///
/// A full destination queue drops the newly arriving line; already-queued
/// lines are never evicted and the producer never blocks.
fn dispatch_line(
    shared: &SharedState,
    response_tx: &Sender<String>,
    async_tx: &Sender<String>,
    line: String,
) {
    let class = {
        let prefixes = shared.async_prefixes.read();
        classify(&line, &prefixes)
    };

    match class {
        LineClass::AsyncEvent => {
            if let Some(hook) = shared.hook.read().as_ref() {
                hook(&line);
            }
            trace!(line = %line, "RX async");
            if let Err(TrySendError::Full(dropped)) = async_tx.try_send(line) {
                warn!(line = %dropped, "async event queue full, dropping line");
            }
        }
        LineClass::Response => {
            trace!(line = %line, "RX response");
            if let Err(TrySendError::Full(dropped)) = response_tx.try_send(line) {
                warn!(line = %dropped, "response queue full, dropping line");
            }
        }
    }
}
