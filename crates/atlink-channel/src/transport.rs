//! Byte-stream transport seam.
//!
//! The engine only needs two things from the physical link: "write these
//! bytes" and "give me the next available byte, if any". Power sequencing,
//! pin assignment, baud rate, and flow control are the transport's problem;
//! by the time a [`Transport`] is handed to the channel the link is ready.
//!
//! [`transport_pair`] builds an in-memory duplex transport for tests and
//! examples: one end behaves like the modem-facing transport, the other is a
//! harness that injects modem output and observes what the host wrote.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io;
use std::time::Duration;

/// A duplex byte-stream channel to the modem.
pub trait Transport: Send {
    /// Write all of `data` to the modem.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read the next available byte from the modem.
    ///
    /// Returns `Ok(None)` when no byte is currently available. An `Err`
    /// means the link is gone and no further bytes will ever arrive.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// In-memory transport end handed to the channel.
pub struct PairedTransport {
    incoming: Receiver<u8>,
    outgoing: Sender<Vec<u8>>,
}

/// Test-harness end of an in-memory transport pair.
pub struct TransportHarness {
    incoming: Sender<u8>,
    outgoing: Receiver<Vec<u8>>,
}

/// Create a connected in-memory transport pair.
pub fn transport_pair() -> (PairedTransport, TransportHarness) {
    let (incoming_tx, incoming_rx) = crossbeam_channel::unbounded();
    let (outgoing_tx, outgoing_rx) = crossbeam_channel::unbounded();
    (
        PairedTransport {
            incoming: incoming_rx,
            outgoing: outgoing_tx,
        },
        TransportHarness {
            incoming: incoming_tx,
            outgoing: outgoing_rx,
        },
    )
}

impl Transport for PairedTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.outgoing
            .send(data.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "transport peer disconnected"))
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.incoming.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "transport peer disconnected",
            )),
        }
    }
}

impl TransportHarness {
    /// Inject bytes as if the modem had emitted them.
    pub fn inject(&self, data: &[u8]) {
        for &byte in data {
            let _ = self.incoming.send(byte);
        }
    }

    /// Wait for the next write made by the host side.
    pub fn next_write(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.outgoing.recv_timeout(timeout).ok()
    }

    /// Collect every write made so far, concatenated.
    pub fn drain_writes(&self) -> Vec<u8> {
        let mut all = Vec::new();
        while let Ok(chunk) = self.outgoing.try_recv() {
            all.extend_from_slice(&chunk);
        }
        all
    }
}
