// src/scheduler/shutdown.rs

//! Cooperative cancellation for the periodic threads.
//!
//! Each thread owns a [`ShutdownSignal`]; the scheduler keeps the matching
//! [`ShutdownHandle`]. Raising the handle, or dropping it, cancels the
//! thread at its next loop head or while it waits for its next deadline.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Instant;

pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (sender, receiver) = mpsc::channel();
    (
        ShutdownHandle { sender },
        ShutdownSignal {
            receiver,
            raised: Cell::new(false),
        },
    )
}

#[derive(Debug)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    pub fn raise(self) {
        // The thread may already be gone; that is as good as delivered.
        let _ = self.sender.send(());
    }
}

#[derive(Debug)]
pub struct ShutdownSignal {
    receiver: Receiver<()>,
    raised: Cell<bool>,
}

impl ShutdownSignal {
    /// Non-blocking check. Once true, stays true.
    pub fn is_raised(&self) -> bool {
        if self.raised.get() {
            return true;
        }
        let raised = match self.receiver.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        };
        self.raised.set(raised);
        raised
    }

    /// Blocks until `deadline` or until shutdown is requested, whichever
    /// comes first. Returns true on shutdown.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        if self.raised.get() {
            return true;
        }
        let timeout = deadline.saturating_duration_since(Instant::now());
        let raised = match self.receiver.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        };
        self.raised.set(raised);
        raised
    }
}
