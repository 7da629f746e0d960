//! Stop signal for background watch threads.
//!
//! The signal is a channel that is never written to: closing the sender is
//! the shutdown, so a watcher can both poll for it and await it alongside
//! its poll delay.

use async_channel::{Receiver, Sender};

/// Signals shutdown when dropped or when [`shutdown`](Self::shutdown) is called.
#[derive(Debug)]
pub(crate) struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    /// Create a new handle and the receiver the background thread watches.
    pub(crate) fn new() -> (Self, ShutdownReceiver) {
        let (sender, receiver) = async_channel::bounded(1);
        (Self { sender }, ShutdownReceiver { receiver })
    }

    /// Signal shutdown without waiting for drop.
    pub(crate) fn shutdown(&self) {
        self.sender.close();
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        self.sender.close();
    }
}

/// The watching side of a [`ShutdownHandle`].
#[derive(Debug, Clone)]
pub(crate) struct ShutdownReceiver {
    receiver: Receiver<()>,
}

impl ShutdownReceiver {
    /// Check whether shutdown was signalled (non-blocking).
    pub(crate) fn is_shutdown(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Resolve once shutdown is signalled.
    pub(crate) async fn wait(&self) {
        // Nothing is ever sent, so recv only returns once the channel closes
        let _ = self.receiver.recv().await;
    }
}
