//! Single-slot delivery of readings from the sampler thread to the render context.
//!
//! The slot holds exactly one reading. The sampler publishes at most once per
//! [`SAMPLE_INTERVAL`](crate::sampler::SAMPLE_INTERVAL) and the consumer is expected
//! to finish each update well inside that window, so in steady state a send never
//! waits. If the consumer does stall, the sampler blocks on the full slot (still
//! cancellable) instead of dropping or merging readings; order is always preserved.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::sampler::CancelToken;
use crate::source::Reading;

pub const HANDOFF_CAPACITY: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Cancelled,
    Disconnected,
}

#[derive(Clone)]
pub struct HandoffSender {
    tx: Sender<Reading>,
}

pub struct HandoffReceiver {
    rx: Receiver<Reading>,
}

pub fn handoff() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = channel::bounded(HANDOFF_CAPACITY);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

impl HandoffSender {
    /// Place `reading` in the slot, waiting for it to free up unless `token` is cancelled first.
    pub fn send_or_cancel(&self, reading: Reading, token: &CancelToken) -> SendOutcome {
        if token.is_cancelled() {
            return SendOutcome::Cancelled;
        }
        channel::select! {
            send(self.tx, reading) -> res => match res {
                Ok(()) => SendOutcome::Delivered,
                Err(_) => SendOutcome::Disconnected,
            },
            recv(token.signal()) -> _ => SendOutcome::Cancelled,
        }
    }
}

impl HandoffReceiver {
    pub fn try_recv(&self) -> Option<Reading> {
        match self.rx.try_recv() {
            Ok(reading) => Some(reading),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Reading> {
        match self.rx.recv_timeout(timeout) {
            Ok(reading) => Some(reading),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub(crate) fn inner(&self) -> &Receiver<Reading> {
        &self.rx
    }
}
