use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::handoff::{HandoffSender, SendOutcome};
use crate::source::ReadingSource;
use crate::{Error, Result};

/// Fixed sampling cadence.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Owner side of the cancellation flag.
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    signal: Option<Sender<()>>,
}

impl CancelHandle {
    /// Raise the flag and wake every waiter. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.flag.store(true, Ordering::SeqCst);
        // Dropping the only sender disconnects the channel, which wakes all receivers.
        self.signal.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Worker side of the cancellation flag.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `interval` unless cancelled first. Returns true when cancelled.
    pub fn wait(&self, interval: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        match self.signal.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let flag = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel::bounded(0);
    (
        CancelHandle {
            flag: flag.clone(),
            signal: Some(tx),
        },
        CancelToken { flag, signal: rx },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Looping,
    Stopped,
}

/// Counts a worker as live from spawn until its thread body returns.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Background unit that pulls one reading per interval and hands it to the render context.
pub struct Sampler {
    interval: Duration,
    state: SamplerState,
    cancel: Option<CancelHandle>,
    worker: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            state: SamplerState::Idle,
            cancel: None,
            worker: None,
        }
    }

    /// Spawn the worker. `live` is bumped for as long as the worker thread runs.
    pub fn start(
        &mut self,
        source: Arc<dyn ReadingSource>,
        sender: HandoffSender,
        live: Arc<AtomicUsize>,
    ) -> Result<()> {
        if self.state != SamplerState::Idle {
            return Err(Error::InvalidArgs(format!(
                "sampler cannot start from {:?}",
                self.state
            )));
        }
        let (handle, token) = cancel_pair();
        let interval = self.interval;
        let guard = LiveGuard::enter(live);
        let worker = thread::Builder::new()
            .name("fpsinfo-sampler".into())
            .spawn(move || {
                let _guard = guard;
                sample_loop(source.as_ref(), &sender, &token, interval);
            })
            .map_err(|e| Error::Spawn(e.to_string()))?;
        log::debug!(
            "sampler started (interval={})",
            humantime::format_duration(interval)
        );
        self.cancel = Some(handle);
        self.worker = Some(worker);
        self.state = SamplerState::Looping;
        Ok(())
    }

    /// Cancel and join. Returns only after the worker thread has exited.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.as_mut() {
            cancel.cancel();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("sampler thread panicked");
            }
            log::debug!("sampler stopped");
        }
        if self.state == SamplerState::Looping {
            self.state = SamplerState::Stopped;
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sample_loop(
    source: &dyn ReadingSource,
    sender: &HandoffSender,
    token: &CancelToken,
    interval: Duration,
) {
    loop {
        if token.wait(interval) {
            return;
        }
        let reading = source.read();
        match sender.send_or_cancel(reading, token) {
            SendOutcome::Delivered => {}
            SendOutcome::Cancelled => return,
            SendOutcome::Disconnected => {
                log::debug!("handoff receiver gone, sampler exiting");
                return;
            }
        }
    }
}
