use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::handoff::{handoff, HandoffReceiver, HandoffSender};
use crate::overlay::{Overlay, OverlayHost};
use crate::power::{idle_or_fail_open, IdleOracle, PowerEvent};
use crate::sampler::{Sampler, SAMPLE_INTERVAL};
use crate::source::ReadingSource;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Running,
    /// Reserved for suspending on idle-mode entry while running. Idle mode is only
    /// polled at screen-on, and an idle screen-on stays `Stopped`, so nothing enters it.
    SuspendedIdle,
}

/// Owns the sampler's lifetime and the overlay, and reacts to power signals.
///
/// Idle display mode is consulted only when the screen turns on. Entering idle
/// mode while already running does not stop sampling; only `ScreenOff` does.
pub struct LifecycleController<O: IdleOracle, H: OverlayHost> {
    source: Arc<dyn ReadingSource>,
    oracle: O,
    overlay: Overlay<H>,
    sender: HandoffSender,
    sampler: Option<Sampler>,
    state: LifecycleState,
    interval: Duration,
    live: Arc<AtomicUsize>,
}

impl<O: IdleOracle, H: OverlayHost> LifecycleController<O, H> {
    /// Build a controller plus the receiving end the render context drains.
    pub fn new(source: Arc<dyn ReadingSource>, oracle: O, host: H) -> (Self, HandoffReceiver) {
        Self::with_interval(source, oracle, host, SAMPLE_INTERVAL)
    }

    /// Same as [`LifecycleController::new`] with a shorter cadence, for tests and demos.
    pub fn with_interval(
        source: Arc<dyn ReadingSource>,
        oracle: O,
        host: H,
        interval: Duration,
    ) -> (Self, HandoffReceiver) {
        let (sender, receiver) = handoff();
        let controller = Self {
            source,
            oracle,
            overlay: Overlay::new(host),
            sender,
            sampler: None,
            state: LifecycleState::Stopped,
            interval,
            live: Arc::new(AtomicUsize::new(0)),
        };
        (controller, receiver)
    }

    /// Attach the overlay and start sampling unless the display is idle.
    pub fn start(&mut self) -> Result<()> {
        log::info!("overlay service starting");
        self.overlay.attach();
        self.handle(PowerEvent::ScreenOn)
    }

    pub fn handle(&mut self, event: PowerEvent) -> Result<()> {
        match (event, self.state) {
            (PowerEvent::ScreenOn, LifecycleState::Running) => {
                log::debug!("screen on while running; nothing to do");
            }
            (PowerEvent::ScreenOn, LifecycleState::Stopped | LifecycleState::SuspendedIdle) => {
                let idle = idle_or_fail_open(&self.oracle);
                log::debug!("screen on (idle={idle})");
                if idle {
                    self.overlay.set_visible(false);
                    self.state = LifecycleState::Stopped;
                } else {
                    self.start_sampler()?;
                    self.overlay.set_visible(true);
                    self.state = LifecycleState::Running;
                }
            }
            (PowerEvent::ScreenOff, LifecycleState::Stopped) => {
                log::debug!("screen off while stopped; nothing to do");
            }
            (PowerEvent::ScreenOff, _) => {
                log::debug!("screen off");
                self.overlay.set_visible(false);
                self.stop_sampler();
                self.state = LifecycleState::Stopped;
            }
        }
        Ok(())
    }

    /// Stop sampling and remove the overlay.
    pub fn shutdown(&mut self) {
        self.stop_sampler();
        self.overlay.detach();
        if self.state != LifecycleState::Stopped {
            log::info!("overlay service stopped");
        }
        self.state = LifecycleState::Stopped;
    }

    /// Cancel and join the current sampler, if any. Safe to call with nothing running.
    pub fn stop_sampler(&mut self) {
        if let Some(mut sampler) = self.sampler.take() {
            sampler.stop();
        }
    }

    fn start_sampler(&mut self) -> Result<()> {
        self.stop_sampler();
        let mut sampler = Sampler::new(self.interval);
        sampler.start(self.source.clone(), self.sender.clone(), self.live.clone())?;
        self.sampler = Some(sampler);
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(Sampler::is_running)
    }

    /// Worker threads currently alive for this controller.
    pub fn live_samplers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn overlay(&self) -> &Overlay<H> {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut Overlay<H> {
        &mut self.overlay
    }
}

impl<O: IdleOracle, H: OverlayHost> Drop for LifecycleController<O, H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
