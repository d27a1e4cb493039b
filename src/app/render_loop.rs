use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::{
    handoff::HandoffReceiver,
    lifecycle::LifecycleController,
    overlay::{Overlay, OverlayHost},
    power::{ControlEvent, IdleOracle},
    render::{LayoutSpec, RenderRequest, RenderState, TextMetrics},
    source::Reading,
};

/// How often the loop wakes with nothing to do, so the ctrl-c flag is noticed.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Everything the consumer owns on the render thread.
pub struct RenderContext<M: TextMetrics> {
    state: RenderState,
    layout: LayoutSpec,
    metrics: M,
}

impl<M: TextMetrics> RenderContext<M> {
    pub fn new(density: f32, metrics: M) -> Self {
        let layout = LayoutSpec::new(density, &metrics);
        Self {
            state: RenderState::new(),
            layout,
            metrics,
        }
    }

    /// Apply one reading and forward the resulting request to the overlay.
    pub fn deliver<H: OverlayHost>(
        &mut self,
        reading: &Reading,
        overlay: &mut Overlay<H>,
    ) -> RenderRequest {
        let request = self.state.apply(reading, &mut self.layout, &self.metrics);
        match request {
            RenderRequest::None => {}
            RenderRequest::Layout => overlay.request_layout(&self.state, &self.layout),
            RenderRequest::Repaint => overlay.invalidate(&self.state, &self.layout),
        }
        request
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn layout(&self) -> &LayoutSpec {
        &self.layout
    }
}

/// Drive the render context: consume readings, react to power events, exit on shutdown.
pub fn run_render_loop<O, H, M>(
    controller: &mut LifecycleController<O, H>,
    readings: &HandoffReceiver,
    context: &mut RenderContext<M>,
    events: &Receiver<ControlEvent>,
    running: &AtomicBool,
) where
    O: IdleOracle,
    H: OverlayHost,
    M: TextMetrics,
{
    let mut events = events.clone();
    while running.load(Ordering::SeqCst) {
        let mut notifier_closed = false;
        let mut shutdown_requested = false;
        channel::select! {
            recv(readings.inner()) -> msg => {
                if let Ok(reading) = msg {
                    let request = context.deliver(&reading, controller.overlay_mut());
                    log::trace!("reading {reading:?} -> {request:?}");
                }
            }
            recv(events) -> msg => match msg {
                Ok(ControlEvent::Power(event)) => {
                    if let Err(err) = controller.handle(event) {
                        log::error!("power event {event:?} failed: {err}");
                    }
                }
                Ok(ControlEvent::Shutdown) => shutdown_requested = true,
                Err(_) => notifier_closed = true,
            },
            default(SHUTDOWN_POLL) => {}
        }
        if shutdown_requested {
            log::info!("shutdown requested");
            break;
        }
        if notifier_closed {
            log::debug!("power notifier closed");
            events = channel::never();
        }
    }
    controller.shutdown();
}
