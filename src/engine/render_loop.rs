//! Cancellable, self-rescheduling per-frame loop bound to one widget.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use super::audio_graph::AudioGraphState;
use super::host::{FrameHandle, Host, MediaHandle, WidgetId};
use super::renderer::{RendererKind, WaveformRenderer};
use super::widget::PlayerWidget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

struct Activation<H: Host> {
    widget: Rc<PlayerWidget<H>>,
    renderer: WaveformRenderer,
    graph: Option<Rc<AudioGraphState<H::Graph>>>,
}

struct LoopShared<H: Host> {
    host: Rc<H>,
    /// Cancellation token. Every start/stop bumps it; a frame scheduled under
    /// an older value returns without drawing or rescheduling.
    generation: Cell<u64>,
    pending: Cell<Option<FrameHandle>>,
    active: RefCell<Option<Activation<H>>>,
}

/// The single render loop shared by all widgets.
pub struct RenderLoop<H: Host> {
    shared: Rc<LoopShared<H>>,
}

impl<H: Host> RenderLoop<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self {
            shared: Rc::new(LoopShared {
                host,
                generation: Cell::new(0),
                pending: Cell::new(None),
                active: RefCell::new(None),
            }),
        }
    }

    /// Bind `widget` and schedule its first frame, cancelling any previous activation.
    pub fn start(
        &self,
        widget: Rc<PlayerWidget<H>>,
        renderer: WaveformRenderer,
        graph: Option<Rc<AudioGraphState<H::Graph>>>,
    ) {
        let generation = self.invalidate();
        debug!(widget = %widget.id, renderer = renderer.kind().label(), "render loop started");
        *self.shared.active.borrow_mut() = Some(Activation {
            widget,
            renderer,
            graph,
        });
        schedule(&self.shared, generation);
    }

    /// Cancel the scheduled frame and go idle. Safe to call when already idle.
    pub fn stop(&self) {
        self.invalidate();
        if let Some(previous) = self.shared.active.borrow_mut().take() {
            debug!(widget = %previous.widget.id, "render loop stopped");
        }
    }

    pub fn state(&self) -> LoopState {
        if self.shared.active.borrow().is_some() {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    pub fn bound_widget(&self) -> Option<WidgetId> {
        self.shared
            .active
            .borrow()
            .as_ref()
            .map(|activation| activation.widget.id)
    }

    pub fn renderer_kind(&self) -> Option<RendererKind> {
        self.shared
            .active
            .borrow()
            .as_ref()
            .map(|activation| activation.renderer.kind())
    }

    fn invalidate(&self) -> u64 {
        let next = self.shared.generation.get().wrapping_add(1);
        self.shared.generation.set(next);
        if let Some(handle) = self.shared.pending.take() {
            self.shared.host.cancel_frame(handle);
        }
        next
    }
}

fn schedule<H: Host>(shared: &Rc<LoopShared<H>>, generation: u64) {
    let next = Rc::clone(shared);
    let step = Box::new(move || run_frame(&next, generation));
    match shared.host.request_frame(step) {
        Ok(handle) => shared.pending.set(Some(handle)),
        Err(err) => {
            warn!(error = %err, "render loop could not schedule a frame");
            shared.active.borrow_mut().take();
        }
    }
}

fn run_frame<H: Host>(shared: &Rc<LoopShared<H>>, generation: u64) {
    if shared.generation.get() != generation {
        return;
    }
    shared.pending.set(None);

    let keep_running = {
        let mut active = shared.active.borrow_mut();
        match active.as_mut() {
            Some(activation) => {
                let media = &activation.widget.media;
                if media.paused() || media.ended() {
                    false
                } else {
                    activation.renderer.draw_frame(
                        &activation.widget.canvas,
                        media,
                        activation.graph.as_deref(),
                    );
                    true
                }
            }
            None => false,
        }
    };

    if keep_running {
        schedule(shared, generation);
    } else if let Some(finished) = shared.active.borrow_mut().take() {
        debug!(widget = %finished.widget.id, "render loop went idle");
    }
}
