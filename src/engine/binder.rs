//! Wires freshly rendered widget handles to the coordinator.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::debug;

use super::coordinator::{PlaybackCoordinator, PlayOutcome};
use super::host::{DrawSurface, EventSink, Host, MediaHandle, SeekSurface, WidgetId};
use super::widget::{PlayerWidget, WidgetEvent, WidgetParts};

/// Fraction of the seek surface covered by a click `offset_x` pixels from its left edge.
pub fn click_fraction(offset_x: f64, width: f64) -> Option<f64> {
    if !(width.is_finite() && width > 0.0) || !offset_x.is_finite() {
        return None;
    }
    Some((offset_x / width).clamp(0.0, 1.0))
}

/// Binds each (re-)rendered set of cards and routes their events.
///
/// Every catalog re-render replaces the card DOM, so [`rebind`](Self::rebind)
/// first disposes the whole previous set: listeners are detached, source
/// bindings evicted and the coordinator forgets the old ids.
pub struct PlayerWidgetBinder<H: Host> {
    me: Weak<Self>,
    coordinator: Rc<PlaybackCoordinator<H>>,
    next_id: Cell<u64>,
    bound: RefCell<Vec<(WidgetId, H::Listeners)>>,
    resize: RefCell<Option<H::Listeners>>,
}

impl<H: Host> PlayerWidgetBinder<H> {
    pub fn new(coordinator: Rc<PlaybackCoordinator<H>>) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            coordinator,
            next_id: Cell::new(0),
            bound: RefCell::new(Vec::new()),
            resize: RefCell::new(None),
        })
    }

    pub fn coordinator(&self) -> &Rc<PlaybackCoordinator<H>> {
        &self.coordinator
    }

    pub fn bound_ids(&self) -> Vec<WidgetId> {
        self.bound.borrow().iter().map(|(id, _)| *id).collect()
    }

    /// Replace the bound widget set with `parts`, returning the new ids in order.
    pub fn rebind(&self, parts: Vec<WidgetParts<H>>) -> Vec<WidgetId> {
        self.release_all();
        self.ensure_resize_listener();

        let host = Rc::clone(self.coordinator.host());
        let sink = self.event_sink();
        let mut ids = Vec::with_capacity(parts.len());
        for part in parts {
            let id = self.allocate_id();
            let widget = PlayerWidget::new(id, part);
            widget.canvas.fit_to_container();
            let listeners = host.attach_widget(&widget, Rc::clone(&sink));
            self.coordinator.register(widget);
            self.bound.borrow_mut().push((id, listeners));
            ids.push(id);
        }
        debug!(count = ids.len(), "player widgets bound");
        ids
    }

    /// Dispose every bound widget and detach its listeners.
    pub fn release_all(&self) {
        let previous: Vec<(WidgetId, H::Listeners)> = self.bound.borrow_mut().drain(..).collect();
        if previous.is_empty() {
            return;
        }
        debug!(count = previous.len(), "releasing player widgets");
        for (id, listeners) in previous {
            self.coordinator.dispose(id);
            drop(listeners);
        }
    }

    /// Translate one DOM/media event into a coordinator call.
    pub fn dispatch(&self, id: WidgetId, event: WidgetEvent) {
        let Some(widget) = self.coordinator.widget(id) else {
            return;
        };
        match event {
            WidgetEvent::ControlClicked => {
                if widget.media.paused() {
                    self.spawn_play(id);
                } else {
                    self.coordinator.request_pause(id);
                }
            }
            WidgetEvent::SeekClicked { offset_x } => {
                if let Some(fraction) = click_fraction(offset_x, widget.seek.width()) {
                    self.coordinator.seek(id, fraction);
                }
            }
            WidgetEvent::Ended => {
                self.coordinator.handle_ended(id);
                widget.refresh_time();
            }
            WidgetEvent::Paused => self.coordinator.handle_paused(id),
            WidgetEvent::MetadataLoaded | WidgetEvent::TimeUpdate => widget.refresh_time(),
        }
    }

    /// Re-fit every bound canvas to its container.
    pub fn resize_all(&self) {
        for id in self.bound_ids() {
            if let Some(widget) = self.coordinator.widget(id) {
                widget.canvas.fit_to_container();
            }
        }
    }

    fn spawn_play(&self, id: WidgetId) {
        let coordinator = Rc::clone(&self.coordinator);
        self.coordinator.host().spawn_local(Box::pin(async move {
            let outcome = coordinator.request_play(id).await;
            if outcome != PlayOutcome::Missing {
                debug!(%id, ?outcome, "play request settled");
            }
        }));
    }

    fn ensure_resize_listener(&self) {
        if self.resize.borrow().is_some() {
            return;
        }
        let me = self.me.clone();
        let listeners = self
            .coordinator
            .host()
            .attach_resize(Rc::new(move || {
                if let Some(binder) = me.upgrade() {
                    binder.resize_all();
                }
            }));
        *self.resize.borrow_mut() = Some(listeners);
    }

    fn event_sink(&self) -> EventSink {
        let me = self.me.clone();
        Rc::new(move |id, event| {
            if let Some(binder) = me.upgrade() {
                binder.dispatch(id, event);
            }
        })
    }

    fn allocate_id(&self) -> WidgetId {
        let next = self.next_id.get() + 1;
        self.next_id.set(next);
        WidgetId(next)
    }
}

impl<H: Host> Drop for PlayerWidgetBinder<H> {
    fn drop(&mut self) {
        self.release_all();
    }
}
