//! Playback coordinator: the only owner of "which widget is playing".

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::audio_graph::{AudioGraphManager, AudioGraphState};
use super::config::EngineConfig;
use super::host::{AudioGraphBackend, Host, MediaHandle, WidgetId};
use super::render_loop::{LoopState, RenderLoop};
use super::renderer::{RendererKind, WaveformRenderer};
use super::source_registry::SourceBindingRegistry;
use super::widget::{ControlGlyph, PlayerWidget};

/// Result of a [`PlaybackCoordinator::request_play`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started and the render loop runs with this renderer.
    Playing(RendererKind),
    /// The platform refused to start playback; the control stays paused.
    Rejected,
    /// A newer play/pause request for the same slot won the race.
    Superseded,
    /// The widget is not (or no longer) registered.
    Missing,
}

type SourceOf<H> = <<H as Host>::Graph as AudioGraphBackend>::Source;

/// Enforces that at most one registered widget is audible at any instant.
pub struct PlaybackCoordinator<H: Host> {
    host: Rc<H>,
    config: EngineConfig,
    renderer_kind: Cell<RendererKind>,
    widgets: RefCell<BTreeMap<WidgetId, Rc<PlayerWidget<H>>>>,
    active: Cell<Option<WidgetId>>,
    play_ticket: Cell<u64>,
    pending_play: Cell<Option<WidgetId>>,
    graph: AudioGraphManager<H>,
    sources: SourceBindingRegistry<SourceOf<H>>,
    render_loop: RenderLoop<H>,
}

impl<H: Host> PlaybackCoordinator<H> {
    pub fn new(host: Rc<H>, config: EngineConfig) -> Self {
        let config = config.normalized();
        Self {
            render_loop: RenderLoop::new(Rc::clone(&host)),
            graph: AudioGraphManager::new(config.fft_size),
            sources: SourceBindingRegistry::new(),
            renderer_kind: Cell::new(config.renderer),
            widgets: RefCell::new(BTreeMap::new()),
            active: Cell::new(None),
            play_ticket: Cell::new(0),
            pending_play: Cell::new(None),
            host,
            config,
        }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// Track a freshly bound widget, showing the paused glyph and its time label.
    pub fn register(&self, widget: PlayerWidget<H>) -> Rc<PlayerWidget<H>> {
        widget.show_glyph(ControlGlyph::Paused);
        widget.refresh_time();
        let widget = Rc::new(widget);
        self.widgets
            .borrow_mut()
            .insert(widget.id, Rc::clone(&widget));
        widget
    }

    /// Forget a widget whose DOM is being discarded, releasing its source binding.
    pub fn dispose(&self, id: WidgetId) -> bool {
        if self.pending_play.get() == Some(id) {
            self.supersede_pending();
        }
        if self.active.get() == Some(id) {
            self.active.set(None);
        }
        if self.render_loop.bound_widget() == Some(id) {
            self.render_loop.stop();
        }
        let removed = self.widgets.borrow_mut().remove(&id);
        self.sources.dispose(id);
        match removed {
            Some(widget) => {
                // Detached media elements keep playing unless told otherwise.
                if !widget.media.paused() {
                    widget.media.pause();
                }
                true
            }
            None => false,
        }
    }

    pub fn widget(&self, id: WidgetId) -> Option<Rc<PlayerWidget<H>>> {
        self.widgets.borrow().get(&id).map(Rc::clone)
    }

    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.widgets.borrow().keys().copied().collect()
    }

    pub fn active_widget(&self) -> Option<WidgetId> {
        self.active.get()
    }

    pub fn loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn loop_widget(&self) -> Option<WidgetId> {
        self.render_loop.bound_widget()
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.renderer_kind.get()
    }

    /// Renderer the running loop actually uses (may differ after a fallback).
    pub fn loop_renderer(&self) -> Option<RendererKind> {
        self.render_loop.renderer_kind()
    }

    pub fn source_binding_count(&self) -> usize {
        self.sources.len()
    }

    /// Pause every other widget, then start `id` and bind the render loop to it.
    pub async fn request_play(&self, id: WidgetId) -> PlayOutcome {
        let Some(widget) = self.widget(id) else {
            warn!(%id, "play requested for an unknown widget");
            return PlayOutcome::Missing;
        };

        if self.active.get() == Some(id) && !widget.media.paused() {
            return PlayOutcome::Playing(
                self.render_loop
                    .renderer_kind()
                    .unwrap_or(self.renderer_kind.get()),
            );
        }

        let ticket = self.supersede_pending();
        self.pending_play.set(Some(id));
        self.pause_others(id);

        let requested = self.renderer_kind.get();
        let prepared = requested.needs_graph() || self.sources.contains(id);
        let mut graph = if prepared {
            self.prepare_graph(&widget).await
        } else {
            None
        };
        if !self.still_current(ticket, id) {
            return PlayOutcome::Superseded;
        }

        if let Err(err) = widget.media.play().await {
            widget.show_glyph(ControlGlyph::Paused);
            // A newer request paused this element, which aborts its pending play.
            if !self.still_current(ticket, id) {
                debug!(%id, error = %err, "superseded play settled");
                return PlayOutcome::Superseded;
            }
            warn!(%id, error = %err, "playback rejected");
            self.pending_play.set(None);
            return PlayOutcome::Rejected;
        }
        if !self.still_current(ticket, id) {
            widget.media.pause();
            widget.show_glyph(ControlGlyph::Paused);
            return PlayOutcome::Superseded;
        }

        // The visualizer may have been switched while `play()` was pending.
        let requested = self.renderer_kind.get();
        if requested.needs_graph() && !prepared {
            graph = self.prepare_graph(&widget).await;
            if !self.still_current(ticket, id) {
                widget.media.pause();
                widget.show_glyph(ControlGlyph::Paused);
                return PlayOutcome::Superseded;
            }
        }
        let kind = effective_kind(requested, graph.is_some());

        self.pending_play.set(None);
        widget.show_glyph(ControlGlyph::Playing);
        self.active.set(Some(id));
        self.render_loop.start(
            Rc::clone(&widget),
            WaveformRenderer::for_kind(kind, &self.config),
            graph,
        );
        info!(%id, renderer = kind.label(), "playback started");
        PlayOutcome::Playing(kind)
    }

    pub fn request_pause(&self, id: WidgetId) {
        self.settle_paused(id, true);
    }

    /// The media element reached end of stream.
    pub fn handle_ended(&self, id: WidgetId) {
        debug!(%id, "playback ended");
        self.settle_paused(id, false);
    }

    /// The media element reported `pause` on its own (OS media keys, device change).
    pub fn handle_paused(&self, id: WidgetId) {
        if self.active.get() != Some(id) {
            return;
        }
        let Some(widget) = self.widget(id) else {
            return;
        };
        if widget.media.paused() {
            self.settle_paused(id, false);
        }
    }

    /// Jump to `fraction` of the track. No-op until the duration is known.
    pub fn seek(&self, id: WidgetId, fraction: f64) -> bool {
        let Some(widget) = self.widget(id) else {
            return false;
        };
        let duration = widget.media.duration();
        if !duration.is_finite() || !fraction.is_finite() {
            return false;
        }
        widget
            .media
            .set_current_time(fraction.clamp(0.0, 1.0) * duration);
        widget.refresh_time();
        true
    }

    /// Switch visualization; an active widget continues with the new renderer.
    pub async fn set_renderer_kind(&self, kind: RendererKind) {
        if self.renderer_kind.replace(kind) == kind {
            return;
        }
        info!(renderer = kind.label(), "renderer changed");

        let Some(id) = self.active.get() else {
            return;
        };
        let Some(widget) = self.widget(id) else {
            return;
        };
        let graph = if kind.needs_graph() || self.sources.contains(id) {
            self.prepare_graph(&widget).await
        } else {
            None
        };
        if self.active.get() != Some(id) || widget.media.paused() {
            return;
        }
        let effective = effective_kind(kind, graph.is_some());
        self.render_loop.start(
            widget,
            WaveformRenderer::for_kind(effective, &self.config),
            graph,
        );
    }

    fn settle_paused(&self, id: WidgetId, pause_media: bool) {
        if self.pending_play.get() == Some(id) {
            self.supersede_pending();
        }
        let Some(widget) = self.widget(id) else {
            return;
        };
        if pause_media && !widget.media.paused() {
            widget.media.pause();
        }
        widget.show_glyph(ControlGlyph::Paused);
        if self.active.get() == Some(id) {
            self.active.set(None);
        }
        if self.render_loop.bound_widget() == Some(id) {
            self.render_loop.stop();
        }
    }

    fn pause_others(&self, keep: WidgetId) {
        let previously_active = self.active.get();
        if previously_active.is_some_and(|active| active != keep) {
            self.active.set(None);
            self.render_loop.stop();
        }
        for (id, widget) in self.widgets.borrow().iter() {
            if *id == keep {
                continue;
            }
            let was_playing = !widget.media.paused();
            if was_playing {
                widget.media.pause();
            }
            if was_playing || previously_active == Some(*id) {
                widget.show_glyph(ControlGlyph::Paused);
            }
        }
    }

    /// Resume the shared context and connect the widget's source to the analyzer.
    async fn prepare_graph(&self, widget: &PlayerWidget<H>) -> Option<Rc<AudioGraphState<H::Graph>>> {
        let graph = match self.graph.ensure_graph(&self.host) {
            Ok(graph) => graph,
            Err(err) => {
                warn!(error = %err, "visualizer falls back to synthetic waveform");
                return None;
            }
        };
        if let Err(err) = self.graph.resume_if_suspended().await {
            warn!(error = %err, "visualizer falls back to synthetic waveform");
            return None;
        }
        match self
            .sources
            .get_or_create_source(widget.id, &widget.media, &graph)
        {
            Ok(_) => Some(graph),
            Err(err) => {
                warn!(id = %widget.id, error = %err, "visualizer falls back to synthetic waveform");
                None
            }
        }
    }

    fn supersede_pending(&self) -> u64 {
        let next = self.play_ticket.get().wrapping_add(1);
        self.play_ticket.set(next);
        self.pending_play.set(None);
        next
    }

    fn still_current(&self, ticket: u64, id: WidgetId) -> bool {
        self.play_ticket.get() == ticket && self.widgets.borrow().contains_key(&id)
    }
}

fn effective_kind(requested: RendererKind, graph_ready: bool) -> RendererKind {
    if requested.needs_graph() && !graph_ready {
        RendererKind::Synthetic
    } else {
        requested
    }
}
