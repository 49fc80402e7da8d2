//! In-memory host used by the engine's unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;

use super::error::EngineError;
use super::host::{
    AudioGraphBackend, DrawSurface, EventSink, FrameHandle, Host, HostFuture, MediaHandle, Point,
    SeekSurface, SourceNode, Stroke, TextSlot, WidgetId,
};
use super::widget::{PlayerWidget, WidgetEvent, WidgetParts};

pub fn fake_parts(duration: f64) -> WidgetParts<FakeHost> {
    WidgetParts {
        media: FakeMedia::new(duration),
        control: FakeText::default(),
        time_label: FakeText::default(),
        canvas: FakeSurface::new(300.0, 60.0),
        seek: FakeSeek::new(300.0),
    }
}

pub fn fake_widget(id: u64, duration: f64) -> PlayerWidget<FakeHost> {
    PlayerWidget::new(WidgetId(id), fake_parts(duration))
}

type FrameStep = Box<dyn FnOnce()>;

pub struct FakeHost {
    frames: RefCell<Vec<(FrameHandle, FrameStep)>>,
    next_frame: Cell<i32>,
    cancelled: Cell<usize>,
    fail_frames: Cell<bool>,
    fail_graph: Cell<bool>,
    graphs: RefCell<Vec<FakeGraph>>,
    last_fft: Cell<Option<u32>>,
    resume_gate: RefCell<Option<oneshot::Receiver<()>>>,
    sinks: Rc<RefCell<HashMap<WidgetId, EventSink>>>,
    resize: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
    resize_attachments: Cell<usize>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl FakeHost {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            frames: RefCell::new(Vec::new()),
            next_frame: Cell::new(0),
            cancelled: Cell::new(0),
            fail_frames: Cell::new(false),
            fail_graph: Cell::new(false),
            graphs: RefCell::new(Vec::new()),
            last_fft: Cell::new(None),
            resume_gate: RefCell::new(None),
            sinks: Rc::new(RefCell::new(HashMap::new())),
            resize: Rc::new(RefCell::new(None)),
            resize_attachments: Cell::new(0),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// The next graph starts with a `resume()` that waits for the returned sender.
    pub fn hold_resume(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.resume_gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Run every frame scheduled so far; frames they schedule wait for the next call.
    pub fn run_frames(&self) {
        for step in self.steal_frames() {
            step();
        }
    }

    /// Take scheduled frames out of the queue without running them.
    pub fn steal_frames(&self) -> Vec<FrameStep> {
        self.frames
            .borrow_mut()
            .drain(..)
            .map(|(_, step)| step)
            .collect()
    }

    pub fn cancelled_frames(&self) -> usize {
        self.cancelled.get()
    }

    pub fn fail_frames(&self, fail: bool) {
        self.fail_frames.set(fail);
    }

    pub fn fail_graph(&self, fail: bool) {
        self.fail_graph.set(fail);
    }

    pub fn graphs_created(&self) -> usize {
        self.graphs.borrow().len()
    }

    pub fn last_graph(&self) -> Option<FakeGraph> {
        self.graphs.borrow().last().cloned()
    }

    pub fn last_fft_size(&self) -> Option<u32> {
        self.last_fft.get()
    }

    pub fn listener_count(&self) -> usize {
        self.sinks.borrow().len()
    }

    pub fn has_resize_listener(&self) -> bool {
        self.resize.borrow().is_some()
    }

    pub fn resize_attachments(&self) -> usize {
        self.resize_attachments.get()
    }

    pub fn fire(&self, id: WidgetId, event: WidgetEvent) {
        let sink = self.sinks.borrow().get(&id).cloned();
        if let Some(sink) = sink {
            sink(id, event);
        }
    }

    pub fn fire_resize(&self) {
        let callback = self.resize.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn run_tasks(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }
}

pub struct FakeListeners {
    release: Option<Box<dyn FnOnce()>>,
}

impl Drop for FakeListeners {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Host for FakeHost {
    type Media = FakeMedia;
    type Surface = FakeSurface;
    type Text = FakeText;
    type Seek = FakeSeek;
    type Graph = FakeGraph;
    type Listeners = FakeListeners;

    fn create_graph(&self, fft_size: u32) -> Result<FakeGraph, EngineError> {
        if self.fail_graph.get() {
            return Err(EngineError::GraphUnavailable("AudioContext blocked".into()));
        }
        let graph = FakeGraph::new(fft_size as usize / 2);
        if let Some(gate) = self.resume_gate.borrow_mut().take() {
            *graph.0.resume_gate.borrow_mut() = Some(gate);
        }
        self.last_fft.set(Some(fft_size));
        self.graphs.borrow_mut().push(graph.clone());
        Ok(graph)
    }

    fn request_frame(&self, step: FrameStep) -> Result<FrameHandle, EngineError> {
        if self.fail_frames.get() {
            return Err(EngineError::Scheduler("no window".into()));
        }
        let handle = FrameHandle(self.next_frame.get() + 1);
        self.next_frame.set(handle.0);
        self.frames.borrow_mut().push((handle, step));
        Ok(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.cancelled.set(self.cancelled.get() + 1);
        self.frames.borrow_mut().retain(|(queued, _)| *queued != handle);
    }

    fn attach_widget(&self, widget: &PlayerWidget<Self>, sink: EventSink) -> FakeListeners {
        let id = widget.id;
        self.sinks.borrow_mut().insert(id, sink);
        let sinks = Rc::clone(&self.sinks);
        FakeListeners {
            release: Some(Box::new(move || {
                sinks.borrow_mut().remove(&id);
            })),
        }
    }

    fn attach_resize(&self, on_resize: Rc<dyn Fn()>) -> FakeListeners {
        self.resize_attachments.set(self.resize_attachments.get() + 1);
        *self.resize.borrow_mut() = Some(on_resize);
        let slot = Rc::clone(&self.resize);
        FakeListeners {
            release: Some(Box::new(move || {
                slot.borrow_mut().take();
            })),
        }
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            panic!("fake executor shut down: {err}");
        }
    }
}

struct MediaState {
    paused: Cell<bool>,
    ended: Cell<bool>,
    time: Cell<f64>,
    duration: Cell<f64>,
    reject: Cell<bool>,
    hold: RefCell<Option<oneshot::Receiver<()>>>,
    play_calls: Cell<usize>,
    sources: Cell<usize>,
}

#[derive(Clone)]
pub struct FakeMedia(Rc<MediaState>);

impl FakeMedia {
    pub fn new(duration: f64) -> Self {
        Self(Rc::new(MediaState {
            paused: Cell::new(true),
            ended: Cell::new(false),
            time: Cell::new(0.0),
            duration: Cell::new(duration),
            reject: Cell::new(false),
            hold: RefCell::new(None),
            play_calls: Cell::new(0),
            sources: Cell::new(0),
        }))
    }

    pub fn set_playing(&self) {
        self.0.paused.set(false);
        self.0.ended.set(false);
    }

    /// Reach end of stream the way browsers do: ended and paused.
    pub fn finish(&self) {
        self.0.ended.set(true);
        self.0.paused.set(true);
        self.0.time.set(self.0.duration.get());
    }

    pub fn set_time(&self, seconds: f64) {
        self.0.time.set(seconds);
    }

    pub fn set_duration(&self, seconds: f64) {
        self.0.duration.set(seconds);
    }

    pub fn reject_play(&self, reject: bool) {
        self.0.reject.set(reject);
    }

    /// Make the next `play()` stay pending until the returned sender fires.
    pub fn hold_play(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.0.hold.borrow_mut() = Some(rx);
        tx
    }

    pub fn play_calls(&self) -> usize {
        self.0.play_calls.get()
    }

    pub fn source_count(&self) -> usize {
        self.0.sources.get()
    }
}

impl MediaHandle for FakeMedia {
    fn paused(&self) -> bool {
        self.0.paused.get()
    }

    fn ended(&self) -> bool {
        self.0.ended.get()
    }

    fn current_time(&self) -> f64 {
        self.0.time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.time.set(seconds);
        self.0.ended.set(false);
    }

    fn duration(&self) -> f64 {
        self.0.duration.get()
    }

    fn play(&self) -> HostFuture {
        self.0.play_calls.set(self.0.play_calls.get() + 1);
        if self.0.reject.get() {
            return Box::pin(future::ready(Err(EngineError::PlaybackRejected(
                "NotAllowedError".into(),
            ))));
        }
        self.set_playing();
        match self.0.hold.borrow_mut().take() {
            Some(gate) => Box::pin(async move {
                gate.await
                    .map_err(|_| EngineError::PlaybackRejected("AbortError".into()))
            }),
            None => Box::pin(future::ready(Ok(()))),
        }
    }

    fn pause(&self) {
        self.0.paused.set(true);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Stroke { points: Vec<Point>, hue: f64 },
}

struct SurfaceState {
    size: Cell<(f64, f64)>,
    container: Cell<(f64, f64)>,
    ops: RefCell<Vec<DrawOp>>,
    fits: Cell<usize>,
}

#[derive(Clone)]
pub struct FakeSurface(Rc<SurfaceState>);

impl FakeSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self(Rc::new(SurfaceState {
            size: Cell::new((width, height)),
            container: Cell::new((width, height)),
            ops: RefCell::new(Vec::new()),
            fits: Cell::new(0),
        }))
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.0.ops.borrow().clone()
    }

    pub fn stroke_count(&self) -> usize {
        self.0
            .ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, DrawOp::Stroke { .. }))
            .count()
    }

    pub fn fit_calls(&self) -> usize {
        self.0.fits.get()
    }
}

impl DrawSurface for FakeSurface {
    fn size(&self) -> (f64, f64) {
        self.0.size.get()
    }

    fn fit_to_container(&self) {
        self.0.size.set(self.0.container.get());
        self.0.fits.set(self.0.fits.get() + 1);
    }

    fn clear(&self) {
        self.0.ops.borrow_mut().push(DrawOp::Clear);
    }

    fn stroke_polyline(&self, points: &[Point], stroke: &Stroke) {
        self.0.ops.borrow_mut().push(DrawOp::Stroke {
            points: points.to_vec(),
            hue: stroke.hue,
        });
    }
}

#[derive(Clone, Default)]
pub struct FakeText(Rc<(RefCell<String>, Cell<usize>)>);

impl FakeText {
    pub fn text(&self) -> String {
        self.0 .0.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.0 .1.get()
    }
}

impl TextSlot for FakeText {
    fn set_text(&self, text: &str) {
        *self.0 .0.borrow_mut() = text.to_string();
        self.0 .1.set(self.0 .1.get() + 1);
    }
}

#[derive(Clone)]
pub struct FakeSeek(Rc<(Cell<f64>, Cell<f64>)>);

impl FakeSeek {
    pub fn new(width: f64) -> Self {
        Self(Rc::new((Cell::new(width), Cell::new(0.0))))
    }

    pub fn set_width(&self, width: f64) {
        self.0 .0.set(width);
    }

    pub fn progress(&self) -> f64 {
        self.0 .1.get()
    }
}

impl SeekSurface for FakeSeek {
    fn width(&self) -> f64 {
        self.0 .0.get()
    }

    fn set_progress(&self, fraction: f64) {
        self.0 .1.set(fraction);
    }
}

pub struct FakeSource {
    disconnected: Cell<bool>,
}

impl FakeSource {
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.get()
    }
}

impl SourceNode for FakeSource {
    fn disconnect(&self) {
        self.disconnected.set(true);
    }
}

struct GraphState {
    bins: usize,
    magnitudes: RefCell<Vec<u8>>,
    suspended: Cell<bool>,
    resume_calls: Cell<usize>,
    fill_calls: Cell<usize>,
    sources_created: Cell<usize>,
    fail_sources: Cell<bool>,
    resume_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

/// Analyzer double; starts suspended like a context created outside a user gesture.
#[derive(Clone)]
pub struct FakeGraph(Rc<GraphState>);

impl FakeGraph {
    pub fn new(bins: usize) -> Self {
        Self(Rc::new(GraphState {
            bins,
            magnitudes: RefCell::new(vec![0; bins]),
            suspended: Cell::new(true),
            resume_calls: Cell::new(0),
            fill_calls: Cell::new(0),
            sources_created: Cell::new(0),
            fail_sources: Cell::new(false),
            resume_gate: RefCell::new(None),
        }))
    }

    pub fn set_magnitudes(&self, magnitudes: Vec<u8>) {
        *self.0.magnitudes.borrow_mut() = magnitudes;
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.0.suspended.set(suspended);
    }

    pub fn resume_calls(&self) -> usize {
        self.0.resume_calls.get()
    }

    pub fn fill_calls(&self) -> usize {
        self.0.fill_calls.get()
    }

    pub fn sources_created(&self) -> usize {
        self.0.sources_created.get()
    }

    pub fn fail_sources(&self, fail: bool) {
        self.0.fail_sources.set(fail);
    }
}

impl AudioGraphBackend for FakeGraph {
    type Media = FakeMedia;
    type Source = FakeSource;

    fn bin_count(&self) -> usize {
        self.0.bins
    }

    fn is_suspended(&self) -> bool {
        self.0.suspended.get()
    }

    fn resume(&self) -> HostFuture {
        self.0.resume_calls.set(self.0.resume_calls.get() + 1);
        match self.0.resume_gate.borrow_mut().take() {
            Some(gate) => {
                let state = Rc::clone(&self.0);
                Box::pin(async move {
                    gate.await
                        .map_err(|_| EngineError::GraphUnavailable("resume aborted".into()))?;
                    state.suspended.set(false);
                    Ok(())
                })
            }
            None => {
                self.0.suspended.set(false);
                Box::pin(future::ready(Ok(())))
            }
        }
    }

    fn fill_frequency_data(&self, buffer: &mut [u8]) {
        self.0.fill_calls.set(self.0.fill_calls.get() + 1);
        let magnitudes = self.0.magnitudes.borrow();
        for (index, slot) in buffer.iter_mut().enumerate() {
            *slot = magnitudes.get(index).copied().unwrap_or(0);
        }
    }

    fn connect_source(&self, media: &FakeMedia) -> Result<FakeSource, EngineError> {
        if self.0.fail_sources.get() {
            return Err(EngineError::GraphUnavailable(
                "cross-origin media without CORS".into(),
            ));
        }
        if media.source_count() > 0 {
            return Err(EngineError::DuplicateSource);
        }
        media.0.sources.set(media.0.sources.get() + 1);
        self.0
            .sources_created
            .set(self.0.sources_created.get() + 1);
        Ok(FakeSource {
            disconnected: Cell::new(false),
        })
    }
}
