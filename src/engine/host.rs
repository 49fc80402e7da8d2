//! Host platform seams.
//!
//! Everything the engine needs from the browser (media element, canvas, audio
//! graph, animation frames, DOM listeners) is expressed here as traits so the
//! coordination logic stays independent of `web-sys` and can be driven by a
//! fake host in tests.

use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;

use super::error::EngineError;
use super::widget::{PlayerWidget, WidgetEvent};

/// Future returned by asynchronous host calls (`play()`, context resume).
pub type HostFuture = LocalBoxFuture<'static, Result<(), EngineError>>;

/// Callback the host invokes when a widget's DOM or media element fires an event.
pub type EventSink = Rc<dyn Fn(WidgetId, WidgetEvent)>;

/// Stable identifier of one bound widget instance.
///
/// Widgets are not persistent across catalog re-renders, so every bind pass
/// hands out fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Cancellation handle returned by the per-frame scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Stroke style for one polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// Hue in degrees, always within `[0, 360)`.
    pub hue: f64,
    pub line_width: f64,
}

impl Stroke {
    pub fn css_color(&self) -> String {
        format!("hsl({:.1}, 90%, 60%)", self.hue)
    }
}

/// The platform's playable audio element.
pub trait MediaHandle {
    fn paused(&self) -> bool;
    fn ended(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Track length in seconds; `NaN` until metadata has loaded.
    fn duration(&self) -> f64;
    fn play(&self) -> HostFuture;
    fn pause(&self);
}

/// 2D drawing surface backing a widget's waveform.
pub trait DrawSurface {
    /// Current backing-store size in pixels. `(0.0, 0.0)` when detached or hidden.
    fn size(&self) -> (f64, f64);
    /// Resize the backing store to the container's current box.
    fn fit_to_container(&self);
    fn clear(&self);
    fn stroke_polyline(&self, points: &[Point], stroke: &Stroke);
}

/// A text-bearing element: the play control glyph or the time label.
pub trait TextSlot {
    fn set_text(&self, text: &str);
}

/// The clickable seek bar.
pub trait SeekSurface {
    fn width(&self) -> f64;
    fn set_progress(&self, fraction: f64);
}

/// A source node created from a media element.
pub trait SourceNode {
    fn disconnect(&self);
}

/// The shared audio-processing context plus its spectral analyzer.
pub trait AudioGraphBackend {
    type Media;
    type Source: SourceNode;

    /// Number of frequency bins the analyzer produces per read.
    fn bin_count(&self) -> usize;
    fn is_suspended(&self) -> bool;
    fn resume(&self) -> HostFuture;
    /// Overwrite `buffer` with the analyzer's current byte magnitudes.
    fn fill_frequency_data(&self, buffer: &mut [u8]);
    /// Create a source node for `media` and connect it to the analyzer.
    ///
    /// Platforms allow this exactly once per media element; callers go
    /// through [`SourceBindingRegistry`](super::SourceBindingRegistry).
    fn connect_source(&self, media: &Self::Media) -> Result<Self::Source, EngineError>;
}

/// Everything the engine consumes from the host platform.
pub trait Host: Sized + 'static {
    type Media: MediaHandle + 'static;
    type Surface: DrawSurface + 'static;
    type Text: TextSlot + 'static;
    type Seek: SeekSurface + 'static;
    type Graph: AudioGraphBackend<Media = Self::Media> + 'static;
    /// Guard owning a set of attached listeners; dropping it detaches them.
    type Listeners: 'static;

    fn create_graph(&self, fft_size: u32) -> Result<Self::Graph, EngineError>;

    fn request_frame(&self, step: Box<dyn FnOnce()>) -> Result<FrameHandle, EngineError>;
    fn cancel_frame(&self, handle: FrameHandle);

    fn attach_widget(&self, widget: &PlayerWidget<Self>, sink: EventSink) -> Self::Listeners;
    fn attach_resize(&self, on_resize: Rc<dyn Fn()>) -> Self::Listeners;

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}
