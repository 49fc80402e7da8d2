//! Browser implementation of [`Host`] on top of `web-sys`.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use tracing::warn;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    window, AnalyserNode, AudioContext, AudioContextState, CanvasRenderingContext2d, Document,
    Element, Event, EventTarget, HtmlAudioElement, HtmlCanvasElement, MediaElementAudioSourceNode,
    MouseEvent, Window,
};

use super::error::EngineError;
use super::host::{
    AudioGraphBackend, DrawSurface, EventSink, FrameHandle, Host, HostFuture, MediaHandle, Point,
    SeekSurface, SourceNode, Stroke, TextSlot,
};
use super::widget::{card_element_id, CardElement, PlayerWidget, WidgetEvent, WidgetParts};

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

pub struct WebHost {
    window: Window,
}

impl WebHost {
    pub fn new() -> Option<Self> {
        window().map(|window| Self { window })
    }

    fn document(&self) -> Option<Document> {
        self.window.document()
    }

    /// Look up the DOM handles of cards `0..count` rendered under `generation`.
    ///
    /// Cards whose elements are missing (already replaced by a newer render)
    /// are skipped.
    pub fn collect_widget_parts(&self, generation: u64, count: usize) -> Vec<WidgetParts<Self>> {
        let Some(document) = self.document() else {
            return Vec::new();
        };
        let lookup = |index: usize, element: CardElement| {
            document.get_element_by_id(&card_element_id(generation, index, element))
        };

        let mut parts = Vec::with_capacity(count);
        for index in 0..count {
            let media = lookup(index, CardElement::Audio)
                .and_then(|el| el.dyn_into::<HtmlAudioElement>().ok());
            let canvas = lookup(index, CardElement::Canvas)
                .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
                .and_then(WebCanvas::new);
            let control = lookup(index, CardElement::Control);
            let time = lookup(index, CardElement::Time);
            let seek = lookup(index, CardElement::Seek);
            let fill = lookup(index, CardElement::Fill);

            match (media, canvas, control, time, seek, fill) {
                (Some(media), Some(canvas), Some(control), Some(time), Some(track), Some(fill)) => {
                    parts.push(WidgetParts {
                        media: WebMedia(media),
                        control: WebText(control),
                        time_label: WebText(time),
                        canvas,
                        seek: WebSeek { track, fill },
                    })
                }
                _ => warn!(generation, index, "card elements missing, skipping"),
            }
        }
        parts
    }
}

/// Listeners attached for one widget (or the window); removed on drop.
pub struct WebListeners {
    bindings: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

impl WebListeners {
    fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    fn listen(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        match target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            Ok(()) => self.bindings.push((target.clone(), event, closure)),
            Err(err) => warn!(event, error = %js_message(&err), "failed to attach listener"),
        }
    }
}

impl Drop for WebListeners {
    fn drop(&mut self) {
        for (target, event, closure) in self.bindings.drain(..) {
            let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

impl Host for WebHost {
    type Media = WebMedia;
    type Surface = WebCanvas;
    type Text = WebText;
    type Seek = WebSeek;
    type Graph = WebGraph;
    type Listeners = WebListeners;

    fn create_graph(&self, fft_size: u32) -> Result<WebGraph, EngineError> {
        let unavailable = |err: JsValue| EngineError::GraphUnavailable(js_message(&err));
        let context = AudioContext::new().map_err(unavailable)?;
        let analyser = context.create_analyser().map_err(unavailable)?;
        analyser.set_fft_size(fft_size);
        analyser
            .connect_with_audio_node(&context.destination())
            .map_err(unavailable)?;
        Ok(WebGraph { context, analyser })
    }

    fn request_frame(&self, step: Box<dyn FnOnce()>) -> Result<FrameHandle, EngineError> {
        let callback = Closure::once_into_js(move || step());
        self.window
            .request_animation_frame(callback.unchecked_ref())
            .map(FrameHandle)
            .map_err(|err| EngineError::Scheduler(js_message(&err)))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0);
    }

    fn attach_widget(&self, widget: &PlayerWidget<Self>, sink: EventSink) -> WebListeners {
        let id = widget.id;
        let mut listeners = WebListeners::new();

        let on_control = Rc::clone(&sink);
        listeners.listen(&widget.control.0, "click", move |_| {
            on_control(id, WidgetEvent::ControlClicked)
        });

        let on_seek = Rc::clone(&sink);
        let track = widget.seek.track.clone();
        listeners.listen(&widget.seek.track, "click", move |event: Event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                let left = track.get_bounding_client_rect().left();
                on_seek(
                    id,
                    WidgetEvent::SeekClicked {
                        offset_x: f64::from(mouse.client_x()) - left,
                    },
                );
            }
        });

        let media: &EventTarget = &widget.media.0;
        for (name, event) in [
            ("ended", WidgetEvent::Ended),
            ("pause", WidgetEvent::Paused),
            ("loadedmetadata", WidgetEvent::MetadataLoaded),
            ("timeupdate", WidgetEvent::TimeUpdate),
        ] {
            let sink = Rc::clone(&sink);
            listeners.listen(media, name, move |_| sink(id, event));
        }
        listeners
    }

    fn attach_resize(&self, on_resize: Rc<dyn Fn()>) -> WebListeners {
        let mut listeners = WebListeners::new();
        listeners.listen(&self.window, "resize", move |_| on_resize());
        listeners
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

pub struct WebMedia(HtmlAudioElement);

impl MediaHandle for WebMedia {
    fn paused(&self) -> bool {
        self.0.paused()
    }

    fn ended(&self) -> bool {
        self.0.ended()
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn play(&self) -> HostFuture {
        let started = self.0.play();
        Box::pin(async move {
            let rejected = |err: JsValue| EngineError::PlaybackRejected(js_message(&err));
            let promise = started.map_err(rejected)?;
            JsFuture::from(promise).await.map(|_| ()).map_err(rejected)
        })
    }

    fn pause(&self) {
        let _ = self.0.pause();
    }
}

pub struct WebCanvas {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebCanvas {
    fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, context })
    }
}

impl DrawSurface for WebCanvas {
    fn size(&self) -> (f64, f64) {
        if !self.canvas.is_connected() {
            return (0.0, 0.0);
        }
        (f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn fit_to_container(&self) {
        let width = self
            .canvas
            .parent_element()
            .map(|parent| parent.client_width())
            .unwrap_or(0);
        let height = self.canvas.client_height();
        self.canvas.set_width(width.max(0) as u32);
        self.canvas.set_height(height.max(0) as u32);
    }

    fn clear(&self) {
        let (width, height) = self.size();
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    fn stroke_polyline(&self, points: &[Point], stroke: &Stroke) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context.set_line_width(stroke.line_width);
        self.context.set_stroke_style_str(&stroke.css_color());
        self.context.stroke();
    }
}

pub struct WebText(Element);

impl TextSlot for WebText {
    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }
}

pub struct WebSeek {
    track: Element,
    fill: Element,
}

impl SeekSurface for WebSeek {
    fn width(&self) -> f64 {
        self.track.get_bounding_client_rect().width()
    }

    fn set_progress(&self, fraction: f64) {
        let _ = self
            .fill
            .set_attribute("style", &format!("width: {:.2}%", fraction * 100.0));
    }
}

pub struct WebSource(MediaElementAudioSourceNode);

impl SourceNode for WebSource {
    fn disconnect(&self) {
        let _ = self.0.disconnect();
    }
}

pub struct WebGraph {
    context: AudioContext,
    analyser: AnalyserNode,
}

impl AudioGraphBackend for WebGraph {
    type Media = WebMedia;
    type Source = WebSource;

    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn is_suspended(&self) -> bool {
        self.context.state() == AudioContextState::Suspended
    }

    fn resume(&self) -> HostFuture {
        let resumed = self.context.resume();
        Box::pin(async move {
            let unavailable = |err: JsValue| EngineError::GraphUnavailable(js_message(&err));
            let promise = resumed.map_err(unavailable)?;
            JsFuture::from(promise).await.map(|_| ()).map_err(unavailable)
        })
    }

    fn fill_frequency_data(&self, buffer: &mut [u8]) {
        self.analyser.get_byte_frequency_data(buffer);
    }

    fn connect_source(&self, media: &WebMedia) -> Result<WebSource, EngineError> {
        let source = self
            .context
            .create_media_element_source(&media.0)
            .map_err(|err| {
                let message = js_message(&err);
                if message.contains("InvalidStateError") {
                    EngineError::DuplicateSource
                } else {
                    EngineError::GraphUnavailable(message)
                }
            })?;
        source
            .connect_with_audio_node(&self.analyser)
            .map_err(|err| EngineError::GraphUnavailable(js_message(&err)))?;
        Ok(WebSource(source))
    }
}
