//! Playback coordination and waveform rendering.
//!
//! The engine owns the rule that at most one player card is audible, the
//! lazily created audio graph, the per-media source bindings and the single
//! render loop. All browser access goes through [`host::Host`].

// Natively only the tests drive the engine.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

pub mod audio_graph;
pub mod binder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod render_loop;
pub mod renderer;
pub mod source_registry;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod web_host;

#[cfg(test)]
pub(crate) mod testing;

pub use binder::PlayerWidgetBinder;
pub use config::EngineConfig;
pub use coordinator::{PlayOutcome, PlaybackCoordinator};
pub use error::EngineError;
pub use host::{Host, WidgetId};
pub use render_loop::LoopState;
pub use renderer::RendererKind;
pub use source_registry::SourceBindingRegistry;
pub use widget::{card_element_id, CardElement, ControlGlyph, WidgetEvent, WidgetParts};
