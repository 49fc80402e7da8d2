use dioxus::prelude::*;
use tracing::warn;

use crate::components::{Icon, PlayerEngine};
use crate::db::{save_settings, PlayerSettings};
use crate::engine::RendererKind;

fn choose(mut settings: Signal<PlayerSettings>, engine: &PlayerEngine, kind: RendererKind) {
    if settings.peek().renderer == kind {
        return;
    }
    settings.with_mut(|s| s.renderer = kind);
    if let Err(err) = save_settings(&settings.peek()) {
        warn!(error = %err, "visualizer choice not persisted");
    }
    engine.set_renderer_kind(kind);
}

fn option_class(active: bool) -> &'static str {
    if active {
        "wc-toggle-option active"
    } else {
        "wc-toggle-option"
    }
}

/// Switches every player between the analyzer spectrum and the synthetic wave.
#[component]
pub fn VisualizerToggle() -> Element {
    let settings = use_context::<Signal<PlayerSettings>>();
    let engine = use_context::<PlayerEngine>();
    let current = settings.read().renderer;
    let spectrum_label = RendererKind::Spectrum.label();
    let synthetic_label = RendererKind::Synthetic.label();

    rsx! {
        div { class: "wc-toggle", role: "group", aria_label: "Visualizer",
            button {
                class: option_class(current == RendererKind::Spectrum),
                r#type: "button",
                title: "Live frequency spectrum",
                onclick: {
                    let engine = engine.clone();
                    move |_| choose(settings, &engine, RendererKind::Spectrum)
                },
                Icon { name: "bars".to_string(), class: "wc-icon".to_string() }
                "{spectrum_label}"
            }
            button {
                class: option_class(current == RendererKind::Synthetic),
                r#type: "button",
                title: "Synthetic wave driven by the playback clock",
                onclick: {
                    let engine = engine.clone();
                    move |_| choose(settings, &engine, RendererKind::Synthetic)
                },
                Icon { name: "wave".to_string(), class: "wc-icon".to_string() }
                "{synthetic_label}"
            }
        }
    }
}
