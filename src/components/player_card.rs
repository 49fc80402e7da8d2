use dioxus::prelude::*;

use crate::api::Track;
use crate::components::Icon;
use crate::engine::{card_element_id, CardElement, ControlGlyph};

/// Markup for one track. Behavior is attached afterwards by the engine,
/// which finds these elements by id.
#[component]
pub fn PlayerCard(generation: u64, index: usize, track: Track) -> Element {
    let id = |element: CardElement| card_element_id(generation, index, element);
    let idle_glyph = ControlGlyph::Paused.as_str();

    rsx! {
        article { class: "wc-card",
            header { class: "wc-card-header",
                Icon { name: "music".to_string(), class: "wc-icon".to_string() }
                h3 { class: "wc-title", title: "{track.file_name}", "{track.display_name}" }
            }
            audio {
                id: id(CardElement::Audio),
                src: "{track.media_url}",
                preload: "metadata",
                crossorigin: "anonymous",
            }
            div { class: "wc-controls",
                button {
                    id: id(CardElement::Control),
                    class: "wc-control",
                    r#type: "button",
                    aria_label: "Play or pause {track.display_name}",
                    "{idle_glyph}"
                }
                span { id: id(CardElement::Time), class: "wc-time", "0:00 / 0:00" }
            }
            div { class: "wc-wave",
                canvas { id: id(CardElement::Canvas), class: "wc-canvas" }
            }
            div { id: id(CardElement::Seek), class: "wc-seek",
                div { id: id(CardElement::Fill), class: "wc-seek-fill" }
            }
            a {
                class: "wc-download",
                href: "{track.media_url}",
                download: "{track.file_name}",
                Icon { name: "download".to_string(), class: "wc-icon".to_string() }
                "Download"
            }
        }
    }
}
