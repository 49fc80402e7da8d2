use dioxus::prelude::*;

use crate::components::{CatalogView, PlayerEngine, VisualizerToggle};
use crate::db::load_settings;

#[component]
pub fn AppShell() -> Element {
    let settings = use_signal(load_settings);
    let engine = use_hook(|| PlayerEngine::new(settings.peek().engine_config()));

    // Provide state via context
    use_context_provider(|| settings);
    use_context_provider(|| engine.clone());

    let source = settings.read().catalog.clone();

    rsx! {
        div { class: "wc-app",
            header { class: "wc-header",
                div {
                    h1 { class: "wc-brand", "Wavecard" }
                    p { class: "wc-subtitle", "{source.owner}/{source.repo}/{source.path}" }
                }
                VisualizerToggle {}
            }
            main { class: "wc-main", CatalogView {} }
        }
    }
}
