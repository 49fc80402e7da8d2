use std::cell::Cell;
use std::rc::Rc;

use dioxus::prelude::*;
use tracing::warn;

use crate::api::{count_label, filter_tracks, Track};
use crate::components::{Icon, PlayerCard, PlayerEngine};
use crate::db::PlayerSettings;

const SEARCH_DEBOUNCE_MS: u64 = 150;

#[cfg(not(target_arch = "wasm32"))]
async fn delay_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

#[cfg(target_arch = "wasm32")]
async fn delay_ms(ms: u64) {
    gloo_timers::future::TimeoutFuture::new(ms as u32).await;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoadState {
    Loading,
    Failed,
    Ready,
}

/// The visible tracks plus the render generation their cards are keyed by.
#[derive(Debug, Clone, PartialEq)]
struct RenderedList {
    generation: u64,
    tracks: Vec<Track>,
}

#[component]
pub fn CatalogView() -> Element {
    let settings = use_context::<Signal<PlayerSettings>>();
    let engine = use_context::<PlayerEngine>();

    let catalog = use_signal(Vec::<Track>::new);
    let load_state = use_signal(|| LoadState::Loading);
    let mut search_query = use_signal(String::new);
    let debounced_query = use_signal(String::new);
    let debounce_generation = use_signal(|| 0u64);
    let render_counter = use_hook(|| Rc::new(Cell::new(0u64)));

    // Load the catalog once.
    use_effect(move || {
        let client = settings.peek().catalog_client();
        let mut catalog = catalog;
        let mut load_state = load_state;
        spawn(async move {
            match client.fetch_tracks().await {
                Ok(tracks) => {
                    catalog.set(tracks);
                    load_state.set(LoadState::Ready);
                }
                Err(err) => {
                    warn!(error = %err, "catalog load failed");
                    load_state.set(LoadState::Failed);
                }
            }
        });
    });

    // Debounce typing so every keystroke does not rebuild the card list.
    {
        let mut debounce_generation = debounce_generation;
        use_effect(move || {
            let query = search_query();
            debounce_generation.with_mut(|value| *value = value.saturating_add(1));
            let generation = *debounce_generation.peek();

            let mut debounced_query = debounced_query;
            if query.trim().is_empty() {
                debounced_query.set(String::new());
                return;
            }
            spawn(async move {
                delay_ms(SEARCH_DEBOUNCE_MS).await;
                if *debounce_generation.peek() != generation {
                    return;
                }
                debounced_query.set(query);
            });
        });
    }

    // Every new visible list gets a fresh generation, so its cards get fresh DOM.
    let rendered = {
        let render_counter = render_counter.clone();
        use_memo(move || {
            let tracks = filter_tracks(&catalog.read(), &debounced_query());
            let generation = render_counter.get().wrapping_add(1);
            render_counter.set(generation);
            RenderedList { generation, tracks }
        })
    };

    // Hand the new cards to the engine once they are in the DOM.
    {
        let engine = engine.clone();
        let render_counter = render_counter.clone();
        use_effect(move || {
            let (generation, count) = {
                let list = rendered.read();
                (list.generation, list.tracks.len())
            };
            let engine = engine.clone();
            let render_counter = render_counter.clone();
            spawn(async move {
                delay_ms(0).await;
                if render_counter.get() != generation {
                    return;
                }
                engine.rebind(generation, count);
            });
        });
    }

    {
        let engine = engine.clone();
        use_drop(move || engine.release_all());
    }

    let list = rendered();
    let total = count_label(catalog.read().len());
    let state = load_state();

    rsx! {
        section { class: "wc-catalog",
            div { class: "wc-toolbar",
                div { class: "wc-search",
                    Icon {
                        name: "search".to_string(),
                        class: "wc-search-icon".to_string(),
                    }
                    input {
                        class: "wc-search-input",
                        r#type: "search",
                        placeholder: "Search tracks...",
                        value: search_query,
                        oninput: move |e| {
                            let value = e.value();
                            search_query.set(value);
                        },
                    }
                }
                span { class: "wc-count", "{total}" }
            }

            {
                match state {
                    LoadState::Loading => rsx! {
                        p { class: "wc-status",
                            Icon {
                                name: "loader".to_string(),
                                class: "wc-icon".to_string(),
                            }
                            "Loading tracks..."
                        }
                    },
                    LoadState::Failed => rsx! {
                        p { class: "wc-status wc-status-error",
                            Icon {
                                name: "alert".to_string(),
                                class: "wc-icon".to_string(),
                            }
                            "Failed to load tracks."
                        }
                    },
                    LoadState::Ready if list.tracks.is_empty() => rsx! {
                        p { class: "wc-status", "No tracks found." }
                    },
                    LoadState::Ready => rsx! {
                        div { class: "wc-grid",
                            for (index, track) in list.tracks.iter().enumerate() {
                                PlayerCard {
                                    key: "{list.generation}-{track.id}",
                                    generation: list.generation,
                                    index,
                                    track: track.clone(),
                                }
                            }
                        }
                    },
                }
            }
        }
    }
}
