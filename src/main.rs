use dioxus::prelude::*;

mod api;
mod components;
mod db;
mod diagnostics;
mod engine;
mod utils;

use components::AppShell;

const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    dioxus::logger::initialize_default();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Wavecard" }
        document::Meta { name: "theme-color", content: "#101014" }
        document::Stylesheet { href: APP_CSS }

        AppShell {}
    }
}
