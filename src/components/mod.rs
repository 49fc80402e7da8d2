//! The components module contains all shared components for our app.

mod app;
mod catalog;
mod engine_bridge;
mod icons;
mod player_card;
mod visualizer_toggle;

pub use app::*;
pub use catalog::*;
pub use engine_bridge::*;
pub use icons::*;
pub use player_card::*;
pub use visualizer_toggle::*;
