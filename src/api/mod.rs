pub mod catalog;
pub mod models;

pub use catalog::{filter_tracks, CatalogClient, CatalogError};
pub use models::{count_label, format_time, time_label, CatalogSource, Track};
