//! Remote track catalog backed by the GitHub repository contents API.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::models::{CatalogSource, ContentEntry, Track};
use crate::diagnostics::PerfTimer;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const API_BASE: &str = "https://api.github.com";
#[cfg(not(target_arch = "wasm32"))]
const USER_AGENT: &str = concat!("wavecard/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog responded with HTTP {0}")]
    Status(u16),

    #[error("Malformed catalog listing: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct CatalogClient {
    source: CatalogSource,
    extensions: Vec<String>,
}

impl CatalogClient {
    pub fn new(source: CatalogSource, extensions: Vec<String>) -> Self {
        Self { source, extensions }
    }

    pub fn contents_url(&self) -> String {
        let path = self
            .source
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{API_BASE}/repos/{}/{}/contents/{path}",
            urlencoding::encode(&self.source.owner),
            urlencoding::encode(&self.source.repo),
        )
    }

    /// Fetch the folder listing and keep the playable files, in listing order.
    pub async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let timer = PerfTimer::start("catalog_fetch");
        let url = self.contents_url();
        debug!(%url, "fetching catalog");

        let request = HTTP_CLIENT
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        // Browsers own the User-Agent header; GitHub rejects native requests without one.
        #[cfg(not(target_arch = "wasm32"))]
        let request = request.header(reqwest::header::USER_AGENT, USER_AGENT);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), %url, "catalog request rejected");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let tracks = parse_listing(&body, &self.extensions)?;
        timer.finish(&format!("{} tracks", tracks.len()));
        Ok(tracks)
    }
}

pub fn parse_listing(body: &str, extensions: &[String]) -> Result<Vec<Track>, serde_json::Error> {
    let entries: Vec<ContentEntry> = serde_json::from_str(body)?;
    Ok(filter_entries(entries, extensions))
}

/// Files with an accepted extension and a download URL become tracks.
///
/// Track ids key the rendered cards, so names that slugify alike get a numeric suffix.
pub fn filter_entries(entries: Vec<ContentEntry>, extensions: &[String]) -> Vec<Track> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| entry.kind == "file" && has_extension(&entry.name, extensions))
        .filter_map(|entry| {
            let url = entry.download_url?;
            let mut track = Track::new(&entry.name, &url);
            let base = track.id.clone();
            let mut suffix = 2;
            while !seen.insert(track.id.clone()) {
                track.id = format!("{base}-{suffix}");
                suffix += 1;
            }
            Some(track)
        })
        .collect()
}

fn has_extension(name: &str, extensions: &[String]) -> bool {
    let name = name.to_lowercase();
    extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_lowercase();
        !ext.is_empty() && name.ends_with(&format!(".{ext}"))
    })
}

/// Case-insensitive substring match on the file name; a blank term keeps everything.
pub fn filter_tracks(tracks: &[Track], term: &str) -> Vec<Track> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return tracks.to_vec();
    }
    tracks
        .iter()
        .filter(|track| track.file_name.to_lowercase().contains(&term))
        .cloned()
        .collect()
}
