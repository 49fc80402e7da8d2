use serde::{Deserialize, Serialize};

use crate::utils::slugify;

/// A GitHub repository folder that holds the audio catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self {
            owner: "EdPlus08".to_string(),
            repo: "Phonk".to_string(),
            path: "audios".to_string(),
        }
    }
}

/// One item of a repository contents listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// A playable track derived from a listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Slug of the file name, unique within one listing. Keys the rendered card.
    pub id: String,
    pub display_name: String,
    pub media_url: String,
    pub file_name: String,
}

impl Track {
    pub fn new(file_name: &str, media_url: &str) -> Self {
        Self {
            id: slugify(file_name),
            display_name: display_name(file_name),
            media_url: media_url.to_string(),
            file_name: file_name.to_string(),
        }
    }
}

/// File name with its last extension stripped.
pub fn display_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 track".to_string()
    } else {
        format!("{count} tracks")
    }
}

/// `m:ss`, flooring fractional seconds. Non-finite or negative input shows `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// `elapsed / total` label shown under each player.
pub fn time_label(elapsed: f64, total: f64) -> String {
    format!("{} / {}", format_time(elapsed), format_time(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_strips_last_extension() {
        assert_eq!(display_name("Night Drive.mp3"), "Night Drive");
        assert_eq!(display_name("remix.v2.wav"), "remix.v2");
        assert_eq!(display_name("README"), "README");
        assert_eq!(display_name(".hidden"), ".hidden");
    }

    #[test]
    fn count_label_pluralizes() {
        assert_eq!(count_label(0), "0 tracks");
        assert_eq!(count_label(1), "1 track");
        assert_eq!(count_label(12), "12 tracks");
    }

    #[test]
    fn time_formatting_floors_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(61.4), "1:01");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(time_label(12.0, f64::INFINITY), "0:12 / 0:00");
    }

    #[test]
    fn track_from_file_name() {
        let track = Track::new("Dark Phonk #3.mp3", "https://example.test/a.mp3");
        assert_eq!(track.id, "dark-phonk-3-mp3");
        assert_eq!(track.display_name, "Dark Phonk #3");
        assert_eq!(track.file_name, "Dark Phonk #3.mp3");
    }

    #[test]
    fn content_entry_reads_github_shape() {
        let entry: ContentEntry = serde_json::from_str(
            r#"{"name":"a.mp3","path":"audios/a.mp3","sha":"x","size":10,
                "type":"file","download_url":"https://raw.test/a.mp3"}"#,
        )
        .unwrap();
        assert_eq!(entry.kind, "file");
        assert_eq!(entry.download_url.as_deref(), Some("https://raw.test/a.mp3"));
    }
}
