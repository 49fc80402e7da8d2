//! Persisted player settings.
//!
//! Browser builds keep them in local storage; native builds (tests, tooling)
//! hold them in a per-thread map so nothing touches disk.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::api::{CatalogClient, CatalogSource};
use crate::engine::config::{DEFAULT_BAR_COUNT, DEFAULT_FFT_SIZE};
use crate::engine::{EngineConfig, RendererKind};

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError, LocalStorage, Storage};

#[cfg(not(target_arch = "wasm32"))]
use std::{cell::RefCell, collections::HashMap};

const SETTINGS_KEY: &str = "wavecard.player_settings";

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
    static MEMORY_STORE: RefCell<HashMap<&'static str, String>> = RefCell::new(HashMap::new());
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[cfg(target_arch = "wasm32")]
    #[error("Local storage failed: {0}")]
    Storage(#[from] StorageError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("Settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// User-tunable player settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default)]
    pub renderer: RendererKind,
    #[serde(default = "default_fft_size")]
    pub fft_size: u32,
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,
    #[serde(default)]
    pub catalog: CatalogSource,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_fft_size() -> u32 {
    DEFAULT_FFT_SIZE
}

fn default_bar_count() -> usize {
    DEFAULT_BAR_COUNT
}

fn default_extensions() -> Vec<String> {
    vec!["mp3".to_string(), "wav".to_string()]
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            fft_size: default_fft_size(),
            bar_count: default_bar_count(),
            catalog: CatalogSource::default(),
            extensions: default_extensions(),
        }
    }
}

impl PlayerSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            renderer: self.renderer,
            fft_size: self.fft_size,
            bar_count: self.bar_count,
            ..EngineConfig::default()
        }
        .normalized()
    }

    pub fn catalog_client(&self) -> CatalogClient {
        CatalogClient::new(self.catalog.clone(), self.extensions.clone())
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save_settings(settings: &PlayerSettings) -> Result<(), SettingsError> {
    LocalStorage::set(SETTINGS_KEY, settings)?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_settings(settings: &PlayerSettings) -> Result<(), SettingsError> {
    let encoded = serde_json::to_string(settings)?;
    MEMORY_STORE.with(|store| store.borrow_mut().insert(SETTINGS_KEY, encoded));
    Ok(())
}

/// Stored settings, or defaults when nothing usable is stored.
#[cfg(target_arch = "wasm32")]
pub fn load_settings() -> PlayerSettings {
    match LocalStorage::get(SETTINGS_KEY) {
        Ok(settings) => settings,
        Err(StorageError::KeyNotFound(_)) => PlayerSettings::default(),
        Err(err) => {
            warn!(error = %err, "stored settings unreadable, using defaults");
            PlayerSettings::default()
        }
    }
}

/// Stored settings, or defaults when nothing usable is stored.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_settings() -> PlayerSettings {
    let stored = MEMORY_STORE.with(|store| store.borrow().get(SETTINGS_KEY).cloned());
    let Some(raw) = stored else {
        return PlayerSettings::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(error = %err, "stored settings unreadable, using defaults");
        PlayerSettings::default()
    })
}
