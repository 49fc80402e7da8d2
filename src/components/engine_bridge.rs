//! Context handle connecting Dioxus views to the playback engine.
//!
//! In the browser it owns the coordinator and binder built on [`WebHost`].
//! On other targets every call is a no-op so the views compile unchanged.

#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use dioxus::prelude::spawn;
#[cfg(target_arch = "wasm32")]
use tracing::{debug, warn};

use crate::engine::{EngineConfig, RendererKind};
#[cfg(target_arch = "wasm32")]
use crate::engine::{web_host::WebHost, PlaybackCoordinator, PlayerWidgetBinder};

#[derive(Clone)]
pub struct PlayerEngine {
    #[cfg(target_arch = "wasm32")]
    binder: Option<Rc<PlayerWidgetBinder<WebHost>>>,
}

#[cfg(target_arch = "wasm32")]
impl PlayerEngine {
    pub fn new(config: EngineConfig) -> Self {
        let binder = match WebHost::new() {
            Some(host) => {
                let coordinator = Rc::new(PlaybackCoordinator::new(Rc::new(host), config));
                Some(PlayerWidgetBinder::new(coordinator))
            }
            None => {
                warn!("no browser window; players stay inert");
                None
            }
        };
        Self { binder }
    }

    /// Bind the cards rendered under `generation`, discarding every earlier card.
    pub fn rebind(&self, generation: u64, count: usize) {
        let Some(binder) = &self.binder else {
            return;
        };
        let parts = binder.coordinator().host().collect_widget_parts(generation, count);
        let ids = binder.rebind(parts);
        debug!(generation, requested = count, bound = ids.len(), "catalog cards bound");
    }

    pub fn set_renderer_kind(&self, kind: RendererKind) {
        let Some(binder) = &self.binder else {
            return;
        };
        let coordinator = Rc::clone(binder.coordinator());
        spawn(async move {
            coordinator.set_renderer_kind(kind).await;
        });
    }

    pub fn release_all(&self) {
        if let Some(binder) = &self.binder {
            binder.release_all();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PlayerEngine {
    pub fn new(_config: EngineConfig) -> Self {
        Self {}
    }

    pub fn rebind(&self, _generation: u64, _count: usize) {}

    pub fn set_renderer_kind(&self, _kind: RendererKind) {}

    pub fn release_all(&self) {}
}
