#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use tracing::info;

/// Wall-clock timer that logs how long a scope took.
pub struct PerfTimer {
    scope: &'static str,
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
    #[cfg(not(target_arch = "wasm32"))]
    started_at: Instant,
}

impl PerfTimer {
    pub fn start(scope: &'static str) -> Self {
        Self {
            scope,
            #[cfg(target_arch = "wasm32")]
            started_ms: js_sys::Date::now(),
            #[cfg(not(target_arch = "wasm32"))]
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            (js_sys::Date::now() - self.started_ms).max(0.0)
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.started_at.elapsed().as_secs_f64() * 1000.0
        }
    }

    #[inline]
    pub fn finish(self, details: &str) {
        let elapsed_ms = self.elapsed_ms().round() as u64;
        if details.trim().is_empty() {
            info!(target: "perf", scope = self.scope, elapsed_ms, "scope finished");
        } else {
            info!(target: "perf", scope = self.scope, elapsed_ms, details, "scope finished");
        }
    }
}
