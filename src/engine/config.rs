use super::renderer::RendererKind;

pub const DEFAULT_FFT_SIZE: u32 = 512;
pub const DEFAULT_BAR_COUNT: usize = 80;
const MIN_FFT_SIZE: u32 = 32;
const MAX_FFT_SIZE: u32 = 32768;
const MIN_BAR_COUNT: usize = 8;
const MAX_BAR_COUNT: usize = 512;

/// Tunables for the coordinator, audio graph and renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub renderer: RendererKind,
    pub fft_size: u32,
    pub bar_count: usize,
    /// Degrees of hue the synthetic waveform rotates per second of playback.
    pub synthetic_hue_rate: f64,
    pub line_width: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            fft_size: DEFAULT_FFT_SIZE,
            bar_count: DEFAULT_BAR_COUNT,
            synthetic_hue_rate: 40.0,
            line_width: 2.0,
        }
    }
}

impl EngineConfig {
    /// Clamp user-provided values into ranges the platform accepts.
    pub fn normalized(mut self) -> Self {
        self.fft_size = normalize_fft_size(self.fft_size);
        self.bar_count = self.bar_count.clamp(MIN_BAR_COUNT, MAX_BAR_COUNT);
        if !self.synthetic_hue_rate.is_finite() {
            self.synthetic_hue_rate = EngineConfig::default().synthetic_hue_rate;
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            self.line_width = EngineConfig::default().line_width;
        }
        self
    }
}

/// Analyzers only accept powers of two in `32..=32768`.
pub fn normalize_fft_size(requested: u32) -> u32 {
    requested
        .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
        .checked_next_power_of_two()
        .unwrap_or(MAX_FFT_SIZE)
        .min(MAX_FFT_SIZE)
}
