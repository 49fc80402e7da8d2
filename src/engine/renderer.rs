//! Waveform renderers: live analyzer spectrum or a synthetic time-based wave.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::audio_graph::AudioGraphState;
use super::config::EngineConfig;
use super::host::{AudioGraphBackend, DrawSurface, MediaHandle, Point, Stroke};

/// Number of sine periods the synthetic wave spans across the canvas.
const SYNTHETIC_CYCLES: f64 = 3.0;
/// Radians per second the base wave travels.
const SYNTHETIC_SPEED: f64 = 2.0;
const PULSE_WEIGHT: f64 = 0.5;
/// Fraction of the canvas height the synthetic wave may swing from its midline.
const SYNTHETIC_AMPLITUDE: f64 = 0.4;

/// Which visualization a widget uses while it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RendererKind {
    #[default]
    Spectrum,
    Synthetic,
}

impl RendererKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Spectrum => "Spectrum",
            Self::Synthetic => "Synthetic",
        }
    }

    pub fn needs_graph(self) -> bool {
        matches!(self, Self::Spectrum)
    }
}

/// Wrap any hue into `[0, 360)`; non-finite input maps to 0.
pub fn wrap_hue(hue: f64) -> f64 {
    let wrapped = hue.rem_euclid(360.0);
    if wrapped.is_finite() && wrapped < 360.0 {
        wrapped
    } else {
        0.0
    }
}

/// Hue derived from the average magnitude: `avg / 255 * 360`.
pub fn spectrum_hue(magnitudes: &[u8]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let sum: u64 = magnitudes.iter().map(|&m| u64::from(m)).sum();
    let average = sum as f64 / magnitudes.len() as f64;
    wrap_hue(average / 255.0 * 360.0)
}

/// Sample `bars` evenly spaced magnitudes into a polyline; zero sits on the bottom edge.
pub fn spectrum_points(
    magnitudes: &[u8],
    width: f64,
    height: f64,
    bars: usize,
    out: &mut Vec<Point>,
) {
    out.clear();
    if magnitudes.is_empty() || bars == 0 {
        return;
    }
    let step = if bars > 1 {
        width / (bars - 1) as f64
    } else {
        0.0
    };
    for bar in 0..bars {
        let index = bar * magnitudes.len() / bars;
        let level = f64::from(magnitudes[index]) / 255.0;
        out.push(Point {
            x: bar as f64 * step,
            y: height - level * height,
        });
    }
}

/// Synthetic hue: `(elapsed * rate) mod 360`.
pub fn synthetic_hue(elapsed_seconds: f64, hue_rate: f64) -> f64 {
    wrap_hue(elapsed_seconds * hue_rate)
}

/// Closed-form waveform: a base sine travelling with elapsed time plus a
/// pulse term shifted by playback progress, across `segments` segments.
pub fn synthetic_points(
    elapsed_seconds: f64,
    progress: f64,
    width: f64,
    height: f64,
    segments: usize,
    out: &mut Vec<Point>,
) {
    out.clear();
    if segments == 0 {
        return;
    }
    let midline = height / 2.0;
    let amplitude = height * SYNTHETIC_AMPLITUDE;
    let peak = 1.0 + PULSE_WEIGHT;
    for segment in 0..=segments {
        let t = segment as f64 / segments as f64;
        let phase = t * TAU * SYNTHETIC_CYCLES;
        let base = (phase + elapsed_seconds * SYNTHETIC_SPEED).sin();
        let pulse = PULSE_WEIGHT * (phase * 2.0 + progress * TAU).sin();
        out.push(Point {
            x: t * width,
            y: midline + (base + pulse) / peak * amplitude,
        });
    }
}

/// Paints the live analyzer magnitudes.
#[derive(Debug)]
pub struct SpectrumRenderer {
    bars: usize,
    line_width: f64,
    points: Vec<Point>,
}

/// Paints a wave computed from the media clock alone.
#[derive(Debug)]
pub struct SyntheticRenderer {
    segments: usize,
    hue_rate: f64,
    line_width: f64,
    points: Vec<Point>,
}

/// The two interchangeable visualizations behind one `draw_frame`.
#[derive(Debug)]
pub enum WaveformRenderer {
    Spectrum(SpectrumRenderer),
    Synthetic(SyntheticRenderer),
}

impl WaveformRenderer {
    pub fn for_kind(kind: RendererKind, config: &EngineConfig) -> Self {
        match kind {
            RendererKind::Spectrum => Self::Spectrum(SpectrumRenderer {
                bars: config.bar_count,
                line_width: config.line_width,
                points: Vec::with_capacity(config.bar_count),
            }),
            RendererKind::Synthetic => Self::Synthetic(SyntheticRenderer {
                segments: config.bar_count,
                hue_rate: config.synthetic_hue_rate,
                line_width: config.line_width,
                points: Vec::with_capacity(config.bar_count + 1),
            }),
        }
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            Self::Spectrum(_) => RendererKind::Spectrum,
            Self::Synthetic(_) => RendererKind::Synthetic,
        }
    }

    /// Paint one frame. A zero-area canvas is left untouched.
    pub fn draw_frame<S, M, G>(&mut self, canvas: &S, media: &M, graph: Option<&AudioGraphState<G>>)
    where
        S: DrawSurface,
        M: MediaHandle,
        G: AudioGraphBackend,
    {
        let (width, height) = canvas.size();
        if !(width > 0.0 && height > 0.0) {
            return;
        }
        canvas.clear();

        match self {
            Self::Spectrum(spectrum) => {
                let Some(graph) = graph else {
                    return;
                };
                let hue = graph.with_frequency_data(|magnitudes| {
                    spectrum_points(
                        magnitudes,
                        width,
                        height,
                        spectrum.bars,
                        &mut spectrum.points,
                    );
                    spectrum_hue(magnitudes)
                });
                if spectrum.points.is_empty() {
                    return;
                }
                canvas.stroke_polyline(
                    &spectrum.points,
                    &Stroke {
                        hue,
                        line_width: spectrum.line_width,
                    },
                );
            }
            Self::Synthetic(synthetic) => {
                let elapsed = finite_or_zero(media.current_time());
                let duration = media.duration();
                let progress = if duration.is_finite() && duration > 0.0 {
                    (elapsed / duration).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                synthetic_points(
                    elapsed,
                    progress,
                    width,
                    height,
                    synthetic.segments,
                    &mut synthetic.points,
                );
                canvas.stroke_polyline(
                    &synthetic.points,
                    &Stroke {
                        hue: synthetic_hue(elapsed, synthetic.hue_rate),
                        line_width: synthetic.line_width,
                    },
                );
            }
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
