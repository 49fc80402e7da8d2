//! Error types for the playback engine.

use thiserror::Error;

/// Failures the engine can observe while talking to the host platform.
///
/// None of these are fatal: the coordinator logs them where they happen and
/// degrades to "no visualization" or "this click did nothing".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The platform refused to start playback (autoplay policy, no user gesture yet).
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// The audio-processing context could not be constructed or resumed.
    #[error("Audio graph unavailable: {0}")]
    GraphUnavailable(String),

    /// A second source node was requested for a media element that already has one.
    #[error("Media element is already bound to a source node")]
    DuplicateSource,

    /// The per-frame scheduling primitive refused a callback.
    #[error("Frame scheduling failed: {0}")]
    Scheduler(String),
}
