//! Player widget handle bundle and the events it emits.

use super::host::{Host, MediaHandle, SeekSurface, TextSlot, WidgetId};
use crate::api::time_label;

/// Glyph shown on a widget's play control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlGlyph {
    Playing,
    Paused,
}

impl ControlGlyph {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "⏸",
            Self::Paused => "▶",
        }
    }
}

/// Element roles within one rendered card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardElement {
    Audio,
    Control,
    Time,
    Canvas,
    Seek,
    Fill,
}

impl CardElement {
    fn suffix(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Control => "control",
            Self::Time => "time",
            Self::Canvas => "canvas",
            Self::Seek => "seek",
            Self::Fill => "fill",
        }
    }
}

/// DOM id of `element` in card `index` of render `generation`.
pub fn card_element_id(generation: u64, index: usize, element: CardElement) -> String {
    format!("wc-{generation}-{index}-{}", element.suffix())
}

/// DOM/media events translated into engine calls by the binder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetEvent {
    ControlClicked,
    /// Click on the seek surface, `offset_x` pixels from its left edge.
    SeekClicked { offset_x: f64 },
    Ended,
    /// The media element paused itself or was paused from outside the engine.
    Paused,
    MetadataLoaded,
    TimeUpdate,
}

/// Handles for one freshly rendered card, before the binder assigns an id.
pub struct WidgetParts<H: Host> {
    pub media: H::Media,
    pub control: H::Text,
    pub time_label: H::Text,
    pub canvas: H::Surface,
    pub seek: H::Seek,
}

/// A bound widget: the DOM handles of one rendered track.
pub struct PlayerWidget<H: Host> {
    pub id: WidgetId,
    pub media: H::Media,
    pub control: H::Text,
    pub time_label: H::Text,
    pub canvas: H::Surface,
    pub seek: H::Seek,
}

impl<H: Host> PlayerWidget<H> {
    pub fn new(id: WidgetId, parts: WidgetParts<H>) -> Self {
        Self {
            id,
            media: parts.media,
            control: parts.control,
            time_label: parts.time_label,
            canvas: parts.canvas,
            seek: parts.seek,
        }
    }

    pub fn show_glyph(&self, glyph: ControlGlyph) {
        self.control.set_text(glyph.as_str());
    }

    /// Refresh the `elapsed / total` label and the seek fill.
    pub fn refresh_time(&self) {
        let elapsed = self.media.current_time();
        let total = self.media.duration();
        self.time_label.set_text(&time_label(elapsed, total));
        if total.is_finite() && total > 0.0 {
            self.seek.set_progress((elapsed / total).clamp(0.0, 1.0));
        } else {
            self.seek.set_progress(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{fake_widget, FakeHost};

    #[test]
    fn card_ids_are_unique_per_generation() {
        assert_eq!(card_element_id(3, 0, CardElement::Canvas), "wc-3-0-canvas");
        assert_ne!(
            card_element_id(3, 1, CardElement::Seek),
            card_element_id(4, 1, CardElement::Seek)
        );
    }

    #[test]
    fn refresh_time_updates_label_and_fill() {
        let widget: PlayerWidget<FakeHost> = fake_widget(1, 80.0);
        widget.media.set_time(20.0);

        widget.refresh_time();

        assert_eq!(widget.time_label.text(), "0:20 / 1:20");
        assert_eq!(widget.seek.progress(), 0.25);
    }

    #[test]
    fn unknown_duration_keeps_fill_empty() {
        let widget: PlayerWidget<FakeHost> = fake_widget(1, f64::INFINITY);
        widget.media.set_time(5.0);

        widget.refresh_time();

        assert_eq!(widget.time_label.text(), "0:05 / 0:00");
        assert_eq!(widget.seek.progress(), 0.0);
    }
}
