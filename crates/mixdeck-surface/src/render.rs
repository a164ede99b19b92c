//! Renderer boundary
//!
//! The surface never draws itself. Each tick it hands the renderer plain
//! view structs describing what a strip or pad should look like; the
//! renderer owns fonts, colours and canvases.

use crate::pads::PadState;
use crate::refresh::StripField;
use crate::strip::StripSlot;
use mixdeck_core::{ChainId, MeterState, ParamKind};

/// Learn affordance drawn over a control instead of its value
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LearnMark {
    /// Learn inactive; draw the live value
    #[default]
    None,
    /// Learn active, control has no source (drawn as `??`)
    Unbound,
    /// Learn active, control bound to the labelled source
    Bound(String),
    /// This control is waiting for a source
    Armed,
}

impl LearnMark {
    /// Text drawn over the control, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            LearnMark::None => None,
            LearnMark::Unbound | LearnMark::Armed => Some("??"),
            LearnMark::Bound(label) => Some(label),
        }
    }
}

/// One control on a strip
#[derive(Clone, Debug, PartialEq)]
pub struct ControlFace {
    pub kind: ParamKind,
    pub value: f32,
    pub momentary: bool,
    pub learn: LearnMark,
}

/// Everything needed to draw one strip
#[derive(Clone, Debug, PartialEq)]
pub struct StripView {
    pub slot: StripSlot,
    pub chain: Option<ChainId>,
    pub legend: String,
    pub title: String,
    /// Empty when the strip has no engine channel
    pub controls: Vec<ControlFace>,
    pub meter: Option<MeterState>,
    pub highlighted: bool,
    /// Solo buttons render differently while the master is soloed
    pub master_solo: bool,
}

impl StripView {
    /// Strip bound to nothing
    pub fn blank(slot: StripSlot) -> Self {
        Self {
            slot,
            chain: None,
            legend: String::new(),
            title: String::new(),
            controls: Vec::new(),
            meter: None,
            highlighted: false,
            master_solo: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn control(&self, kind: ParamKind) -> Option<&ControlFace> {
        self.controls.iter().find(|c| c.kind == kind)
    }
}

/// Everything needed to draw one pad
#[derive(Clone, Debug, PartialEq)]
pub struct PadView {
    pub index: usize,
    pub state: PadState,
    pub title: String,
    pub group: u8,
    pub selected: bool,
}

/// Draw target for strips and pads
pub trait Renderer {
    /// Redraw `field` of the strip described by `view`
    fn draw_strip(&mut self, field: StripField, view: &StripView);

    fn draw_pad(&mut self, _view: &PadView) {}
}

/// Renderer that keeps every draw call, for tests and headless runs
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub strips: Vec<(StripField, StripView)>,
    pub pads: Vec<PadView>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.strips.clear();
        self.pads.clear();
    }

    /// Slots drawn since the last clear, sorted and deduplicated
    pub fn drawn_slots(&self) -> Vec<StripSlot> {
        let mut slots: Vec<StripSlot> = self.strips.iter().map(|(_, v)| v.slot).collect();
        slots.sort();
        slots.dedup();
        slots
    }

    /// Latest view drawn for `slot`
    pub fn last_view(&self, slot: StripSlot) -> Option<&StripView> {
        self.strips.iter().rev().find(|(_, v)| v.slot == slot).map(|(_, v)| v)
    }

    pub fn was_drawn(&self, slot: StripSlot, field: StripField) -> bool {
        self.strips.iter().any(|(f, v)| v.slot == slot && *f == field)
    }
}

impl Renderer for RecordingRenderer {
    fn draw_strip(&mut self, field: StripField, view: &StripView) {
        self.strips.push((field, view.clone()));
    }

    fn draw_pad(&mut self, view: &PadView) {
        self.pads.push(view.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_mark_text() {
        assert_eq!(LearnMark::None.text(), None);
        assert_eq!(LearnMark::Unbound.text(), Some("??"));
        assert_eq!(LearnMark::Armed.text(), Some("??"));
        assert_eq!(LearnMark::Bound("1#7".into()).text(), Some("1#7"));
    }

    #[test]
    fn test_recording_renderer_tracks_slots() {
        let mut r = RecordingRenderer::new();
        r.draw_strip(StripField::Level, &StripView::blank(StripSlot::Visible(2)));
        r.draw_strip(StripField::All, &StripView::blank(StripSlot::Master));
        r.draw_strip(StripField::Mute, &StripView::blank(StripSlot::Visible(2)));

        assert_eq!(r.drawn_slots(), vec![StripSlot::Visible(2), StripSlot::Master]);
        assert!(r.was_drawn(StripSlot::Visible(2), StripField::Mute));
        assert!(!r.was_drawn(StripSlot::Master, StripField::Mute));
        r.clear();
        assert!(r.drawn_slots().is_empty());
    }
}
