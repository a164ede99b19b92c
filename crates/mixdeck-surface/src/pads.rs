//! Pattern pad grid
//!
//! Thin view over the sequencer's pad bank: normalises raw play states,
//! tracks the selected pad and turns pad presses into play toggles (short)
//! or pattern-editor requests (held).

use crate::config::GestureConfig;
use crate::gesture::{PressOutcome, PressTracker};
use crate::render::{PadView, Renderer};
use crate::surface::SurfaceAction;
use mixdeck_core::{PadInfo, PatternGrid, RawPlayState};
use std::sync::Arc;
use std::time::Duration;

/// Display state of a pad
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadState {
    /// Stopped with no events
    Empty,
    /// Zero length or play mode disabled
    Disabled,
    Stopped,
    Starting,
    Playing,
    Stopping,
}

impl PadState {
    pub fn from_info(info: &PadInfo) -> Self {
        if info.length == 0 || info.disabled {
            return PadState::Disabled;
        }
        match info.play_state {
            RawPlayState::Stopped if info.empty => PadState::Empty,
            RawPlayState::Stopped => PadState::Stopped,
            RawPlayState::Starting => PadState::Starting,
            RawPlayState::Playing | RawPlayState::Restarting => PadState::Playing,
            RawPlayState::Stopping | RawPlayState::StoppingSync => PadState::Stopping,
        }
    }

    /// Playing or about to
    pub fn is_running(self) -> bool {
        matches!(self, PadState::Starting | PadState::Playing)
    }
}

/// Group letter shown on a pad (0 = "A")
pub fn group_label(group: u8) -> char {
    (b'A' + group % 26) as char
}

/// Result of a completed pad press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadAction {
    /// Playback toggled
    Toggled(usize),
    /// Held: caller should open the pattern editor
    OpenEditor(usize),
}

impl PadAction {
    /// Screen change the caller should perform, if any
    pub fn navigation(self) -> Option<SurfaceAction> {
        match self {
            PadAction::Toggled(_) => None,
            PadAction::OpenEditor(pad) => Some(SurfaceAction::OpenPatternEditor(pad)),
        }
    }
}

pub struct PadGrid {
    grid: Arc<dyn PatternGrid>,
    selected: usize,
    pressed: Option<usize>,
    hold: PressTracker,
}

impl PadGrid {
    pub fn new(grid: Arc<dyn PatternGrid>, config: &GestureConfig) -> Self {
        Self {
            grid,
            selected: 0,
            pressed: None,
            hold: PressTracker::new(config.pad_hold()),
        }
    }

    pub fn pad_count(&self) -> usize {
        self.grid.pad_count()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Select `pad`, clamped to the last pad
    pub fn select(&mut self, pad: usize) -> usize {
        self.selected = pad.min(self.pad_count().saturating_sub(1));
        self.selected
    }

    pub fn state(&self, pad: usize) -> Option<PadState> {
        self.grid.pad_info(pad).map(|info| PadState::from_info(&info))
    }

    pub fn press(&mut self, pad: usize, time: Duration) {
        if pad >= self.pad_count() {
            return;
        }
        self.select(pad);
        self.pressed = Some(pad);
        self.hold.press(time);
    }

    pub fn release(&mut self, time: Duration) -> Option<PadAction> {
        let pad = self.pressed.take()?;
        match self.hold.release(time)? {
            PressOutcome::Long => {
                log::debug!("Pads: pad {} held, opening editor", pad);
                Some(PadAction::OpenEditor(pad))
            }
            PressOutcome::Short => {
                self.grid.toggle_play(pad);
                Some(PadAction::Toggled(pad))
            }
            PressOutcome::Drag => None,
        }
    }

    /// Toggle the selected pad (select switch)
    pub fn toggle_selected(&mut self) -> PadAction {
        self.grid.toggle_play(self.selected);
        PadAction::Toggled(self.selected)
    }

    pub fn cancel(&mut self) {
        self.pressed = None;
        self.hold.cancel();
    }

    pub fn view(&self, pad: usize) -> Option<PadView> {
        let info = self.grid.pad_info(pad)?;
        Some(PadView {
            index: pad,
            state: PadState::from_info(&info),
            title: info.title,
            group: info.group,
            selected: pad == self.selected,
        })
    }

    /// Draw changed pads (every pad when `force`). Returns how many were drawn.
    pub fn refresh(&self, force: bool, renderer: &mut dyn Renderer) -> usize {
        let mut drawn = 0;
        for pad in 0..self.pad_count() {
            let changed = self.grid.take_changed(pad);
            if !(force || changed) {
                continue;
            }
            if let Some(view) = self.view(pad) {
                renderer.draw_pad(&view);
                drawn += 1;
            }
        }
        drawn
    }
}
