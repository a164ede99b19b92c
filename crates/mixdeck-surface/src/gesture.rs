//! Pointer gesture interpretation
//!
//! Raw press/motion/release events become one of three things:
//! - a continuous fader adjustment locked to one axis ([`FaderGesture`])
//! - a short or long press, measured at release ([`PressTracker`])
//! - a label drag stepping one strip width at a time ([`LabelDrag`])
//!
//! Long presses are decided from the press duration when the release
//! arrives; there is no timer running while the finger is down.

use crate::config::GestureConfig;
use mixdeck_core::ParamKind;
use std::time::Duration;

/// Pointer sample from the input layer (time since an arbitrary epoch)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub time: Duration,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, time_ms: u64) -> Self {
        Self {
            x,
            y,
            time: Duration::from_millis(time_ms),
        }
    }
}

/// Axis a fader drag is locked to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragAxis {
    /// Adjusts level
    Vertical,
    /// Adjusts balance
    Horizontal,
}

impl DragAxis {
    pub fn param_kind(self) -> ParamKind {
        match self {
            DragAxis::Vertical => ParamKind::Level,
            DragAxis::Horizontal => ParamKind::Balance,
        }
    }
}

/// Relative change to apply to one parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaderAdjust {
    pub kind: ParamKind,
    pub delta: f32,
}

#[derive(Clone, Copy, Debug)]
struct Anchor {
    x: f32,
    y: f32,
    pressed_at: Duration,
}

/// Drag on a fader: debounced, then locked to the first axis to move
#[derive(Debug)]
pub struct FaderGesture {
    debounce: Duration,
    lock_px: f32,
    anchor: Option<Anchor>,
    axis: Option<DragAxis>,
}

impl FaderGesture {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            debounce: config.drag_debounce(),
            lock_px: config.axis_lock_px,
            anchor: None,
            axis: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn axis(&self) -> Option<DragAxis> {
        self.axis
    }

    pub fn press(&mut self, event: PointerEvent) {
        self.anchor = Some(Anchor {
            x: event.x,
            y: event.y,
            pressed_at: event.time,
        });
        self.axis = None;
    }

    /// Interpret a motion sample against a fader of `width` x `height` pixels
    ///
    /// Returns the value change for the locked axis, if any. Vertical
    /// displacement is tested first, so a diagonal first move locks level.
    pub fn motion(&mut self, event: PointerEvent, width: f32, height: f32) -> Option<FaderAdjust> {
        let anchor = self.anchor.as_mut()?;
        if event.time.saturating_sub(anchor.pressed_at) < self.debounce {
            return None;
        }

        let dy = anchor.y - event.y;
        let dx = event.x - anchor.x;
        if self.axis.is_none() {
            if dy.abs() > self.lock_px {
                self.axis = Some(DragAxis::Vertical);
            } else if dx.abs() > self.lock_px {
                self.axis = Some(DragAxis::Horizontal);
            }
        }

        match self.axis? {
            DragAxis::Vertical if height > 0.0 => {
                anchor.y = event.y;
                Some(FaderAdjust {
                    kind: ParamKind::Level,
                    delta: dy / height,
                })
            }
            DragAxis::Horizontal if width > 0.0 => {
                anchor.x = event.x;
                Some(FaderAdjust {
                    kind: ParamKind::Balance,
                    delta: dx / width * 2.0,
                })
            }
            _ => None,
        }
    }

    /// End of the drag (release or focus loss)
    pub fn release(&mut self) {
        self.anchor = None;
        self.axis = None;
    }
}

/// How a press ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    Short,
    Long,
    /// The press turned into a drag; no click action
    Drag,
}

/// Short/long press classification by duration at release
#[derive(Debug)]
pub struct PressTracker {
    hold: Duration,
    pressed_at: Option<Duration>,
    dragged: bool,
}

impl PressTracker {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            pressed_at: None,
            dragged: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn press(&mut self, time: Duration) {
        self.pressed_at = Some(time);
        self.dragged = false;
    }

    pub fn mark_drag(&mut self) {
        if self.pressed_at.is_some() {
            self.dragged = true;
        }
    }

    /// `None` if there was no matching press
    pub fn release(&mut self, time: Duration) -> Option<PressOutcome> {
        let pressed_at = self.pressed_at.take()?;
        if std::mem::take(&mut self.dragged) {
            return Some(PressOutcome::Drag);
        }
        if time.saturating_sub(pressed_at) > self.hold {
            Some(PressOutcome::Long)
        } else {
            Some(PressOutcome::Short)
        }
    }

    pub fn cancel(&mut self) {
        self.pressed_at = None;
        self.dragged = false;
    }
}

/// Horizontal drag on a strip label
///
/// Each time the pointer travels more than one strip width from the anchor
/// it yields one step and the anchor resets to the pointer, so a long drag
/// produces repeated single steps.
#[derive(Debug)]
pub struct LabelDrag {
    anchor_x: Option<f32>,
    press: PressTracker,
}

impl LabelDrag {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            anchor_x: None,
            press: PressTracker::new(config.label_hold()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor_x.is_some()
    }

    pub fn press(&mut self, event: PointerEvent) {
        self.anchor_x = Some(event.x);
        self.press.press(event.time);
    }

    /// +1 for a rightward step, -1 for leftward, `None` below one strip width
    pub fn motion(&mut self, event: PointerEvent, strip_width: f32) -> Option<i32> {
        let anchor = self.anchor_x.as_mut()?;
        let delta = event.x - *anchor;
        let step = if delta > strip_width {
            1
        } else if delta < -strip_width {
            -1
        } else {
            return None;
        };
        *anchor = event.x;
        self.press.mark_drag();
        Some(step)
    }

    pub fn release(&mut self, event: PointerEvent) -> Option<PressOutcome> {
        self.anchor_x = None;
        self.press.release(event.time)
    }

    pub fn cancel(&mut self) {
        self.anchor_x = None;
        self.press.cancel();
    }
}
