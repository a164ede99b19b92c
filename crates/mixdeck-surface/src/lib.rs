//! Live mixer surface for mixdeck
//!
//! This crate provides:
//! - A sliding window of chain strips plus the pinned master strip
//! - A deduplicating refresh queue drained once per display tick
//! - The control learn state machine with sticky parking across hides
//! - Fader, label and pad gesture interpretation
//! - The pattern pad grid view
//!
//! # Architecture
//!
//! ```text
//! Engine → NotificationHub → MixerSurface::tick → RefreshQueue → Renderer
//! Input  → MixerSurface::handle_input → ControllerBinding → Engine
//!                                     → SurfaceAction (navigation, titles)
//! ```

pub mod config;
mod gesture;
mod layout;
mod learn;
mod pads;
mod refresh;
mod render;
mod strip;
mod surface;
mod window;

pub use config::{
    default_config_path, load_config, save_config, EncoderRole, GestureConfig, LayoutConfig,
    MeterConfig, NudgeConfig, SurfaceConfig, DEFAULT_ENCODERS,
};
pub use gesture::{
    DragAxis, FaderAdjust, FaderGesture, LabelDrag, PointerEvent, PressOutcome, PressTracker,
};
pub use layout::{Region, StripGeometry};
pub use learn::{CaptureOutcome, LearnError, LearnMachine, LearnState};
pub use pads::{group_label, PadAction, PadGrid, PadState};
pub use refresh::{RefreshBatch, RefreshEntry, RefreshQueue, StripField};
pub use render::{ControlFace, LearnMark, PadView, RecordingRenderer, Renderer, StripView};
pub use strip::{Strip, StripSlot, ViewContext};
pub use surface::{
    balance_title, volume_title, Arrow, InputEvent, LearnOption, LearnOptions, MixerSurface,
    Switch, SwitchPress, SurfaceAction,
};
pub use window::StripWindow;
