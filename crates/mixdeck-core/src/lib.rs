//! Shared mixer model for mixdeck views
//!
//! This crate provides:
//! - Protocol-agnostic chain, channel, parameter and control-source types
//! - Controller bindings (cached, clamped views of engine parameters)
//! - Collaborator traits for the chain directory, engine, sequencer and prompts
//! - A publish/subscribe hub for engine notifications
//! - An in-memory console implementing every collaborator
//!
//! # Architecture
//!
//! ```text
//! Engine thread → NotificationHub → flume channel → view tick → redraw
//! View input    → ControllerBinding → EngineParams::set_value → Engine
//! ```

mod binding;
mod engine;
mod memory;
mod notify;
mod types;

pub use binding::{ControllerBinding, StripBindings};
pub use engine::{
    ChainDirectory, ConfirmPrompt, EngineError, EngineParams, PadInfo, PatternGrid, RawPlayState,
    UnbindScope,
};
pub use memory::{InMemoryConsole, InMemoryPatterns, DEFAULT_CHANNELS};
pub use notify::{Notification, NotificationHub, Subscription, SubscriptionId};
pub use types::{
    Chain, ChainId, ControlEvent, ControlSource, MeterState, MidiRouting, MixerChannel, ParamKind,
    ParamRef,
};
