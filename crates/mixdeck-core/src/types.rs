//! Protocol-agnostic mixer types
//!
//! These types are shared by the engine collaborators and every view that
//! renders mixer state. They carry no behaviour beyond range bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a signal chain
///
/// Stable for the lifetime of the chain and unique among live chains.
/// [`ChainId::MASTER`] is reserved for the always-present master bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

impl ChainId {
    /// The master bus
    pub const MASTER: ChainId = ChainId(0);

    pub fn is_master(self) -> bool {
        self == Self::MASTER
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_master() {
            write!(f, "main")
        } else {
            write!(f, "chain {}", self.0)
        }
    }
}

/// Engine mixer channel index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MixerChannel(pub usize);

/// Mixer parameters exposed per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Level,
    Balance,
    Mute,
    Solo,
    Mono,
}

impl ParamKind {
    /// All parameters in display order
    pub const ALL: [ParamKind; 5] = [
        ParamKind::Level,
        ParamKind::Balance,
        ParamKind::Mute,
        ParamKind::Solo,
        ParamKind::Mono,
    ];

    /// Declared value range (inclusive)
    pub fn range(self) -> (f32, f32) {
        match self {
            ParamKind::Balance => (-1.0, 1.0),
            _ => (0.0, 1.0),
        }
    }

    /// Toggle parameters only ever hold 0.0 or 1.0
    pub fn is_toggle(self) -> bool {
        matches!(self, ParamKind::Mute | ParamKind::Solo | ParamKind::Mono)
    }

    /// Value the engine resets the parameter to
    pub fn default_value(self) -> f32 {
        match self {
            ParamKind::Level => 0.8,
            _ => 0.0,
        }
    }

    /// Clamp a raw value into this parameter's range
    ///
    /// Toggles snap to 0/1 around the midpoint. NaN collapses to the range minimum.
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        if value.is_nan() {
            return min;
        }
        let clamped = value.clamp(min, max);
        if self.is_toggle() {
            if clamped >= 0.5 { 1.0 } else { 0.0 }
        } else {
            clamped
        }
    }

    /// Short symbol used in logs and learn menus
    pub fn symbol(self) -> &'static str {
        match self {
            ParamKind::Level => "level",
            ParamKind::Balance => "balance",
            ParamKind::Mute => "mute",
            ParamKind::Solo => "solo",
            ParamKind::Mono => "mono",
        }
    }
}

/// A single parameter on a single mixer channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamRef {
    pub channel: MixerChannel,
    pub kind: ParamKind,
}

impl ParamRef {
    pub fn new(channel: MixerChannel, kind: ParamKind) -> Self {
        Self { channel, kind }
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel.0, self.kind.symbol())
    }
}

/// A physical control that can drive a parameter
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum ControlSource {
    /// MIDI control change (channel 0-15, CC 0-127)
    Midi { channel: u8, cc: u8 },
    /// HID named control (e.g. "fader_2")
    Hid { name: String },
}

impl ControlSource {
    /// Compact label shown on a control while learn mode is active
    pub fn learn_label(&self) -> String {
        match self {
            ControlSource::Midi { channel, cc } => format!("{}#{}", channel + 1, cc),
            ControlSource::Hid { name } => name.clone(),
        }
    }
}

/// Already-debounced event from a physical control
#[derive(Clone, Debug, PartialEq)]
pub struct ControlEvent {
    pub source: ControlSource,
    /// Normalized 0.0-1.0
    pub value: f32,
}

/// MIDI routing of a chain, used for its legend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiRouting {
    /// Single channel (0-15)
    Channel(u8),
    /// Listens on every channel
    All,
}

/// Snapshot of a chain as reported by the chain directory
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub id: ChainId,
    /// Engine mixer channel; `None` for placeholder chains without audio
    pub mixer_channel: Option<MixerChannel>,
    pub midi: Option<MidiRouting>,
    pub is_audio: bool,
    pub title: String,
}

impl Chain {
    /// Audio chain routed to a mixer channel
    pub fn audio(id: u32, channel: usize) -> Self {
        Self {
            id: ChainId(id),
            mixer_channel: Some(MixerChannel(channel)),
            midi: None,
            is_audio: true,
            title: format!("Chain {}", id),
        }
    }

    /// Chain with no mixer channel (MIDI-only or empty)
    pub fn silent(id: u32) -> Self {
        Self {
            id: ChainId(id),
            mixer_channel: None,
            midi: None,
            is_audio: false,
            title: format!("Chain {}", id),
        }
    }

    pub fn with_midi(mut self, routing: MidiRouting) -> Self {
        self.midi = Some(routing);
        self
    }
}

/// Peak meter reading for one mixer channel (levels in dBFS)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterState {
    pub peak_a: f32,
    pub peak_b: f32,
    pub hold_a: f32,
    pub hold_b: f32,
    pub mono: bool,
}

impl MeterState {
    /// Floor value used when a meter is reset or unavailable
    pub const SILENT_DB: f32 = -200.0;

    pub fn silent() -> Self {
        Self {
            peak_a: Self::SILENT_DB,
            peak_b: Self::SILENT_DB,
            hold_a: Self::SILENT_DB,
            hold_b: Self::SILENT_DB,
            mono: false,
        }
    }
}

impl Default for MeterState {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_clamp_ranges() {
        assert_eq!(ParamKind::Level.clamp(1.5), 1.0);
        assert_eq!(ParamKind::Level.clamp(-0.2), 0.0);
        assert_eq!(ParamKind::Balance.clamp(-2.0), -1.0);
        assert_eq!(ParamKind::Balance.clamp(0.3), 0.3);
        assert_eq!(ParamKind::Level.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn test_toggle_snaps() {
        assert_eq!(ParamKind::Mute.clamp(0.7), 1.0);
        assert_eq!(ParamKind::Solo.clamp(0.2), 0.0);
        assert_eq!(ParamKind::Mono.clamp(3.0), 1.0);
        assert!(!ParamKind::Balance.is_toggle());
    }

    #[test]
    fn test_learn_label() {
        let midi = ControlSource::Midi { channel: 0, cc: 7 };
        assert_eq!(midi.learn_label(), "1#7");
        let hid = ControlSource::Hid { name: "fader_2".to_string() };
        assert_eq!(hid.learn_label(), "fader_2");
    }

    #[test]
    fn test_control_source_serde() {
        let source = ControlSource::Midi { channel: 3, cc: 21 };
        let yaml = serde_yaml::to_string(&source).unwrap();
        let parsed: ControlSource = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, source);
    }

    #[test]
    fn test_master_chain_id() {
        assert!(ChainId::MASTER.is_master());
        assert!(!ChainId(4).is_master());
        assert_eq!(ChainId::MASTER.to_string(), "main");
    }
}
