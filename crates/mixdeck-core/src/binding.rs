//! Controller bindings - cached view of engine parameters
//!
//! A [`ControllerBinding`] mirrors one engine parameter: its value (always
//! clamped to the parameter's range), the learned control source and the
//! momentary flag. Writes from the user go through to the engine; values
//! arriving from engine notifications are applied silently so they never
//! bounce back as a second write.

use crate::engine::EngineParams;
use crate::types::{ControlSource, MixerChannel, ParamKind, ParamRef};

/// Cached state of one engine parameter
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerBinding {
    param: ParamRef,
    value: f32,
    source: Option<ControlSource>,
    momentary: bool,
}

impl ControllerBinding {
    /// Detached binding with a known value (no engine lookup)
    pub fn new(param: ParamRef, value: f32) -> Self {
        Self {
            param,
            value: param.kind.clamp(value),
            source: None,
            momentary: false,
        }
    }

    /// Read the parameter's current state from the engine
    ///
    /// Returns `None` if the engine no longer knows the channel.
    pub fn acquire(param: ParamRef, engine: &dyn EngineParams) -> Option<Self> {
        let value = engine.get_value(param)?;
        Some(Self {
            param,
            value: param.kind.clamp(value),
            source: engine.get_bound_source(param),
            momentary: engine.is_momentary(param),
        })
    }

    pub fn param(&self) -> ParamRef {
        self.param
    }

    pub fn kind(&self) -> ParamKind {
        self.param.kind
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Toggle parameters read as booleans
    pub fn is_on(&self) -> bool {
        self.value >= 0.5
    }

    pub fn source(&self) -> Option<&ControlSource> {
        self.source.as_ref()
    }

    pub fn is_momentary(&self) -> bool {
        self.momentary
    }

    /// User-initiated write
    ///
    /// Clamps, updates the cache and forwards to the engine. Returns true if
    /// the stored value changed.
    pub fn set_value(&mut self, value: f32, engine: &dyn EngineParams) -> bool {
        let value = self.param.kind.clamp(value);
        if value == self.value {
            return false;
        }
        self.value = value;
        engine.set_value(self.param, value);
        true
    }

    /// Apply a value reported by the engine without writing it back
    pub fn sync_from_engine(&mut self, value: f32) -> bool {
        let value = self.param.kind.clamp(value);
        if value == self.value {
            return false;
        }
        self.value = value;
        true
    }

    /// Step the value by `ticks` increments of `step`
    ///
    /// Toggles ignore `step`: a positive tick switches on, a negative one off.
    pub fn nudge(&mut self, ticks: i32, step: f32, engine: &dyn EngineParams) -> bool {
        if ticks == 0 {
            return false;
        }
        let target = if self.param.kind.is_toggle() {
            if ticks > 0 { 1.0 } else { 0.0 }
        } else {
            self.value + ticks as f32 * step
        };
        self.set_value(target, engine)
    }

    pub fn toggle(&mut self, engine: &dyn EngineParams) -> bool {
        let target = if self.is_on() { 0.0 } else { 1.0 };
        self.set_value(target, engine)
    }

    /// Restore the parameter's default value
    pub fn reset(&mut self, engine: &dyn EngineParams) -> bool {
        self.set_value(self.param.kind.default_value(), engine)
    }

    /// Re-read the learned source and momentary flag from the engine
    pub fn refresh_source(&mut self, engine: &dyn EngineParams) {
        self.source = engine.get_bound_source(self.param);
        self.momentary = engine.is_momentary(self.param);
    }

    pub fn set_momentary(&mut self, momentary: bool, engine: &dyn EngineParams) {
        self.momentary = momentary;
        engine.set_momentary(self.param, momentary);
    }
}

/// The full parameter set of one mixer channel
#[derive(Clone, Debug, PartialEq)]
pub struct StripBindings {
    channel: MixerChannel,
    level: ControllerBinding,
    balance: ControllerBinding,
    mute: ControllerBinding,
    solo: ControllerBinding,
    mono: ControllerBinding,
}

impl StripBindings {
    /// Acquire every parameter of `channel`; `None` if any lookup misses
    pub fn acquire(channel: MixerChannel, engine: &dyn EngineParams) -> Option<Self> {
        let get = |kind| ControllerBinding::acquire(ParamRef::new(channel, kind), engine);
        Some(Self {
            channel,
            level: get(ParamKind::Level)?,
            balance: get(ParamKind::Balance)?,
            mute: get(ParamKind::Mute)?,
            solo: get(ParamKind::Solo)?,
            mono: get(ParamKind::Mono)?,
        })
    }

    pub fn channel(&self) -> MixerChannel {
        self.channel
    }

    pub fn get(&self, kind: ParamKind) -> &ControllerBinding {
        match kind {
            ParamKind::Level => &self.level,
            ParamKind::Balance => &self.balance,
            ParamKind::Mute => &self.mute,
            ParamKind::Solo => &self.solo,
            ParamKind::Mono => &self.mono,
        }
    }

    pub fn get_mut(&mut self, kind: ParamKind) -> &mut ControllerBinding {
        match kind {
            ParamKind::Level => &mut self.level,
            ParamKind::Balance => &mut self.balance,
            ParamKind::Mute => &mut self.mute,
            ParamKind::Solo => &mut self.solo,
            ParamKind::Mono => &mut self.mono,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerBinding> {
        ParamKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    pub fn refresh_sources(&mut self, engine: &dyn EngineParams) {
        for kind in ParamKind::ALL {
            self.get_mut(kind).refresh_source(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryConsole;

    fn level(ch: usize) -> ParamRef {
        ParamRef::new(MixerChannel(ch), ParamKind::Level)
    }

    #[test]
    fn test_set_value_clamps_and_writes_engine() {
        let console = InMemoryConsole::with_audio_chains(2);
        let mut binding = ControllerBinding::acquire(level(0), &console).unwrap();

        assert!(binding.set_value(1.5, &console));
        assert_eq!(binding.value(), 1.0);
        assert_eq!(console.get_value(level(0)), Some(1.0));

        let mut balance =
            ControllerBinding::acquire(ParamRef::new(MixerChannel(0), ParamKind::Balance), &console)
                .unwrap();
        balance.set_value(-2.0, &console);
        assert_eq!(balance.value(), -1.0);
    }

    #[test]
    fn test_sync_from_engine_is_silent() {
        let console = InMemoryConsole::with_audio_chains(1);
        let sub = console.hub().subscribe();
        let mut binding = ControllerBinding::acquire(level(0), &console).unwrap();

        assert!(binding.sync_from_engine(0.3));
        assert_eq!(binding.value(), 0.3);
        // Engine untouched, nothing published
        assert_eq!(console.get_value(level(0)), Some(0.8));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_nudge_level_and_toggle() {
        let console = InMemoryConsole::with_audio_chains(1);
        let mut binding = ControllerBinding::acquire(level(0), &console).unwrap();
        for _ in 0..40 {
            binding.nudge(1, 0.01, &console);
        }
        assert_eq!(binding.value(), 1.0);

        let mut mute =
            ControllerBinding::acquire(ParamRef::new(MixerChannel(0), ParamKind::Mute), &console)
                .unwrap();
        assert!(mute.nudge(3, 0.01, &console));
        assert!(mute.is_on());
        assert!(!mute.nudge(1, 0.01, &console));
        assert!(mute.toggle(&console));
        assert!(!mute.is_on());
    }

    #[test]
    fn test_acquire_unknown_channel() {
        let console = InMemoryConsole::with_audio_chains(1);
        assert!(StripBindings::acquire(MixerChannel(42), &console).is_none());
        assert!(StripBindings::acquire(MixerChannel(0), &console).is_some());
    }

    #[test]
    fn test_strip_bindings_lookup() {
        let console = InMemoryConsole::with_audio_chains(1);
        let bindings = StripBindings::acquire(MixerChannel(0), &console).unwrap();
        assert_eq!(bindings.iter().count(), 5);
        assert_eq!(bindings.get(ParamKind::Balance).kind(), ParamKind::Balance);
        assert_eq!(bindings.get(ParamKind::Level).value(), 0.8);
    }
}
