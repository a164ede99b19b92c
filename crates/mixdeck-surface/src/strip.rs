//! Mixer strips
//!
//! A [`Strip`] is a fixed screen slot. It never moves; the window rebinds it
//! to whichever chain currently falls under it. A strip whose chain has no
//! engine channel keeps no bindings, renders empty and ignores writes.

use crate::learn::LearnState;
use crate::render::{ControlFace, LearnMark, StripView};
use mixdeck_core::{
    Chain, ChainId, ControllerBinding, EngineParams, MeterState, MidiRouting, MixerChannel,
    ParamKind, StripBindings,
};

/// Screen slot of a strip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StripSlot {
    /// Scrolling strip, 0 = leftmost
    Visible(usize),
    /// Pinned master strip at the right edge
    Master,
}

/// Legend for the active chain while it is being moved
pub const MOVE_LEGEND: &str = "\u{21e6}\u{21e8}";
/// Icon-font glyph for audio-only chains
pub const AUDIO_GLYPH: &str = "\u{f130}";
/// Icon-font glyph for chains without audio or MIDI input
pub const PROCESSOR_GLYPH: &str = "\u{f0ae}";

/// Render-time context shared by every strip in one pass
#[derive(Clone, Copy, Debug)]
pub struct ViewContext<'a> {
    pub learn: &'a LearnState,
    pub active: ChainId,
    pub move_mode: bool,
    pub master_solo: bool,
}

#[derive(Debug)]
pub struct Strip {
    slot: StripSlot,
    chain: Option<Chain>,
    bindings: Option<StripBindings>,
    meter: MeterState,
    highlighted: bool,
    hidden: bool,
}

impl Strip {
    pub fn new(slot: StripSlot) -> Self {
        Self {
            slot,
            chain: None,
            bindings: None,
            meter: MeterState::silent(),
            highlighted: false,
            hidden: false,
        }
    }

    pub fn slot(&self) -> StripSlot {
        self.slot
    }

    pub fn chain(&self) -> Option<&Chain> {
        self.chain.as_ref()
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain.as_ref().map(|c| c.id)
    }

    pub fn channel(&self) -> Option<MixerChannel> {
        self.bindings.as_ref().map(|b| b.channel())
    }

    pub fn bindings(&self) -> Option<&StripBindings> {
        self.bindings.as_ref()
    }

    /// Binding for `kind`, or `None` on an empty strip
    pub fn binding(&self, kind: ParamKind) -> Option<&ControllerBinding> {
        self.bindings.as_ref().map(|b| b.get(kind))
    }

    pub fn binding_mut(&mut self, kind: ParamKind) -> Option<&mut ControllerBinding> {
        self.bindings.as_mut().map(|b| b.get_mut(kind))
    }

    /// No engine channel behind this strip
    pub fn is_empty(&self) -> bool {
        self.bindings.is_none()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn meter(&self) -> MeterState {
        self.meter
    }

    /// Attach `chain` (or nothing), dropping any cached bindings first
    ///
    /// A chain whose channel cannot be read leaves the strip empty.
    pub fn bind(&mut self, chain: Option<Chain>, engine: &dyn EngineParams) {
        self.bindings = None;
        self.meter = MeterState::silent();
        self.chain = chain;

        let Some(chain) = &self.chain else {
            return;
        };
        if let Some(channel) = chain.mixer_channel {
            self.bindings = StripBindings::acquire(channel, engine);
            if self.bindings.is_none() {
                log::debug!("Mixer: {} has no readable channel {}, strip empty", chain.id, channel.0);
            }
        }
    }

    /// Apply an engine-reported value. Returns true if the cached value changed.
    pub fn apply_engine_value(&mut self, kind: ParamKind, value: f32) -> bool {
        match self.binding_mut(kind) {
            Some(binding) => binding.sync_from_engine(value),
            None => false,
        }
    }

    pub fn set_meter(&mut self, meter: MeterState) -> bool {
        if self.meter == meter {
            return false;
        }
        self.meter = meter;
        true
    }

    pub fn set_highlight(&mut self, highlighted: bool) -> bool {
        let changed = self.highlighted != highlighted;
        self.highlighted = highlighted;
        changed
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Re-read learned sources after a bind or unbind
    pub fn refresh_sources(&mut self, engine: &dyn EngineParams) {
        if let Some(bindings) = self.bindings.as_mut() {
            bindings.refresh_sources(engine);
        }
    }

    /// Bottom legend text
    pub fn legend(&self, ctx: &ViewContext<'_>) -> String {
        let Some(chain) = &self.chain else {
            return String::new();
        };
        if chain.id.is_master() {
            return "Main".to_string();
        }
        if ctx.move_mode && chain.id == ctx.active {
            return MOVE_LEGEND.to_string();
        }
        match chain.midi {
            Some(MidiRouting::Channel(ch)) => format!("\u{266b} {}", ch as u32 + 1),
            Some(MidiRouting::All) => "\u{266b} All".to_string(),
            None if chain.is_audio => AUDIO_GLYPH.to_string(),
            None => PROCESSOR_GLYPH.to_string(),
        }
    }

    fn learn_mark(&self, binding: &ControllerBinding, learn: &LearnState) -> LearnMark {
        if !learn.is_armed() {
            return LearnMark::None;
        }
        if learn.armed_target() == Some(binding.param()) {
            return LearnMark::Armed;
        }
        match binding.source() {
            Some(source) => LearnMark::Bound(source.learn_label()),
            None => LearnMark::Unbound,
        }
    }

    /// Snapshot for the renderer
    pub fn view(&self, ctx: &ViewContext<'_>) -> StripView {
        let mut view = StripView::blank(self.slot);
        view.chain = self.chain_id();
        view.highlighted = self.highlighted;
        view.master_solo = ctx.master_solo;
        view.legend = self.legend(ctx);
        view.title = self.chain.as_ref().map(|c| c.title.clone()).unwrap_or_default();

        if let Some(bindings) = &self.bindings {
            view.controls = bindings
                .iter()
                .map(|b| ControlFace {
                    kind: b.kind(),
                    value: b.value(),
                    momentary: b.is_momentary(),
                    learn: self.learn_mark(b, ctx.learn),
                })
                .collect();
            view.meter = Some(self.meter);
        }
        view
    }
}
