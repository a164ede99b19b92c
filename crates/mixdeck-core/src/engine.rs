//! Collaborator interfaces consumed by mixer views
//!
//! The audio engine, chain manager and sequencer live outside this workspace.
//! Views talk to them only through these traits. Every method is a
//! non-blocking lookup against the collaborator's own synchronization, so the
//! traits take `&self` and require `Send + Sync`.

use crate::types::{Chain, ChainId, ControlSource, MeterState, MixerChannel, ParamRef};

/// Errors reported by engine collaborators
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Mixer channel {0} does not exist")]
    UnknownChannel(usize),

    #[error("Control source {source_label} is already bound to {target}")]
    SourceInUse {
        source_label: String,
        target: ParamRef,
    },

    #[error("Engine rejected request: {0}")]
    Rejected(String),
}

/// Which learned bindings an unbind request clears
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnbindScope {
    /// A single parameter
    Param(ParamRef),
    /// Every mixer parameter
    All,
}

/// Ordered list of signal chains and the active-chain pointer
pub trait ChainDirectory: Send + Sync {
    /// Chain ids in display order. May include [`ChainId::MASTER`].
    fn ordered_chain_ids(&self) -> Vec<ChainId>;

    /// Look up a chain; `None` if it was removed
    fn get_chain(&self, id: ChainId) -> Option<Chain>;

    fn active_chain_id(&self) -> ChainId;

    /// Make `id` the active chain. Returns false if it does not exist.
    fn set_active(&self, id: ChainId) -> bool;

    /// Swap the active chain with its neighbour `offset` positions away.
    /// Returns false (and changes nothing) at either boundary.
    fn move_active(&self, offset: i32) -> bool;
}

/// Parameter access on the audio engine
pub trait EngineParams: Send + Sync {
    /// Current value, or `None` if the channel does not exist
    fn get_value(&self, param: ParamRef) -> Option<f32>;

    /// Write a value. The engine clamps and publishes a change notification.
    fn set_value(&self, param: ParamRef, value: f32);

    /// Control source currently driving `param`
    fn get_bound_source(&self, param: ParamRef) -> Option<ControlSource>;

    /// Parameter currently driven by `source`
    fn bound_target(&self, source: &ControlSource) -> Option<ParamRef>;

    /// Bind `source` to `param`, replacing any previous source of `param`
    fn bind_source(&self, param: ParamRef, source: ControlSource) -> Result<(), EngineError>;

    fn unbind(&self, scope: UnbindScope);

    /// Whether a learned toggle acts momentarily (press/release) or latches
    fn is_momentary(&self, param: ParamRef) -> bool;

    fn set_momentary(&self, param: ParamRef, momentary: bool);

    /// Latest peak meter reading for a channel
    fn meters(&self, channel: MixerChannel) -> Option<MeterState>;
}

/// Yes/no prompt shown before destructive actions
pub trait ConfirmPrompt {
    fn confirm(&mut self, message: &str) -> bool;
}

/// Any `FnMut(&str) -> bool` can answer a prompt
impl<F> ConfirmPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Raw play state reported by the sequencer for one pad
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawPlayState {
    Stopped,
    Playing,
    Stopping,
    Starting,
    Restarting,
    StoppingSync,
}

impl RawPlayState {
    /// Decode the sequencer's numeric play state
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Stopped),
            1 => Some(Self::Playing),
            2 => Some(Self::Stopping),
            3 => Some(Self::Starting),
            4 => Some(Self::Restarting),
            5 => Some(Self::StoppingSync),
            _ => None,
        }
    }
}

/// Sequencer description of one pad
#[derive(Clone, Debug, PartialEq)]
pub struct PadInfo {
    pub play_state: RawPlayState,
    /// Sequence length in steps; zero means nothing to play
    pub length: u32,
    /// Play mode is "disabled"
    pub disabled: bool,
    /// Sequence contains no events
    pub empty: bool,
    /// Mutually-exclusive play group (0 = "A")
    pub group: u8,
    pub title: String,
}

/// The sequencer's pad bank
pub trait PatternGrid: Send + Sync {
    fn pad_count(&self) -> usize;

    fn pad_info(&self, pad: usize) -> Option<PadInfo>;

    /// Returns true once per change of the pad since the last call
    fn take_changed(&self, pad: usize) -> bool;

    fn toggle_play(&self, pad: usize);
}
