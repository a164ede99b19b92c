//! Learn mode state machine
//!
//! Binds a physical control source to one mixer parameter.
//!
//! ```text
//! Idle ──enter_any──► ArmedAny ──select(c)──► ArmedSpecific(c) ──capture──► Idle
//!   └──────────enter_specific(c)──────────────────┘
//! Armed* ──cancel / hide──► Idle
//! Armed* ──hide (sticky)──► Sticky(state) ──resume──► state
//! ```
//!
//! The machine holds a single state value, so at most one parameter can be
//! armed at a time; arming another simply replaces the previous target.

use mixdeck_core::{ControlEvent, EngineParams, ParamRef};

/// Current learn mode
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LearnState {
    #[default]
    Idle,
    /// Waiting for the user to pick a parameter
    ArmedAny,
    /// Waiting for a control source to bind to this parameter
    ArmedSpecific(ParamRef),
    /// Window hidden while armed; restored on the next show
    Sticky(Box<LearnState>),
}

impl LearnState {
    pub fn is_idle(&self) -> bool {
        matches!(self, LearnState::Idle)
    }

    /// Armed generically or for a specific parameter
    pub fn is_armed(&self) -> bool {
        matches!(self, LearnState::ArmedAny | LearnState::ArmedSpecific(_))
    }

    /// Parameter waiting for a control source
    pub fn armed_target(&self) -> Option<ParamRef> {
        match self {
            LearnState::ArmedSpecific(target) => Some(*target),
            _ => None,
        }
    }

    /// Armed target, looking through a parked state
    pub fn pending_target(&self) -> Option<ParamRef> {
        match self {
            LearnState::ArmedSpecific(target) => Some(*target),
            LearnState::Sticky(parked) => parked.pending_target(),
            _ => None,
        }
    }
}

/// Reasons a learn request is refused
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LearnError {
    #[error("Control has no engine channel to learn")]
    NoEngineChannel,

    #[error("Learn mode is not armed")]
    NotArmed,
}

/// Result of offering a control event to learn mode
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Source bound; learn mode returned to idle
    Bound(ParamRef),
    /// Event not used for learning (state unchanged)
    Ignored,
}

/// Owner of the single learn state
#[derive(Debug, Default)]
pub struct LearnMachine {
    state: LearnState,
    /// Caller announced the window will be hidden but learning should resume
    sticky_requested: bool,
}

impl LearnMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LearnState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }

    /// Arm without a target. Returns true if the state changed.
    pub fn enter_any(&mut self) -> bool {
        self.sticky_requested = false;
        if self.state == LearnState::ArmedAny {
            return false;
        }
        log::info!("Learn: armed (select a control)");
        self.state = LearnState::ArmedAny;
        true
    }

    /// Arm for `target`; `None` means the control has no engine channel
    ///
    /// Any previously armed target is dropped without binding.
    pub fn enter_specific(&mut self, target: Option<ParamRef>) -> Result<bool, LearnError> {
        let target = target.ok_or(LearnError::NoEngineChannel)?;
        self.sticky_requested = false;
        if self.state == LearnState::ArmedSpecific(target) {
            return Ok(false);
        }
        if let LearnState::ArmedSpecific(previous) = &self.state {
            log::debug!("Learn: dropping armed target {}", previous);
        }
        log::info!("Learn: armed for {}", target);
        self.state = LearnState::ArmedSpecific(target);
        Ok(true)
    }

    /// Pick a target while armed
    pub fn select(&mut self, target: Option<ParamRef>) -> Result<bool, LearnError> {
        if !self.state.is_armed() {
            return Err(LearnError::NotArmed);
        }
        self.enter_specific(target)
    }

    /// Leave learn mode. Returns true if anything was armed.
    pub fn cancel(&mut self) -> bool {
        self.sticky_requested = false;
        if self.state.is_idle() {
            return false;
        }
        log::info!("Learn: cancelled");
        self.state = LearnState::Idle;
        true
    }

    /// Learn button behaviour: idle arms, generic disarms, specific widens to generic
    pub fn toggle(&mut self) -> bool {
        match self.state {
            LearnState::ArmedAny => self.cancel(),
            _ => self.enter_any(),
        }
    }

    /// Keep learning across the next hide
    pub fn mark_sticky(&mut self) {
        if self.state.is_armed() {
            self.sticky_requested = true;
        }
    }

    pub fn is_sticky_requested(&self) -> bool {
        self.sticky_requested
    }

    /// Window is being hidden. Returns true if learning was parked as sticky.
    pub fn suspend(&mut self) -> bool {
        let sticky = std::mem::take(&mut self.sticky_requested);
        if !self.state.is_armed() {
            return false;
        }
        if sticky {
            let parked = std::mem::take(&mut self.state);
            log::debug!("Learn: parked {:?} while hidden", parked);
            self.state = LearnState::Sticky(Box::new(parked));
            true
        } else {
            self.cancel();
            false
        }
    }

    /// Window is shown again. Restores a parked state; returns true if it did.
    pub fn resume(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            LearnState::Sticky(parked) => {
                log::debug!("Learn: resumed {:?}", parked);
                self.state = *parked;
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Back to generic arming after an unlearn, keeping any parked state parked
    pub fn rearm(&mut self) {
        match &mut self.state {
            LearnState::Sticky(parked) => **parked = LearnState::ArmedAny,
            state => *state = LearnState::ArmedAny,
        }
    }

    /// Offer a control-source event
    ///
    /// Binds only while armed for a specific parameter. A source that already
    /// drives a different parameter is left alone: the event is live control
    /// for that parameter, not a learn gesture.
    pub fn capture(&mut self, event: &ControlEvent, engine: &dyn EngineParams) -> CaptureOutcome {
        let Some(target) = self.state.armed_target() else {
            return CaptureOutcome::Ignored;
        };
        if let Some(owner) = engine.bound_target(&event.source) {
            if owner != target {
                log::debug!(
                    "Learn: {} already drives {}, not binding to {}",
                    event.source.learn_label(),
                    owner,
                    target
                );
                return CaptureOutcome::Ignored;
            }
        }
        match engine.bind_source(target, event.source.clone()) {
            Ok(()) => {
                log::info!("Learn: bound {} to {}", event.source.learn_label(), target);
                self.state = LearnState::Idle;
                self.sticky_requested = false;
                CaptureOutcome::Bound(target)
            }
            Err(e) => {
                log::warn!("Learn: engine refused binding for {}: {}", target, e);
                CaptureOutcome::Ignored
            }
        }
    }
}
