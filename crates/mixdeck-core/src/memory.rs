//! In-process console model
//!
//! A self-contained implementation of the chain directory, engine parameters
//! and pad bank. Used by the headless simulator and by tests; it behaves like
//! the real engine from a view's point of view: values are clamped, every
//! change is published on the [`NotificationHub`], and reads never block on
//! anything but a short-lived lock.

use crate::engine::{
    ChainDirectory, EngineError, EngineParams, PadInfo, PatternGrid, RawPlayState, UnbindScope,
};
use crate::notify::{Notification, NotificationHub};
use crate::types::{
    Chain, ChainId, ControlEvent, ControlSource, MeterState, MixerChannel, ParamKind, ParamRef,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Number of mixer channels, excluding the master bus
pub const DEFAULT_CHANNELS: usize = 16;

struct ConsoleState {
    /// Ordered chains, master excluded
    chains: Vec<Chain>,
    master: Chain,
    active: ChainId,
    values: HashMap<ParamRef, f32>,
    sources: HashMap<ControlSource, ParamRef>,
    momentary: HashSet<ParamRef>,
    meters: HashMap<MixerChannel, MeterState>,
}

impl ConsoleState {
    fn position(&self, id: ChainId) -> Option<usize> {
        self.chains.iter().position(|c| c.id == id)
    }
}

/// Chain directory + mixer engine held entirely in memory
pub struct InMemoryConsole {
    hub: Arc<NotificationHub>,
    channel_count: usize,
    state: RwLock<ConsoleState>,
}

impl InMemoryConsole {
    /// Console with only the master bus
    pub fn new(channel_count: usize) -> Self {
        let master_channel = MixerChannel(channel_count);
        let mut values = HashMap::new();
        for ch in 0..=channel_count {
            for kind in ParamKind::ALL {
                values.insert(ParamRef::new(MixerChannel(ch), kind), kind.default_value());
            }
        }
        let master = Chain {
            id: ChainId::MASTER,
            mixer_channel: Some(master_channel),
            midi: None,
            is_audio: true,
            title: "Main".to_string(),
        };
        Self {
            hub: Arc::new(NotificationHub::new()),
            channel_count,
            state: RwLock::new(ConsoleState {
                chains: Vec::new(),
                master,
                active: ChainId::MASTER,
                values,
                sources: HashMap::new(),
                momentary: HashSet::new(),
                meters: HashMap::new(),
            }),
        }
    }

    /// Console with `count` audio chains (ids 1..=count on channels 0..count)
    pub fn with_audio_chains(count: usize) -> Self {
        let console = Self::new(DEFAULT_CHANNELS.max(count));
        for i in 0..count {
            console.add_chain(Chain::audio(i as u32 + 1, i));
        }
        console
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    pub fn master_channel(&self) -> MixerChannel {
        MixerChannel(self.channel_count)
    }

    /// Append a chain at the end of the order
    pub fn add_chain(&self, chain: Chain) {
        if let Ok(mut state) = self.state.write() {
            log::debug!("Console: adding {}", chain.id);
            state.chains.push(chain);
        }
        self.hub.publish(Notification::ChainsChanged);
    }

    /// Remove a chain; the active pointer falls back to a neighbour
    pub fn remove_chain(&self, id: ChainId) -> bool {
        let mut active_changed = None;
        if let Ok(mut state) = self.state.write() {
            let Some(pos) = state.position(id) else {
                return false;
            };
            state.chains.remove(pos);
            if state.active == id {
                let fallback = state
                    .chains
                    .get(pos.saturating_sub(1))
                    .map(|c| c.id)
                    .unwrap_or(ChainId::MASTER);
                state.active = fallback;
                active_changed = Some(fallback);
            }
        } else {
            return false;
        }
        self.hub.publish(Notification::ChainsChanged);
        if let Some(active) = active_changed {
            self.hub.publish(Notification::ActiveChainChanged(active));
        }
        true
    }

    /// Replace the displayed order (ids not present are ignored)
    pub fn reorder(&self, order: &[ChainId]) {
        if let Ok(mut state) = self.state.write() {
            let mut reordered: Vec<Chain> = order
                .iter()
                .filter_map(|id| state.chains.iter().find(|c| c.id == *id).cloned())
                .collect();
            for chain in &state.chains {
                if !reordered.iter().any(|c| c.id == chain.id) {
                    reordered.push(chain.clone());
                }
            }
            state.chains = reordered;
        }
        self.hub.publish(Notification::ChainsChanged);
    }

    pub fn set_meter(&self, channel: MixerChannel, meter: MeterState) {
        if let Ok(mut state) = self.state.write() {
            state.meters.insert(channel, meter);
        }
    }

    /// Route a hardware event to the parameter its source is bound to
    pub fn apply_control(&self, event: &ControlEvent) -> Option<ParamRef> {
        let target = self.bound_target(&event.source)?;
        let (min, max) = target.kind.range();
        self.set_value(target, min + event.value.clamp(0.0, 1.0) * (max - min));
        Some(target)
    }

    /// Publish a snapshot reload (all values may have changed)
    pub fn load_snapshot(&self, values: &[(ParamRef, f32)]) {
        if let Ok(mut state) = self.state.write() {
            for (param, value) in values {
                state.values.insert(*param, param.kind.clamp(*value));
            }
        }
        self.hub.publish(Notification::SnapshotLoaded);
    }

    fn channel_exists(&self, channel: MixerChannel) -> bool {
        channel.0 <= self.channel_count
    }
}

impl ChainDirectory for InMemoryConsole {
    fn ordered_chain_ids(&self) -> Vec<ChainId> {
        self.state
            .read()
            .map(|state| {
                let mut ids: Vec<ChainId> = state.chains.iter().map(|c| c.id).collect();
                ids.push(ChainId::MASTER);
                ids
            })
            .unwrap_or_default()
    }

    fn get_chain(&self, id: ChainId) -> Option<Chain> {
        let state = self.state.read().ok()?;
        if id.is_master() {
            return Some(state.master.clone());
        }
        state.chains.iter().find(|c| c.id == id).cloned()
    }

    fn active_chain_id(&self) -> ChainId {
        self.state
            .read()
            .map(|state| state.active)
            .unwrap_or(ChainId::MASTER)
    }

    fn set_active(&self, id: ChainId) -> bool {
        let changed = match self.state.write() {
            Ok(mut state) => {
                if !id.is_master() && state.position(id).is_none() {
                    return false;
                }
                let changed = state.active != id;
                state.active = id;
                changed
            }
            Err(_) => return false,
        };
        if changed {
            self.hub.publish(Notification::ActiveChainChanged(id));
        }
        true
    }

    fn move_active(&self, offset: i32) -> bool {
        let moved = match self.state.write() {
            Ok(mut state) => {
                let active = state.active;
                match state.position(active) {
                    Some(pos) => {
                        let target = pos as i64 + offset as i64;
                        if target < 0 || target >= state.chains.len() as i64 {
                            false
                        } else {
                            state.chains.swap(pos, target as usize);
                            true
                        }
                    }
                    None => false,
                }
            }
            Err(_) => false,
        };
        if moved {
            self.hub.publish(Notification::ChainsChanged);
        }
        moved
    }
}

impl EngineParams for InMemoryConsole {
    fn get_value(&self, param: ParamRef) -> Option<f32> {
        self.state.read().ok()?.values.get(&param).copied()
    }

    fn set_value(&self, param: ParamRef, value: f32) {
        if !self.channel_exists(param.channel) {
            return;
        }
        let value = param.kind.clamp(value);
        let changed = match self.state.write() {
            Ok(mut state) => state.values.insert(param, value) != Some(value),
            Err(_) => false,
        };
        if changed {
            self.hub.publish(Notification::ValueChanged { param, value });
        }
    }

    fn get_bound_source(&self, param: ParamRef) -> Option<ControlSource> {
        let state = self.state.read().ok()?;
        state
            .sources
            .iter()
            .find(|(_, target)| **target == param)
            .map(|(source, _)| source.clone())
    }

    fn bound_target(&self, source: &ControlSource) -> Option<ParamRef> {
        self.state.read().ok()?.sources.get(source).copied()
    }

    fn bind_source(&self, param: ParamRef, source: ControlSource) -> Result<(), EngineError> {
        if !self.channel_exists(param.channel) {
            return Err(EngineError::UnknownChannel(param.channel.0));
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| EngineError::Rejected("console state poisoned".to_string()))?;
        if let Some(existing) = state.sources.get(&source) {
            if *existing != param {
                return Err(EngineError::SourceInUse {
                    source_label: source.learn_label(),
                    target: *existing,
                });
            }
        }
        state.sources.retain(|_, target| *target != param);
        state.sources.insert(source, param);
        Ok(())
    }

    fn unbind(&self, scope: UnbindScope) {
        if let Ok(mut state) = self.state.write() {
            match scope {
                UnbindScope::Param(param) => state.sources.retain(|_, target| *target != param),
                UnbindScope::All => state.sources.clear(),
            }
        }
    }

    fn is_momentary(&self, param: ParamRef) -> bool {
        self.state
            .read()
            .map(|state| state.momentary.contains(&param))
            .unwrap_or(false)
    }

    fn set_momentary(&self, param: ParamRef, momentary: bool) {
        if let Ok(mut state) = self.state.write() {
            if momentary {
                state.momentary.insert(param);
            } else {
                state.momentary.remove(&param);
            }
        }
    }

    fn meters(&self, channel: MixerChannel) -> Option<MeterState> {
        if !self.channel_exists(channel) {
            return None;
        }
        let state = self.state.read().ok()?;
        Some(state.meters.get(&channel).copied().unwrap_or_default())
    }
}

/// Pad bank held in memory
pub struct InMemoryPatterns {
    pads: RwLock<Vec<(PadInfo, bool)>>,
}

impl InMemoryPatterns {
    /// `count` stopped pads, each sixteen steps long
    pub fn new(count: usize) -> Self {
        let pads = (0..count)
            .map(|i| {
                let info = PadInfo {
                    play_state: RawPlayState::Stopped,
                    length: 16,
                    disabled: false,
                    empty: false,
                    group: (i % 4) as u8,
                    title: format!("{}", i + 1),
                };
                (info, true)
            })
            .collect();
        Self {
            pads: RwLock::new(pads),
        }
    }

    pub fn set_pad(&self, pad: usize, info: PadInfo) {
        if let Ok(mut pads) = self.pads.write() {
            if let Some(slot) = pads.get_mut(pad) {
                *slot = (info, true);
            }
        }
    }
}

impl PatternGrid for InMemoryPatterns {
    fn pad_count(&self) -> usize {
        self.pads.read().map(|pads| pads.len()).unwrap_or(0)
    }

    fn pad_info(&self, pad: usize) -> Option<PadInfo> {
        self.pads.read().ok()?.get(pad).map(|(info, _)| info.clone())
    }

    fn take_changed(&self, pad: usize) -> bool {
        match self.pads.write() {
            Ok(mut pads) => pads
                .get_mut(pad)
                .map(|(_, changed)| std::mem::replace(changed, false))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn toggle_play(&self, pad: usize) {
        if let Ok(mut pads) = self.pads.write() {
            if let Some((info, changed)) = pads.get_mut(pad) {
                info.play_state = match info.play_state {
                    RawPlayState::Stopped | RawPlayState::Stopping | RawPlayState::StoppingSync => {
                        RawPlayState::Starting
                    }
                    RawPlayState::Playing | RawPlayState::Starting | RawPlayState::Restarting => {
                        RawPlayState::Stopping
                    }
                };
                *changed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_ids_end_with_master() {
        let console = InMemoryConsole::with_audio_chains(3);
        assert_eq!(
            console.ordered_chain_ids(),
            vec![ChainId(1), ChainId(2), ChainId(3), ChainId::MASTER]
        );
        assert_eq!(console.get_chain(ChainId::MASTER).unwrap().mixer_channel, Some(console.master_channel()));
    }

    #[test]
    fn test_move_active_swaps_and_stops_at_edges() {
        let console = InMemoryConsole::with_audio_chains(3);
        console.set_active(ChainId(1));
        assert!(!console.move_active(-1));
        assert!(console.move_active(1));
        assert_eq!(
            console.ordered_chain_ids(),
            vec![ChainId(2), ChainId(1), ChainId(3), ChainId::MASTER]
        );
        assert!(console.move_active(1));
        assert!(!console.move_active(1));
    }

    #[test]
    fn test_set_value_publishes_once() {
        let console = InMemoryConsole::with_audio_chains(1);
        let sub = console.hub().subscribe();
        let param = ParamRef::new(MixerChannel(0), ParamKind::Level);
        console.set_value(param, 0.5);
        console.set_value(param, 0.5);
        let events: Vec<_> = sub.drain().collect();
        assert_eq!(events, vec![Notification::ValueChanged { param, value: 0.5 }]);
    }

    #[test]
    fn test_bind_rejects_source_owned_elsewhere() {
        let console = InMemoryConsole::with_audio_chains(2);
        let source = ControlSource::Midi { channel: 0, cc: 7 };
        let a = ParamRef::new(MixerChannel(0), ParamKind::Level);
        let b = ParamRef::new(MixerChannel(1), ParamKind::Level);
        console.bind_source(a, source.clone()).unwrap();
        assert!(matches!(
            console.bind_source(b, source.clone()),
            Err(EngineError::SourceInUse { .. })
        ));
        console.unbind(UnbindScope::Param(a));
        assert!(console.bind_source(b, source.clone()).is_ok());
        assert_eq!(console.bound_target(&source), Some(b));
    }

    #[test]
    fn test_apply_control_routes_to_bound_param() {
        let console = InMemoryConsole::with_audio_chains(1);
        let source = ControlSource::Midi { channel: 0, cc: 1 };
        let param = ParamRef::new(MixerChannel(0), ParamKind::Balance);
        console.bind_source(param, source.clone()).unwrap();
        let routed = console.apply_control(&ControlEvent { source, value: 0.0 });
        assert_eq!(routed, Some(param));
        assert_eq!(console.get_value(param), Some(-1.0));
    }

    #[test]
    fn test_remove_active_chain_falls_back() {
        let console = InMemoryConsole::with_audio_chains(3);
        console.set_active(ChainId(2));
        assert!(console.remove_chain(ChainId(2)));
        assert_eq!(console.active_chain_id(), ChainId(1));
        assert!(!console.remove_chain(ChainId(2)));
    }

    #[test]
    fn test_pattern_toggle_marks_changed() {
        let patterns = InMemoryPatterns::new(4);
        assert!(patterns.take_changed(0));
        assert!(!patterns.take_changed(0));
        patterns.toggle_play(0);
        assert!(patterns.take_changed(0));
        assert_eq!(patterns.pad_info(0).unwrap().play_state, RawPlayState::Starting);
    }
}
