//! Mixer surface - tick loop and input dispatch
//!
//! Owns the strip window, the learn machine and the in-flight gestures, and
//! is driven by three timelines:
//!
//! - `tick()` at display rate: pump engine notifications, drain the refresh
//!   queue, redraw what changed
//! - `refresh_meters()` at a slow poll rate: read peak meters
//! - `handle_input()` / `on_control_event()` as events arrive
//!
//! Navigation to other screens is out of scope; such requests are queued as
//! [`SurfaceAction`]s and collected with [`MixerSurface::take_actions`].

use crate::config::{EncoderRole, SurfaceConfig};
use crate::gesture::{FaderGesture, LabelDrag, PointerEvent, PressOutcome, PressTracker};
use crate::layout::{Region, StripGeometry};
use crate::learn::{CaptureOutcome, LearnError, LearnMachine, LearnState};
use crate::refresh::{RefreshQueue, StripField};
use crate::render::Renderer;
use crate::strip::{StripSlot, ViewContext};
use crate::window::StripWindow;
use mixdeck_core::{
    ChainDirectory, ChainId, ConfirmPrompt, ControlEvent, EngineParams, Notification,
    NotificationHub, ParamKind, ParamRef, Subscription, UnbindScope,
};
use std::sync::Arc;

/// Physical push switches of the control panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    Layer,
    Back,
    Snapshot,
    Select,
}

/// Press duration class reported by the switch driver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchPress {
    Short,
    Bold,
    Long,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

/// Already-debounced input delivered to the surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Press(PointerEvent),
    Motion(PointerEvent),
    Release(PointerEvent),
    /// Mouse wheel; positive is up
    Wheel { x: f32, y: f32, delta: i32 },
    Rotary { encoder: usize, delta: i32 },
    Switch(Switch, SwitchPress),
    Arrow(Arrow),
    /// Pointer grab lost; abandons any drag
    FocusLost,
}

/// Contents of the learn options menu
#[derive(Clone, Debug, PartialEq)]
pub struct LearnOptions {
    pub title: String,
    /// Armed parameter, or `None` for all mixer controls
    pub target: Option<ParamRef>,
    /// Current momentary flag; only offered for toggle controls
    pub momentary: Option<bool>,
}

impl LearnOptions {
    pub fn clean_label(&self) -> String {
        match self.target {
            Some(param) => format!("Clean learn ({})", param.kind.symbol()),
            None => "Clean learn (ALL)".to_string(),
        }
    }
}

/// Entry picked from the learn options menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnOption {
    Momentary,
    Latch,
    Clean,
}

/// Request for the caller (screen routing, title bar)
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceAction {
    OpenChainControl(ChainId),
    OpenChainOptions(ChainId),
    OpenLearnOptions(LearnOptions),
    OpenPadView,
    OpenPatternEditor(usize),
    ShowBackButton(bool),
    /// Transient title text
    SetTitle(String),
}

/// Title shown after a level change
pub fn volume_title(level: f32) -> String {
    if level > 0.0 {
        format!("Volume: {:.2}dB", 20.0 * level.log10())
    } else {
        "Volume: -\u{221e}dB".to_string()
    }
}

/// Title shown after a balance change
pub fn balance_title(balance: f32) -> String {
    format!("Balance: {}%", (balance * 100.0) as i32)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PointerTarget {
    Fader(StripSlot),
    Button(StripSlot, Region),
    Label(StripSlot),
}

pub struct MixerSurface {
    config: SurfaceConfig,
    geometry: StripGeometry,
    directory: Arc<dyn ChainDirectory>,
    engine: Arc<dyn EngineParams>,
    hub: Arc<NotificationHub>,
    subscription: Option<Subscription>,
    queue: RefreshQueue,
    window: StripWindow,
    learn: LearnMachine,
    fader: FaderGesture,
    label: LabelDrag,
    button: PressTracker,
    pointer: Option<PointerTarget>,
    move_mode: bool,
    shown: bool,
    actions: Vec<SurfaceAction>,
}

impl MixerSurface {
    pub fn new(
        config: SurfaceConfig,
        directory: Arc<dyn ChainDirectory>,
        engine: Arc<dyn EngineParams>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        let queue = RefreshQueue::new();
        let window = StripWindow::new(config.layout.strip_count(), queue.clone());
        log::info!(
            "Mixer: {} strips + master on {}x{}",
            window.visible_count(),
            config.layout.screen_width,
            config.layout.screen_height
        );
        Self {
            geometry: StripGeometry::new(&config.layout),
            fader: FaderGesture::new(&config.gesture),
            label: LabelDrag::new(&config.gesture),
            button: PressTracker::new(config.gesture.label_hold()),
            config,
            directory,
            engine,
            hub,
            subscription: None,
            queue,
            window,
            learn: LearnMachine::new(),
            pointer: None,
            move_mode: false,
            shown: false,
            actions: Vec::new(),
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn geometry(&self) -> &StripGeometry {
        &self.geometry
    }

    pub fn window(&self) -> &StripWindow {
        &self.window
    }

    pub fn learn_state(&self) -> &LearnState {
        self.learn.state()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_move_mode(&self) -> bool {
        self.move_mode
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handle to the redraw queue for producers on other threads
    pub fn refresh_handle(&self) -> RefreshQueue {
        self.queue.clone()
    }

    /// Navigation and title requests queued since the last call
    pub fn take_actions(&mut self) -> Vec<SurfaceAction> {
        std::mem::take(&mut self.actions)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub fn show(&mut self) {
        if self.shown {
            return;
        }
        self.shown = true;
        if self.subscription.is_none() {
            self.subscription = Some(self.hub.subscribe());
        }
        let resumed = self.learn.resume();
        self.sync_chains();
        self.window.invalidate_all();
        log::info!(
            "Mixer: shown (offset {}, active {}{})",
            self.window.offset(),
            self.window.active(),
            if resumed { ", learn resumed" } else { "" }
        );

        if self.move_mode || self.learn.is_armed() {
            self.actions.push(SurfaceAction::ShowBackButton(true));
        }
        self.actions.push(SurfaceAction::SetTitle("Mixer".to_string()));
    }

    /// Hide the surface
    ///
    /// Drags are abandoned. Learn mode is cancelled unless it was marked
    /// sticky, in which case it is parked and the notification subscription
    /// stays open until the next show.
    pub fn hide(&mut self) {
        if !self.shown {
            return;
        }
        self.shown = false;
        self.cancel_pointer();
        let parked = self.learn.suspend();
        if !parked {
            if let Some(subscription) = self.subscription.take() {
                self.hub.unsubscribe(subscription.id());
            }
        }
        log::info!("Mixer: hidden{}", if parked { " (learn parked)" } else { "" });
    }

    /// Keep learn mode across the next hide
    pub fn mark_learn_sticky(&mut self) {
        self.learn.mark_sticky();
    }

    /// Apply pending engine notifications and redraw what changed
    ///
    /// Returns the number of strip draws issued.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> usize {
        self.pump_notifications();
        if !self.shown {
            return 0;
        }

        let batch = self.queue.drain();
        if batch.is_empty() {
            return 0;
        }
        let ctx = ViewContext {
            learn: self.learn.state(),
            active: self.window.active(),
            move_mode: self.move_mode,
            master_solo: self.master_solo(),
        };
        let mut drawn = 0;
        for entry in batch {
            let Some(strip) = self.window.strip(entry.slot) else {
                continue;
            };
            if strip.is_hidden() {
                continue;
            }
            renderer.draw_strip(entry.field, &strip.view(&ctx));
            drawn += 1;
        }
        log::debug!("Mixer: tick drew {} strip fields", drawn);
        drawn
    }

    /// Poll peak meters; queues a redraw for each strip whose reading changed
    ///
    /// The master meter is always polled; chain meters only when enabled.
    pub fn refresh_meters(&mut self) -> usize {
        if !self.shown {
            return 0;
        }
        let enabled = self.config.meters.enabled;
        let mut changed = 0;
        for strip in self.window.strips_mut() {
            if strip.is_hidden() || (!enabled && strip.slot() != StripSlot::Master) {
                continue;
            }
            let Some(meter) = strip.channel().and_then(|ch| self.engine.meters(ch)) else {
                continue;
            };
            if strip.set_meter(meter) {
                self.queue.enqueue(strip.slot(), StripField::Meter);
                changed += 1;
            }
        }
        changed
    }

    fn pump_notifications(&mut self) -> usize {
        // Collect first to release the subscription borrow
        let pending: Vec<Notification> = match &self.subscription {
            Some(subscription) => subscription.drain().collect(),
            None => return 0,
        };
        let count = pending.len();
        for notification in pending {
            self.apply_notification(notification);
        }
        count
    }

    fn apply_notification(&mut self, notification: Notification) {
        match notification {
            Notification::ValueChanged { param, value } => {
                let Some(slot) = self.window.slot_for_channel(param.channel) else {
                    return;
                };
                let changed = self
                    .window
                    .strip_mut(slot)
                    .is_some_and(|strip| strip.apply_engine_value(param.kind, value));
                if changed {
                    self.mark_changed(slot, param.kind);
                }
            }
            Notification::ActiveChainChanged(id) => {
                self.window.set_active(id, &*self.directory, &*self.engine);
            }
            Notification::ChainsChanged => self.sync_chains(),
            Notification::SnapshotLoaded => {
                log::debug!("Mixer: snapshot loaded, rebinding");
                self.window.rebind(&*self.directory, &*self.engine);
            }
        }
    }

    /// Queue the redraw a parameter change needs
    fn mark_changed(&mut self, slot: StripSlot, kind: ParamKind) {
        match kind {
            ParamKind::Solo if slot == StripSlot::Master => self.window.invalidate_all(),
            ParamKind::Mono => {
                self.queue.enqueue(slot, StripField::Mono);
                self.queue.enqueue(slot, StripField::Meter);
            }
            _ => self.queue.enqueue(slot, kind.into()),
        }
    }

    fn sync_chains(&mut self) {
        let ids = self.directory.ordered_chain_ids();
        self.window.set_chain_list(&ids, &*self.directory, &*self.engine);
        let active = self.directory.active_chain_id();
        if !self.window.set_active(active, &*self.directory, &*self.engine) {
            self.window.set_active(ChainId::MASTER, &*self.directory, &*self.engine);
        }
    }

    fn master_solo(&self) -> bool {
        self.window
            .strip(StripSlot::Master)
            .and_then(|s| s.binding(ParamKind::Solo))
            .is_some_and(|b| b.is_on())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Input dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Route one input event. Returns false if the surface did not use it.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if !self.shown {
            return false;
        }
        match event {
            InputEvent::Press(ev) => self.pointer_press(ev),
            InputEvent::Motion(ev) => self.pointer_motion(ev),
            InputEvent::Release(ev) => self.pointer_release(ev),
            InputEvent::Wheel { x, y, delta } => self.wheel(x, y, delta),
            InputEvent::Rotary { encoder, delta } => self.rotary(encoder, delta),
            InputEvent::Switch(switch, press) => self.switch(switch, press),
            InputEvent::Arrow(arrow) => self.arrow(arrow),
            InputEvent::FocusLost => {
                self.cancel_pointer();
                true
            }
        }
    }

    fn cancel_pointer(&mut self) {
        self.pointer = None;
        self.fader.release();
        self.label.cancel();
        self.button.cancel();
    }

    fn pointer_press(&mut self, ev: PointerEvent) -> bool {
        let Some((slot, region)) = self.geometry.hit(ev.x, ev.y) else {
            return false;
        };
        self.cancel_pointer();
        match region {
            Region::Fader => {
                self.activate_slot(slot);
                if self.learn.is_armed() {
                    self.learn_target(slot, ParamKind::Level);
                } else {
                    self.fader.press(ev);
                    self.pointer = Some(PointerTarget::Fader(slot));
                }
            }
            Region::Balance => {
                if self.learn.is_armed() {
                    self.learn_target(slot, ParamKind::Balance);
                }
            }
            Region::Solo | Region::Mute => {
                self.button.press(ev.time);
                self.pointer = Some(PointerTarget::Button(slot, region));
            }
            Region::Legend => {
                self.activate_slot(slot);
                self.label.press(ev);
                self.pointer = Some(PointerTarget::Label(slot));
            }
        }
        true
    }

    fn pointer_motion(&mut self, ev: PointerEvent) -> bool {
        match self.pointer {
            Some(PointerTarget::Fader(slot)) => {
                let width = self.geometry.fader_width();
                let height = self.geometry.fader_height();
                if let Some(adjust) = self.fader.motion(ev, width, height) {
                    let current = self
                        .window
                        .strip(slot)
                        .and_then(|s| s.binding(adjust.kind))
                        .map(|b| b.value());
                    if let Some(current) = current {
                        self.set_param(slot, adjust.kind, current + adjust.delta);
                    }
                }
                true
            }
            Some(PointerTarget::Label(_)) => {
                if let Some(step) = self.label.motion(ev, self.geometry.strip_width()) {
                    if self.move_mode {
                        self.window.move_active(step, &*self.directory, &*self.engine);
                    } else {
                        self.window.scroll(-step, &*self.directory, &*self.engine);
                    }
                }
                true
            }
            Some(PointerTarget::Button(..)) => true,
            None => false,
        }
    }

    fn pointer_release(&mut self, ev: PointerEvent) -> bool {
        match self.pointer.take() {
            Some(PointerTarget::Fader(_)) => {
                self.fader.release();
            }
            Some(PointerTarget::Button(slot, region)) => {
                let kind = match (region, self.button.release(ev.time)) {
                    (_, None) => return true,
                    (Region::Mute, Some(PressOutcome::Long)) => ParamKind::Mono,
                    (Region::Mute, _) => ParamKind::Mute,
                    _ => ParamKind::Solo,
                };
                self.toggle(slot, kind);
            }
            Some(PointerTarget::Label(slot)) => {
                let outcome = self.label.release(ev);
                self.set_move_mode(false);
                if self.learn.is_armed() {
                    return true;
                }
                if let Some(chain) = self.window.strip(slot).and_then(|s| s.chain_id()) {
                    match outcome {
                        Some(PressOutcome::Short) => {
                            self.actions.push(SurfaceAction::OpenChainControl(chain))
                        }
                        Some(PressOutcome::Long) => {
                            self.actions.push(SurfaceAction::OpenChainOptions(chain))
                        }
                        _ => {}
                    }
                }
            }
            None => return false,
        }
        true
    }

    fn wheel(&mut self, x: f32, y: f32, delta: i32) -> bool {
        let Some((slot, region)) = self.geometry.hit(x, y) else {
            return false;
        };
        match region {
            Region::Fader => {
                self.nudge(slot, ParamKind::Level, delta);
            }
            Region::Balance => {
                self.nudge(slot, ParamKind::Balance, delta);
            }
            _ => {
                self.window.scroll(delta, &*self.directory, &*self.engine);
            }
        }
        true
    }

    fn rotary(&mut self, encoder: usize, delta: i32) -> bool {
        let Some(role) = self.config.encoder_role(encoder) else {
            return false;
        };
        match role {
            EncoderRole::ActiveLevel => {
                self.nudge_highlighted(ParamKind::Level, delta);
            }
            EncoderRole::ActiveBalance => {
                self.nudge_highlighted(ParamKind::Balance, delta);
            }
            EncoderRole::MasterLevel => {
                self.nudge(StripSlot::Master, ParamKind::Level, delta);
            }
            EncoderRole::SelectChain => {
                if self.move_mode {
                    self.move_active(delta);
                } else {
                    self.select_relative(delta);
                }
            }
        }
        true
    }

    fn switch(&mut self, switch: Switch, press: SwitchPress) -> bool {
        let highlighted = self.window.highlighted();
        match (switch, press) {
            (Switch::Layer, SwitchPress::Short) => {
                if let Some(slot) = highlighted {
                    self.toggle(slot, ParamKind::Solo);
                }
                true
            }
            (Switch::Layer, SwitchPress::Bold) if self.learn.is_armed() => {
                self.open_learn_options();
                true
            }
            (Switch::Back, SwitchPress::Short) if !self.move_mode => {
                if let Some(slot) = highlighted {
                    self.toggle(slot, ParamKind::Mute);
                }
                true
            }
            (Switch::Back, SwitchPress::Short) => self.back_action(),
            (Switch::Back, SwitchPress::Bold) => {
                if self.learn.is_armed() {
                    self.back_action()
                } else {
                    self.actions.push(SurfaceAction::OpenPadView);
                    true
                }
            }
            (Switch::Select, _) if self.move_mode => {
                self.set_move_mode(false);
                true
            }
            (Switch::Select, SwitchPress::Short) => {
                if self.learn.is_armed() {
                    self.open_learn_options();
                } else {
                    let active = self.window.active();
                    self.actions.push(SurfaceAction::OpenChainControl(active));
                }
                true
            }
            (Switch::Select, SwitchPress::Bold) => {
                let active = self.window.active();
                self.actions.push(SurfaceAction::OpenChainOptions(active));
                true
            }
            _ => false,
        }
    }

    fn arrow(&mut self, arrow: Arrow) -> bool {
        match arrow {
            Arrow::Left | Arrow::Right => {
                let step = if arrow == Arrow::Left { -1 } else { 1 };
                if self.move_mode {
                    self.move_active(step);
                } else {
                    self.select_relative(step);
                }
            }
            Arrow::Up => {
                self.nudge_highlighted(ParamKind::Level, 1);
            }
            Arrow::Down => {
                self.nudge_highlighted(ParamKind::Level, -1);
            }
        }
        true
    }

    /// Leave move mode, else cancel learn. Returns false if neither applied.
    pub fn back_action(&mut self) -> bool {
        if self.move_mode {
            self.set_move_mode(false);
            return true;
        }
        if self.learn.is_armed() {
            self.exit_learn();
            return true;
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────
    // Parameter edits
    // ─────────────────────────────────────────────────────────────────────

    /// Set a parameter from a user gesture. While learning, selects it instead.
    pub fn set_param(&mut self, slot: StripSlot, kind: ParamKind, value: f32) -> bool {
        if self.learn.is_armed() {
            return self.learn_target(slot, kind);
        }
        let engine = &*self.engine;
        let Some(binding) = self.window.strip_mut(slot).and_then(|s| s.binding_mut(kind)) else {
            return false;
        };
        if !binding.set_value(value, engine) {
            return false;
        }
        let value = binding.value();
        self.after_user_change(slot, kind, value);
        true
    }

    /// Step a parameter by `ticks` nudges
    pub fn nudge(&mut self, slot: StripSlot, kind: ParamKind, ticks: i32) -> bool {
        if self.learn.is_armed() {
            return self.learn_target(slot, kind);
        }
        let step = match kind {
            ParamKind::Level => self.config.nudge.level_step,
            ParamKind::Balance => self.config.nudge.balance_step,
            _ => 1.0,
        };
        let engine = &*self.engine;
        let Some(binding) = self.window.strip_mut(slot).and_then(|s| s.binding_mut(kind)) else {
            return false;
        };
        if !binding.nudge(ticks, step, engine) {
            return false;
        }
        let value = binding.value();
        self.after_user_change(slot, kind, value);
        true
    }

    fn nudge_highlighted(&mut self, kind: ParamKind, ticks: i32) -> bool {
        match self.window.highlighted() {
            Some(slot) => self.nudge(slot, kind, ticks),
            None => false,
        }
    }

    pub fn toggle(&mut self, slot: StripSlot, kind: ParamKind) -> bool {
        if self.learn.is_armed() {
            return self.learn_target(slot, kind);
        }
        let engine = &*self.engine;
        let Some(binding) = self.window.strip_mut(slot).and_then(|s| s.binding_mut(kind)) else {
            return false;
        };
        if !binding.toggle(engine) {
            return false;
        }
        let value = binding.value();
        self.after_user_change(slot, kind, value);
        true
    }

    /// Restore a parameter's default (level 0.8, balance centre)
    pub fn reset(&mut self, slot: StripSlot, kind: ParamKind) -> bool {
        if self.learn.is_armed() {
            return self.learn_target(slot, kind);
        }
        let engine = &*self.engine;
        let Some(binding) = self.window.strip_mut(slot).and_then(|s| s.binding_mut(kind)) else {
            return false;
        };
        if !binding.reset(engine) {
            return false;
        }
        let value = binding.value();
        self.after_user_change(slot, kind, value);
        true
    }

    fn after_user_change(&mut self, slot: StripSlot, kind: ParamKind, value: f32) {
        self.mark_changed(slot, kind);
        match kind {
            ParamKind::Level => self.actions.push(SurfaceAction::SetTitle(volume_title(value))),
            ParamKind::Balance => self.actions.push(SurfaceAction::SetTitle(balance_title(value))),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Chain selection
    // ─────────────────────────────────────────────────────────────────────

    /// Make `id` the active chain and bring it into view
    pub fn select_chain(&mut self, id: ChainId) -> bool {
        if !self.directory.set_active(id) {
            log::debug!("Mixer: cannot select {}", id);
            return false;
        }
        self.window.set_active(id, &*self.directory, &*self.engine)
    }

    /// Select the chain `delta` places away (master included, at the end)
    pub fn select_relative(&mut self, delta: i32) -> bool {
        let ids = self.directory.ordered_chain_ids();
        let active = self.directory.active_chain_id();
        let Some(pos) = ids.iter().position(|id| *id == active) else {
            return false;
        };
        let target = (pos as i64 + delta as i64).clamp(0, ids.len() as i64 - 1) as usize;
        if target == pos {
            return false;
        }
        self.select_chain(ids[target])
    }

    fn activate_slot(&mut self, slot: StripSlot) {
        if let Some(id) = self.window.strip(slot).and_then(|s| s.chain_id()) {
            self.select_chain(id);
        }
    }

    pub fn move_active(&mut self, direction: i32) -> bool {
        self.window.move_active(direction, &*self.directory, &*self.engine)
    }

    /// Enter or leave chain move mode
    pub fn set_move_mode(&mut self, on: bool) {
        if self.move_mode == on {
            return;
        }
        self.move_mode = on;
        log::debug!("Mixer: move mode {}", if on { "on" } else { "off" });
        if let Some(slot) = self.window.highlighted() {
            self.queue.enqueue(slot, StripField::Legend);
        }
        self.actions.push(SurfaceAction::ShowBackButton(on || self.learn.is_armed()));
    }

    /// Hide one strip while the caller resizes it; redraws skip it
    pub fn begin_strip_resize(&mut self, slot: StripSlot) {
        self.window.begin_resize(slot);
    }

    pub fn end_strip_resize(&mut self) {
        self.window.end_resize();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Learn
    // ─────────────────────────────────────────────────────────────────────

    /// Arm learn without a target
    pub fn enter_learn(&mut self) {
        if self.learn.enter_any() {
            self.learn_changed();
        }
    }

    /// Arm learn for one control, from any state
    pub fn learn_control(&mut self, slot: StripSlot, kind: ParamKind) -> Result<bool, LearnError> {
        let param = self.param_at(slot, kind);
        let changed = self.learn.enter_specific(param)?;
        if changed {
            self.learn_changed();
        }
        Ok(changed)
    }

    pub fn exit_learn(&mut self) {
        if self.learn.cancel() {
            self.learn_changed();
        }
    }

    /// Learn button: arm generically, or disarm when already generic
    pub fn toggle_learn(&mut self) {
        if self.learn.toggle() {
            self.learn_changed();
        }
    }

    fn param_at(&self, slot: StripSlot, kind: ParamKind) -> Option<ParamRef> {
        self.window
            .strip(slot)
            .and_then(|s| s.binding(kind))
            .map(|b| b.param())
    }

    /// While armed, pick the control under a gesture as the learn target
    fn learn_target(&mut self, slot: StripSlot, kind: ParamKind) -> bool {
        match self.learn.select(self.param_at(slot, kind)) {
            Ok(changed) => {
                if changed {
                    self.window.invalidate_all();
                }
                true
            }
            Err(e) => {
                log::debug!("Learn: {} on {:?} not selectable: {}", kind.symbol(), slot, e);
                false
            }
        }
    }

    fn learn_changed(&mut self) {
        self.window.invalidate_all();
        self.actions
            .push(SurfaceAction::ShowBackButton(self.learn.is_armed() || self.move_mode));
    }

    /// Offer an external control event to learn mode
    pub fn on_control_event(&mut self, event: &ControlEvent) -> CaptureOutcome {
        let outcome = self.learn.capture(event, &*self.engine);
        if let CaptureOutcome::Bound(param) = &outcome {
            if let Some(slot) = self.window.slot_for_channel(param.channel) {
                if let Some(strip) = self.window.strip_mut(slot) {
                    strip.refresh_sources(&*self.engine);
                }
            }
            self.learn_changed();
        }
        outcome
    }

    /// Queue the learn options menu; learn mode survives the navigation
    pub fn open_learn_options(&mut self) {
        let target = self.learn.state().pending_target();
        let master = self.window.strip(StripSlot::Master).and_then(|s| s.channel());
        let title = match target {
            Some(param) if Some(param.channel) == master => "Learn Options (Main)".to_string(),
            Some(param) => format!("Learn Options ({})", param.channel.0 + 1),
            None => "Learn Options".to_string(),
        };
        let momentary = target
            .filter(|p| p.kind.is_toggle())
            .map(|p| self.engine.is_momentary(p));
        self.learn.mark_sticky();
        self.actions.push(SurfaceAction::OpenLearnOptions(LearnOptions {
            title,
            target,
            momentary,
        }));
    }

    /// Apply an entry picked from the learn options menu
    pub fn apply_learn_option(&mut self, option: LearnOption, prompt: &mut dyn ConfirmPrompt) -> bool {
        match option {
            LearnOption::Momentary => self.set_learn_momentary(true),
            LearnOption::Latch => self.set_learn_momentary(false),
            LearnOption::Clean => self.request_unlearn(prompt),
        }
    }

    /// Set momentary/latch on the armed toggle control
    pub fn set_learn_momentary(&mut self, momentary: bool) -> bool {
        let Some(param) = self.learn.state().pending_target().filter(|p| p.kind.is_toggle()) else {
            return false;
        };
        let engine = &*self.engine;
        match self.window.slot_for_channel(param.channel) {
            Some(slot) => {
                if let Some(binding) = self.window.strip_mut(slot).and_then(|s| s.binding_mut(param.kind)) {
                    binding.set_momentary(momentary, engine);
                }
                self.queue.enqueue(slot, param.kind.into());
            }
            None => engine.set_momentary(param, momentary),
        }
        true
    }

    /// Clear the armed control's learned source, or every source when none
    /// is armed, after confirmation
    pub fn request_unlearn(&mut self, prompt: &mut dyn ConfirmPrompt) -> bool {
        let (message, scope) = match self.learn.state().pending_target() {
            Some(param) => (
                format!("Do you want to clear learn for '{}' control?", param.kind.symbol()),
                UnbindScope::Param(param),
            ),
            None => (
                "Do you want to clean learn for ALL mixer controls?".to_string(),
                UnbindScope::All,
            ),
        };
        if !prompt.confirm(&message) {
            log::debug!("Learn: unlearn declined");
            return false;
        }

        self.engine.unbind(scope);
        let engine = &*self.engine;
        for strip in self.window.strips_mut() {
            strip.refresh_sources(engine);
        }
        log::info!("Learn: cleared {:?}", scope);
        self.learn.rearm();
        self.learn_changed();
        true
    }
}
