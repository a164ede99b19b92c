//! Mixdeck surface simulator - headless replay of a scripted session
//!
//! Drives a `MixerSurface` against the in-memory console and logs every
//! redraw and surface action, so the view logic can be exercised without a
//! display or audio engine.
//!
//! ## Command line flags
//!
//! - `--config <path>`: surface config file (default: ~/.config/mixdeck/surface.yaml)
//! - `--chains <n>`: number of audio chains to create (default 12)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mixdeck_core::{
    ControlEvent, ControlSource, InMemoryConsole, InMemoryPatterns, MeterState, MixerChannel,
    ParamKind,
};
use mixdeck_surface::{
    default_config_path, load_config, Arrow, InputEvent, LearnOption, MixerSurface, PadGrid,
    PadView, PointerEvent, Renderer, StripField, StripSlot, StripView, Switch, SwitchPress,
};

/// Renderer that writes each draw call to the log
struct LogRenderer;

impl Renderer for LogRenderer {
    fn draw_strip(&mut self, field: StripField, view: &StripView) {
        let level = view
            .control(ParamKind::Level)
            .map(|c| format!("{:.2}", c.value))
            .unwrap_or_else(|| "-".to_string());
        log::info!(
            "draw {:?} {:?} legend={:?} level={}{}",
            view.slot,
            field,
            view.legend,
            level,
            if view.highlighted { " *" } else { "" }
        );
    }

    fn draw_pad(&mut self, view: &PadView) {
        log::info!("pad {} {:?} {:?}", view.index, view.state, view.title);
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn drain_actions(surface: &mut MixerSurface) {
    for action in surface.take_actions() {
        log::info!("action {:?}", action);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = arg_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let chains = arg_value(&args, "--chains")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(12);

    let config = load_config(&config_path);
    let console = Arc::new(InMemoryConsole::with_audio_chains(chains));
    let mut surface = MixerSurface::new(
        config.clone(),
        console.clone(),
        console.clone(),
        console.hub().clone(),
    );
    let mut renderer = LogRenderer;

    log::info!("mixdeck-sim starting with {} chains", chains);
    surface.show();
    surface.tick(&mut renderer);
    drain_actions(&mut surface);

    // Drag the first fader up by a fifth of its height
    let x = surface.geometry().strip_x(StripSlot::Visible(0)) + 5.0;
    let y = surface.geometry().fader_height() * 0.75;
    let travel = surface.geometry().fader_height() * 0.2;
    surface.handle_input(InputEvent::Press(PointerEvent::new(x, y, 0)));
    surface.handle_input(InputEvent::Motion(PointerEvent::new(x, y - travel, 150)));
    surface.handle_input(InputEvent::Release(PointerEvent::new(x, y - travel, 200)));
    surface.tick(&mut renderer);
    drain_actions(&mut surface);

    // Walk the selection past the right edge so the window pages
    for _ in 0..config.layout.strip_count() + 1 {
        surface.handle_input(InputEvent::Arrow(Arrow::Right));
    }
    surface.tick(&mut renderer);

    // Learn a MIDI CC onto the highlighted strip's mute, then play it
    if let Some(slot) = surface.window().highlighted() {
        match surface.learn_control(slot, ParamKind::Mute) {
            Ok(_) => {
                let event = ControlEvent {
                    source: ControlSource::Midi { channel: 0, cc: 20 },
                    value: 1.0,
                };
                log::info!("capture {:?}", surface.on_control_event(&event));
                console.apply_control(&event);
            }
            Err(e) => log::warn!("learn refused: {}", e),
        }
    }
    surface.tick(&mut renderer);
    drain_actions(&mut surface);

    // Clean every learned control through the options menu
    surface.enter_learn();
    surface.handle_input(InputEvent::Switch(Switch::Select, SwitchPress::Short));
    let mut accept = |message: &str| {
        log::info!("confirm: {}", message);
        true
    };
    surface.apply_learn_option(LearnOption::Clean, &mut accept);
    surface.exit_learn();
    surface.tick(&mut renderer);
    drain_actions(&mut surface);

    // Meter poll
    console.set_meter(
        MixerChannel(0),
        MeterState {
            peak_a: -6.0,
            peak_b: -7.5,
            ..MeterState::silent()
        },
    );
    log::info!("meters changed on {} strips", surface.refresh_meters());
    surface.tick(&mut renderer);

    // Pads: short press toggles, hold opens the editor
    let mut pads = PadGrid::new(Arc::new(InMemoryPatterns::new(16)), &config.gesture);
    pads.refresh(true, &mut renderer);
    pads.press(0, Duration::from_millis(0));
    if let Some(action) = pads.release(Duration::from_millis(100)) {
        log::info!("pad action {:?}", action);
    }
    pads.press(1, Duration::from_millis(0));
    if let Some(nav) = pads
        .release(config.gesture.pad_hold() + Duration::from_millis(100))
        .and_then(|action| action.navigation())
    {
        log::info!("action {:?}", nav);
    }
    pads.refresh(false, &mut renderer);

    surface.hide();
    log::info!("mixdeck-sim done");
}
