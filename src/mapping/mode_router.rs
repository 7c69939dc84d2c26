//! Button routing between the menu, area-effect and default policies
//!
//! Every button notification is handled by exactly one policy, chosen in
//! strict priority order: character menu, then area-effect cast, then the
//! default key bindings. Releases always undo what the matching press sent,
//! whichever policy is active when the release arrives.

use crate::config::{EngineConfig, KeyBindings};
use crate::mapping::edge_tracker::{Edge, EdgeTracker};
use crate::mapping::mapping_types::{
    GameStateSignals, HeldOutput, Key, LogicalButton, MouseButton, OutputEvent,
};
use crate::mapping::providers::OutputSink;
use std::fmt::{self, Display};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPolicy {
    /// Character select and other out-of-world screens
    Menu,
    /// Targeted area-effect placement
    AreaEffect,
    Default,
}

impl Display for ButtonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonPolicy::Menu => write!(f, "Menu"),
            ButtonPolicy::AreaEffect => write!(f, "AreaEffect"),
            ButtonPolicy::Default => write!(f, "Default"),
        }
    }
}

/// Picks the policy for the current game state
pub fn route(signals: &GameStateSignals, config: &EngineConfig) -> ButtonPolicy {
    if !config.memory_reading {
        return ButtonPolicy::Default;
    }
    let signals = signals.effective();

    if config.override_menu && signals.attached && !signals.in_world {
        ButtonPolicy::Menu
    } else if signals.in_world() && config.override_area_effect && signals.area_effect_cast {
        ButtonPolicy::AreaEffect
    } else {
        ButtonPolicy::Default
    }
}

/// Keys used by the menu policy
pub fn menu_key(button: LogicalButton) -> Option<Key> {
    match button {
        LogicalButton::LFaceUp => Some(Key::Up),
        LogicalButton::LFaceDown => Some(Key::Down),
        LogicalButton::RFaceDown => Some(Key::Enter),
        LogicalButton::CenterMiddle => Some(Key::Escape),
        _ => None,
    }
}

/// Handles one button notification and returns the policy that took it
pub fn handle_button(
    button: LogicalButton,
    pressed: bool,
    signals: &GameStateSignals,
    config: &EngineConfig,
    bindings: &KeyBindings,
    tracker: &mut EdgeTracker,
    sink: &dyn OutputSink,
) -> ButtonPolicy {
    let policy = route(signals, config);
    debug!("Button {} {} via {} policy", button, pressed, policy);

    match policy {
        ButtonPolicy::Menu => {
            let output = held_output(button, menu_key);
            apply_edge(button, pressed, output, tracker, sink);
            ButtonPolicy::Menu
        }
        ButtonPolicy::AreaEffect => {
            if area_effect_click(button, pressed, config, tracker, sink) {
                ButtonPolicy::AreaEffect
            } else {
                default_policy(button, pressed, bindings, tracker, sink);
                ButtonPolicy::Default
            }
        }
        ButtonPolicy::Default => {
            default_policy(button, pressed, bindings, tracker, sink);
            ButtonPolicy::Default
        }
    }
}

fn default_policy(
    button: LogicalButton,
    pressed: bool,
    bindings: &KeyBindings,
    tracker: &mut EdgeTracker,
    sink: &dyn OutputSink,
) {
    let output = held_output(button, |b| bindings.get(b));
    if output.is_none() && pressed {
        debug!("No binding for {}", button);
    }
    apply_edge(button, pressed, output, tracker, sink);
}

/// Confirm/cancel clicks while an area effect is being placed
///
/// Returns false when the event should fall through to the default policy.
fn area_effect_click(
    button: LogicalButton,
    pressed: bool,
    config: &EngineConfig,
    tracker: &EdgeTracker,
    sink: &dyn OutputSink,
) -> bool {
    if !pressed || tracker.is_held(button) {
        return false;
    }

    let click = if button == config.area_effect_confirm {
        MouseButton::Left
    } else if button == config.area_effect_cancel {
        MouseButton::Right
    } else {
        return false;
    };

    debug!("Area-effect {} -> {:?} click", button, click);
    sink.emit(OutputEvent::MouseClick(click));
    true
}

/// Stick clicks always drive the mouse; everything else goes through `keys`
fn held_output(
    button: LogicalButton,
    keys: impl Fn(LogicalButton) -> Option<Key>,
) -> Option<HeldOutput> {
    button
        .stick_click_mouse()
        .map(HeldOutput::Mouse)
        .or_else(|| keys(button).map(HeldOutput::Key))
}

fn apply_edge(
    button: LogicalButton,
    pressed: bool,
    output: Option<HeldOutput>,
    tracker: &mut EdgeTracker,
    sink: &dyn OutputSink,
) {
    match tracker.observe(button, pressed) {
        Edge::Pressed => {
            if let Some(output) = output {
                sink.emit(output.press_event());
                tracker.latch(button, output);
            }
        }
        Edge::Released => {
            if let Some(held) = tracker.unlatch(button) {
                sink.emit(held.release_event());
            }
        }
        Edge::None => {}
    }
}
