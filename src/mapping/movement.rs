//! Movement stick translation
//!
//! Turns the movement stick into four held direction keys and, when the game
//! reports its movement mode, into walk/run toggle keystrokes.

use crate::config::EngineConfig;
use crate::mapping::axis_curve::direction_gates;
use crate::mapping::edge_tracker::{Edge, EdgeTracker};
use crate::mapping::mapping_types::{
    AxisSample, GameStateSignals, HeldOutput, Key, LogicalButton, MovementMode, OutputEvent,
};
use crate::mapping::providers::OutputSink;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Key that toggles between walking and running in the target application
pub const WALK_TOGGLE_KEY: Key = Key::NumpadDivide;

/// How long a sent toggle waits for the reported mode to change
pub const TOGGLE_ACK_TIMEOUT: Duration = Duration::from_millis(250);

/// Fixed keys for the synthetic stick directions
pub fn direction_key(button: LogicalButton) -> Option<Key> {
    match button {
        LogicalButton::LeftStickUp => Some(Key::W),
        LogicalButton::LeftStickDown => Some(Key::S),
        LogicalButton::LeftStickLeft => Some(Key::A),
        LogicalButton::LeftStickRight => Some(Key::D),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkAction {
    StartWalk,
    StartRun,
    StopWalk,
}

#[derive(Debug, Default, Clone)]
pub struct MovementTranslator {
    /// Set once a stop-walk toggle went out; cleared when walking starts again
    stop_walk_sent: bool,
    /// Mode a toggle was sent from, and when
    awaiting_ack: Option<(MovementMode, Instant)>,
}

impl MovementTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_walk_sent(&self) -> bool {
        self.stop_walk_sent
    }

    /// Runs one tick of movement translation
    pub fn translate(
        &mut self,
        sample: AxisSample,
        signals: &GameStateSignals,
        config: &EngineConfig,
        tracker: &mut EdgeTracker,
        now: Instant,
        sink: &dyn OutputSink,
    ) {
        if config.auto_walk && signals.in_world() {
            if let Some(mode) = signals.movement_mode {
                self.auto_walk(sample, mode, config, now, sink);
            }
        }

        let gates = direction_gates(sample, config.movement_threshold);
        for (button, active) in [
            (LogicalButton::LeftStickLeft, gates.left),
            (LogicalButton::LeftStickRight, gates.right),
            (LogicalButton::LeftStickUp, gates.up),
            (LogicalButton::LeftStickDown, gates.down),
        ] {
            Self::drive_direction(button, active, tracker, sink);
        }
    }

    fn drive_direction(
        button: LogicalButton,
        active: bool,
        tracker: &mut EdgeTracker,
        sink: &dyn OutputSink,
    ) {
        match tracker.observe(button, active) {
            Edge::Pressed => {
                if let Some(key) = direction_key(button) {
                    let output = HeldOutput::Key(key);
                    sink.emit(output.press_event());
                    tracker.latch(button, output);
                }
            }
            Edge::Released => {
                if let Some(output) = tracker.unlatch(button) {
                    sink.emit(output.release_event());
                }
            }
            Edge::None => {}
        }
    }

    fn auto_walk(
        &mut self,
        sample: AxisSample,
        mode: MovementMode,
        config: &EngineConfig,
        now: Instant,
        sink: &dyn OutputSink,
    ) {
        if let Some((sent_from, sent_at)) = self.awaiting_ack {
            if sent_from == mode && now.duration_since(sent_at) < TOGGLE_ACK_TIMEOUT {
                return;
            }
            self.awaiting_ack = None;
        }

        let strength = sample.magnitude();
        let threshold = config.movement_threshold as f64;
        let walk_threshold = config.walk_threshold as f64;

        let action = match mode {
            MovementMode::Idle if strength >= threshold && strength < walk_threshold => {
                Some(WalkAction::StartWalk)
            }
            MovementMode::Walk if strength >= walk_threshold => Some(WalkAction::StartRun),
            MovementMode::Walk if strength < threshold && !self.stop_walk_sent => {
                Some(WalkAction::StopWalk)
            }
            _ => None,
        };

        if let Some(action) = action {
            info!(
                "Auto-walk {:?} (strength {:.1}, mode {:?})",
                action, strength, mode
            );
            match action {
                WalkAction::StartWalk => self.stop_walk_sent = false,
                WalkAction::StopWalk => self.stop_walk_sent = true,
                WalkAction::StartRun => {}
            }
            sink.emit(OutputEvent::KeyDown(WALK_TOGGLE_KEY));
            sink.emit(OutputEvent::KeyUp(WALK_TOGGLE_KEY));
            self.awaiting_ack = Some((mode, now));
        } else {
            debug!("Auto-walk idle (strength {:.1}, mode {:?})", strength, mode);
        }
    }
}
