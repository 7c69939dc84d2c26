//! Input engine: shared state, per-tick work and lifecycle
//!
//! # Architecture
//!
//! ```text
//! ControllerProvider ──(button listener)──┐
//!                                         ▼
//!                     EngineCore { Mutex<EngineState> } ──► OutputSink
//!                                         ▲
//! PollLoop thread ─────────(tick)─────────┘
//! ```
//!
//! Button notifications and poll ticks both lock the same [`EngineState`] for
//! their whole duration. They interleave freely but never tear a button's
//! state, and output leaves in the same order the state changed.

use crate::config::{EngineConfig, KeyBindings};
use crate::mapping::cursor::translate_cursor;
use crate::mapping::edge_tracker::{ButtonState, EdgeTracker};
use crate::mapping::mapping_types::{AxisSample, GameStateSignals, LogicalButton};
use crate::mapping::mode_router::{handle_button, ButtonPolicy};
use crate::mapping::movement::MovementTranslator;
use crate::mapping::poll_loop::{PollLoop, Running};
use crate::mapping::providers::{
    Clock, ControllerProvider, GameStateProvider, HapticFeedback, OutputSink, WindowProvider,
};
use crate::mapping::session_monitor::{SessionMonitor, SessionTimers};
use crate::mapping::EngineError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// External collaborators the engine is constructed with
#[derive(Clone)]
pub struct Collaborators {
    pub controller: Arc<dyn ControllerProvider>,
    pub game_state: Arc<dyn GameStateProvider>,
    pub window: Arc<dyn WindowProvider>,
    pub output: Arc<dyn OutputSink>,
    pub clock: Arc<dyn Clock>,
    pub haptics: Arc<dyn HapticFeedback>,
}

/// Mutable engine state, guarded by one lock
#[derive(Debug, Default)]
struct EngineState {
    tracker: EdgeTracker,
    movement: MovementTranslator,
    session: SessionMonitor,
}

/// Everything the poll thread and the button listener share
pub struct EngineCore {
    config: EngineConfig,
    bindings: KeyBindings,
    collaborators: Collaborators,
    state: Mutex<EngineState>,
}

impl EngineCore {
    fn new(config: EngineConfig, bindings: KeyBindings, collaborators: Collaborators) -> Self {
        Self {
            config,
            bindings,
            collaborators,
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Engine state lock poisoned, continuing with inner state");
            poisoned.into_inner()
        })
    }

    /// Game state as the policies should see it
    fn signals(&self) -> GameStateSignals {
        if self.config.memory_reading {
            self.collaborators.game_state.signals().effective()
        } else {
            GameStateSignals::DETACHED
        }
    }

    /// Movement and cursor samples, honoring `swap_sticks`
    fn axes(&self) -> (AxisSample, AxisSample) {
        let controller = &self.collaborators.controller;
        let left = controller.latest_left_axis();
        let right = controller.latest_right_axis();
        if self.config.swap_sticks {
            (right, left)
        } else {
            (left, right)
        }
    }

    /// One poll iteration: movement, cursor, session monitor
    pub fn tick(&self) {
        let signals = self.signals();
        let now = self.collaborators.clock.now();
        let (movement, cursor) = self.axes();
        let output = &*self.collaborators.output;
        let window = &*self.collaborators.window;

        let mut guard = self.lock_state();
        let state = &mut *guard;

        state.movement.translate(
            movement,
            &signals,
            &self.config,
            &mut state.tracker,
            now,
            output,
        );
        translate_cursor(cursor, &self.config, window, output);
        state
            .session
            .tick(now, &signals, window, &self.config, output);
    }

    /// Handles one button change from the controller
    pub fn on_button_state_changed(&self, button: LogicalButton, pressed: bool) -> ButtonPolicy {
        let signals = self.signals();
        let mut state = self.lock_state();
        handle_button(
            button,
            pressed,
            &signals,
            &self.config,
            &self.bindings,
            &mut state.tracker,
            &*self.collaborators.output,
        )
    }
}

/// The input-translation engine
///
/// Owns the button table, session timers and configuration. Button
/// notifications are handled from construction on; [`InputEngine::start`]
/// adds the periodic poll.
pub struct InputEngine {
    core: Arc<EngineCore>,
    poll: Option<PollLoop<Running>>,
}

impl InputEngine {
    /// Validates `config` and registers for button notifications
    pub fn new(
        config: EngineConfig,
        bindings: KeyBindings,
        collaborators: Collaborators,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        info!(
            "Creating input engine: poll every {}ms, {} key bindings",
            config.poll_interval_ms,
            bindings.len()
        );

        let core = Arc::new(EngineCore::new(config, bindings, collaborators));

        let listener_core = Arc::downgrade(&core);
        core.collaborators
            .controller
            .subscribe(Arc::new(move |button: LogicalButton, pressed: bool| {
                match listener_core.upgrade() {
                    Some(core) => {
                        core.on_button_state_changed(button, pressed);
                    }
                    None => debug!("Engine dropped, ignoring {} {}", button, pressed),
                }
            }));
        debug!("Registered button listener with controller");

        Ok(Self { core, poll: None })
    }

    /// Starts the poll thread
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.poll.is_some() {
            return Err(EngineError::InvalidStateTransition(
                "engine is already running".to_string(),
            ));
        }

        let period = self.core.config.poll_interval();
        let running = PollLoop::create(self.core.clone(), period).start()?;
        self.poll = Some(running);
        info!("Input engine started");
        Ok(())
    }

    /// Stops polling and cancels haptic feedback
    ///
    /// Keys already held stay held; only further polling stops.
    pub fn stop(&mut self) {
        if let Some(poll) = self.poll.take() {
            let stopped = poll.stop();
            info!("Input engine stopped after {} ticks", stopped.ticks());
        } else {
            debug!("Stop requested while not running");
        }

        let held: Vec<LogicalButton> = self
            .core
            .lock_state()
            .tracker
            .state()
            .held_buttons()
            .collect();
        if !held.is_empty() {
            debug!("Buttons still held at stop: {:?}", held);
        }
        self.core.collaborators.haptics.abort();
    }

    pub fn is_running(&self) -> bool {
        self.poll.is_some()
    }

    /// Runs one poll iteration on the calling thread
    pub fn tick(&self) {
        self.core.tick();
    }

    pub fn on_button_state_changed(&self, button: LogicalButton, pressed: bool) -> ButtonPolicy {
        self.core.on_button_state_changed(button, pressed)
    }

    pub fn button_state(&self) -> ButtonState {
        self.core.lock_state().tracker.state().clone()
    }

    pub fn session_timers(&self) -> SessionTimers {
        self.core.lock_state().session.timers().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        self.core.config()
    }
}

impl Drop for InputEngine {
    fn drop(&mut self) {
        if self.poll.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::mapping_types::{
        CursorPosition, Key, MouseButton, MovementMode, OutputEvent,
    };
    use crate::mapping::output::ChannelSink;
    use crate::mapping::test_support::{in_menu, in_world, Harness, TEST_RECT};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine_with(harness: &Harness, config: EngineConfig) -> InputEngine {
        InputEngine::new(
            config,
            KeyBindings::default(),
            Collaborators {
                controller: harness.controller.clone(),
                game_state: harness.game.clone(),
                window: harness.window.clone(),
                output: harness.sink.clone(),
                clock: harness.clock.clone(),
                haptics: harness.haptics.clone(),
            },
        )
        .expect("valid config")
    }

    fn engine(harness: &Harness) -> InputEngine {
        engine_with(harness, EngineConfig::default())
    }

    #[test]
    fn rejects_invalid_config() {
        let harness = Harness::new();
        let result = InputEngine::new(
            EngineConfig {
                poll_interval_ms: 0,
                ..EngineConfig::default()
            },
            KeyBindings::default(),
            Collaborators {
                controller: harness.controller.clone(),
                game_state: harness.game.clone(),
                window: harness.window.clone(),
                output: harness.sink.clone(),
                clock: harness.clock.clone(),
                haptics: harness.haptics.clone(),
            },
        );
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn registers_for_button_notifications() {
        let harness = Harness::new();
        let _engine = engine(&harness);
        assert_eq!(harness.controller.listener_count(), 1);

        harness.controller.press(LogicalButton::RFaceDown, true);
        harness.controller.press(LogicalButton::RFaceDown, false);
        assert_eq!(
            harness.sink.take(),
            vec![
                OutputEvent::KeyDown(Key::Num1),
                OutputEvent::KeyUp(Key::Num1)
            ]
        );
    }

    #[test]
    fn dropped_engine_ignores_notifications() {
        let harness = Harness::new();
        drop(engine(&harness));
        harness.controller.press(LogicalButton::RFaceDown, true);
        assert!(harness.sink.take().is_empty());
    }

    #[test]
    fn tick_runs_movement_then_cursor() {
        let harness = Harness::new();
        let engine = engine(&harness);
        harness.controller.set_left(50, 0);
        harness.controller.set_right(127, 0);

        engine.tick();
        assert_eq!(
            harness.sink.take(),
            vec![
                OutputEvent::KeyDown(Key::D),
                OutputEvent::SetCursor(CursorPosition { x: 303, y: 200 }),
            ]
        );
        assert!(engine.button_state().is_held(LogicalButton::LeftStickRight));
    }

    #[test]
    fn swapped_sticks_exchange_roles() {
        let harness = Harness::new();
        let engine = engine_with(
            &harness,
            EngineConfig {
                swap_sticks: true,
                hardware_mouse: true,
                ..EngineConfig::default()
            },
        );
        harness.controller.set_left(127, 0);
        harness.controller.set_right(0, 50);

        engine.tick();
        assert_eq!(
            harness.sink.take(),
            vec![
                OutputEvent::KeyDown(Key::S),
                OutputEvent::MoveRelative { dx: 3, dy: 0 },
            ]
        );
    }

    #[test]
    fn backed_up_output_channel_keeps_releases_balanced() {
        let harness = Harness::new();
        let (sink, mut rx) = ChannelSink::channel(8);
        let engine = InputEngine::new(
            EngineConfig {
                hardware_mouse: true,
                ..EngineConfig::default()
            },
            KeyBindings::default(),
            Collaborators {
                controller: harness.controller.clone(),
                game_state: harness.game.clone(),
                window: harness.window.clone(),
                output: Arc::new(sink),
                clock: harness.clock.clone(),
                haptics: harness.haptics.clone(),
            },
        )
        .expect("valid config");

        harness.controller.press(LogicalButton::RFaceDown, true);
        harness.controller.set_right(127, 0);
        for _ in 0..20 {
            engine.tick();
        }
        harness.controller.press(LogicalButton::RFaceDown, false);
        assert!(!engine.button_state().is_held(LogicalButton::RFaceDown));

        let mut received = Vec::new();
        while let Some(event) = rx.try_recv() {
            received.push(event);
        }
        let downs = received
            .iter()
            .filter(|e| matches!(e, OutputEvent::KeyDown(Key::Num1)))
            .count();
        let ups = received
            .iter()
            .filter(|e| matches!(e, OutputEvent::KeyUp(Key::Num1)))
            .count();
        assert_eq!((downs, ups), (1, 1));
        assert_eq!(received.last(), Some(&OutputEvent::KeyUp(Key::Num1)));
        assert!(received.len() <= 9);
    }

    #[test]
    fn memory_switch_off_ignores_game_state() {
        let harness = Harness::new();
        let engine = engine_with(
            &harness,
            EngineConfig {
                memory_reading: false,
                ..EngineConfig::default()
            },
        );
        harness.game.publish(in_menu());
        assert_eq!(
            engine.on_button_state_changed(LogicalButton::LFaceUp, true),
            ButtonPolicy::Default
        );

        harness.game.publish(GameStateSignals {
            movement_mode: Some(MovementMode::Idle),
            ..in_world()
        });
        harness.controller.set_left(50, 0);
        engine.tick();
        assert_eq!(
            harness.sink.take(),
            vec![OutputEvent::KeyDown(Key::Num5), OutputEvent::KeyDown(Key::D)]
        );
    }

    #[test]
    fn stick_direction_and_button_share_one_table() {
        let harness = Harness::new();
        let engine = engine(&harness);
        harness.game.publish(in_world());

        harness.controller.set_left(0, -60);
        engine.tick();
        harness.controller.press(LogicalButton::LeftStick, true);
        harness.controller.set_left(0, 0);
        engine.tick();
        harness.controller.press(LogicalButton::LeftStick, false);

        assert_eq!(
            harness.sink.take(),
            vec![
                OutputEvent::KeyDown(Key::W),
                OutputEvent::MouseDown(MouseButton::Left),
                OutputEvent::KeyUp(Key::W),
                OutputEvent::MouseUp(MouseButton::Left),
            ]
        );
    }

    #[test]
    fn aim_lock_session_recenters_once() {
        let harness = Harness::new();
        let engine = engine_with(
            &harness,
            EngineConfig {
                enable_overlay: false,
                ..EngineConfig::default()
            },
        );
        harness.game.publish(GameStateSignals {
            aim_lock: true,
            ..in_world()
        });
        for _ in 0..200 {
            engine.tick();
            harness.clock.advance(Duration::from_millis(5));
        }
        assert!(engine.session_timers().aim_lock_started.is_some());

        harness.game.update(|s| s.aim_lock = false);
        for _ in 0..200 {
            engine.tick();
            harness.clock.advance(Duration::from_millis(5));
        }
        assert_eq!(
            harness.sink.take(),
            vec![OutputEvent::SetCursor(TEST_RECT.center())]
        );
    }

    #[test]
    fn start_and_stop_lifecycle() {
        let harness = Harness::new();
        let mut engine = engine(&harness);
        assert!(!engine.is_running());

        engine.start().expect("start");
        assert!(engine.is_running());
        assert!(matches!(
            engine.start(),
            Err(EngineError::InvalidStateTransition(_))
        ));

        std::thread::sleep(Duration::from_millis(30));
        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(harness.haptics.abort_count(), 1);

        // Restart after stop
        engine.start().expect("restart");
        drop(engine);
        assert_eq!(harness.haptics.abort_count(), 2);
    }

    #[test]
    fn running_loop_emits_direction_key_once() {
        let harness = Harness::new();
        let mut engine = engine(&harness);
        harness.controller.set_left(-80, 0);

        engine.start().expect("start");
        std::thread::sleep(Duration::from_millis(50));
        engine.stop();

        assert_eq!(harness.sink.take(), vec![OutputEvent::KeyDown(Key::A)]);
    }
}
