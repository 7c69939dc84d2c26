use crate::mapping::mapping_types::{AxisSample, LogicalButton};
use crate::mapping::providers::ButtonListener;
use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Latest reading of both sticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickSnapshot {
    pub left: AxisSample,
    pub right: AxisSample,
}

// Collector settings
#[derive(Clone, Debug, PartialEq)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
    pub trigger_threshold: f32,
    pub poll_interval: Duration,
    pub gamepad_index: Option<usize>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.0,
            trigger_threshold: 0.5,
            poll_interval: Duration::from_millis(1),
            gamepad_index: None,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to spawn collector thread: {0}")]
    ThreadError(String),
}

/// Subscribers for button changes, shared between the handle and the thread
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<ButtonListener>>,
}

impl ListenerRegistry {
    pub fn add(&self, listener: ButtonListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener outside the registry lock
    pub fn notify(&self, button: LogicalButton, pressed: bool) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(button, pressed);
        }
    }
}

/// Gamepad state as seen through gilrs events
///
/// Turns raw gilrs buttons and axes into logical buttons and stick samples.
/// Button changes are reported once per transition; triggers reported as
/// analog axes become digital presses at `trigger_threshold`.
#[derive(Debug, Clone)]
pub struct InputState {
    deadzone: f32,
    trigger_threshold: f32,
    left: (f32, f32),
    right: (f32, f32),
    held: [bool; LogicalButton::COUNT],
}

impl InputState {
    pub fn new(settings: &CollectorSettings) -> Self {
        Self {
            deadzone: settings.joystick_deadzone,
            trigger_threshold: settings.trigger_threshold,
            left: (0.0, 0.0),
            right: (0.0, 0.0),
            held: [false; LogicalButton::COUNT],
        }
    }

    pub fn sticks(&self) -> StickSnapshot {
        StickSnapshot {
            left: AxisSample::from_normalized(self.left.0, self.left.1),
            right: AxisSample::from_normalized(self.right.0, self.right.1),
        }
    }

    /// Returns the logical change, if the button maps and actually changed
    pub fn button(&mut self, button: Button, pressed: bool) -> Option<(LogicalButton, bool)> {
        let logical = map_button(button)?;
        self.set_held(logical, pressed)
    }

    /// Updates stick state; triggers may produce a button change
    pub fn axis(&mut self, axis: Axis, value: f32) -> Option<(LogicalButton, bool)> {
        let value = apply_deadzone(value, self.deadzone);
        match axis {
            Axis::LeftStickX => self.left.0 = value,
            Axis::LeftStickY => self.left.1 = value,
            Axis::RightStickX => self.right.0 = value,
            Axis::RightStickY => self.right.1 = value,
            Axis::LeftZ => {
                return self.set_held(LogicalButton::LeftTrigger, value >= self.trigger_threshold)
            }
            Axis::RightZ => {
                return self.set_held(LogicalButton::RightTrigger, value >= self.trigger_threshold)
            }
            _ => debug!("Ignoring unsupported axis: {:?}", axis),
        }
        None
    }

    /// Releases everything and centers both sticks
    pub fn reset(&mut self) -> Vec<LogicalButton> {
        self.left = (0.0, 0.0);
        self.right = (0.0, 0.0);
        let released = LogicalButton::ALL
            .iter()
            .copied()
            .filter(|button| self.held[button.index()])
            .collect();
        self.held = [false; LogicalButton::COUNT];
        released
    }

    fn set_held(&mut self, button: LogicalButton, pressed: bool) -> Option<(LogicalButton, bool)> {
        let slot = &mut self.held[button.index()];
        if *slot == pressed {
            return None;
        }
        *slot = pressed;
        Some((button, pressed))
    }
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct EventCollector<S: CollectionState> {
    gilrs: Gilrs,
    active_gamepad: Option<GamepadId>,
    settings: CollectorSettings,
    input: InputState,
    sticks: watch::Sender<StickSnapshot>,
    listeners: Arc<ListenerRegistry>,
    keep_running: Arc<AtomicBool>,
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: CollectorSettings,
        sticks: watch::Sender<StickSnapshot>,
        listeners: Arc<ListenerRegistry>,
        keep_running: Arc<AtomicBool>,
    ) -> Result<Self, CollectorError> {
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        let input = InputState::new(&settings);
        Ok(Self::new(
            gilrs,
            None, // active_gamepad
            settings,
            input,
            sticks,
            listeners,
            keep_running,
        ))
    }

    /// Picks the gamepad to follow and transitions to Collecting
    pub fn initialize(mut self) -> EventCollector<Collecting> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one to appear");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }

            let index = match self.settings.gamepad_index {
                Some(index) if index < gamepads.len() => index,
                Some(index) => {
                    warn!("Gamepad index {} not present, using the first one", index);
                    0
                }
                None => 0,
            };
            let (id, gamepad) = &gamepads[index];
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
            self.active_gamepad = Some(*id);
        }

        self.transition()
    }
}

impl EventCollector<Collecting> {
    /// Handles a single pending gilrs event; returns false when none was queued
    pub fn collect_next_event(&mut self) -> bool {
        let Some(Event { id, event, .. }) = self.gilrs.next_event() else {
            return false;
        };

        match self.active_gamepad {
            Some(active_id) if id != active_id => {
                debug!("Skipping event from non-active gamepad: {:?}", id);
                return true;
            }
            None => {
                info!("Adopting gamepad {} as active", id);
                self.active_gamepad = Some(id);
            }
            _ => {}
        }

        match event {
            EventType::ButtonPressed(button, _) => self.apply_button(button, true),
            EventType::ButtonReleased(button, _) => self.apply_button(button, false),
            EventType::AxisChanged(axis, value, _) => {
                let change = self.input.axis(axis, value);
                self.publish_sticks();
                if let Some((button, pressed)) = change {
                    self.dispatch(button, pressed);
                }
            }
            EventType::Disconnected => {
                warn!("Active gamepad {} disconnected, releasing all inputs", id);
                self.active_gamepad = None;
                for button in self.input.reset() {
                    self.dispatch(button, false);
                }
                self.publish_sticks();
            }
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
            }
            _ => debug!("Unhandled event type: {:?}", event),
        }
        true
    }

    /// Runs until the shared flag is cleared
    pub fn run_collection_loop(&mut self) {
        info!("Starting Event Collector loop");

        let mut event_count = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        while self.keep_running.load(Ordering::Acquire) {
            while self.collect_next_event() {
                event_count += 1;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: processed {} events in last {} seconds (avg {:.2}/sec)",
                    event_count,
                    log_interval.num_seconds(),
                    event_count as f64 / log_interval.num_seconds() as f64
                );
                event_count = 0;
                last_log_time = now;
            }

            std::thread::sleep(self.settings.poll_interval);
        }

        info!("Event Collector loop finished");
    }

    fn apply_button(&mut self, button: Button, pressed: bool) {
        match self.input.button(button, pressed) {
            Some((logical, pressed)) => self.dispatch(logical, pressed),
            None => debug!("Button {:?} ignored (unmapped or unchanged)", button),
        }
    }

    fn dispatch(&self, button: LogicalButton, pressed: bool) {
        info!(
            "Button {} {} at {}",
            button,
            if pressed { "pressed" } else { "released" },
            Local::now().format("%H:%M:%S.%3f")
        );
        self.listeners.notify(button, pressed);
    }

    fn publish_sticks(&self) {
        let snapshot = self.input.sticks();
        self.sticks.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Maps gilrs buttons onto the logical layout
///
/// The D-pad is the left face cluster, the action buttons the right one.
pub fn map_button(button: Button) -> Option<LogicalButton> {
    match button {
        Button::South => Some(LogicalButton::RFaceDown),
        Button::East => Some(LogicalButton::RFaceRight),
        Button::West => Some(LogicalButton::RFaceLeft),
        Button::North => Some(LogicalButton::RFaceUp),
        Button::DPadUp => Some(LogicalButton::LFaceUp),
        Button::DPadDown => Some(LogicalButton::LFaceDown),
        Button::DPadLeft => Some(LogicalButton::LFaceLeft),
        Button::DPadRight => Some(LogicalButton::LFaceRight),
        Button::LeftTrigger => Some(LogicalButton::LeftShoulder),
        Button::RightTrigger => Some(LogicalButton::RightShoulder),
        Button::LeftTrigger2 => Some(LogicalButton::LeftTrigger),
        Button::RightTrigger2 => Some(LogicalButton::RightTrigger),
        Button::LeftThumb => Some(LogicalButton::LeftStick),
        Button::RightThumb => Some(LogicalButton::RightStick),
        Button::Select => Some(LogicalButton::CenterLeft),
        Button::Start => Some(LogicalButton::CenterRight),
        Button::Mode => Some(LogicalButton::CenterMiddle),
        _ => None,
    }
}

// Helper function to apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if deadzone <= 0.0 {
        value
    } else if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
