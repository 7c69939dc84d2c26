//! Fakes shared by the unit tests

use crate::mapping::mapping_types::{
    AxisSample, ClientRect, CursorPosition, GameStateSignals, LogicalButton, MovementMode,
    OutputEvent,
};
use crate::mapping::providers::{
    ButtonListener, Clock, ControllerProvider, HapticFeedback, OutputSink, SharedGameState,
    SharedWindowState, WindowSnapshot,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<OutputEvent>>,
}

impl RecordingSink {
    /// Returns and clears everything recorded so far
    pub fn take(&self) -> Vec<OutputEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl OutputSink for RecordingSink {
    fn emit(&self, event: OutputEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeController {
    left: Mutex<AxisSample>,
    right: Mutex<AxisSample>,
    listeners: Mutex<Vec<ButtonListener>>,
}

impl FakeController {
    pub fn set_left(&self, x: i32, y: i32) {
        *self.left.lock().unwrap() = AxisSample::new(x, y);
    }

    pub fn set_right(&self, x: i32, y: i32) {
        *self.right.lock().unwrap() = AxisSample::new(x, y);
    }

    /// Delivers a button change to every subscriber, like the collector thread
    pub fn press(&self, button: LogicalButton, pressed: bool) {
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener(button, pressed);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl ControllerProvider for FakeController {
    fn latest_left_axis(&self) -> AxisSample {
        *self.left.lock().unwrap()
    }

    fn latest_right_axis(&self) -> AxisSample {
        *self.right.lock().unwrap()
    }

    fn subscribe(&self, listener: ButtonListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

#[derive(Debug, Default)]
pub struct CountingHaptics {
    pub aborts: AtomicUsize,
}

impl CountingHaptics {
    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl HapticFeedback for CountingHaptics {
    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn in_world() -> GameStateSignals {
    GameStateSignals {
        attached: true,
        in_world: true,
        movement_mode: Some(MovementMode::Run),
        aim_lock: false,
        area_effect_cast: false,
    }
}

pub fn in_menu() -> GameStateSignals {
    GameStateSignals {
        attached: true,
        in_world: false,
        movement_mode: None,
        aim_lock: false,
        area_effect_cast: false,
    }
}

pub const TEST_RECT: ClientRect = ClientRect {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
};

pub fn focused_window(cursor: CursorPosition) -> WindowSnapshot {
    WindowSnapshot {
        available: true,
        foreground: true,
        client_rect: Some(TEST_RECT),
        cursor: Some(cursor),
    }
}

/// Every collaborator an engine needs, all controllable from a test
pub struct Harness {
    pub controller: Arc<FakeController>,
    pub game: Arc<SharedGameState>,
    pub window: Arc<SharedWindowState>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub haptics: Arc<CountingHaptics>,
}

impl Harness {
    pub fn new() -> Self {
        let window = SharedWindowState::new();
        window.publish(focused_window(CursorPosition { x: 300, y: 200 }));
        Self {
            controller: Arc::new(FakeController::default()),
            game: Arc::new(SharedGameState::new()),
            window: Arc::new(window),
            sink: Arc::new(RecordingSink::default()),
            clock: Arc::new(ManualClock::new()),
            haptics: Arc::new(CountingHaptics::default()),
        }
    }
}
