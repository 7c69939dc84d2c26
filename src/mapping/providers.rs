//! Collaborator interfaces the engine is constructed with
//!
//! The engine has no platform dependency of its own. Controller input, game
//! state, window queries, output injection, time and haptics all come in
//! through these traits.

use crate::mapping::mapping_types::{
    AxisSample, ClientRect, CursorPosition, GameStateSignals, LogicalButton, OutputEvent,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Callback invoked for every button state change, `(button, pressed)`
pub type ButtonListener = Arc<dyn Fn(LogicalButton, bool) + Send + Sync>;

/// Source of stick samples and button notifications
pub trait ControllerProvider: Send + Sync {
    fn latest_left_axis(&self) -> AxisSample;

    fn latest_right_axis(&self) -> AxisSample;

    /// Registers a listener for button changes
    ///
    /// Listeners are called from the provider's own thread.
    fn subscribe(&self, listener: ButtonListener);
}

/// Read-only access to the target application's state
pub trait GameStateProvider: Send + Sync {
    /// Best-effort snapshot; may be stale
    fn signals(&self) -> GameStateSignals;
}

/// Window and pointer queries for the target application
pub trait WindowProvider: Send + Sync {
    /// Whether the target process and its main window exist at all
    fn target_available(&self) -> bool;

    fn is_target_foreground(&self) -> bool;

    fn target_client_rect(&self) -> Option<ClientRect>;

    fn cursor_position(&self) -> Option<CursorPosition>;
}

/// Receiver of synthesized input and overlay commands
///
/// Called while the engine state lock is held, so implementations must not
/// block.
pub trait OutputSink: Send + Sync {
    fn emit(&self, event: OutputEvent);
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn emit(&self, event: OutputEvent) {
        (**self).emit(event)
    }
}

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Controller rumble that can be cancelled on shutdown
pub trait HapticFeedback: Send + Sync {
    fn abort(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Haptics implementation for controllers without rumble support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn abort(&self) {}
}

/// Game state published through a watch channel
///
/// The memory-reading collaborator calls [`SharedGameState::publish`]; the
/// engine reads the latest value. Starts out detached.
#[derive(Debug)]
pub struct SharedGameState {
    sender: watch::Sender<GameStateSignals>,
}

impl SharedGameState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(GameStateSignals::DETACHED);
        Self { sender }
    }

    pub fn publish(&self, signals: GameStateSignals) {
        self.sender.send_replace(signals);
    }

    /// Applies a change to the current snapshot in place
    pub fn update(&self, change: impl FnOnce(&mut GameStateSignals)) {
        self.sender.send_modify(change);
    }

    pub fn subscribe(&self) -> watch::Receiver<GameStateSignals> {
        self.sender.subscribe()
    }
}

impl Default for SharedGameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStateProvider for SharedGameState {
    fn signals(&self) -> GameStateSignals {
        *self.sender.borrow()
    }
}

/// Latest known state of the target window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSnapshot {
    pub available: bool,
    pub foreground: bool,
    pub client_rect: Option<ClientRect>,
    pub cursor: Option<CursorPosition>,
}

/// Window state published through a watch channel by the window tracker
#[derive(Debug)]
pub struct SharedWindowState {
    sender: watch::Sender<WindowSnapshot>,
}

impl SharedWindowState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(WindowSnapshot::default());
        Self { sender }
    }

    pub fn publish(&self, snapshot: WindowSnapshot) {
        self.sender.send_replace(snapshot);
    }

    pub fn update(&self, change: impl FnOnce(&mut WindowSnapshot)) {
        self.sender.send_modify(change);
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        *self.sender.borrow()
    }
}

impl Default for SharedWindowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowProvider for SharedWindowState {
    fn target_available(&self) -> bool {
        self.sender.borrow().available
    }

    fn is_target_foreground(&self) -> bool {
        let snapshot = self.sender.borrow();
        snapshot.available && snapshot.foreground
    }

    fn target_client_rect(&self) -> Option<ClientRect> {
        self.sender.borrow().client_rect
    }

    fn cursor_position(&self) -> Option<CursorPosition> {
        self.sender.borrow().cursor
    }
}
