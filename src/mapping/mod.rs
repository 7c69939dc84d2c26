//! Translation of gamepad input into keyboard and mouse events
//!
//! The engine combines a polled view of both sticks with button
//! notifications and externally observed game state, and emits a balanced
//! stream of key, mouse and overlay events.
//!
//! # Architecture
//!
//! ```text
//!             ┌──────────────── PollLoop (every poll_interval_ms) ────────────────┐
//! sticks ───► │ MovementTranslator ──► CursorTranslator ──► SessionMonitor        │ ──► OutputSink
//!             └───────────────────────────────────────────────────────────────────┘
//! buttons ──► ModeRouter (menu > area-effect > default) ───────────────────────────► OutputSink
//! ```
//!
//! Both paths share one [`edge_tracker::EdgeTracker`] behind the engine lock.

pub mod axis_curve;
pub mod cursor;
pub mod edge_tracker;
pub mod engine;
pub mod error;
pub mod mapping_types;
pub mod mode_router;
pub mod movement;
pub mod output;
pub mod poll_loop;
pub mod providers;
pub mod session_monitor;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{Collaborators, InputEngine};
pub use error::EngineError;
pub use mapping_types::{
    AxisSample, GameStateSignals, Key, LogicalButton, MouseButton, MovementMode, OutputEvent,
};
pub use mode_router::ButtonPolicy;
pub use output::{run_dispatcher, ChannelSink, OutputReceiver, TracingSink};
pub use providers::{
    Clock, ControllerProvider, GameStateProvider, HapticFeedback, NoHaptics, OutputSink,
    SharedGameState, SharedWindowState, SystemClock, WindowProvider,
};
