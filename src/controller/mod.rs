//! Controller subsystem for gamepad input handling
//!
//! 1. [`event_collector`] - gilrs event collection on a dedicated thread
//! 2. [`controller_handle`] - lifecycle and the [`ControllerProvider`] view
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──┬──► watch<StickSnapshot> ──► latest_*_axis()
//!                         └──► ListenerRegistry ──────► button listeners
//! ```
//!
//! [`ControllerProvider`]: crate::mapping::providers::ControllerProvider

pub mod controller_handle;
pub mod event_collector;

pub use controller_handle::{ControllerError, ControllerHandle, ControllerSettings};
