//! Controller Handle - gamepad input as a [`ControllerProvider`]
//!
//! Owns the collector thread and exposes its output to the engine: the latest
//! stick samples through a watch channel and button changes through
//! subscribed listeners.

use crate::mapping::mapping_types::AxisSample;
use crate::mapping::providers::{ButtonListener, ControllerProvider};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

pub use super::event_collector::{
    CollectorError, CollectorSettings, EventCollector, InputState, ListenerRegistry,
    StickSnapshot,
};

/// Configuration settings for the controller subsystem
///
/// # Examples
///
/// ```rust
/// use padmapper::controller::ControllerSettings;
///
/// let settings = ControllerSettings {
///     collection_interval_ms: 2,
///     ..ControllerSettings::default()
/// };
/// assert_eq!(settings.trigger_threshold, 0.5);
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerSettings {
    /// How often pending gilrs events are drained, in milliseconds
    pub collection_interval_ms: u64,

    /// Analog stick deadzone as a fraction (0.0-1.0)
    ///
    /// The engine applies its own thresholds, so this defaults to off. Raise it
    /// only for worn sticks that drift past the engine thresholds.
    pub joystick_deadzone: f32,

    /// Analog trigger travel (0.0-1.0) that counts as pressed
    pub trigger_threshold: f32,

    /// Which connected gamepad to follow; the first one when unset
    pub gamepad_index: Option<usize>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            collection_interval_ms: 1,
            joystick_deadzone: 0.0,
            trigger_threshold: 0.5,
            gamepad_index: None,
        }
    }
}

impl ControllerSettings {
    fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            joystick_deadzone: self.joystick_deadzone.clamp(0.0, 0.95),
            trigger_threshold: self.trigger_threshold,
            poll_interval: Duration::from_millis(self.collection_interval_ms.max(1)),
            gamepad_index: self.gamepad_index,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Error from the event collection subsystem
    #[error("Collector error: {0}")]
    CollectorError(#[from] CollectorError),

    /// Collector thread ended before reporting whether it started
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

/// Handle for the running controller subsystem
///
/// The gilrs context is created on the collector thread itself and never
/// leaves it.
pub struct ControllerHandle {
    sticks: watch::Receiver<StickSnapshot>,
    listeners: Arc<ListenerRegistry>,
    keep_running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Spawns the collector thread and waits until gilrs is initialized
    pub async fn spawn(settings: Option<ControllerSettings>) -> Result<Self, ControllerError> {
        let settings = settings.unwrap_or_default();
        info!("Initializing controller system with settings: {:?}", settings);

        let collector_settings = settings.collector_settings();
        let (stick_sender, sticks) = watch::channel(StickSnapshot::default());
        let listeners = Arc::new(ListenerRegistry::default());
        let keep_running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_listeners = listeners.clone();
        let thread_running = keep_running.clone();
        let worker = std::thread::Builder::new()
            .name("event-collector".to_string())
            .spawn(move || {
                let collector = match EventCollector::create(
                    collector_settings,
                    stick_sender,
                    thread_listeners,
                    thread_running,
                ) {
                    Ok(collector) => {
                        let _ = ready_tx.send(Ok(()));
                        collector
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let mut collecting = collector.initialize();
                collecting.run_collection_loop();
            })
            .map_err(|e| CollectorError::ThreadError(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => debug!("Event Collector reported ready"),
            Ok(Err(e)) => {
                error!("Event Collector failed to start: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                return Err(ControllerError::InitializationError(
                    "collector thread exited during startup".to_string(),
                ))
            }
        }

        info!("Controller system initialized successfully");
        Ok(Self {
            sticks,
            listeners,
            keep_running,
            worker: Some(worker),
        })
    }

    pub fn sticks(&self) -> StickSnapshot {
        *self.sticks.borrow()
    }

    /// Stops the collector thread and waits for it
    pub fn shutdown(&mut self) {
        self.keep_running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Event Collector thread panicked");
            } else {
                info!("Controller system shut down");
            }
        }
    }
}

impl ControllerProvider for ControllerHandle {
    fn latest_left_axis(&self) -> AxisSample {
        self.sticks.borrow().left
    }

    fn latest_right_axis(&self) -> AxisSample {
        self.sticks.borrow().right
    }

    fn subscribe(&self, listener: ButtonListener) {
        self.listeners.add(listener);
        debug!("Controller listener added ({} total)", self.listeners.len());
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_map_onto_collector() {
        let settings = ControllerSettings {
            collection_interval_ms: 0,
            joystick_deadzone: 2.0,
            ..ControllerSettings::default()
        };
        let collector = settings.collector_settings();
        assert_eq!(collector.poll_interval, Duration::from_millis(1));
        assert_eq!(collector.joystick_deadzone, 0.95);
        assert_eq!(collector.gamepad_index, None);
    }

    #[test]
    fn settings_read_partial_toml() {
        let settings: ControllerSettings =
            toml::from_str("gamepad_index = 1\ntrigger_threshold = 0.3\n").expect("parse");
        assert_eq!(settings.gamepad_index, Some(1));
        assert_eq!(settings.trigger_threshold, 0.3);
        assert_eq!(settings.collection_interval_ms, 1);
    }
}
