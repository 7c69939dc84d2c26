//! Aim-lock session tracking
//!
//! Timed behaviors keyed off the aim-lock flag and window focus: the overlay
//! crosshair, pointer recentering after a long aim-lock hold, and cancelling
//! aim-lock when the target window loses focus.
//!
//! After the recenter delay passes during a single aim-lock hold the
//! crosshair is hidden and stays hidden until that hold ends; the next hold
//! shows it again.

use crate::config::EngineConfig;
use crate::mapping::mapping_types::{CursorPosition, GameStateSignals, MouseButton, OutputEvent};
use crate::mapping::providers::{OutputSink, WindowProvider};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionTimers {
    /// When the current aim-lock hold started; `None` while aim-lock is off
    pub aim_lock_started: Option<Instant>,
    /// Crosshair was shown during the current hold
    pub crosshair_shown: bool,
    /// Crosshair is currently visible on the overlay
    pub crosshair_visible: bool,
    /// Aim-lock was cancelled for the current loss of focus
    pub aim_lock_cancelled: bool,
    pub last_cursor: Option<CursorPosition>,
}

#[derive(Debug, Default, Clone)]
pub struct SessionMonitor {
    timers: SessionTimers,
}

impl SessionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    pub fn tick(
        &mut self,
        now: Instant,
        signals: &GameStateSignals,
        window: &dyn WindowProvider,
        config: &EngineConfig,
        sink: &dyn OutputSink,
    ) {
        if !signals.in_world() || !window.target_available() {
            self.suspend(sink);
            return;
        }

        let foreground = window.is_target_foreground();
        let aim_lock = signals.aim_lock;
        let held_for = self
            .timers
            .aim_lock_started
            .map(|started| now.saturating_duration_since(started));
        let past_recenter_delay =
            config.auto_center && held_for.is_some_and(|held| held >= config.auto_center_delay());

        self.auto_cancel(foreground, aim_lock, config, sink);

        if config.crosshair_enabled() {
            let crosshair_due = held_for.is_some_and(|held| held >= config.crosshair_delay());
            if aim_lock && crosshair_due && !past_recenter_delay && !self.timers.crosshair_shown {
                info!("Showing crosshair at {:?}", self.timers.last_cursor);
                sink.emit(OutputEvent::Crosshair {
                    visible: true,
                    at: self.timers.last_cursor,
                });
                self.timers.crosshair_shown = true;
                self.timers.crosshair_visible = true;
            } else if !aim_lock && self.timers.crosshair_shown {
                self.hide_crosshair(sink);
                self.timers.crosshair_shown = false;
            }
        }

        if aim_lock {
            match self.timers.aim_lock_started {
                None => {
                    debug!("Aim-lock started");
                    self.timers.aim_lock_started = Some(now);
                }
                Some(_) => {
                    if config.crosshair_enabled() && past_recenter_delay && self.timers.crosshair_shown {
                        self.hide_crosshair(sink);
                    }
                }
            }
        } else {
            if let Some(cursor) = window.cursor_position() {
                self.timers.last_cursor = Some(cursor);
            }
            if past_recenter_delay && foreground {
                self.recenter(window, sink);
            }
            if self.timers.aim_lock_started.take().is_some() {
                debug!("Aim-lock ended");
            }
        }
    }

    fn auto_cancel(
        &mut self,
        foreground: bool,
        aim_lock: bool,
        config: &EngineConfig,
        sink: &dyn OutputSink,
    ) {
        if foreground {
            self.timers.aim_lock_cancelled = false;
            return;
        }
        if config.auto_cancel && aim_lock && !self.timers.aim_lock_cancelled {
            info!("Target window lost focus during aim-lock, cancelling");
            sink.emit(OutputEvent::MouseClick(MouseButton::Right));
            self.timers.aim_lock_cancelled = true;
        }
    }

    fn recenter(&mut self, window: &dyn WindowProvider, sink: &dyn OutputSink) {
        match window.target_client_rect() {
            Some(rect) => {
                let center = rect.center();
                info!("Recentering pointer to {:?}", center);
                sink.emit(OutputEvent::SetCursor(center));
            }
            None => debug!("No client rect available, skipping recenter"),
        }
    }

    fn hide_crosshair(&mut self, sink: &dyn OutputSink) {
        if self.timers.crosshair_visible {
            debug!("Hiding crosshair");
            sink.emit(OutputEvent::Crosshair {
                visible: false,
                at: None,
            });
            self.timers.crosshair_visible = false;
        }
    }

    /// Session conditions are gone; drop timers and take down the crosshair
    fn suspend(&mut self, sink: &dyn OutputSink) {
        self.hide_crosshair(sink);
        self.timers.crosshair_shown = false;
        self.timers.aim_lock_started = None;
    }
}
