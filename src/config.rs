//! Engine configuration and key bindings
//!
//! All values are plain serde structs so they can live in the TOML file
//! managed by [`crate::persistence`]. Missing fields fall back to defaults.

use crate::controller::controller_handle::ControllerSettings;
use crate::mapping::mapping_types::{Key, LogicalButton, AXIS_MAX};
use crate::mapping::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Thresholds, curve parameters and feature switches of the engine
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Axis component (hardware units) a direction must exceed to hold its key
    pub movement_threshold: i32,
    /// Stick strength at or above which auto-walk switches back to running
    pub walk_threshold: i32,
    /// Radius around center ignored by the cursor stick
    pub cursor_deadzone: f64,
    pub cursor_speed: f64,
    /// Response curve strength; scaled by 0.05 before use
    pub cursor_curve: f64,
    /// Aim-lock hold time after which the pointer is recentered on release
    pub auto_center_delay_ms: u64,
    /// Aim-lock hold time before the overlay crosshair appears
    pub crosshair_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub swap_sticks: bool,
    pub auto_walk: bool,
    pub auto_cancel: bool,
    pub auto_center: bool,
    pub enable_overlay: bool,
    pub enable_overlay_crosshair: bool,
    /// Inject relative motion instead of repositioning the OS cursor
    pub hardware_mouse: bool,
    /// Master switch for everything that depends on game-state signals
    pub memory_reading: bool,
    pub override_menu: bool,
    pub override_area_effect: bool,
    pub area_effect_confirm: LogicalButton,
    pub area_effect_cancel: LogicalButton,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 30,
            walk_threshold: 100,
            cursor_deadzone: 10.0,
            cursor_speed: 10.0,
            cursor_curve: 3.0,
            auto_center_delay_ms: 500,
            crosshair_delay_ms: 200,
            poll_interval_ms: 5,
            swap_sticks: false,
            auto_walk: true,
            auto_cancel: true,
            auto_center: true,
            enable_overlay: true,
            enable_overlay_crosshair: true,
            hardware_mouse: false,
            memory_reading: true,
            override_menu: true,
            override_area_effect: true,
            area_effect_confirm: LogicalButton::RFaceDown,
            area_effect_cancel: LogicalButton::RFaceRight,
        }
    }
}

impl EngineConfig {
    /// Rejects combinations the translators cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.movement_threshold < 0 || self.movement_threshold >= AXIS_MAX {
            return Err(EngineError::ConfigError(format!(
                "movement_threshold must be within 0..{}, got {}",
                AXIS_MAX, self.movement_threshold
            )));
        }
        if self.walk_threshold < self.movement_threshold {
            return Err(EngineError::ConfigError(format!(
                "walk_threshold ({}) must not be below movement_threshold ({})",
                self.walk_threshold, self.movement_threshold
            )));
        }
        if !(0.0..AXIS_MAX as f64).contains(&self.cursor_deadzone) {
            return Err(EngineError::ConfigError(format!(
                "cursor_deadzone must be within 0..{}, got {}",
                AXIS_MAX, self.cursor_deadzone
            )));
        }
        if self.cursor_speed < 0.0 || self.cursor_curve <= 0.0 {
            return Err(EngineError::ConfigError(
                "cursor_speed must be non-negative and cursor_curve positive".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(EngineError::ConfigError(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.area_effect_confirm == self.area_effect_cancel {
            return Err(EngineError::ConfigError(format!(
                "area-effect confirm and cancel share the button {}",
                self.area_effect_confirm
            )));
        }
        if self.auto_center
            && self.crosshair_enabled()
            && self.auto_center_delay_ms <= self.crosshair_delay_ms
        {
            return Err(EngineError::ConfigError(format!(
                "auto_center_delay_ms ({}) must exceed crosshair_delay_ms ({}) or the crosshair never shows",
                self.auto_center_delay_ms, self.crosshair_delay_ms
            )));
        }
        debug!("Engine configuration validated");
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auto_center_delay(&self) -> Duration {
        Duration::from_millis(self.auto_center_delay_ms)
    }

    pub fn crosshair_delay(&self) -> Duration {
        Duration::from_millis(self.crosshair_delay_ms)
    }

    pub fn crosshair_enabled(&self) -> bool {
        self.enable_overlay && self.enable_overlay_crosshair
    }
}

/// Mapping from physical buttons to keyboard keys
///
/// Stick clicks always drive the mouse and the stick directions use fixed
/// movement keys, so entries for those buttons are never consulted.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: HashMap<LogicalButton, Key>,
}

impl KeyBindings {
    pub fn new(bindings: HashMap<LogicalButton, Key>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, button: LogicalButton) -> Option<Key> {
        self.bindings.get(&button).copied()
    }

    pub fn bind(&mut self, button: LogicalButton, key: Key) -> Option<Key> {
        if button.is_stick_direction() || button.stick_click_mouse().is_some() {
            warn!("Binding {} to {:?} has no effect, the button has a fixed output", button, key);
        }
        self.bindings.insert(button, key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(LogicalButton::RFaceDown, Key::Num1);
        bindings.insert(LogicalButton::RFaceRight, Key::Num2);
        bindings.insert(LogicalButton::RFaceLeft, Key::Num3);
        bindings.insert(LogicalButton::RFaceUp, Key::Num4);
        bindings.insert(LogicalButton::LFaceUp, Key::Num5);
        bindings.insert(LogicalButton::LFaceRight, Key::Num6);
        bindings.insert(LogicalButton::LFaceDown, Key::Num7);
        bindings.insert(LogicalButton::LFaceLeft, Key::Num8);
        bindings.insert(LogicalButton::LeftShoulder, Key::Shift);
        bindings.insert(LogicalButton::RightShoulder, Key::Control);
        bindings.insert(LogicalButton::LeftTrigger, Key::Space);
        bindings.insert(LogicalButton::RightTrigger, Key::Tab);
        bindings.insert(LogicalButton::CenterLeft, Key::M);
        bindings.insert(LogicalButton::CenterRight, Key::Escape);
        bindings.insert(LogicalButton::CenterMiddle, Key::F12);
        Self { bindings }
    }
}

/// Everything stored in the configuration file
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub controller: ControllerSettings,
    pub bindings: KeyBindings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn walk_threshold_below_movement_threshold_is_rejected() {
        let config = EngineConfig {
            movement_threshold: 40,
            walk_threshold: 20,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn deadzone_at_axis_max_is_rejected() {
        let config = EngineConfig {
            cursor_deadzone: AXIS_MAX as f64,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shared_confirm_and_cancel_is_rejected() {
        let config = EngineConfig {
            area_effect_confirm: LogicalButton::RFaceDown,
            area_effect_cancel: LogicalButton::RFaceDown,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn crosshair_needs_both_overlay_switches() {
        let config = EngineConfig {
            enable_overlay: false,
            ..EngineConfig::default()
        };
        assert!(!config.crosshair_enabled());
        assert!(EngineConfig::default().crosshair_enabled());
    }

    #[test]
    fn recenter_before_crosshair_is_rejected() {
        let config = EngineConfig {
            auto_center_delay_ms: 150,
            crosshair_delay_ms: 200,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::ConfigError(_))
        ));

        let equal = EngineConfig {
            auto_center_delay_ms: 200,
            crosshair_delay_ms: 200,
            ..EngineConfig::default()
        };
        assert!(equal.validate().is_err());

        // Fine when either timer is out of play
        let no_recenter = EngineConfig {
            auto_center: false,
            ..config.clone()
        };
        assert!(no_recenter.validate().is_ok());
        let no_crosshair = EngineConfig {
            enable_overlay_crosshair: false,
            ..config
        };
        assert!(no_crosshair.validate().is_ok());
    }

    #[test]
    fn default_bindings_leave_stick_clicks_unbound() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.get(LogicalButton::LeftStick), None);
        assert_eq!(bindings.get(LogicalButton::RFaceDown), Some(Key::Num1));
    }

    #[test]
    fn app_config_survives_toml() {
        let mut config = AppConfig::default();
        config.engine.swap_sticks = true;
        config.bindings.bind(LogicalButton::LFaceUp, Key::F1);

        let text = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parsed: AppConfig = toml::from_str("[engine]\nmovement_threshold = 45\n").expect("parse");
        assert_eq!(parsed.engine.movement_threshold, 45);
        assert_eq!(parsed.engine.walk_threshold, 100);
        assert_eq!(parsed.bindings, KeyBindings::default());
    }
}
