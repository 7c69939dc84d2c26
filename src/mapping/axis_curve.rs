//! Stick sample transforms
//!
//! Stateless helpers that turn an [`AxisSample`] into directional intent for
//! movement or into curved pointer motion for the cursor.

use crate::config::EngineConfig;
use crate::mapping::mapping_types::{AxisSample, AXIS_MAX};

/// Scale applied to the configured curve value
pub const CURVE_SCALE: f64 = 0.05;

/// Which movement directions a sample asks for
///
/// Gates are independent; a diagonal legitimately sets two of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionGates {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

pub fn direction_gates(sample: AxisSample, threshold: i32) -> DirectionGates {
    DirectionGates {
        left: -sample.x > threshold,
        right: sample.x > threshold,
        up: -sample.y > threshold,
        down: sample.y > threshold,
    }
}

/// Quadratic-plus-linear response for one axis speed, `(c*s)^2 + c*s`
pub fn response(speed: f64, curve: f64) -> f64 {
    let scaled = curve * speed;
    scaled * scaled + scaled
}

/// Curved pointer motion for a cursor-stick sample, before rounding
///
/// Returns `None` inside the deadzone. Outside it the direction is kept and
/// the magnitude rescaled so the deadzone edge maps to zero and full
/// deflection along an axis maps to one.
pub fn cursor_response(sample: AxisSample, config: &EngineConfig) -> Option<(f64, f64)> {
    let magnitude = sample.magnitude();
    if magnitude <= config.cursor_deadzone {
        return None;
    }

    let scale = (magnitude - config.cursor_deadzone) / (AXIS_MAX as f64 - config.cursor_deadzone);
    let unit_x = sample.x as f64 / magnitude;
    let unit_y = sample.y as f64 / magnitude;

    let curve = CURVE_SCALE * config.cursor_curve;
    let x_speed = (unit_x * scale).abs() * config.cursor_speed;
    let y_speed = (unit_y * scale).abs() * config.cursor_speed;

    let x = response(x_speed, curve).copysign(sample.x as f64);
    let y = response(y_speed, curve).copysign(sample.y as f64);
    // copysign keeps a zero component at +/-0.0; normalize
    Some((x + 0.0, y + 0.0))
}

/// Whole-pixel displacement, truncated toward zero
pub fn cursor_displacement(sample: AxisSample, config: &EngineConfig) -> Option<(i32, i32)> {
    cursor_response(sample, config).map(|(x, y)| (x.trunc() as i32, y.trunc() as i32))
}
