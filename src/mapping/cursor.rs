//! Cursor stick translation

use crate::config::EngineConfig;
use crate::mapping::axis_curve::cursor_displacement;
use crate::mapping::mapping_types::{AxisSample, CursorPosition, OutputEvent};
use crate::mapping::providers::{OutputSink, WindowProvider};
use tracing::trace;

/// Emits pointer motion for one cursor-stick sample
///
/// With `hardware_mouse` the displacement goes out as relative motion;
/// otherwise the OS cursor is moved to its current position plus the
/// displacement. When the pointer position cannot be read the relative path
/// is used so the displacement is never lost.
pub fn translate_cursor(
    sample: AxisSample,
    config: &EngineConfig,
    window: &dyn WindowProvider,
    sink: &dyn OutputSink,
) {
    let Some((dx, dy)) = cursor_displacement(sample, config) else {
        return;
    };
    if dx == 0 && dy == 0 {
        return;
    }
    trace!("Cursor displacement ({}, {}) from {:?}", dx, dy, sample);

    if config.hardware_mouse {
        sink.emit(OutputEvent::MoveRelative { dx, dy });
        return;
    }

    match window.cursor_position() {
        Some(current) => sink.emit(OutputEvent::SetCursor(CursorPosition {
            x: current.x + dx,
            y: current.y + dy,
        })),
        None => sink.emit(OutputEvent::MoveRelative { dx, dy }),
    }
}
