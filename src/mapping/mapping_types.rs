//! Shared data types for the input engine
//!
//! Buttons, axis samples, game-state signals and the output events the
//! engine emits. Everything here is plain data; behavior lives in the
//! translator modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest absolute value an axis component reports, in hardware units
pub const AXIS_MAX: i32 = 127;

/// Every button the engine knows about
///
/// Besides the physical buttons this includes the four synthetic directions of
/// the movement stick, so stick directions run through the same edge tracking
/// as real buttons. The set is closed; [`LogicalButton::index`] is dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalButton {
    // D-pad
    LFaceUp,
    LFaceDown,
    LFaceLeft,
    LFaceRight,
    // Face buttons
    RFaceUp,
    RFaceDown,
    RFaceLeft,
    RFaceRight,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    // Stick clicks
    LeftStick,
    RightStick,
    // Select / start / guide
    CenterLeft,
    CenterRight,
    CenterMiddle,
    // Synthetic movement-stick directions
    LeftStickUp,
    LeftStickDown,
    LeftStickLeft,
    LeftStickRight,
}

impl LogicalButton {
    pub const COUNT: usize = 21;

    pub const ALL: [LogicalButton; LogicalButton::COUNT] = [
        LogicalButton::LFaceUp,
        LogicalButton::LFaceDown,
        LogicalButton::LFaceLeft,
        LogicalButton::LFaceRight,
        LogicalButton::RFaceUp,
        LogicalButton::RFaceDown,
        LogicalButton::RFaceLeft,
        LogicalButton::RFaceRight,
        LogicalButton::LeftShoulder,
        LogicalButton::RightShoulder,
        LogicalButton::LeftTrigger,
        LogicalButton::RightTrigger,
        LogicalButton::LeftStick,
        LogicalButton::RightStick,
        LogicalButton::CenterLeft,
        LogicalButton::CenterRight,
        LogicalButton::CenterMiddle,
        LogicalButton::LeftStickUp,
        LogicalButton::LeftStickDown,
        LogicalButton::LeftStickLeft,
        LogicalButton::LeftStickRight,
    ];

    /// Dense table index of this button
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for the four directions derived from the movement stick
    pub fn is_stick_direction(self) -> bool {
        matches!(
            self,
            LogicalButton::LeftStickUp
                | LogicalButton::LeftStickDown
                | LogicalButton::LeftStickLeft
                | LogicalButton::LeftStickRight
        )
    }

    /// Mouse button a stick click stands for, if this is one
    pub fn stick_click_mouse(self) -> Option<MouseButton> {
        match self {
            LogicalButton::LeftStick => Some(MouseButton::Left),
            LogicalButton::RightStick => Some(MouseButton::Right),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One analog stick reading in hardware units
///
/// Components range over `-AXIS_MAX..=AXIS_MAX`. Y grows downward: pushing the
/// stick up yields a negative `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisSample {
    pub x: i32,
    pub y: i32,
}

impl AxisSample {
    pub const CENTER: AxisSample = AxisSample { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a normalized gilrs-style reading (-1.0..=1.0, y up) into
    /// hardware units (y down)
    pub fn from_normalized(x: f32, y: f32) -> Self {
        let scale = |v: f32| (v.clamp(-1.0, 1.0) * AXIS_MAX as f32).round() as i32;
        Self {
            x: scale(x),
            y: -scale(y),
        }
    }

    pub fn magnitude(&self) -> f64 {
        let x = self.x as f64;
        let y = self.y as f64;
        (x * x + y * y).sqrt()
    }
}

/// Movement mode reported by the target application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    Idle,
    Walk,
    Run,
}

/// Externally observed state of the target application
///
/// Owned by the memory-reading collaborator; the engine only reads snapshots.
/// When `attached` is false every other field is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameStateSignals {
    pub attached: bool,
    pub in_world: bool,
    pub movement_mode: Option<MovementMode>,
    pub aim_lock: bool,
    pub area_effect_cast: bool,
}

impl GameStateSignals {
    /// Snapshot with all game-state dependent fields cleared
    pub const DETACHED: GameStateSignals = GameStateSignals {
        attached: false,
        in_world: false,
        movement_mode: None,
        aim_lock: false,
        area_effect_cast: false,
    };

    /// Returns the snapshot the engine should act on
    ///
    /// A detached reader may still hold stale values; they are dropped here so
    /// no policy ever sees them.
    pub fn effective(self) -> GameStateSignals {
        if self.attached {
            self
        } else {
            GameStateSignals::DETACHED
        }
    }

    pub fn in_world(&self) -> bool {
        self.attached && self.in_world
    }
}

/// Client area of the target window in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ClientRect {
    pub fn center(&self) -> CursorPosition {
        CursorPosition {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }
}

/// Pointer position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// Keyboard keys the engine can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Shift,
    Control,
    Alt,
    NumpadDivide,
    NumpadMultiply,
    NumpadMinus,
    NumpadPlus,
}

/// Output held down by a pressed button, released again on its release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldOutput {
    Key(Key),
    Mouse(MouseButton),
}

impl HeldOutput {
    pub fn press_event(self) -> OutputEvent {
        match self {
            HeldOutput::Key(key) => OutputEvent::KeyDown(key),
            HeldOutput::Mouse(button) => OutputEvent::MouseDown(button),
        }
    }

    pub fn release_event(self) -> OutputEvent {
        match self {
            HeldOutput::Key(key) => OutputEvent::KeyUp(key),
            HeldOutput::Mouse(button) => OutputEvent::MouseUp(button),
        }
    }
}

/// Commands the engine sends to the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    MouseClick(MouseButton),
    /// Low-level relative pointer motion
    MoveRelative { dx: i32, dy: i32 },
    /// Absolute pointer placement
    SetCursor(CursorPosition),
    /// Overlay crosshair visibility, optionally anchored at a position
    Crosshair {
        visible: bool,
        at: Option<CursorPosition>,
    },
}
