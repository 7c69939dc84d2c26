//! Per-button edge detection
//!
//! [`EdgeTracker`] owns the one authoritative [`ButtonState`] table and turns
//! "is it pressed right now" samples into press/release edges. It also keeps a
//! press ledger: whatever output a press produced is what its release undoes,
//! even when routing changed in between.

use crate::mapping::mapping_types::{HeldOutput, LogicalButton};
use tracing::debug;

/// Transition reported for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Pressed,
    Released,
}

/// Held flag for every [`LogicalButton`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    held: [bool; LogicalButton::COUNT],
}

impl Default for ButtonState {
    fn default() -> Self {
        Self {
            held: [false; LogicalButton::COUNT],
        }
    }
}

impl ButtonState {
    pub fn is_held(&self, button: LogicalButton) -> bool {
        self.held[button.index()]
    }

    pub fn held_buttons(&self) -> impl Iterator<Item = LogicalButton> + '_ {
        LogicalButton::ALL
            .into_iter()
            .filter(move |button| self.held[button.index()])
    }
}

#[derive(Debug, Default, Clone)]
pub struct EdgeTracker {
    state: ButtonState,
    ledger: [Option<HeldOutput>; LogicalButton::COUNT],
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `sampled` against the stored flag and stores it
    ///
    /// At most one edge per transition; repeated identical samples yield
    /// [`Edge::None`].
    pub fn observe(&mut self, button: LogicalButton, sampled: bool) -> Edge {
        let stored = &mut self.state.held[button.index()];
        let edge = match (*stored, sampled) {
            (false, true) => Edge::Pressed,
            (true, false) => Edge::Released,
            _ => Edge::None,
        };
        *stored = sampled;

        if edge != Edge::None {
            debug!("Edge on {}: {:?}", button, edge);
        }
        edge
    }

    pub fn is_held(&self, button: LogicalButton) -> bool {
        self.state.is_held(button)
    }

    pub fn state(&self) -> &ButtonState {
        &self.state
    }

    /// Remembers what a press of `button` sent
    pub fn latch(&mut self, button: LogicalButton, output: HeldOutput) {
        self.ledger[button.index()] = Some(output);
    }

    /// Takes what a press of `button` sent, if anything is still held
    pub fn unlatch(&mut self, button: LogicalButton) -> Option<HeldOutput> {
        self.ledger[button.index()].take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::mapping_types::Key;

    #[test]
    fn one_press_and_one_release_per_transition() {
        let mut tracker = EdgeTracker::new();
        let edges: Vec<Edge> = [false, true, true, true, false]
            .into_iter()
            .map(|sampled| tracker.observe(LogicalButton::RFaceDown, sampled))
            .collect();

        assert_eq!(
            edges,
            vec![Edge::None, Edge::Pressed, Edge::None, Edge::None, Edge::Released]
        );
    }

    #[test]
    fn buttons_are_tracked_independently() {
        let mut tracker = EdgeTracker::new();
        assert_eq!(tracker.observe(LogicalButton::LFaceUp, true), Edge::Pressed);
        assert_eq!(tracker.observe(LogicalButton::LFaceDown, false), Edge::None);
        assert!(tracker.is_held(LogicalButton::LFaceUp));
        assert!(!tracker.is_held(LogicalButton::LFaceDown));

        let held: Vec<_> = tracker.state().held_buttons().collect();
        assert_eq!(held, vec![LogicalButton::LFaceUp]);
    }

    #[test]
    fn ledger_hands_back_the_press_output_once() {
        let mut tracker = EdgeTracker::new();
        tracker.latch(LogicalButton::LFaceUp, HeldOutput::Key(Key::Up));

        assert_eq!(
            tracker.unlatch(LogicalButton::LFaceUp),
            Some(HeldOutput::Key(Key::Up))
        );
        assert_eq!(tracker.unlatch(LogicalButton::LFaceUp), None);
    }
}
