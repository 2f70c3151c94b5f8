//! Quadrature encoder step decode.
//!
//! Direction is derived from the two phase levels sampled at the edge
//! instant: equal levels read as clockwise (increment), unequal as
//! counter-clockwise. This trusts the edge source instead of walking the
//! full 4-phase quadrature table; a known approximation that holds up at
//! hand-turning speeds, not a state machine over all phases.

use crate::debounce::DebounceGate;
use spindle_traits::Level;

/// Rotation direction of one accepted encoder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Simplified quadrature decode at the edge instant.
    #[inline]
    pub fn from_levels(clk: Level, dt: Level) -> Self {
        if clk == dt { Self::Up } else { Self::Down }
    }
}

/// Debounced rotary input: one instance per physical encoder.
#[derive(Debug)]
pub struct EncoderInput {
    gate: DebounceGate,
}

impl EncoderInput {
    pub fn new(gate: DebounceGate) -> Self {
        Self { gate }
    }

    /// Handle one edge. Returns the decoded direction when the edge passes
    /// the debounce gate, `None` when it is filtered out.
    pub fn on_edge(&mut self, clk: Level, dt: Level, now_ms: u64) -> Option<Direction> {
        if !self.gate.accept(now_ms) {
            return None;
        }
        Some(Direction::from_levels(clk, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::Retrigger;

    #[test]
    fn equal_levels_decode_clockwise() {
        assert_eq!(Direction::from_levels(Level::High, Level::High), Direction::Up);
        assert_eq!(Direction::from_levels(Level::Low, Level::Low), Direction::Up);
        assert_eq!(Direction::from_levels(Level::High, Level::Low), Direction::Down);
        assert_eq!(Direction::from_levels(Level::Low, Level::High), Direction::Down);
    }

    #[test]
    fn bounced_edges_are_dropped() {
        let mut enc = EncoderInput::new(DebounceGate::new(100, Retrigger::Always));
        assert_eq!(
            enc.on_edge(Level::High, Level::High, 150),
            Some(Direction::Up)
        );
        assert_eq!(enc.on_edge(Level::High, Level::Low, 200), None);
        assert_eq!(
            enc.on_edge(Level::High, Level::Low, 350),
            Some(Direction::Down)
        );
    }
}
