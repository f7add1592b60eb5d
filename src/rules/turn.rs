//! Turn order, direction, pending draws and the color in force.

use serde::{Deserialize, Serialize};

use crate::cards::Color;

/// Direction of play around the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Increasing seat index.
    Clockwise,
    /// Decreasing seat index.
    CounterClockwise,
}

impl Direction {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Whose turn it is and what they owe.
///
/// `pending_draw` is non-zero only between a DrawTwo/WildDrawFour being
/// played and the next player resolving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnState {
    /// Seat index of the player to act.
    pub active: usize,
    pub direction: Direction,
    /// Cards the active player must draw unless they stack.
    pub pending_draw: u32,
    /// Color a card must match. `Wild` only before the first play when a
    /// plain Wild seeded the discard pile.
    pub current_color: Color,
}

impl TurnState {
    /// First turn: seat 0, clockwise, nothing pending.
    #[must_use]
    pub fn opening(current_color: Color) -> Self {
        Self {
            active: 0,
            direction: Direction::Clockwise,
            pending_draw: 0,
            current_color,
        }
    }

    /// Seat reached by moving `steps` seats from the active one in the
    /// current direction.
    #[must_use]
    pub fn seat_after(&self, steps: usize, seat_count: usize) -> usize {
        debug_assert!(seat_count > 0);
        let steps = steps % seat_count;
        match self.direction {
            Direction::Clockwise => (self.active + steps) % seat_count,
            Direction::CounterClockwise => (self.active + seat_count - steps) % seat_count,
        }
    }

    /// Pass the turn `steps` seats along.
    pub fn advance(&mut self, steps: usize, seat_count: usize) {
        self.active = self.seat_after(steps, seat_count);
    }
}
