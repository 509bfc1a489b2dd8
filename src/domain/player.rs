/// The input-controlled agent.

use std::collections::VecDeque;

use super::collision::CollisionField;
use super::direction::Direction;
use super::geometry::Position;
use super::movement;

#[derive(Clone, Debug)]
pub struct Player {
    pub position: Position,
    pub speed: i32,
    pub facing: Direction,
    /// Most recent positions reached, oldest first.
    history: VecDeque<Position>,
    history_len: usize,
}

impl Player {
    pub fn new(position: Position, speed: i32, history_len: usize) -> Self {
        Player {
            position,
            speed,
            facing: Direction::Right,
            history: VecDeque::with_capacity(history_len.min(1024)),
            history_len,
        }
    }

    /// Take one step toward `dir` if the destination box is clear of walls.
    /// Returns whether the player moved. Facing follows the request even
    /// when blocked so the sprite turns toward the wall.
    pub fn try_move(&mut self, dir: Direction, field: &CollisionField, half_extent: i32) -> bool {
        self.facing = dir;
        match movement::try_step(field, self.position, dir, self.speed, half_extent) {
            Some(next) => {
                self.position = next;
                self.record(next);
                true
            }
            None => false,
        }
    }

    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Position> {
        self.history.iter()
    }

    fn record(&mut self, pos: Position) {
        if self.history_len == 0 { return; }
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(pos);
    }
}
