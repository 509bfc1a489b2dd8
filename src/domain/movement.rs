/// Shared single-step movement rule.
///
/// The player and every pursuer go through `try_step`, so both use the
/// same box sizing and the same intersection semantics against the field.

use super::collision::CollisionField;
use super::direction::Direction;
use super::geometry::{BoundingBox, Position};

/// Default half-width of an entity's collision box, in pixels.
pub const DEFAULT_HALF_EXTENT: i32 = 15;

/// Candidate position one step of `speed` from `from` toward `dir`,
/// or `None` if the candidate's box intersects a wall.
pub fn try_step(
    field: &CollisionField,
    from: Position,
    dir: Direction,
    speed: i32,
    half_extent: i32,
) -> Option<Position> {
    let candidate = from.offset(dir.scaled(speed));
    if field.intersects_any(&BoundingBox::around(candidate, half_extent)) {
        None
    } else {
        Some(candidate)
    }
}

/// Is `pos` a legal resting place for an entity of this size?
pub fn is_clear(field: &CollisionField, pos: Position, half_extent: i32) -> bool {
    !field.intersects_any(&BoundingBox::around(pos, half_extent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Rect;

    #[test]
    fn free_step_moves_by_speed() {
        let field = CollisionField::default();
        let p = try_step(&field, Position::new(300, 300), Direction::Left, 8, 15);
        assert_eq!(p, Some(Position::new(292, 300)));
    }

    #[test]
    fn blocked_step_is_refused() {
        // Wall whose left edge is 20 px right of center: a box of 15 reaches 315,
        // one step of 8 reaches 323 and overlaps.
        let field = CollisionField::new(vec![Rect::new(320, 200, 10, 200)]);
        assert_eq!(try_step(&field, Position::new(300, 300), Direction::Right, 8, 15), None);
        assert!(try_step(&field, Position::new(300, 300), Direction::Left, 8, 15).is_some());
    }

    #[test]
    fn step_may_end_flush_against_wall() {
        let field = CollisionField::new(vec![Rect::new(323, 200, 10, 200)]);
        // Box right edge after step = 308 + 15 = 323: touching only.
        assert_eq!(
            try_step(&field, Position::new(300, 300), Direction::Right, 8, 15),
            Some(Position::new(308, 300))
        );
    }

    #[test]
    fn clear_position_check() {
        let field = CollisionField::new(vec![Rect::new(50, 50, 200, 10)]);
        assert!(is_clear(&field, Position::new(100, 100), 15));
        assert!(!is_clear(&field, Position::new(100, 60), 15));
    }
}
