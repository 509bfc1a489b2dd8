/// Static obstacle set.
///
/// The wall list is fixed at construction; queries borrow `&self` only,
/// so the field can be shared by the player, every pursuer and the
/// renderer within a tick.

use super::geometry::{BoundingBox, Rect};

#[derive(Clone, Debug, Default)]
pub struct CollisionField {
    walls: Vec<Rect>,
}

impl CollisionField {
    pub fn new(walls: Vec<Rect>) -> Self {
        CollisionField { walls }
    }

    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Does `bbox` overlap any wall with non-zero area?
    /// Edge contact is not a collision; degenerate walls never collide.
    pub fn intersects_any(&self, bbox: &BoundingBox) -> bool {
        self.walls.iter().any(|w| w.intersects(bbox.rect()))
    }
}
