/// Plane geometry in integer pixel space.
///
/// y grows downward (screen convention). Rectangles are half-open:
/// a rect covers `[x, x + width) × [y, y + height)`, so two rects that
/// only share an edge do not overlap, and an empty rect overlaps nothing.

use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn offset(self, d: Displacement) -> Position {
        Position { x: self.x + d.dx, y: self.y + d.dy }
    }

    /// Exact squared Euclidean distance. Orders identically to the
    /// Euclidean distance, without floating-point ties going astray.
    pub fn distance_sq(self, other: Position) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Is `other` strictly closer than `reach`?
    pub fn within(self, other: Position, reach: i32) -> bool {
        let r = reach as i64;
        self.distance_sq(other) < r * r
    }
}

/// Per-tick position delta.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Displacement {
    pub dx: i32,
    pub dy: i32,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Displacement { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

/// Axis-aligned rectangle. Walls are plain `Rect`s.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> i32 { self.x + self.width }
    pub fn bottom(&self) -> i32 { self.y + self.height }

    /// Zero (or negative) area: never intersects anything.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Non-zero-area overlap under half-open interval semantics.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() { return false; }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Collision box of an entity: a square of side `2 * half_extent`
/// centered on its position. Built per query, never stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundingBox(Rect);

impl BoundingBox {
    pub fn around(center: Position, half_extent: i32) -> Self {
        BoundingBox(Rect::new(
            center.x - half_extent,
            center.y - half_extent,
            half_extent * 2,
            half_extent * 2,
        ))
    }

    /// Box from explicit edges (used by the renderer to test screen cells).
    pub fn from_rect(rect: Rect) -> Self {
        BoundingBox(rect)
    }

    pub fn rect(&self) -> &Rect {
        &self.0
    }
}
