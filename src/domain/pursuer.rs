/// Pursuer AI: greedy one-step chase against a static wall set.
///
/// One of three outcomes per tick:
///   1. **Chase**: of the four cardinal steps whose box stays clear of the
///      walls, take the one ending closest to the target. Directions are
///      scanned in `Direction::ALL` order with a strict `<`, so the first
///      direction reaching the minimum wins a tie.
///   2. **WallFollow**: every chase candidate is blocked. Shuffle the four
///      directions and take the first clear one.
///   3. **Stalled**: nothing is clear. Zero displacement this tick.
///
/// The decision never fails and never mutates the field.

use rand::seq::SliceRandom;
use rand::Rng;

use super::collision::CollisionField;
use super::direction::Direction;
use super::geometry::{Displacement, Position};
use super::movement::{self, DEFAULT_HALF_EXTENT};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuitMode {
    Chase,
    WallFollow,
    Stalled,
}

/// Result of one pursuer decision.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StepDecision {
    pub mode: PursuitMode,
    pub direction: Option<Direction>,
    pub displacement: Displacement,
}

impl StepDecision {
    const STALLED: StepDecision = StepDecision {
        mode: PursuitMode::Stalled,
        direction: None,
        displacement: Displacement::ZERO,
    };
}

/// Tunables shared by all pursuers of a level.
#[derive(Clone, Copy, Debug)]
pub struct PursuerController {
    half_extent: i32,
    /// Probe length for the fallback. `None` = same as the chase step.
    wall_follow_speed: Option<i32>,
}

impl Default for PursuerController {
    fn default() -> Self {
        PursuerController { half_extent: DEFAULT_HALF_EXTENT, wall_follow_speed: None }
    }
}

impl PursuerController {
    pub fn new(half_extent: i32) -> Self {
        PursuerController { half_extent, wall_follow_speed: None }
    }

    pub fn with_wall_follow_speed(mut self, speed: Option<i32>) -> Self {
        self.wall_follow_speed = speed;
        self
    }

    /// Choose this tick's displacement for a pursuer at `from` chasing `target`.
    pub fn step<R: Rng + ?Sized>(
        &self,
        from: Position,
        target: Position,
        field: &CollisionField,
        speed: i32,
        rng: &mut R,
    ) -> StepDecision {
        if let Some(dir) = self.greedy_direction(from, target, field, speed) {
            return StepDecision {
                mode: PursuitMode::Chase,
                direction: Some(dir),
                displacement: dir.scaled(speed),
            };
        }

        let step = self.wall_follow_speed.unwrap_or(speed);
        match self.wall_follow_direction(from, field, step, rng) {
            Some(dir) => StepDecision {
                mode: PursuitMode::WallFollow,
                direction: Some(dir),
                displacement: dir.scaled(step),
            },
            None => StepDecision::STALLED,
        }
    }

    fn greedy_direction(
        &self,
        from: Position,
        target: Position,
        field: &CollisionField,
        speed: i32,
    ) -> Option<Direction> {
        let mut best: Option<(Direction, i64)> = None;
        for dir in Direction::ALL {
            let Some(candidate) = movement::try_step(field, from, dir, speed, self.half_extent) else {
                continue;
            };
            let dist = candidate.distance_sq(target);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((dir, dist)),
            }
        }
        best.map(|(dir, _)| dir)
    }

    fn wall_follow_direction<R: Rng + ?Sized>(
        &self,
        from: Position,
        field: &CollisionField,
        speed: i32,
        rng: &mut R,
    ) -> Option<Direction> {
        let mut order = Direction::ALL;
        order.shuffle(rng);
        order
            .into_iter()
            .find(|&dir| movement::try_step(field, from, dir, speed, self.half_extent).is_some())
    }
}

/// A chasing agent. The field it moves through is borrowed per tick.
#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: usize,
    pub position: Position,
    pub speed: i32,
    /// Last direction actually taken (initial value comes from the level).
    pub heading: Direction,
}

impl Pursuer {
    pub fn new(id: usize, position: Position, speed: i32, heading: Direction) -> Self {
        Pursuer { id, position, speed, heading }
    }

    /// Decide and apply one tick of movement.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        controller: &PursuerController,
        target: Position,
        field: &CollisionField,
        rng: &mut R,
    ) -> StepDecision {
        let decision = controller.step(self.position, target, field, self.speed, rng);
        if !decision.displacement.is_zero() {
            self.position = self.position.offset(decision.displacement);
        }
        if let Some(dir) = decision.direction {
            self.heading = dir;
        }
        decision
    }
}
