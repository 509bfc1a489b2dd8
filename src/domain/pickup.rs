/// Collectibles: pellets and timed bonus fruit.
///
/// Every pickup moves through an explicit lifecycle:
///
/// ```text
///   Active ──collect──▶ Collected
///     │
///     └────expire────▶ Expired      (fruit only, when its lifetime runs out)
/// ```
///
/// Both terminal states are sticky: collecting an already collected or
/// expired pickup yields 0 points.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use super::geometry::Position;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupState {
    Active,
    Collected,
    Expired,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum FruitKind {
    Cherry,
    Banana,
    Strawberry,
    Orange,
    Apple,
    Melon,
    Galaxian,
    Bell,
    Key,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown fruit type `{0}`")]
pub struct ParseFruitError(pub String);

impl FruitKind {
    pub fn points(self) -> u32 {
        match self {
            FruitKind::Cherry => 100,
            FruitKind::Banana => 200,
            FruitKind::Strawberry => 300,
            FruitKind::Orange => 500,
            FruitKind::Apple => 700,
            FruitKind::Melon => 1000,
            FruitKind::Galaxian => 2000,
            FruitKind::Bell => 3000,
            FruitKind::Key => 5000,
        }
    }

    /// How long the fruit stays collectible after spawning.
    pub fn lifespan(self) -> Duration {
        let ms = match self {
            FruitKind::Cherry => 10_000,
            FruitKind::Banana | FruitKind::Strawberry | FruitKind::Orange => 9_000,
            FruitKind::Apple | FruitKind::Melon => 8_000,
            FruitKind::Galaxian | FruitKind::Bell => 7_000,
            FruitKind::Key => 6_000,
        };
        Duration::from_millis(ms)
    }

    pub fn name(self) -> &'static str {
        match self {
            FruitKind::Cherry => "cherry",
            FruitKind::Banana => "banana",
            FruitKind::Strawberry => "strawberry",
            FruitKind::Orange => "orange",
            FruitKind::Apple => "apple",
            FruitKind::Melon => "melon",
            FruitKind::Galaxian => "galaxian",
            FruitKind::Bell => "bell",
            FruitKind::Key => "key",
        }
    }
}

impl fmt::Display for FruitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FruitKind {
    type Err = ParseFruitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "cherry" => FruitKind::Cherry,
            "banana" => FruitKind::Banana,
            "strawberry" => FruitKind::Strawberry,
            "orange" => FruitKind::Orange,
            "apple" => FruitKind::Apple,
            "melon" => FruitKind::Melon,
            "galaxian" => FruitKind::Galaxian,
            "bell" => FruitKind::Bell,
            "key" => FruitKind::Key,
            _ => return Err(ParseFruitError(s.to_string())),
        };
        Ok(kind)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Pellet,
    Fruit(FruitKind),
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub kind: PickupKind,
    pub position: Position,
    pub points: u32,
    state: PickupState,
    /// Remaining lifetime; `None` for pellets, which never expire.
    remaining: Option<Duration>,
}

impl Pickup {
    pub fn pellet(position: Position, points: u32) -> Self {
        Pickup {
            kind: PickupKind::Pellet,
            position,
            points,
            state: PickupState::Active,
            remaining: None,
        }
    }

    pub fn fruit(kind: FruitKind, position: Position) -> Self {
        Pickup {
            kind: PickupKind::Fruit(kind),
            position,
            points: kind.points(),
            state: PickupState::Active,
            remaining: Some(kind.lifespan()),
        }
    }

    pub fn state(&self) -> PickupState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PickupState::Active
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Active → Collected. Returns the points awarded (0 if not active).
    pub fn collect(&mut self) -> u32 {
        if self.state != PickupState::Active { return 0; }
        self.state = PickupState::Collected;
        self.points
    }

    /// Advance the lifetime. Returns true if the pickup just expired.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.state != PickupState::Active { return false; }
        let Some(left) = self.remaining else { return false; };
        let left = left.saturating_sub(elapsed);
        self.remaining = Some(left);
        if left.is_zero() {
            self.state = PickupState::Expired;
            return true;
        }
        false
    }
}

/// Outcome of a `collect` sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    pub points: u32,
    pub pellets: usize,
    pub fruit: Vec<FruitKind>,
}

/// Owns every pickup of the running level.
#[derive(Clone, Debug, Default)]
pub struct PickupManager {
    pickups: Vec<Pickup>,
}

impl PickupManager {
    pub fn new(pellets: impl IntoIterator<Item = Position>, pellet_points: u32) -> Self {
        PickupManager {
            pickups: pellets.into_iter().map(|p| Pickup::pellet(p, pellet_points)).collect(),
        }
    }

    /// Collect every active pickup strictly within `reach` of `position`.
    pub fn collect(&mut self, position: Position, reach: i32) -> Collected {
        let mut out = Collected::default();
        for p in self.pickups.iter_mut().filter(|p| p.is_active()) {
            if !p.position.within(position, reach) { continue; }
            out.points += p.collect();
            match p.kind {
                PickupKind::Pellet => out.pellets += 1,
                PickupKind::Fruit(kind) => out.fruit.push(kind),
            }
        }
        out
    }

    /// Advance fruit lifetimes; returns the kinds that expired this tick.
    /// Finished fruit is dropped from the list.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<FruitKind> {
        let mut expired = vec![];
        for p in &mut self.pickups {
            if p.tick(elapsed) {
                if let PickupKind::Fruit(kind) = p.kind {
                    expired.push(kind);
                }
            }
        }
        self.pickups.retain(|p| p.kind == PickupKind::Pellet || p.state() == PickupState::Active);
        expired
    }

    /// Place a fruit unless one is already out. Returns whether it spawned.
    pub fn spawn_fruit(&mut self, kind: FruitKind, position: Position) -> bool {
        if self.active_fruit().is_some() { return false; }
        self.pickups.push(Pickup::fruit(kind, position));
        true
    }

    pub fn active_fruit(&self) -> Option<&Pickup> {
        self.pickups
            .iter()
            .find(|p| p.is_active() && matches!(p.kind, PickupKind::Fruit(_)))
    }

    pub fn pellets_remaining(&self) -> usize {
        self.pickups
            .iter()
            .filter(|p| p.is_active() && p.kind == PickupKind::Pellet)
            .count()
    }

    pub fn active(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter().filter(|p| p.is_active())
    }
}
