/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages and sound.

use crate::domain::pickup::FruitKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten { points: u32 },
    FruitSpawned { kind: FruitKind },
    FruitEaten { kind: FruitKind, points: u32 },
    FruitExpired { kind: FruitKind },
    PursuerWallFollow { id: usize },
    PursuerStalled { id: usize },
    PlayerCaught { id: usize },
    MazeCleared,
}
