/// Cardinal movement directions.
///
/// `Direction::ALL` is the fixed evaluation order used by the pursuer's
/// greedy scan; its order decides ties.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::geometry::Displacement;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown direction `{0}` (expected UP, DOWN, LEFT or RIGHT)")]
pub struct ParseDirectionError(pub String);

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn unit(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn scaled(self, speed: i32) -> Displacement {
        let (ux, uy) = self.unit();
        Displacement::new(ux * speed, uy * speed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" Right ".parse::<Direction>(), Ok(Direction::Right));
        assert_eq!("DOWN".parse::<Direction>(), Ok(Direction::Down));
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "NORTH".parse::<Direction>().unwrap_err();
        assert_eq!(err, ParseDirectionError("NORTH".into()));
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn scaled_displacement() {
        assert_eq!(Direction::Up.scaled(4), Displacement::new(0, -4));
        assert_eq!(Direction::Left.scaled(8), Displacement::new(-8, 0));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
        }
    }
}
