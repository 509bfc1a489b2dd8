/// Level geometry: walls, pellets and spawn points.
///
/// A level is either the embedded `classic` maze or a TOML file named by
/// `general.level_file` in config.toml (see `levels/crossroads.toml`):
///
/// ```toml
/// name = "Crossroads"
/// width = 600
/// height = 600
/// border = true                      # add four 10 px arena walls
/// player = [300, 300]
/// fruit_spawn = [300, 300]           # optional, defaults to the player start
/// pellets = [[100, 100], [200, 100]]
/// walls = [{ x = 50, y = 50, width = 200, height = 10 }]
///
/// [[pursuers]]
/// at = [100, 100]
/// speed = 4                          # optional, defaults to speed.pursuer_speed
/// heading = "LEFT"                   # optional, random if absent
/// ```
///
/// Loading validates everything up front: a bad heading string, a wall
/// with negative size or a spawn inside a wall is rejected here rather
/// than discovered mid-game.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::collision::CollisionField;
use crate::domain::direction::{Direction, ParseDirectionError};
use crate::domain::geometry::{Position, Rect};
use crate::domain::movement;

const BORDER_THICKNESS: i32 = 10;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("arena must have positive size, got {width}x{height}")]
    BadArena { width: i32, height: i32 },
    #[error("wall #{index} has negative size {width}x{height}")]
    NegativeWall { index: usize, width: i32, height: i32 },
    #[error("pursuer #{index}: {source}")]
    BadHeading {
        index: usize,
        #[source]
        source: ParseDirectionError,
    },
    #[error("pursuer #{index} speed must be positive, got {speed}")]
    BadSpeed { index: usize, speed: i32 },
    #[error("level has no pursuers")]
    NoPursuers,
    #[error("{what} spawn at ({x}, {y}) overlaps a wall")]
    SpawnBlocked { what: String, x: i32, y: i32 },
}

#[derive(Clone, Debug)]
pub struct PursuerSpawn {
    pub position: Position,
    pub speed: Option<i32>,
    pub heading: Option<Direction>,
}

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub walls: Vec<Rect>,
    pub pellets: Vec<Position>,
    pub player_start: Position,
    pub fruit_spawn: Position,
    pub pursuers: Vec<PursuerSpawn>,
}

impl Level {
    pub fn collision_field(&self) -> CollisionField {
        CollisionField::new(self.walls.clone())
    }

    /// Check that every entity starts in a legal place for boxes of `half_extent`.
    pub fn validate_spawns(&self, half_extent: i32) -> Result<(), LevelError> {
        let field = self.collision_field();
        let check = |what: String, p: Position| {
            if movement::is_clear(&field, p, half_extent) {
                Ok(())
            } else {
                Err(LevelError::SpawnBlocked { what, x: p.x, y: p.y })
            }
        };
        check("player".into(), self.player_start)?;
        for (i, s) in self.pursuers.iter().enumerate() {
            check(format!("pursuer #{i}"), s.position)?;
        }
        Ok(())
    }
}

// ── TOML schema ──

#[derive(Deserialize, Debug)]
struct LevelFile {
    #[serde(default = "default_name")]
    name: String,
    width: i32,
    height: i32,
    #[serde(default = "default_border")]
    border: bool,
    player: [i32; 2],
    #[serde(default)]
    fruit_spawn: Option<[i32; 2]>,
    #[serde(default)]
    pellets: Vec<[i32; 2]>,
    #[serde(default)]
    walls: Vec<Rect>,
    #[serde(default)]
    pursuers: Vec<PursuerFile>,
}

#[derive(Deserialize, Debug)]
struct PursuerFile {
    at: [i32; 2],
    #[serde(default)]
    speed: Option<i32>,
    #[serde(default)]
    heading: Option<String>,
}

fn default_name() -> String { "Untitled".into() }
fn default_border() -> bool { true }

fn pos([x, y]: [i32; 2]) -> Position {
    Position::new(x, y)
}

/// Parse and validate a level document (spawns are checked separately,
/// once the collision box size is known).
pub fn parse_level(text: &str) -> Result<Level, LevelError> {
    let file: LevelFile = toml::from_str(text)?;

    if file.width <= 0 || file.height <= 0 {
        return Err(LevelError::BadArena { width: file.width, height: file.height });
    }
    for (index, w) in file.walls.iter().enumerate() {
        if w.width < 0 || w.height < 0 {
            return Err(LevelError::NegativeWall { index, width: w.width, height: w.height });
        }
    }
    if file.pursuers.is_empty() {
        return Err(LevelError::NoPursuers);
    }

    let mut pursuers = Vec::with_capacity(file.pursuers.len());
    for (index, p) in file.pursuers.into_iter().enumerate() {
        let heading = p.heading
            .as_deref()
            .map(str::parse::<Direction>)
            .transpose()
            .map_err(|source| LevelError::BadHeading { index, source })?;
        if let Some(speed) = p.speed {
            if speed <= 0 {
                return Err(LevelError::BadSpeed { index, speed });
            }
        }
        pursuers.push(PursuerSpawn { position: pos(p.at), speed: p.speed, heading });
    }

    let mut walls = file.walls;
    if file.border {
        walls.extend(border_walls(file.width, file.height));
    }

    let player_start = pos(file.player);
    Ok(Level {
        name: file.name,
        width: file.width,
        height: file.height,
        walls,
        pellets: file.pellets.into_iter().map(pos).collect(),
        player_start,
        fruit_spawn: file.fruit_spawn.map(pos).unwrap_or(player_start),
        pursuers,
    })
}

pub fn load_level_file(path: &Path) -> Result<Level, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level(&text)
}

/// Resolve the level for a session: the configured file if it loads and
/// validates, otherwise the embedded classic maze. Fails only when the
/// classic maze itself cannot hold boxes of the configured size.
pub fn load_level(config: &GameConfig) -> Result<Level, LevelError> {
    let half_extent = config.collision.half_extent;
    if let Some(path) = &config.level_file {
        match load_level_file(path).and_then(|l| l.validate_spawns(half_extent).map(|_| l)) {
            Ok(level) => {
                info!(name = %level.name, path = %path.display(), "loaded level");
                return Ok(level);
            }
            Err(e) => warn!("{e}; falling back to the classic maze"),
        }
    }
    let level = classic();
    level.validate_spawns(half_extent)?;
    Ok(level)
}

fn border_walls(width: i32, height: i32) -> [Rect; 4] {
    let t = BORDER_THICKNESS;
    [
        Rect::new(0, 0, width, t),
        Rect::new(0, height - t, width, t),
        Rect::new(0, 0, t, height),
        Rect::new(width - t, 0, t, height),
    ]
}

/// The classic 600×600 maze: twelve inner walls with gaps, a pellet on
/// every 100 px lattice point except the player's start.
pub fn classic() -> Level {
    let mut walls = vec![
        Rect::new(50, 50, 200, 10),
        Rect::new(50, 50, 10, 200),
        Rect::new(50, 350, 10, 200),
        Rect::new(50, 540, 200, 10),
        Rect::new(150, 150, 200, 10),
        Rect::new(150, 150, 10, 200),
        Rect::new(150, 440, 200, 10),
        Rect::new(350, 50, 200, 10),
        Rect::new(350, 540, 200, 10),
        Rect::new(440, 150, 10, 200),
        Rect::new(540, 50, 10, 200),
        Rect::new(540, 350, 10, 200),
    ];
    walls.extend(border_walls(600, 600));

    let start = Position::new(300, 300);
    let pellets = (1..=5)
        .flat_map(|col| (1..=5).map(move |row| Position::new(col * 100, row * 100)))
        .filter(|&p| p != start)
        .collect();

    Level {
        name: "Classic".into(),
        width: 600,
        height: 600,
        walls,
        pellets,
        player_start: start,
        fruit_spawn: start,
        pursuers: vec![PursuerSpawn {
            position: Position::new(100, 100),
            speed: None,
            heading: None,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        name = "Corridor"
        width = 400
        height = 200
        player = [300, 100]
        pellets = [[100, 100], [200, 100]]
        walls = [{ x = 150, y = 0, width = 10, height = 60 }]

        [[pursuers]]
        at = [60, 100]
        heading = "right"

        [[pursuers]]
        at = [340, 60]
        speed = 2
    "#;

    #[test]
    fn classic_layout() {
        let level = classic();
        assert_eq!(level.walls.len(), 16);
        assert_eq!(level.pellets.len(), 24);
        assert!(!level.pellets.contains(&level.player_start));
        assert_eq!(level.pursuers[0].position, Position::new(100, 100));
        level.validate_spawns(15).unwrap();
    }

    #[test]
    fn parses_sample_level() {
        let level = parse_level(SAMPLE).unwrap();
        assert_eq!(level.name, "Corridor");
        assert_eq!(level.walls.len(), 5); // one inner + four border
        assert_eq!(level.fruit_spawn, Position::new(300, 100));
        assert_eq!(level.pursuers[0].heading, Some(Direction::Right));
        assert_eq!(level.pursuers[1].heading, None);
        assert_eq!(level.pursuers[1].speed, Some(2));
        level.validate_spawns(15).unwrap();
    }

    #[test]
    fn bundled_crossroads_level_is_valid() {
        let level = parse_level(include_str!("../../levels/crossroads.toml")).unwrap();
        assert_eq!(level.name, "Crossroads");
        assert_eq!(level.walls.len(), 9);
        assert_eq!(level.pellets.len(), 16);
        assert_eq!(level.pursuers.len(), 2);
        assert_eq!(level.pursuers[1].speed, Some(3));
        level.validate_spawns(15).unwrap();
    }

    #[test]
    fn rejects_unknown_heading() {
        let text = SAMPLE.replace("\"right\"", "\"sideways\"");
        match parse_level(&text) {
            Err(LevelError::BadHeading { index: 0, source }) => {
                assert_eq!(source, ParseDirectionError("sideways".into()));
            }
            other => panic!("expected BadHeading, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_wall_but_allows_degenerate() {
        let neg = SAMPLE.replace("width = 10, height = 60", "width = -10, height = 60");
        assert!(matches!(parse_level(&neg), Err(LevelError::NegativeWall { index: 0, .. })));

        let flat = SAMPLE.replace("width = 10, height = 60", "width = 0, height = 60");
        assert!(parse_level(&flat).is_ok());
    }

    #[test]
    fn rejects_spawn_inside_wall() {
        let text = SAMPLE.replace("player = [300, 100]", "player = [150, 30]");
        let level = parse_level(&text).unwrap();
        assert!(matches!(
            level.validate_spawns(15),
            Err(LevelError::SpawnBlocked { x: 150, y: 30, .. })
        ));
    }

    #[test]
    fn rejects_level_without_pursuers() {
        let text = "width = 100\nheight = 100\nplayer = [50, 50]\n";
        assert!(matches!(parse_level(text), Err(LevelError::NoPursuers)));
    }

    #[test]
    fn rejects_bad_arena_and_speed() {
        let text = SAMPLE.replace("width = 400", "width = 0");
        assert!(matches!(parse_level(&text), Err(LevelError::BadArena { .. })));
        let text = SAMPLE.replace("speed = 2", "speed = 0");
        assert!(matches!(parse_level(&text), Err(LevelError::BadSpeed { index: 1, speed: 0 })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_level_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
    }

    #[test]
    fn bad_configured_file_falls_back_to_classic() {
        let mut cfg = GameConfig::default();
        cfg.level_file = Some(PathBuf::from("/definitely/not/here.toml"));
        assert_eq!(load_level(&cfg).unwrap().name, "Classic");
    }

    #[test]
    fn classic_maze_is_checked_against_box_size() {
        let mut cfg = GameConfig::default();
        cfg.collision.half_extent = 60;
        let err = load_level(&cfg).unwrap_err();
        assert!(matches!(err, LevelError::SpawnBlocked { .. }), "{err:?}");

        cfg.collision.half_extent = 15;
        assert_eq!(load_level(&cfg).unwrap().name, "Classic");
    }
}
