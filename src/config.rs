/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::domain::pickup::FruitKind;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub collision: CollisionConfig,
    pub pickups: PickupConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub history_len: usize,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_speed: i32,
    pub pursuer_speed: i32,
    pub wall_follow_speed: Option<i32>, // wall-follow step; None = pursuer_speed
}

#[derive(Clone, Debug)]
pub struct CollisionConfig {
    pub half_extent: i32,
    pub catch_distance: i32,
    pub pickup_reach: i32,
}

#[derive(Clone, Debug)]
pub struct PickupConfig {
    pub pellet_points: u32,
    /// (pellets eaten, fruit) milestones, in file order.
    pub schedule: Vec<(usize, FruitKind)>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    collision: TomlCollision,
    #[serde(default)]
    pickups: TomlPickups,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    #[serde(default = "default_pursuer_speed")]
    pursuer_speed: i32,
    #[serde(default)]
    wall_follow_speed: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct TomlCollision {
    #[serde(default = "default_half_extent")]
    half_extent: i32,
    #[serde(default = "default_catch_distance")]
    catch_distance: i32,
    #[serde(default = "default_pickup_reach")]
    pickup_reach: i32,
}

#[derive(Deserialize, Debug)]
struct TomlPickups {
    #[serde(default = "default_pellet_points")]
    pellet_points: u32,
    #[serde(default = "default_schedule")]
    schedule: Vec<TomlMilestone>,
}

#[derive(Deserialize, Debug)]
struct TomlMilestone {
    pellets_eaten: usize,
    fruit: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_history_len")]
    history_len: usize,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }      // ~30 fps, one tick per frame
fn default_player_speed() -> i32 { 8 }
fn default_pursuer_speed() -> i32 { 4 }
fn default_half_extent() -> i32 { 15 }
fn default_catch_distance() -> i32 { 20 }
fn default_pickup_reach() -> i32 { 15 }
fn default_pellet_points() -> u32 { 10 }
fn default_history_len() -> usize { 256 }

fn default_schedule() -> Vec<TomlMilestone> {
    vec![
        TomlMilestone { pellets_eaten: 8, fruit: "cherry".into() },
        TomlMilestone { pellets_eaten: 16, fruit: "strawberry".into() },
    ]
}

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pause() -> Vec<String> { vec!["Y".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
            pursuer_speed: default_pursuer_speed(),
            wall_follow_speed: None,
        }
    }
}

impl Default for TomlCollision {
    fn default() -> Self {
        TomlCollision {
            half_extent: default_half_extent(),
            catch_distance: default_catch_distance(),
            pickup_reach: default_pickup_reach(),
        }
    }
}

impl Default for TomlPickups {
    fn default() -> Self {
        TomlPickups {
            pellet_points: default_pellet_points(),
            schedule: default_schedule(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: None,
            seed: None,
            history_len: default_history_len(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home. Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document directly (no filesystem search).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let level_file = cfg.general.level_file.map(|name| resolve_path(&name, search_dirs));

        let mut schedule = Vec::with_capacity(cfg.pickups.schedule.len());
        for m in cfg.pickups.schedule {
            match m.fruit.parse::<FruitKind>() {
                Ok(kind) => schedule.push((m.pellets_eaten, kind)),
                Err(e) => warn!("config.toml: {e}; milestone at {} pellets ignored", m.pellets_eaten),
            }
        }

        let mut speed = SpeedConfig {
            tick_rate_ms: cfg.speed.tick_rate_ms.max(1),
            player_speed: cfg.speed.player_speed,
            pursuer_speed: cfg.speed.pursuer_speed,
            wall_follow_speed: cfg.speed.wall_follow_speed,
        };
        if speed.player_speed <= 0 {
            warn!("config.toml: player_speed must be positive, using {}", default_player_speed());
            speed.player_speed = default_player_speed();
        }
        if speed.pursuer_speed <= 0 {
            warn!("config.toml: pursuer_speed must be positive, using {}", default_pursuer_speed());
            speed.pursuer_speed = default_pursuer_speed();
        }
        if matches!(speed.wall_follow_speed, Some(s) if s <= 0) {
            warn!("config.toml: wall_follow_speed must be positive, ignoring");
            speed.wall_follow_speed = None;
        }
        let mut half_extent = cfg.collision.half_extent;
        if half_extent <= 0 {
            warn!("config.toml: half_extent must be positive, using {}", default_half_extent());
            half_extent = default_half_extent();
        }

        GameConfig {
            speed,
            collision: CollisionConfig {
                half_extent,
                catch_distance: cfg.collision.catch_distance.max(0),
                pickup_reach: cfg.collision.pickup_reach.max(0),
            },
            pickups: PickupConfig {
                pellet_points: cfg.pickups.pellet_points,
                schedule,
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                pause: cfg.gamepad.pause,
            },
            level_file,
            seed: cfg.general.seed,
            history_len: cfg.general.history_len,
        }
    }
}

/// Absolute paths are kept; relative ones are looked up in the search dirs,
/// then left relative to CWD.
fn resolve_path(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pellet-chase");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    debug!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e) => {
                    warn!("config.toml parse error: {e}; using default settings");
                    return TomlConfig::default();
                }
            },
            Err(e) => warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_tuning() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.speed.player_speed, 8);
        assert_eq!(cfg.speed.pursuer_speed, 4);
        assert_eq!(cfg.speed.wall_follow_speed, None);
        assert_eq!(cfg.collision.half_extent, 15);
        assert_eq!(cfg.collision.catch_distance, 20);
        assert_eq!(cfg.collision.pickup_reach, 15);
        assert_eq!(cfg.pickups.pellet_points, 10);
        assert_eq!(
            cfg.pickups.schedule,
            vec![(8, FruitKind::Cherry), (16, FruitKind::Strawberry)]
        );
        assert!(cfg.level_file.is_none());
        assert!(cfg.seed.is_none());
        assert_eq!(cfg.history_len, 256);
        assert_eq!(cfg.speed.tick_rate_ms, 33);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[speed]\npursuer_speed = 6\nwall_follow_speed = 1\n\n[general]\nseed = 7\n",
        ).unwrap();
        assert_eq!(cfg.speed.pursuer_speed, 6);
        assert_eq!(cfg.speed.wall_follow_speed, Some(1));
        assert_eq!(cfg.speed.player_speed, 8);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.collision.catch_distance, 20);
        assert_eq!(cfg.history_len, 256);
    }

    #[test]
    fn schedule_skips_unknown_fruit() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [pickups]
            schedule = [
                { pellets_eaten = 3, fruit = "bell" },
                { pellets_eaten = 5, fruit = "durian" },
            ]
            "#,
        ).unwrap();
        assert_eq!(cfg.pickups.schedule, vec![(3, FruitKind::Bell)]);
    }

    #[test]
    fn non_positive_speeds_fall_back() {
        let cfg = GameConfig::from_toml_str(
            "[speed]\nplayer_speed = 0\npursuer_speed = -3\nwall_follow_speed = 0\n",
        ).unwrap();
        assert_eq!(cfg.speed.player_speed, 8);
        assert_eq!(cfg.speed.pursuer_speed, 4);
        assert_eq!(cfg.speed.wall_follow_speed, None);
    }

    #[test]
    fn degenerate_box_falls_back() {
        for doc in ["[collision]\nhalf_extent = 0\n", "[collision]\nhalf_extent = -4\n"] {
            let cfg = GameConfig::from_toml_str(doc).unwrap();
            assert_eq!(cfg.collision.half_extent, 15);
        }
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[speed\nplayer_speed = 1").is_err());
    }
}
