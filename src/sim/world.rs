/// WorldState: the complete state of a running game.
///
/// The collision field is built once from the level and never mutated;
/// the player and every pursuer borrow it during a tick. The RNG is a
/// seeded ChaCha stream so a session (and every test) can be replayed
/// from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GameConfig;
use crate::domain::collision::CollisionField;
use crate::domain::direction::Direction;
use crate::domain::pickup::{FruitKind, PickupManager};
use crate::domain::player::Player;
use crate::domain::pursuer::{Pursuer, PursuerController};
use super::level::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Ready,
    Playing,
    Paused,
    GameOver,
    Cleared,
}

/// Tuning that stays fixed for a session.
#[derive(Clone, Debug)]
pub struct Rules {
    pub player_speed: i32,
    pub pursuer_speed: i32,
    pub wall_follow_speed: Option<i32>,
    pub half_extent: i32,
    pub catch_distance: i32,
    pub pickup_reach: i32,
    pub pellet_points: u32,
    pub fruit_schedule: Vec<(usize, FruitKind)>,
    pub history_len: usize,
}

impl Rules {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Rules {
            player_speed: cfg.speed.player_speed,
            pursuer_speed: cfg.speed.pursuer_speed,
            wall_follow_speed: cfg.speed.wall_follow_speed,
            half_extent: cfg.collision.half_extent,
            catch_distance: cfg.collision.catch_distance,
            pickup_reach: cfg.collision.pickup_reach,
            pellet_points: cfg.pickups.pellet_points,
            fruit_schedule: cfg.pickups.schedule.clone(),
            history_len: cfg.history_len,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::from_config(&GameConfig::default())
    }
}

pub struct WorldState {
    pub phase: Phase,
    pub level: Level,
    pub field: CollisionField,
    pub rules: Rules,
    pub controller: PursuerController,
    pub player: Player,
    pub pursuers: Vec<Pursuer>,
    pub pickups: PickupManager,

    pub score: u32,
    pub pellets_eaten: usize,
    /// Index of the next unreached entry in `rules.fruit_schedule`.
    pub next_milestone: usize,
    pub caught_by: Option<usize>,

    pub tick: u64,
    pub seed: u64,
    pub rng: ChaCha8Rng,

    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(level: Level, rules: Rules, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let field = level.collision_field();
        let controller = PursuerController::new(rules.half_extent)
            .with_wall_follow_speed(rules.wall_follow_speed);
        let player = Player::new(level.player_start, rules.player_speed, rules.history_len);
        let pursuers = spawn_pursuers(&level, &rules, &mut rng);
        let pickups = PickupManager::new(level.pellets.iter().copied(), rules.pellet_points);

        WorldState {
            phase: Phase::Ready,
            level,
            field,
            rules,
            controller,
            player,
            pursuers,
            pickups,
            score: 0,
            pellets_eaten: 0,
            next_milestone: 0,
            caught_by: None,
            tick: 0,
            seed,
            rng,
            message: String::new(),
            message_timer: 0,
        }
    }

    /// Show a message for `ticks` ticks (0 = until replaced or cleared).
    pub fn set_message(&mut self, msg: &str, ticks: u32) {
        self.message = msg.to_string();
        self.message_timer = ticks;
    }

    /// Reset the level to its starting state under a new seed.
    pub fn restart(&mut self, seed: u64) {
        let level = self.level.clone();
        let rules = self.rules.clone();
        *self = WorldState::new(level, rules, seed);
    }
}

fn spawn_pursuers(level: &Level, rules: &Rules, rng: &mut ChaCha8Rng) -> Vec<Pursuer> {
    level.pursuers.iter().enumerate()
        .map(|(id, s)| {
            let heading = s.heading.unwrap_or_else(|| Direction::ALL[rng.gen_range(0..4)]);
            Pursuer::new(id, s.position, s.speed.unwrap_or(rules.pursuer_speed), heading)
        })
        .collect()
}
