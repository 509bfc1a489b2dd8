/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Player movement (one direction, applied only if clear)
///   2. Pursuer decisions (each independent, against the same field)
///   3. Pickup collection
///   4. Fruit schedule (spawn on pellet milestones)
///   5. Fruit timers (expiry)
///   6. Catch check (pursuer contact ends the game)
///   7. Clear check (no pellets left)

use std::time::Duration;

use tracing::{debug, info, trace};

use crate::domain::direction::Direction;
use crate::domain::pursuer::PursuitMode;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: Option<Direction>, elapsed: Duration) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_player_movement(world, input);
    resolve_pursuers(world, &mut events);
    resolve_pickups(world, &mut events);
    resolve_fruit_schedule(world, &mut events);
    resolve_fruit_timers(world, elapsed, &mut events);
    if resolve_catch(world, &mut events) { return events; }
    resolve_clear(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, input: Option<Direction>) {
    let Some(dir) = input else { return };
    let moved = world.player.try_move(dir, &world.field, world.rules.half_extent);
    trace!(tick = world.tick, %dir, moved, "player move");
}

fn resolve_pursuers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let target = world.player.position;
    for p in &mut world.pursuers {
        let decision = p.advance(&world.controller, target, &world.field, &mut world.rng);
        match decision.mode {
            PursuitMode::Chase => {}
            PursuitMode::WallFollow => {
                debug!(id = p.id, dir = ?decision.direction, "pursuer wall-following");
                events.push(GameEvent::PursuerWallFollow { id: p.id });
            }
            PursuitMode::Stalled => {
                debug!(id = p.id, x = p.position.x, y = p.position.y, "pursuer stalled");
                events.push(GameEvent::PursuerStalled { id: p.id });
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Pickups
// ══════════════════════════════════════════════════════════════

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let got = world.pickups.collect(world.player.position, world.rules.pickup_reach);
    if got.points == 0 && got.pellets == 0 && got.fruit.is_empty() { return; }

    world.score += got.points;
    world.pellets_eaten += got.pellets;
    for _ in 0..got.pellets {
        events.push(GameEvent::PelletEaten { points: world.rules.pellet_points });
    }
    for kind in got.fruit {
        info!(fruit = %kind, points = kind.points(), "fruit eaten");
        world.set_message(&format!("{} +{}", kind.name().to_uppercase(), kind.points()), 45);
        events.push(GameEvent::FruitEaten { kind, points: kind.points() });
    }
}

/// A milestone reached while another fruit is still out is consumed
/// without spawning, so fruit never stacks.
fn resolve_fruit_schedule(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    while let Some(&(threshold, kind)) = world.rules.fruit_schedule.get(world.next_milestone) {
        if world.pellets_eaten < threshold { break; }
        world.next_milestone += 1;
        if world.pickups.spawn_fruit(kind, world.level.fruit_spawn) {
            debug!(fruit = %kind, pellets = world.pellets_eaten, "fruit spawned");
            events.push(GameEvent::FruitSpawned { kind });
        } else {
            debug!(fruit = %kind, "fruit milestone skipped, one already out");
        }
    }
}

fn resolve_fruit_timers(world: &mut WorldState, elapsed: Duration, events: &mut Vec<GameEvent>) {
    for kind in world.pickups.tick(elapsed) {
        debug!(fruit = %kind, "fruit expired");
        events.push(GameEvent::FruitExpired { kind });
    }
}

// ══════════════════════════════════════════════════════════════
// End conditions
// ══════════════════════════════════════════════════════════════

fn resolve_catch(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let player = world.player.position;
    let reach = world.rules.catch_distance;
    let Some(p) = world.pursuers.iter().find(|p| p.position.within(player, reach)) else {
        return false;
    };
    let id = p.id;
    info!(id, tick = world.tick, score = world.score, "player caught");
    world.caught_by = Some(id);
    world.phase = Phase::GameOver;
    world.set_message("CAUGHT!", 0);
    events.push(GameEvent::PlayerCaught { id });
    true
}

fn resolve_clear(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.pickups.pellets_remaining() > 0 { return; }
    info!(tick = world.tick, score = world.score, "maze cleared");
    world.phase = Phase::Cleared;
    world.set_message("MAZE CLEARED!", 0);
    events.push(GameEvent::MazeCleared);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::{Position, Rect};
    use crate::domain::pickup::FruitKind;
    use crate::sim::level::{classic, Level, PursuerSpawn};
    use crate::sim::world::Rules;

    const TICK: Duration = Duration::from_millis(33);

    fn open_level(player: Position, pursuer: Position, pellets: Vec<Position>) -> Level {
        Level {
            name: "test".into(),
            width: 1000,
            height: 1000,
            walls: vec![],
            pellets,
            player_start: player,
            fruit_spawn: Position::new(500, 500),
            pursuers: vec![PursuerSpawn {
                position: pursuer,
                speed: None,
                heading: Some(Direction::Left),
            }],
        }
    }

    fn playing(level: Level, rules: Rules) -> WorldState {
        let mut w = WorldState::new(level, rules, 7);
        w.phase = Phase::Playing;
        w
    }

    #[test]
    fn nothing_happens_outside_playing() {
        let mut w = WorldState::new(classic(), Rules::default(), 1);
        assert!(step(&mut w, Some(Direction::Left), TICK).is_empty());
        assert_eq!(w.tick, 0);
        assert_eq!(w.player.position, Position::new(300, 300));
    }

    #[test]
    fn classic_first_tick() {
        let mut w = playing(classic(), Rules::default());
        let events = step(&mut w, Some(Direction::Left), TICK);
        assert!(events.is_empty());
        assert_eq!(w.player.position, Position::new(292, 300));
        // (100,100) toward (292,300): Down lands closest.
        assert_eq!(w.pursuers[0].position, Position::new(100, 104));
        assert_eq!(w.pursuers[0].heading, Direction::Down);
    }

    #[test]
    fn contact_ends_the_game() {
        let mut w = playing(
            open_level(Position::new(300, 300), Position::new(330, 300), vec![Position::new(900, 900)]),
            Rules::default(),
        );
        let events = step(&mut w, None, TICK);
        // Pursuer steps left to 326: distance 26, not yet.
        assert!(events.is_empty());
        let events = step(&mut w, None, TICK);
        let events2 = step(&mut w, None, TICK);
        let all: Vec<_> = events.into_iter().chain(events2).collect();
        assert!(all.contains(&GameEvent::PlayerCaught { id: 0 }));
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.caught_by, Some(0));
        assert!(step(&mut w, None, TICK).is_empty());
    }

    #[test]
    fn eating_the_last_pellet_clears_the_maze() {
        let mut w = playing(
            open_level(
                Position::new(300, 300),
                Position::new(900, 100),
                vec![Position::new(308, 300), Position::new(316, 300)],
            ),
            Rules::default(),
        );
        let events = step(&mut w, Some(Direction::Right), TICK);
        assert_eq!(w.score, 20);
        assert_eq!(w.pellets_eaten, 2);
        assert_eq!(
            events,
            vec![
                GameEvent::PelletEaten { points: 10 },
                GameEvent::PelletEaten { points: 10 },
                GameEvent::MazeCleared,
            ]
        );
        assert_eq!(w.phase, Phase::Cleared);
    }

    #[test]
    fn fruit_spawns_on_milestone_and_expires() {
        let rules = Rules { fruit_schedule: vec![(1, FruitKind::Key)], ..Rules::default() };
        let mut w = playing(
            open_level(
                Position::new(300, 300),
                Position::new(900, 100),
                vec![Position::new(308, 300), Position::new(800, 800)],
            ),
            rules,
        );
        let events = step(&mut w, Some(Direction::Right), TICK);
        assert!(events.contains(&GameEvent::FruitSpawned { kind: FruitKind::Key }));
        assert!(w.pickups.active_fruit().is_some());

        let events = step(&mut w, None, Duration::from_secs(6));
        assert!(events.contains(&GameEvent::FruitExpired { kind: FruitKind::Key }));
        assert!(w.pickups.active_fruit().is_none());
        assert_eq!(w.next_milestone, 1);
    }

    #[test]
    fn milestone_during_active_fruit_is_skipped() {
        let rules = Rules {
            fruit_schedule: vec![(1, FruitKind::Cherry), (2, FruitKind::Bell)],
            ..Rules::default()
        };
        let mut w = playing(
            open_level(
                Position::new(300, 300),
                Position::new(900, 100),
                vec![Position::new(308, 300), Position::new(316, 300), Position::new(800, 800)],
            ),
            rules,
        );
        let events = step(&mut w, Some(Direction::Right), TICK);
        assert!(events.contains(&GameEvent::FruitSpawned { kind: FruitKind::Cherry }));
        assert!(!events.contains(&GameEvent::FruitSpawned { kind: FruitKind::Bell }));
        assert_eq!(w.next_milestone, 2);
    }

    #[test]
    fn walking_onto_fruit_scores_it() {
        let rules = Rules { fruit_schedule: vec![(0, FruitKind::Orange)], ..Rules::default() };
        let mut level = open_level(
            Position::new(300, 300),
            Position::new(900, 100),
            vec![Position::new(800, 800)],
        );
        level.fruit_spawn = Position::new(316, 300);
        let mut w = playing(level, rules);
        step(&mut w, None, TICK); // milestone 0 spawns immediately
        let events = step(&mut w, Some(Direction::Right), TICK);
        assert!(events.contains(&GameEvent::FruitEaten { kind: FruitKind::Orange, points: 500 }));
        assert_eq!(w.score, 500);
        assert_eq!(w.message, "ORANGE +500");
    }

    #[test]
    fn blocked_player_stays_put() {
        let mut level = open_level(Position::new(300, 300), Position::new(900, 100), vec![Position::new(800, 800)]);
        level.walls = vec![Rect::new(250, 270, 100, 10)];
        let mut w = playing(level, Rules::default());
        step(&mut w, Some(Direction::Up), TICK);
        assert_eq!(w.player.position, Position::new(300, 300));
    }

    #[test]
    fn boxed_pursuer_reports_stall() {
        let mut level = open_level(Position::new(500, 500), Position::new(100, 100), vec![Position::new(800, 800)]);
        level.walls = vec![
            Rect::new(70, 75, 60, 10),
            Rect::new(70, 115, 60, 10),
            Rect::new(75, 70, 10, 60),
            Rect::new(115, 70, 10, 60),
        ];
        let mut w = playing(level, Rules::default());
        let events = step(&mut w, None, TICK);
        assert_eq!(events, vec![GameEvent::PursuerStalled { id: 0 }]);
        assert_eq!(w.pursuers[0].position, Position::new(100, 100));
    }

    #[test]
    fn replay_is_deterministic_for_a_seed() {
        let inputs = [Some(Direction::Left), Some(Direction::Up), None, Some(Direction::Down)];
        let run = || {
            let mut w = playing(classic(), Rules::default());
            for i in 0..300 {
                step(&mut w, inputs[i % inputs.len()], TICK);
            }
            (w.player.position, w.pursuers[0].position, w.score, w.phase)
        };
        assert_eq!(run(), run());
    }
}
