/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PushKeyboardEnhancementFlags, PopKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use rand::Rng;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::direction::Direction;
use sim::level::load_level;
use sim::step;
use sim::world::{Phase, Rules, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_CONFIRM, KEYS_PAUSE, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::{required_size, Renderer};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_ENV: &str = "PELLET_CHASE_LOG";
const LOG_FILE_ENV: &str = "PELLET_CHASE_LOG_FILE";

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let level = match load_level(&config) {
        Ok(level) => level,
        Err(e) => {
            error!("{e}");
            eprintln!("Cannot start: {e}");
            return;
        }
    };
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut world = WorldState::new(level, Rules::from_config(&config), seed);
    info!(
        seed,
        level = %world.level.name,
        walls = world.field.walls().len(),
        pellets = world.pickups.pellets_remaining(),
        "starting session"
    );

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let (need_w, need_h) = required_size(&world);
    if let Ok((tw, th)) = terminal::size() {
        if (tw as usize) < need_w || (th as usize) < need_h {
            warn!(need_w, need_h, tw, th, "terminal smaller than the arena; view is clipped");
        }
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pellet Chase!");
    println!("Final Score: {}  (seed {})", world.score, world.seed);
}

/// Log filter from `PELLET_CHASE_LOG` (default `warn`). The terminal
/// belongs to the game, so `PELLET_CHASE_LOG_FILE` can redirect output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match std::env::var_os(LOG_FILE_ENV).map(File::create) {
        Some(Ok(file)) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Some(Err(e)) => {
            builder.with_writer(std::io::stderr).init();
            warn!("could not open log file: {e}; logging to stderr");
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    if terminal::supports_keyboard_enhancement().unwrap_or(false) {
        execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
        kb.honor_release = true;
        debug!("keyboard enhancement enabled");
    }

    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();

    let result = loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || handle_meta(world, &kb, &gp) {
            break Ok(());
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            if world.phase == Phase::Playing {
                let events = step::step(world, detect_movement(&kb, &gp), elapsed);
                if let Some(sfx) = sound {
                    sfx.play_events(&events);
                }
            }
            last_tick = Instant::now();
        }

        if let Err(e) = renderer.render(world) {
            break Err(e.into());
        }
        std::thread::sleep(FRAME_SLEEP);
    };

    if kb.honor_release {
        execute!(std::io::stdout(), PopKeyboardEnhancementFlags)?;
    }
    result
}

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    kb.movement().or_else(|| gp.direction())
}

fn new_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Phase transitions driven by input. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let quit = kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed();
    let pause = kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed();
    let restart = kb.any_pressed(KEYS_RESTART);

    if quit {
        info!(score = world.score, tick = world.tick, "quit");
        return true;
    }

    match world.phase {
        Phase::Ready => {
            if confirm || kb.any_direction_pressed() || gp.direction().is_some() {
                world.phase = Phase::Playing;
                world.message.clear();
                world.message_timer = 0;
            }
        }
        Phase::Playing => {
            if pause {
                world.phase = Phase::Paused;
            } else if restart {
                restart_world(world);
            }
        }
        Phase::Paused => {
            if pause || confirm {
                world.phase = Phase::Playing;
            } else if restart {
                restart_world(world);
            }
        }
        Phase::GameOver | Phase::Cleared => {
            if confirm || restart {
                restart_world(world);
            }
        }
    }

    false
}

fn restart_world(world: &mut WorldState) {
    let seed = new_seed();
    info!(seed, "restart");
    world.restart(seed);
    world.set_message("Level Restarted", 30);
}
