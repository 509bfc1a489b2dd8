/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` table of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A / Start             →  Confirm
///   Select                →  Quit
///   Y                     →  Pause
///
/// Without the `gamepad` feature every query reports "not pressed".

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::direction::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    pause: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::Select],
            pause: vec![Btn::Y],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `update`.
    just_pressed: [bool; BTN_COUNT],
    /// D-pad, indexed like `Direction::ALL`.
    dpad: [bool; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                if g.gamepads().next().is_some() {
                    tracing::info!("gamepad connected");
                }
                Some(g)
            }
            Err(e) => {
                tracing::debug!("gamepad support unavailable: {e}");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            dpad: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
        }
    }

    /// Apply the configured mapping. Unknown names are skipped; an action
    /// whose list parses to nothing keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        let pa = parse_list(&cfg.pause);
        if !pa.is_empty() { map.pause = pa; }
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.stick_x = value,
                    Axis::LeftStickY => self.stick_y = value,
                    _ => {}
                },
                EventType::Connected => tracing::info!("gamepad connected"),
                EventType::Disconnected => {
                    tracing::info!("gamepad disconnected");
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad = match gilrs_btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.dpad[dir as usize] = held;
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.just_pressed[btn as usize] |= held;
        }
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }

    /// Held movement direction. The D-pad beats the stick.
    pub fn direction(&self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| self.dpad[d as usize])
            .or_else(|| stick_direction(self.stick_x, self.stick_y))
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.dpad = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

impl Default for GamepadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Digital direction for an analog stick; the dominant axis wins.
/// gilrs reports +y as up.
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() <= STICK_DEADZONE && y.abs() <= STICK_DEADZONE {
        return None;
    }
    Some(if y.abs() >= x.abs() {
        if y > 0.0 { Direction::Up } else { Direction::Down }
    } else if x > 0.0 {
        Direction::Right
    } else {
        Direction::Left
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name(" Back "), Some(Btn::Select));
        assert_eq!(Btn::from_name("Z"), None);
    }

    #[test]
    fn config_overrides_only_parsable_lists() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            confirm: vec!["B".into()],
            cancel: vec!["nonsense".into()],
            pause: vec![],
        });
        assert_eq!(gp.action_map.confirm, vec![Btn::B]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select]);
        assert_eq!(gp.action_map.pause, vec![Btn::Y]);
    }

    #[test]
    fn stick_deadzone_and_dominant_axis() {
        assert_eq!(stick_direction(0.1, -0.2), None);
        assert_eq!(stick_direction(0.9, 0.3), Some(Direction::Right));
        assert_eq!(stick_direction(-0.4, 0.0), Some(Direction::Left));
        assert_eq!(stick_direction(0.3, 0.6), Some(Direction::Up));
        assert_eq!(stick_direction(0.0, -0.8), Some(Direction::Down));
    }

    #[test]
    fn dpad_beats_stick() {
        let mut gp = GamepadState::new();
        gp.stick_x = 1.0;
        gp.dpad[Direction::Down as usize] = true;
        assert_eq!(gp.direction(), Some(Direction::Down));
        gp.release_all();
        assert_eq!(gp.direction(), None);
    }

    #[test]
    fn presses_last_one_update() {
        let mut gp = GamepadState::new();
        gp.just_pressed[Btn::Start as usize] = true;
        assert!(gp.confirm_pressed());
        assert!(!gp.pause_pressed());
        gp.update();
        assert!(!gp.confirm_pressed());
    }
}
