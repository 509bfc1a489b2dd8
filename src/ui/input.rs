/// Keyboard state tracker.
///
/// Movement is level-triggered: a direction applies every tick while its
/// key is held, and when several are held the most recently pressed one
/// wins. Commands (pause, restart, quit) are edge-triggered.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::direction::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::F(2), KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn keys_for(dir: Direction) -> &'static [KeyCode] {
    match dir {
        Direction::Up => KEYS_UP,
        Direction::Down => KEYS_DOWN,
        Direction::Left => KEYS_LEFT,
        Direction::Right => KEYS_RIGHT,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// When each held key was first pressed; decides which direction wins.
    pressed_at: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            pressed_at: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.feed(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;
    }

    fn feed(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                self.pressed_at.remove(&key.code);
            }
            // Without enhancement, release is inferred by timeout.
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, now) {
                    self.fresh_presses.push(key.code);
                    self.pressed_at.insert(key.code, now);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        let live = &self.last_active;
        self.pressed_at.retain(|k, _| live.contains_key(k));
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn any_direction_pressed(&self) -> bool {
        Direction::ALL.into_iter().any(|d| self.any_pressed(keys_for(d)))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    /// The direction to move this tick: the most recently pressed of the
    /// held direction keys.
    pub fn movement(&self) -> Option<Direction> {
        self.movement_at(Instant::now())
    }

    fn movement_at(&self, now: Instant) -> Option<Direction> {
        let mut best: Option<(Direction, Instant)> = None;
        for dir in Direction::ALL {
            for &code in keys_for(dir) {
                if !self.is_held_at(code, now) && !self.was_pressed(code) { continue; }
                let Some(&at) = self.pressed_at.get(&code) else { continue };
                if best.map_or(true, |(_, t)| at > t) {
                    best = Some((dir, at));
                }
            }
        }
        best.map(|(d, _)| d)
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn held_key_moves() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.begin_frame();
        kb.feed(press(KeyCode::Left), t0);
        assert_eq!(kb.movement_at(t0), Some(Direction::Left));
        assert!(kb.was_pressed(KeyCode::Left));
    }

    #[test]
    fn latest_press_wins() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.begin_frame();
        kb.feed(press(KeyCode::Up), t0);
        let t1 = t0 + Duration::from_millis(20);
        kb.begin_frame();
        kb.feed(press(KeyCode::Up), t1);
        kb.feed(press(KeyCode::Char('d')), t1);
        assert_eq!(kb.movement_at(t1), Some(Direction::Right));
        // Repeat of Up does not reset its original press time.
        assert!(!kb.was_pressed(KeyCode::Up));
    }

    #[test]
    fn key_expires_without_release_events() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.begin_frame();
        kb.feed(press(KeyCode::Down), t0);
        let later = t0 + HOLD_TIMEOUT + Duration::from_millis(1);
        kb.begin_frame();
        kb.expire(later);
        assert_eq!(kb.movement_at(later), None);
    }

    #[test]
    fn release_honored_only_with_enhancement() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.feed(press(KeyCode::Left), t0);
        kb.feed(release(KeyCode::Left), t0);
        assert_eq!(kb.movement_at(t0), Some(Direction::Left));

        kb.honor_release = true;
        kb.feed(release(KeyCode::Left), t0);
        kb.begin_frame();
        assert_eq!(kb.movement_at(t0), None);
    }

    #[test]
    fn ctrl_c_detected() {
        let mut kb = InputState::new();
        kb.begin_frame();
        kb.feed(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
        kb.begin_frame();
        assert!(!kb.ctrl_c_pressed());
    }
}
