/// Keyboard state tracker and the key → command mapping.
///
/// Directions are edge-triggered: a fresh press faces the player and sets it
/// moving, letting go of every direction key stops it but keeps the facing.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Terminals without it never report a let-go, so the player keeps running
/// until a wall stops it or another direction is pressed; held-state still
/// expires by timeout for menu repeat handling.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Command;
use crate::domain::geom::Direction;
use crate::domain::portal::PortalColor;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const DIRECTION_KEYS: [(KeyCode, Direction); 4] = [
    (KeyCode::Up, Direction::Up),
    (KeyCode::Left, Direction::Left),
    (KeyCode::Down, Direction::Down),
    (KeyCode::Right, Direction::Right),
];
pub const FIRE_BLUE_KEYS: [KeyCode; 2] = [KeyCode::Char('a'), KeyCode::Char('z')];
pub const FIRE_ORANGE_KEYS: [KeyCode; 2] = [KeyCode::Char('s'), KeyCode::Char('x')];
pub const CONFIRM_KEYS: [KeyCode; 2] = [KeyCode::Enter, KeyCode::Char(' ')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Keys with an explicit Release event during the most recent drain.
    releases: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            releases: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.releases.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);
            self.record(key.code, key.kind);
        }

        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        match self.last_active.get(&code) {
            Some(_) if self.honor_release => true,
            Some(t) => t.elapsed() < HOLD_TIMEOUT,
            None => false,
        }
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Fresh press of a direction key, last one wins.
    pub fn direction_pressed(&self) -> Option<Direction> {
        self.fresh_presses.iter().rev().find_map(|code| {
            DIRECTION_KEYS.iter().find(|(k, _)| k == code).map(|&(_, d)| d)
        })
    }

    /// A direction key was let go and none is still down.
    pub fn direction_released(&self) -> bool {
        let keys = DIRECTION_KEYS.map(|(k, _)| k);
        self.releases.iter().any(|c| keys.contains(c)) && !self.any_held(&keys)
    }

    /// Player commands for this frame, in application order.
    pub fn commands(&self) -> Vec<Command> {
        let mut out = Vec::new();
        if let Some(dir) = self.direction_pressed() {
            out.push(Command::Face(dir));
        }
        if self.direction_released() {
            out.push(Command::Release);
        }
        if self.any_pressed(&FIRE_BLUE_KEYS) {
            out.push(Command::Fire(PortalColor::Blue));
        }
        if self.any_pressed(&FIRE_ORANGE_KEYS) {
            out.push(Command::Fire(PortalColor::Orange));
        }
        out
    }

    // ── Internal ──

    fn record(&mut self, code: KeyCode, kind: KeyEventKind) {
        match kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
                self.releases.push(code);
            }
            // Not trusted without enhancement; the timeout handles it.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(code);
                self.last_active.insert(code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }
}
