/// Entities: the player, the pursuers, and per-frame player commands.
/// Pursuer behaviour is a four-state machine; the transitions live here,
/// the direction policies in `ai`.

use std::collections::VecDeque;

use super::geom::{Direction, Rect};
use super::portal::PortalColor;
use super::timer::Deadline;

/// Player commands, dispatched by `sim::step::apply_command`.
/// Directional commands are edge-triggered: a press faces and starts moving,
/// a release stops moving but keeps the facing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Face(Direction),
    Release,
    Fire(PortalColor),
}

#[derive(Clone, Debug)]
pub struct Player {
    pub rect: Rect,
    pub facing: Option<Direction>,
    pub moving: bool,
    pub alive: bool,
    pub speed: i32,
    spawn_center: (i32, i32),
    pub anim_tick: u32,
    pub died_at: u64,
}

impl Player {
    pub fn new(spawn_center: (i32, i32), size: i32, speed: i32) -> Self {
        Player {
            rect: Rect::centered(spawn_center.0, spawn_center.1, size, size),
            facing: None,
            moving: false,
            alive: true,
            speed,
            spawn_center,
            anim_tick: 0,
            died_at: 0,
        }
    }

    pub fn set_facing(&mut self, dir: Direction) {
        self.facing = Some(dir);
        self.moving = true;
    }

    pub fn release(&mut self) {
        self.moving = false;
    }

    pub fn die(&mut self, now: u64) {
        self.alive = false;
        self.moving = false;
        self.died_at = now;
    }

    pub fn revive(&mut self) {
        self.alive = true;
        self.anim_tick = 0;
    }

    pub fn reset_position(&mut self) {
        self.rect.set_center(self.spawn_center.0, self.spawn_center.1);
        self.facing = None;
        self.moving = false;
    }

    /// Index into the death animation.
    pub fn death_frame(&self, now: u64, frame_ticks: u64) -> u64 {
        now.saturating_sub(self.died_at) / frame_ticks.max(1)
    }
}

// ── Pursuers ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuerKind {
    Pinky,
    Inky,
    Clyde,
    Blinky,
}

impl PursuerKind {
    /// Spawn tiles take identities from this list in file order, cycling.
    pub const CYCLE: [PursuerKind; 4] = [
        PursuerKind::Pinky,
        PursuerKind::Inky,
        PursuerKind::Clyde,
        PursuerKind::Blinky,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PursuerKind::Pinky => "pinky",
            PursuerKind::Inky => "inky",
            PursuerKind::Clyde => "clyde",
            PursuerKind::Blinky => "blinky",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuerMode {
    Disabled,
    Normal,
    Flee,
    Captured,
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: usize,
    pub kind: PursuerKind,
    pub leader: bool,
    pub rect: Rect,
    pub direction: Option<Direction>,
    pub mode: PursuerMode,
    pub home: (usize, usize),
    start: Rect,
    pub return_path: VecDeque<(usize, usize)>,
    pub speed: i32,
    /// The previous update left it where it was; it decides again.
    pub stalled: bool,
    pub blink: bool,
    pub flee_ends: Deadline,
    pub blink_next: Deadline,
    pub return_grace: Deadline,
}

impl Pursuer {
    pub fn new(id: usize, kind: PursuerKind, home: (usize, usize), start: Rect, speed: i32) -> Self {
        Pursuer {
            id,
            kind,
            leader: false,
            rect: start,
            direction: None,
            mode: PursuerMode::Disabled,
            home,
            start,
            return_path: VecDeque::new(),
            speed,
            stalled: false,
            blink: false,
            flee_ends: Deadline::default(),
            blink_next: Deadline::default(),
            return_grace: Deadline::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != PursuerMode::Disabled
    }

    pub fn enable(&mut self, first: Option<Direction>) {
        self.mode = PursuerMode::Normal;
        self.direction = first;
        self.stalled = false;
    }

    pub fn disable(&mut self) {
        self.mode = PursuerMode::Disabled;
        self.direction = None;
        self.stalled = false;
        self.return_path.clear();
        self.blink = false;
        self.flee_ends.clear();
        self.blink_next.clear();
        self.return_grace.clear();
    }

    pub fn reset_position(&mut self) {
        self.rect = self.start;
    }

    /// Enter (or restart) flee mode. Captured and disabled pursuers ignore it.
    /// The blink warning starts halfway through.
    pub fn begin_flee(&mut self, now: u64, flee_ticks: u64) -> bool {
        match self.mode {
            PursuerMode::Normal | PursuerMode::Flee => {
                self.mode = PursuerMode::Flee;
                self.blink = false;
                self.flee_ends.schedule(now, flee_ticks);
                self.blink_next.schedule(now, flee_ticks / 2);
                true
            }
            PursuerMode::Captured | PursuerMode::Disabled => false,
        }
    }

    pub fn end_flee(&mut self) {
        self.mode = PursuerMode::Normal;
        self.blink = false;
        self.flee_ends.clear();
        self.blink_next.clear();
    }

    /// Caught while fleeing: follow `path` home after the grace delay.
    pub fn capture(&mut self, path: Vec<(usize, usize)>, now: u64, grace_ticks: u64) {
        self.mode = PursuerMode::Captured;
        self.blink = false;
        self.flee_ends.clear();
        self.blink_next.clear();
        self.return_path = path.into();
        self.return_grace.schedule(now, grace_ticks);
    }

    pub fn finish_return(&mut self) {
        self.mode = PursuerMode::Normal;
        self.return_path.clear();
        self.return_grace.clear();
        self.stalled = false;
    }

    /// Captured and still inside the grace delay (drawn as the score marker).
    pub fn showing_marker(&self, now: u64) -> bool {
        self.mode == PursuerMode::Captured && !self.return_grace.due(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pursuer() -> Pursuer {
        Pursuer::new(0, PursuerKind::Blinky, (1, 1), Rect::new(24, 24, 24, 24), 2)
    }

    #[test]
    fn release_keeps_facing() {
        let mut p = Player::new((36, 36), 24, 3);
        p.set_facing(Direction::Left);
        assert!(p.moving);
        p.release();
        assert!(!p.moving);
        assert_eq!(p.facing, Some(Direction::Left));
    }

    #[test]
    fn revive_after_death_and_reset() {
        let mut p = Player::new((36, 36), 24, 3);
        p.rect = p.rect.offset(30, 0);
        p.die(100);
        assert!(!p.alive);
        assert_eq!(p.death_frame(130, 10), 3);
        p.revive();
        p.reset_position();
        assert!(p.alive);
        assert_eq!(p.rect.center(), (36, 36));
    }

    #[test]
    fn flee_is_ignored_unless_active() {
        let mut p = pursuer();
        assert!(!p.begin_flee(0, 300));
        assert_eq!(p.mode, PursuerMode::Disabled);

        p.enable(Some(Direction::Up));
        assert!(p.begin_flee(0, 300));
        assert_eq!(p.mode, PursuerMode::Flee);
        assert!(p.flee_ends.due(300));
        assert!(p.blink_next.due(150));

        p.capture(vec![(1, 1)], 10, 60);
        assert!(!p.begin_flee(20, 300));
        assert_eq!(p.mode, PursuerMode::Captured);
    }

    #[test]
    fn capture_shows_marker_until_grace_ends() {
        let mut p = pursuer();
        p.enable(None);
        p.begin_flee(0, 300);
        p.capture(vec![(1, 2), (1, 1)], 100, 60);
        assert_eq!(p.mode, PursuerMode::Captured);
        assert!(!p.flee_ends.is_set());
        assert!(p.showing_marker(159));
        assert!(!p.showing_marker(160));
        p.finish_return();
        assert_eq!(p.mode, PursuerMode::Normal);
        assert!(p.return_path.is_empty());
    }

    #[test]
    fn disable_clears_everything() {
        let mut p = pursuer();
        p.enable(Some(Direction::Left));
        p.begin_flee(0, 300);
        p.rect = p.rect.offset(48, 0);
        p.disable();
        p.reset_position();
        assert_eq!(p.mode, PursuerMode::Disabled);
        assert_eq!(p.direction, None);
        assert!(!p.flee_ends.is_set());
        assert_eq!(p.rect, Rect::new(24, 24, 24, 24));
    }
}
