/// The step function: advances the world by one tick.
///
/// Playing order:
///   1. Player commands
///   2. Staggered release
///   3. Pursuer movement (portal transit, steering, flee timers, return walk)
///   4. Projectiles, then player portal transit and movement
///   5. Teleport pair
///   6. Collectibles
///   7. Player/pursuer contact
///   8. Level-clear check
///
/// The other phases only wait on their deadline. Banner and death phases
/// freeze every agent.
///
/// Pursuers decide at decision points: grid-aligned on an intersection tile,
/// or stalled (the previous update did not move them). Every open direction
/// is a candidate, the way back included.

use tracing::{debug, info, warn};

use crate::domain::ai::{self, AxisPreference};
use crate::domain::entity::{Command, Pursuer, PursuerMode};
use crate::domain::geom::{Direction, Rect};
use crate::domain::maze::{CollectibleKind, Maze};
use crate::domain::portal::{PortalController, PortalEffect};
use super::event::GameEvent;
use super::level;
use super::world::{Phase, WorldState};

pub const PELLET_POINTS: u32 = 10;
pub const BONUS_POINTS: u32 = 20;
pub const POWER_POINTS: u32 = 20;
pub const CAPTURE_POINTS: u32 = 200;

/// What stops a player move, in precedence order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Blocker {
    Wall,
    Shield,
    Portal,
}

type Policy = fn(&[Direction], (i32, i32), (i32, i32), AxisPreference) -> Option<Direction>;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, commands: &[Command]) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.anim_tick = world.anim_tick.wrapping_add(1);

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    let now = world.tick;
    match world.phase {
        Phase::LevelTransition => {
            if world.banner.fire(now) {
                world.phase = Phase::Playing;
                level::release_pursuers(world, &mut events);
            }
        }
        Phase::Playing => play(world, commands, &mut events),
        Phase::LevelClear => {
            if world.next_level_at.fire(now) {
                level::next_level(world, &mut events);
            }
        }
        Phase::Dying => {
            if world.rebuild_at.fire(now) {
                level::rebuild_maze(world, &mut events);
            }
        }
        Phase::Title | Phase::HighScores | Phase::GameOver => {}
    }

    events
}

fn play(world: &mut WorldState, commands: &[Command], events: &mut Vec<GameEvent>) {
    for &cmd in commands {
        apply_command(world, cmd, events);
    }
    if world.release.fire(world.tick) {
        level::release_next(world, events);
    }
    update_pursuers(world, events);
    update_player(world, events);
    resolve_teleports(world, events);
    resolve_eat(world, events);
    resolve_contact(world, events);
    resolve_level_clear(world, events);
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

pub fn apply_command(world: &mut WorldState, cmd: Command, events: &mut Vec<GameEvent>) {
    if !world.player.alive { return; }
    match cmd {
        Command::Face(dir) => world.player.set_facing(dir),
        Command::Release => world.player.release(),
        Command::Fire(color) => {
            if world.portals.fire(color, &world.player.rect, world.player.facing) {
                debug!(?color, facing = ?world.player.facing, "portal shot");
                events.push(GameEvent::PortalFired { color });
            }
        }
    }
}

/// Walls first, then shields, then a portal whose partner is missing.
pub fn movement_blocker(maze: &Maze, portals: &PortalController, ahead: &Rect) -> Option<Blocker> {
    if maze.collides_wall(ahead) {
        Some(Blocker::Wall)
    } else if maze.collides_shield(ahead) {
        Some(Blocker::Shield)
    } else if portals.blocks(ahead) {
        Some(Blocker::Portal)
    } else {
        None
    }
}

pub fn update_player(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for effect in world.portals.update(&mut world.maze) {
        match effect {
            PortalEffect::Opened { color, row, col } => {
                debug!(?color, row, col, "portal placed");
                events.push(GameEvent::PortalOpened { color, row, col });
            }
            PortalEffect::Fizzled { color } => {
                debug!(?color, "portal shot hit a portal");
                events.push(GameEvent::PortalFizzled { color });
            }
            PortalEffect::Lost { color } => debug!(?color, "portal shot left the maze"),
        }
    }

    if !world.player.alive { return; }

    if world.portals.check_portals(&mut world.player.rect, &world.maze) {
        events.push(GameEvent::PortalTravel);
    }

    let player = &world.player;
    let (Some(dir), true) = (player.facing, player.moving) else { return };
    let ahead = player.rect.shifted(dir, player.speed);
    if movement_blocker(&world.maze, &world.portals, &ahead).is_none() {
        world.player.rect = ahead;
        world.player.anim_tick = world.player.anim_tick.wrapping_add(1);
    }
}

fn resolve_teleports(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(pair) = world.maze.teleport else { return };

    if world.player.alive && pair.check_teleport(&mut world.player.rect) {
        events.push(GameEvent::Teleported);
    }
    // Captured pursuers follow their path over the map instead.
    for p in world.pursuers.iter_mut() {
        if matches!(p.mode, PursuerMode::Normal | PursuerMode::Flee) {
            pair.check_teleport(&mut p.rect);
        }
    }
}

pub fn resolve_eat(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive { return; }

    for kind in world.maze.take_collectibles(&world.player.rect) {
        match kind {
            CollectibleKind::Pellet => {
                world.score += PELLET_POINTS;
                events.push(GameEvent::PelletEaten);
            }
            CollectibleKind::Bonus => {
                world.score += BONUS_POINTS;
                world.items += 1;
                events.push(GameEvent::BonusEaten);
            }
            CollectibleKind::PowerPellet => {
                world.score += POWER_POINTS;
                events.push(GameEvent::PowerPelletEaten);
                begin_flee_all(world, events);
            }
        }
    }
}

/// Every Normal or Flee pursuer (re)starts its flee interval.
fn begin_flee_all(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (now, ticks) = (world.tick, world.timing.flee);
    let started = world
        .pursuers
        .iter_mut()
        .map(|p| p.begin_flee(now, ticks))
        .filter(|&fled| fled)
        .count();
    if started > 0 {
        debug!(started, "pursuers fleeing");
        events.push(GameEvent::FleeStarted);
    }
}

// ══════════════════════════════════════════════════════════════
// Pursuers
// ══════════════════════════════════════════════════════════════

pub fn update_pursuers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let now = world.tick;
    let target = world.player.rect.center();
    let pref = world.rules.axis_preference;
    let blink = world.timing.blink;
    let WorldState { maze, portals, pursuers, .. } = world;

    for p in pursuers.iter_mut() {
        match p.mode {
            PursuerMode::Disabled => continue,
            PursuerMode::Normal => {
                portals.check_portals(&mut p.rect, maze);
                steer(p, maze, portals, target, pref, ai::chase_direction);
            }
            PursuerMode::Flee => {
                portals.check_portals(&mut p.rect, maze);
                steer(p, maze, portals, target, pref, ai::flee_direction);
                if p.flee_ends.fire(now) {
                    p.end_flee();
                    events.push(GameEvent::FleeEnded { id: p.id });
                } else if p.blink_next.fire(now) {
                    p.blink = !p.blink;
                    p.blink_next.schedule(now, blink);
                }
            }
            PursuerMode::Captured => walk_home(p, maze, portals, target, pref, now, events),
        }
    }
}

fn steer(p: &mut Pursuer, maze: &Maze, portals: &PortalController, target: (i32, i32), pref: AxisPreference, policy: Policy) {
    let options = ai::direction_options(maze, portals, &p.rect, p.speed);

    if p.stalled || at_decision_point(maze, &p.rect) {
        p.direction = policy(&options, p.rect.center(), target, pref);
    }
    let before = p.rect;
    if let Some(dir) = p.direction {
        if options.contains(&dir) {
            p.rect = p.rect.shifted(dir, p.speed);
        }
    }
    p.stalled = p.rect == before;
}

/// Top-left exactly on the origin of an intersection tile.
fn at_decision_point(maze: &Maze, rect: &Rect) -> bool {
    let (row, col) = maze.world_to_tile(rect.x, rect.y);
    if !maze.in_grid(row, col) || maze.tile_to_world(row, col) != (rect.x, rect.y) {
        return false;
    }
    ai::is_at_intersection(maze, (row as usize, col as usize))
}

fn walk_home(
    p: &mut Pursuer,
    maze: &Maze,
    portals: &PortalController,
    target: (i32, i32),
    pref: AxisPreference,
    now: u64,
    events: &mut Vec<GameEvent>,
) {
    if !p.return_grace.due(now) { return; }

    let Some(&next) = p.return_path.front() else {
        return_to_normal(p, maze, portals, target, pref, events);
        return;
    };

    let (tx, ty) = maze.tile_to_world(next.0 as i32, next.1 as i32);
    let (row, col) = maze.world_to_tile(p.rect.x, p.rect.y);
    if let Some(dir) = ai::direction_from_path(maze.clamp_tile(row, col), next) {
        p.direction = Some(dir);
    }

    // One axis per update. The lane across the step is closed first so the
    // body never clips a corner.
    let s = p.speed.max(1);
    let (dx, dy) = (tx - p.rect.x, ty - p.rect.y);
    let vertical_step = matches!(p.direction, Some(Direction::Up | Direction::Down));
    p.rect = if dx != 0 && (vertical_step || dy == 0) {
        p.rect.offset(dx.clamp(-s, s), 0)
    } else {
        p.rect.offset(0, dy.clamp(-s, s))
    };

    if (p.rect.x, p.rect.y) == (tx, ty) {
        p.return_path.pop_front();
        if p.return_path.is_empty() {
            return_to_normal(p, maze, portals, target, pref, events);
        }
    }
}

fn return_to_normal(
    p: &mut Pursuer,
    maze: &Maze,
    portals: &PortalController,
    target: (i32, i32),
    pref: AxisPreference,
    events: &mut Vec<GameEvent>,
) {
    p.finish_return();
    let options = ai::direction_options(maze, portals, &p.rect, p.speed);
    p.direction = ai::chase_direction(&options, p.rect.center(), target, pref);
    debug!(id = p.id, kind = p.kind.name(), "pursuer back home");
    events.push(GameEvent::PursuerHome { id: p.id });
}

// ══════════════════════════════════════════════════════════════
// Contact, death, level clear
// ══════════════════════════════════════════════════════════════

/// Pursuers in identity order: a fleeing one is captured, the first normal
/// one kills the player and ends resolution.
pub fn resolve_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive { return; }

    for i in 0..world.pursuers.len() {
        if !world.pursuers[i].rect.overlaps(&world.player.rect) { continue; }
        match world.pursuers[i].mode {
            PursuerMode::Flee => capture_pursuer(world, i, events),
            PursuerMode::Normal => {
                kill_player(world, events);
                return;
            }
            PursuerMode::Captured | PursuerMode::Disabled => {}
        }
    }
}

fn capture_pursuer(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let maze = &world.maze;
    let p = &world.pursuers[i];
    let (row, col) = maze.world_to_tile(p.rect.x, p.rect.y);
    let start = maze.clamp_tile(row, col);

    let path = match ai::find_path(maze, start, p.home) {
        Some(path) => path,
        None => {
            warn!(id = p.id, ?start, home = ?p.home, "no return path; resuming chase after the grace delay");
            Vec::new()
        }
    };

    let (now, grace) = (world.tick, world.timing.return_delay);
    let p = &mut world.pursuers[i];
    debug!(id = p.id, kind = p.kind.name(), steps = path.len(), "pursuer captured");
    p.capture(path, now, grace);
    world.score += CAPTURE_POINTS;
    events.push(GameEvent::PursuerCaptured { id: p.id });
}

pub fn kill_player(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let now = world.tick;
    world.lives = world.lives.saturating_sub(1);
    world.portals.clear_portals(&mut world.maze);
    world.player.die(now);
    for p in &mut world.pursuers {
        p.disable();
    }
    world.release.clear();
    world.release_queue.clear();
    info!(lives = world.lives, level = world.level, score = world.score, "player killed");
    events.push(GameEvent::PlayerKilled);

    if world.lives == 0 {
        level::end_session(world, events);
    } else {
        world.phase = Phase::Dying;
        world.rebuild_at.schedule(now, world.timing.death_delay);
    }
}

pub fn resolve_level_clear(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing || world.maze.collectibles_remaining() { return; }
    world.phase = Phase::LevelClear;
    world.next_level_at.schedule(world.tick, world.timing.clear_delay);
    info!(level = world.level, score = world.score, "level cleared");
    events.push(GameEvent::LevelCleared);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::portal::{PortalColor, PortalState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world_from(rows: &[&str]) -> WorldState {
        let mut cfg = GameConfig::default();
        cfg.rules.bonus_chance_percent = 0;
        let maze = Maze::parse(&rows.join("\n"), cfg.layout).unwrap();
        let mut w = WorldState::new(maze, &cfg, StdRng::seed_from_u64(7));
        level::start_session(&mut w, &mut Vec::new());
        w
    }

    /// Step through the banner into play.
    fn playing(rows: &[&str]) -> WorldState {
        let mut w = world_from(rows);
        for _ in 0..10_000 {
            if w.phase == Phase::Playing { return w; }
            step(&mut w, &[]);
        }
        panic!("banner never ended");
    }

    fn run(w: &mut WorldState, ticks: u64) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| step(w, &[])).collect()
    }

    /// Sealed pen below the player's corridor.
    const SPLIT: [&str; 5] = [
        "xxxxxxxxxx",
        "x@  o  * x",
        "xxxxxxxxxx",
        "xg g g   x",
        "xxxxxxxxxx",
    ];

    #[test]
    fn last_pellet_clears_the_level_once() {
        let mut w = playing(&["xxxxx", "xo *x", "xxxxx"]);
        w.player.rect = w.maze.tile_rect(1, 3);
        let events = step(&mut w, &[]);
        assert_eq!(w.score, PELLET_POINTS);
        assert_eq!(events, vec![GameEvent::PelletEaten, GameEvent::LevelCleared]);
        assert_eq!(w.phase, Phase::LevelClear);

        let wait = w.timing.clear_delay + 50;
        let events = run(&mut w, wait);
        assert_eq!(w.level, 2);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::LevelStarted { .. })).count(), 1);
        assert!(!events.contains(&GameEvent::LevelCleared));
        assert_eq!(w.phase, Phase::LevelTransition);
        assert!(w.maze.collectibles_remaining());
    }

    #[test]
    fn banner_releases_the_leader_then_the_rest() {
        let mut w = world_from(&[
            "xxxxxxxxxx",
            "x  o   * x",
            "xxxxxxxxxx",
            "xg gg  g x",
            "xxxxxxxxxx",
        ]);
        let banner = w.timing.banner;
        let events = run(&mut w, banner);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(events, vec![GameEvent::PursuerReleased { id: 3 }]);
        assert!(w.pursuers[3].is_enabled());
        assert!(!w.pursuers[0].is_enabled());

        let interval = w.timing.release_interval;
        let events = run(&mut w, interval);
        assert!(events.contains(&GameEvent::PursuerReleased { id: 0 }));
        assert!(!w.pursuers[1].is_enabled());
    }

    #[test]
    fn blocker_precedence_wall_shield_portal() {
        let w = world_from(&["xxxxx", "xos x", "xxxxx"]);
        let shield = w.maze.tile_rect(1, 2);
        assert_eq!(movement_blocker(&w.maze, &w.portals, &shield), Some(Blocker::Shield));
        assert_eq!(movement_blocker(&w.maze, &w.portals, &shield.offset(0, -3)), Some(Blocker::Wall));
        assert_eq!(movement_blocker(&w.maze, &w.portals, &w.maze.tile_rect(1, 1)), None);

        let mut w = playing(&["xxxxx", "xo *x", "xxxxx"]);
        w.player.set_facing(Direction::Right);
        w.player.release();
        apply_command(&mut w, Command::Fire(PortalColor::Blue), &mut Vec::new());
        for _ in 0..10 {
            w.portals.update(&mut w.maze);
        }
        let ahead = w.maze.tile_rect(1, 3).offset(2, 0);
        assert_eq!(movement_blocker(&w.maze, &w.portals, &ahead), Some(Blocker::Portal));
    }

    #[test]
    fn player_walks_until_released_and_stops_at_walls() {
        let mut w = playing(&["xxxxxxx", "xo   *x", "xxxxxxx"]);
        let start = w.player.rect;
        step(&mut w, &[Command::Face(Direction::Right)]);
        assert_eq!(w.player.rect, start.offset(3, 0));
        step(&mut w, &[Command::Release]);
        assert_eq!(w.player.rect, start.offset(3, 0));
        assert_eq!(w.player.facing, Some(Direction::Right));

        step(&mut w, &[Command::Face(Direction::Up)]);
        assert_eq!(w.player.rect, start.offset(3, 0));
        step(&mut w, &[Command::Face(Direction::Left)]);
        step(&mut w, &[]);
        assert_eq!(w.player.rect, start);
    }

    #[test]
    fn power_pellet_scares_only_active_pursuers() {
        let mut w = playing(&SPLIT);
        w.pursuers[1].enable(None);
        w.pursuers[1].capture(Vec::new(), w.tick, 1000);
        assert!(!w.pursuers[2].is_enabled());

        w.player.rect = w.maze.tile_rect(1, 1);
        let events = step(&mut w, &[]);
        assert_eq!(w.score, POWER_POINTS);
        assert!(events.contains(&GameEvent::FleeStarted));
        assert_eq!(w.pursuers[0].mode, PursuerMode::Flee);
        assert_eq!(w.pursuers[1].mode, PursuerMode::Captured);
        assert_eq!(w.pursuers[2].mode, PursuerMode::Disabled);
    }

    #[test]
    fn flee_blinks_then_expires() {
        let mut w = playing(&SPLIT);
        w.player.rect = w.maze.tile_rect(1, 1);
        step(&mut w, &[]);
        assert_eq!(w.pursuers[0].mode, PursuerMode::Flee);

        let half = w.timing.flee / 2;
        run(&mut w, half);
        assert!(w.pursuers[0].blink);

        let rest = w.timing.flee - half;
        let events = run(&mut w, rest);
        assert!(events.contains(&GameEvent::FleeEnded { id: 0 }));
        assert_eq!(w.pursuers[0].mode, PursuerMode::Normal);
        assert!(!w.pursuers[0].blink);
    }

    fn fleeing_pursuer_on_player() -> WorldState {
        let mut w = playing(&[
            "xxxxxxxx",
            "xo  g *x",
            "xxxxxxxx",
        ]);
        let now = w.tick;
        w.pursuers[0].begin_flee(now, 300);
        w.pursuers[0].rect = w.player.rect;
        w
    }

    #[test]
    fn touching_a_fleeing_pursuer_captures_it() {
        let mut w = fleeing_pursuer_on_player();
        let events = step(&mut w, &[]);
        assert_eq!(w.score, CAPTURE_POINTS);
        assert_eq!(w.pursuers[0].mode, PursuerMode::Captured);
        assert!(events.contains(&GameEvent::PursuerCaptured { id: 0 }));
        assert!(w.player.alive);
        assert_eq!(w.pursuers[0].return_path.back(), Some(&(1, 4)));
        assert!(w.pursuers[0].showing_marker(w.tick));
    }

    #[test]
    fn exhausted_return_path_resumes_normal_at_home() {
        let mut w = fleeing_pursuer_on_player();
        step(&mut w, &[]);
        let mut home_events = 0;
        for _ in 0..500 {
            if w.pursuers[0].mode != PursuerMode::Captured { break; }
            home_events += step(&mut w, &[])
                .iter()
                .filter(|e| matches!(e, GameEvent::PursuerHome { .. }))
                .count();
        }
        assert_eq!(w.pursuers[0].mode, PursuerMode::Normal);
        assert_eq!(home_events, 1);
        assert_eq!(w.pursuers[0].rect, w.maze.tile_rect(1, 4));
        assert!(w.pursuers[0].return_path.is_empty());
    }

    fn normal_pursuer_on_player(lives: u32) -> WorldState {
        let mut w = playing(&[
            "xxxxxxxx",
            "xo  g *x",
            "xxxxxxxx",
        ]);
        w.lives = lives;
        w.score = 120;
        w.pursuers[0].rect = w.player.rect;
        w
    }

    #[test]
    fn losing_the_last_life_ends_the_session_without_rebuild() {
        let mut w = normal_pursuer_on_player(1);
        let generation = w.maze.generation;
        let events = step(&mut w, &[]);

        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(w.lives, 0);
        assert_eq!(w.maze.generation, generation);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(events.contains(&GameEvent::SessionEnded { score: 120, rank: Some(0) }));
        assert_eq!(w.high_scores.scores(), &[120]);

        let wait = w.timing.death_delay + 10;
        run(&mut w, wait);
        assert_eq!(w.maze.generation, generation);
        assert_eq!(w.phase, Phase::GameOver);
    }

    #[test]
    fn losing_a_spare_life_rebuilds_after_the_delay() {
        let mut w = normal_pursuer_on_player(3);
        let generation = w.maze.generation;
        step(&mut w, &[]);
        assert_eq!(w.phase, Phase::Dying);
        assert_eq!(w.lives, 2);
        assert!(!w.player.alive);
        assert!(w.pursuers.iter().all(|p| !p.is_enabled()));

        let delay = w.timing.death_delay;
        run(&mut w, delay - 1);
        assert_eq!(w.maze.generation, generation);
        let events = run(&mut w, 1);
        assert_eq!(events, vec![GameEvent::LevelStarted { level: 1 }]);
        assert_eq!(w.maze.generation, generation + 1);
        assert!(w.player.alive);
        assert_eq!(w.player.rect, w.maze.tile_rect(1, 1));
        assert_eq!(w.pursuers[0].rect, w.maze.tile_rect(1, 4));
    }

    #[test]
    fn captured_pursuers_do_not_hurt() {
        let mut w = normal_pursuer_on_player(3);
        let now = w.tick;
        w.pursuers[0].capture(Vec::new(), now, 1000);
        step(&mut w, &[]);
        assert!(w.player.alive);
        assert_eq!(w.phase, Phase::Playing);
    }

    /// Put pursuer 0 at `rect` heading `dir`, choosing by pursuer-to-player offsets.
    fn aim(w: &mut WorldState, rect: Rect, dir: Direction) {
        w.rules.axis_preference = AxisPreference::Relative;
        let p = &mut w.pursuers[0];
        p.rect = rect;
        p.direction = Some(dir);
        p.stalled = false;
    }

    /// Fire `color` from `from` toward `dir` and fly the shot until it lands.
    fn place_portal(w: &mut WorldState, color: PortalColor, from: (usize, usize), dir: Direction) {
        let src = w.maze.tile_rect(from.0, from.1);
        assert!(w.portals.fire(color, &src, Some(dir)));
        for _ in 0..40 {
            w.portals.update(&mut w.maze);
            if w.portals.state(color) == PortalState::Placed { return; }
        }
        panic!("{color:?} portal never landed");
    }

    #[test]
    fn pursuer_between_tiles_keeps_its_heading() {
        let mut w = playing(&[
            "xxxxxxxxx",
            "x   o   x",
            "x       x",
            "x   g * x",
            "xxxxxxxxx",
        ]);
        // The player is straight above: a fresh decision would turn Up.
        let start = w.maze.tile_rect(3, 4).offset(2, 0);
        aim(&mut w, start, Direction::Right);
        let speed = w.pursuers[0].speed;

        run(&mut w, 2);
        assert_eq!(w.pursuers[0].direction, Some(Direction::Right));
        assert_eq!(w.pursuers[0].rect, start.offset(2 * speed, 0));
        assert!(!w.pursuers[0].stalled);
    }

    #[test]
    fn pursuer_turns_back_at_an_intersection_toward_the_player() {
        let mut w = playing(&[
            "xxxxxxxxx",
            "x       x",
            "x       x",
            "xo  g * x",
            "xxxxxxxxx",
        ]);
        let start = w.maze.tile_rect(3, 4);
        aim(&mut w, start, Direction::Right);
        let speed = w.pursuers[0].speed;

        step(&mut w, &[]);
        assert_eq!(w.pursuers[0].direction, Some(Direction::Left));
        assert_eq!(w.pursuers[0].rect, start.offset(-speed, 0));
    }

    #[test]
    fn blocked_pursuer_decides_again_on_the_next_update() {
        let mut w = playing(&[
            "xxxxxxx",
            "xg  o*x",
            "xxxxxxx",
        ]);
        let start = w.maze.tile_rect(1, 1);
        aim(&mut w, start, Direction::Left);
        let speed = w.pursuers[0].speed;

        step(&mut w, &[]);
        assert_eq!(w.pursuers[0].rect, start);
        assert_eq!(w.pursuers[0].direction, Some(Direction::Left));
        assert!(w.pursuers[0].stalled);

        step(&mut w, &[]);
        assert_eq!(w.pursuers[0].direction, Some(Direction::Right));
        assert_eq!(w.pursuers[0].rect, start.offset(speed, 0));
    }

    const PORTAL_ROOMS: [&str; 5] = [
        "xxxxxxxxx",
        "x   o   x",
        "xxxxxxxxx",
        "xg    * x",
        "xxxxxxxxx",
    ];

    #[test]
    fn pursuer_rides_a_complete_portal_pair() {
        let mut w = playing(&PORTAL_ROOMS);
        place_portal(&mut w, PortalColor::Blue, (3, 2), Direction::Left);
        place_portal(&mut w, PortalColor::Orange, (1, 2), Direction::Up);
        let start = w.maze.tile_rect(3, 1);
        aim(&mut w, start, Direction::Left);

        let mut crossed = false;
        for _ in 0..20 {
            step(&mut w, &[]);
            let (cx, cy) = w.pursuers[0].rect.center();
            if w.maze.world_to_tile(cx, cy).0 == 1 {
                crossed = true;
                break;
            }
        }
        assert!(crossed, "pursuer never came out of the orange portal");
        assert_eq!(w.pursuers[0].mode, PursuerMode::Normal);
    }

    #[test]
    fn lone_portal_stops_a_pursuer_like_a_wall() {
        let mut w = playing(&PORTAL_ROOMS);
        place_portal(&mut w, PortalColor::Blue, (3, 2), Direction::Left);
        let start = w.maze.tile_rect(3, 1);
        aim(&mut w, start, Direction::Left);

        for _ in 0..10 {
            step(&mut w, &[]);
            let p = &w.pursuers[0];
            assert!(!w.portals.collides(&p.rect));
            assert!(p.rect.x >= start.x);
            assert_eq!(p.rect.y, start.y);
        }
        assert_eq!(w.pursuers[0].direction, Some(Direction::Right));
    }

    #[test]
    fn captured_pursuer_walks_home_one_axis_at_a_time() {
        let mut w = playing(&[
            "xxxxxxx",
            "xg    x",
            "x xxxxx",
            "x   o*x",
            "xxxxxxx",
        ]);
        // Straddling (3,1) and (3,2); the way home is straight up from (3,1).
        w.pursuers[0].rect = w.maze.tile_rect(3, 1).offset(10, 0);
        let path = ai::find_path(&w.maze, (3, 1), (1, 1)).unwrap();
        let now = w.tick;
        w.pursuers[0].capture(path, now, 0);

        for _ in 0..200 {
            if w.pursuers[0].mode != PursuerMode::Captured { break; }
            let before = w.pursuers[0].rect;
            step(&mut w, &[]);
            let after = w.pursuers[0].rect;
            assert!(before.x == after.x || before.y == after.y, "{before:?} -> {after:?}");
            assert!(!w.maze.collides_wall(&after), "{after:?}");
        }
        assert_eq!(w.pursuers[0].mode, PursuerMode::Normal);
        assert_eq!(w.pursuers[0].rect.center(), w.maze.tile_center(1, 1));
    }

    #[test]
    fn teleport_carries_the_player_through_the_tunnel() {
        let mut w = playing(&["t o *  t"]);
        w.player.rect = w.maze.tile_rect(0, 1);
        let events = step(&mut w, &[Command::Face(Direction::Left)]);
        assert!(events.contains(&GameEvent::Teleported));
        assert_eq!(w.player.rect, w.maze.tile_rect(0, 6));
    }
}
