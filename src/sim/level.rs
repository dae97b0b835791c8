/// Maze loading and the session/level lifecycle.
///
/// ## Maze file (`maze.txt`):
///   One text row per maze row, one character per tile.
///
/// ## Tile legend:
///   'x' = Wall                   ' ' = Floor
///   '*' = Pellet                 '@' = Power pellet
///   's' = Shield (player-only)   'o' = Player spawn
///   'g' = Pursuer spawn          't' = Teleport endpoint
///
/// ## Lifecycle:
///   start_session → rebuild_maze → banner → Playing
///   level cleared → next_level → rebuild_maze → banner
///   player killed → (lives left) rebuild_maze after the death delay
///                 → (no lives)   end_session → Game Over

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::ai;
use crate::domain::entity::{Pursuer, PursuerKind};
use crate::domain::maze::Maze;
use crate::error::GameError;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Read and parse the configured maze file. Failure here is fatal.
pub fn load_maze(config: &GameConfig) -> Result<Maze, GameError> {
    let path = &config.maze_file;
    if !path.is_file() {
        return Err(GameError::MazeNotFound(path.clone()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| GameError::Io {
        path: path.clone(),
        source,
    })?;
    let maze = Maze::parse(&text, config.layout)?;
    info!(
        path = %path.display(),
        width = maze.width,
        height = maze.height,
        pursuers = maze.pursuer_spawns.len(),
        teleport = maze.teleport.is_some(),
        "maze loaded"
    );
    Ok(maze)
}

/// One pursuer per spawn tile, identities cycling in file order.
pub fn spawn_pursuers(maze: &Maze, speed: i32) -> Vec<Pursuer> {
    let mut pursuers: Vec<Pursuer> = maze
        .pursuer_spawns
        .iter()
        .enumerate()
        .map(|(id, &(r, c))| {
            let kind = PursuerKind::CYCLE[id % PursuerKind::CYCLE.len()];
            Pursuer::new(id, kind, (r, c), maze.tile_rect(r, c), speed)
        })
        .collect();

    let leader = pursuers
        .iter()
        .position(|p| p.kind == PursuerKind::Blinky)
        .unwrap_or(0);
    if let Some(p) = pursuers.get_mut(leader) {
        p.leader = true;
    }
    pursuers
}

// ══════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════

/// Fresh session: counters reset, speed boost off, maze rebuilt.
pub fn start_session(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.score = 0;
    world.level = 1;
    world.lives = world.rules.lives;
    world.items = 0;
    world.boosted = false;
    world.last_rank = None;
    info!(lives = world.lives, "session started");
    rebuild_maze(world, events);
}

/// Record the score and go to Game Over.
pub fn end_session(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    clear_schedule(world);
    for p in &mut world.pursuers {
        p.disable();
    }
    let rank = world.high_scores.insert(world.score);
    world.last_rank = rank;
    world.phase = Phase::GameOver;
    info!(score = world.score, level = world.level, ?rank, "session ended");
    events.push(GameEvent::SessionEnded { score: world.score, rank });
}

// ══════════════════════════════════════════════════════════════
// Levels
// ══════════════════════════════════════════════════════════════

/// Reset the maze and every agent, then show the level banner.
/// With no lives left this ends the session instead.
pub fn rebuild_maze(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.lives == 0 {
        end_session(world, events);
        return;
    }

    world.portals.clear_portals(&mut world.maze);
    world.maze.build(&mut world.rng, world.rules.bonus_chance_percent);

    let speed = world.pursuer_speed();
    for p in &mut world.pursuers {
        p.disable();
        p.reset_position();
        p.speed = speed;
    }
    world.player.revive();
    world.player.reset_position();

    begin_banner(world, events);
}

/// Level cleared: advance the counter, maybe speed the pursuers up, rebuild.
pub fn next_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.portals.clear_portals(&mut world.maze);
    world.level += 1;
    if world.level > world.speed.boost_after_level && !world.boosted {
        world.boosted = true;
        info!(level = world.level, speed = world.speed.pursuer_boosted, "pursuers sped up");
    }
    rebuild_maze(world, events);
}

fn begin_banner(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    clear_schedule(world);
    world.phase = Phase::LevelTransition;
    world.banner.schedule(world.tick, world.timing.banner);
    info!(level = world.level, "level start");
    events.push(GameEvent::LevelStarted { level: world.level });
}

fn clear_schedule(world: &mut WorldState) {
    world.banner.clear();
    world.release.clear();
    world.release_queue.clear();
    world.rebuild_at.clear();
    world.next_level_at.clear();
}

// ══════════════════════════════════════════════════════════════
// Release
// ══════════════════════════════════════════════════════════════

/// Banner over: the leader comes out at once, the rest queue up.
pub fn release_pursuers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.release_queue.clear();
    let leader = world.leader();
    if let Some(i) = leader {
        enable_pursuer(world, i, events);
    }
    world.release_queue = (0..world.pursuers.len()).filter(|&i| Some(i) != leader).collect();
    if !world.release_queue.is_empty() {
        world.release.schedule(world.tick, world.timing.release_interval);
    }
}

/// Release the next queued pursuer and re-arm the timer while any remain.
pub fn release_next(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if let Some(i) = world.release_queue.pop_front() {
        enable_pursuer(world, i, events);
    }
    if !world.release_queue.is_empty() {
        world.release.schedule(world.tick, world.timing.release_interval);
    }
}

fn enable_pursuer(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    let Some(p) = world.pursuers.get(i) else { return };
    let options = ai::direction_options(&world.maze, &world.portals, &p.rect, p.speed);
    let first = options.first().copied();

    let p = &mut world.pursuers[i];
    p.enable(first);
    debug!(id = p.id, kind = p.kind.name(), direction = ?first, "pursuer released");
    events.push(GameEvent::PursuerReleased { id: p.id });
}
