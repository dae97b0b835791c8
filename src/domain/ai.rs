/// Pursuer AI: direction options, chase/flee heuristics, and the return-home walk.
///
/// Chase and flee look at one axis at a time. The axis is picked by
/// `AxisPreference`; the pursuer then steps toward (chase) or away from
/// (flee) the target on that axis, falling back to a fixed order when the
/// preferred step is closed.
///
/// The return path is a depth-first greedy walk over the map topology: take
/// the open, unvisited neighbour that best closes the dominant axis gap,
/// backtrack by popping when stuck. Every tile is visited at most once, so
/// the walk ends within a bounded number of steps.

use super::geom::{Direction, Rect};
use super::maze::Maze;
use super::portal::PortalController;

pub const CHASE_FALLBACK: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Right, Direction::Down];
pub const FLEE_FALLBACK: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

/// How the chase/flee axis is chosen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AxisPreference {
    /// Compare |target_x| with |target_y| in world coordinates (the classic
    /// behaviour; ignores where the pursuer is).
    Absolute,
    /// Compare the pursuer-to-target offsets.
    Relative,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Axis {
    X,
    Y,
}

fn dominant_axis(me: (i32, i32), target: (i32, i32), pref: AxisPreference) -> Axis {
    let (ax, ay) = match pref {
        AxisPreference::Absolute => (target.0.abs(), target.1.abs()),
        AxisPreference::Relative => ((target.0 - me.0).abs(), (target.1 - me.1).abs()),
    };
    if ax >= ay { Axis::X } else { Axis::Y }
}

/// Directions whose one-step displacement hits neither a wall nor an
/// incomplete portal. Shields are ignored: pursuers pass through them.
pub fn direction_options(maze: &Maze, portals: &PortalController, rect: &Rect, step: i32) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|&d| {
            let ahead = rect.shifted(d, step);
            !maze.collides_wall(&ahead) && !portals.blocks(&ahead)
        })
        .collect()
}

fn pick(options: &[Direction], preferred: Option<Direction>, fallback: &[Direction; 4]) -> Option<Direction> {
    if let Some(d) = preferred {
        if options.contains(&d) {
            return Some(d);
        }
    }
    fallback.iter().copied().find(|d| options.contains(d))
}

/// Step toward `target` on the dominant axis.
pub fn chase_direction(options: &[Direction], me: (i32, i32), target: (i32, i32), pref: AxisPreference) -> Option<Direction> {
    let preferred = match dominant_axis(me, target, pref) {
        Axis::X if target.0 < me.0 => Some(Direction::Left),
        Axis::X if target.0 > me.0 => Some(Direction::Right),
        Axis::Y if target.1 < me.1 => Some(Direction::Up),
        Axis::Y if target.1 > me.1 => Some(Direction::Down),
        _ => None,
    };
    pick(options, preferred, &CHASE_FALLBACK)
}

/// Mirror of `chase_direction`: step away on the dominant axis.
pub fn flee_direction(options: &[Direction], me: (i32, i32), target: (i32, i32), pref: AxisPreference) -> Option<Direction> {
    let preferred = match dominant_axis(me, target, pref) {
        Axis::X if target.0 < me.0 => Some(Direction::Right),
        Axis::X if target.0 > me.0 => Some(Direction::Left),
        Axis::Y if target.1 < me.1 => Some(Direction::Down),
        Axis::Y if target.1 > me.1 => Some(Direction::Up),
        _ => None,
    };
    pick(options, preferred, &FLEE_FALLBACK)
}

/// More than two open neighbours in the map topology.
pub fn is_at_intersection(maze: &Maze, tile: (usize, usize)) -> bool {
    let (r, c) = (tile.0 as i32, tile.1 as i32);
    Direction::ALL
        .iter()
        .filter(|d| {
            let (dr, dc) = d.tile_delta();
            maze.is_open(r + dr, c + dc)
        })
        .count()
        > 2
}

/// Open neighbours ranked by remaining distance: dominant axis first
/// (rows win a tie), then the other axis. Stable, so equal keys keep
/// `Direction::ALL` order.
fn ranked_neighbors(maze: &Maze, cur: (usize, usize), target: (usize, usize)) -> Vec<(usize, usize)> {
    let (cr, cc) = (cur.0 as i32, cur.1 as i32);
    let (tr, tc) = (target.0 as i32, target.1 as i32);
    let rows_first = (tr - cr).abs() >= (tc - cc).abs();

    let mut out: Vec<(usize, usize)> = Direction::ALL
        .iter()
        .map(|d| {
            let (dr, dc) = d.tile_delta();
            (cr + dr, cc + dc)
        })
        .filter(|&(r, c)| maze.is_open(r, c))
        .map(|(r, c)| (r as usize, c as usize))
        .collect();

    out.sort_by_key(|&(r, c)| {
        let dr = (tr - r as i32).abs();
        let dc = (tc - c as i32).abs();
        if rows_first { (dr, dc) } else { (dc, dr) }
    });
    out
}

/// Tiles from `start` (exclusive) to `target` (inclusive), or `None` when
/// the walk backtracks past its origin.
pub fn find_path(maze: &Maze, start: (usize, usize), target: (usize, usize)) -> Option<Vec<(usize, usize)>> {
    if start.0 >= maze.height || start.1 >= maze.width {
        return None;
    }
    let mut visited = vec![vec![false; maze.width]; maze.height];
    visited[start.0][start.1] = true;
    let mut path: Vec<(usize, usize)> = Vec::new();
    let mut cur = start;

    while cur != target {
        let next = ranked_neighbors(maze, cur, target)
            .into_iter()
            .find(|&(r, c)| !visited[r][c]);
        match next {
            Some(n) => {
                visited[n.0][n.1] = true;
                path.push(n);
                cur = n;
            }
            None => {
                path.pop()?;
                cur = path.last().copied().unwrap_or(start);
            }
        }
    }

    Some(path)
}

/// Which way to step from `tile` to reach the adjacent `next`.
pub fn direction_from_path(tile: (usize, usize), next: (usize, usize)) -> Option<Direction> {
    if next.0 < tile.0 {
        Some(Direction::Up)
    } else if next.0 > tile.0 {
        Some(Direction::Down)
    } else if next.1 < tile.1 {
        Some(Direction::Left)
    } else if next.1 > tile.1 {
        Some(Direction::Right)
    } else {
        None
    }
}
