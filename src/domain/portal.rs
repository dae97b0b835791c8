/// Player-fired portals.
///
/// Each colour runs its own small state machine:
///
///   Unfired ──fire──▶ InFlight ──hits wall──▶ Placed
///      ▲                 │                      │
///      └─ hits a portal / leaves the maze       └─ clear_portals
///
/// A placed portal sits on a wall tile that has been taken out of the maze's
/// wall layer. Placing a new portal of the same colour restores the old tile.
/// While only one colour is placed the portal behaves like a wall; once both
/// are placed, touching one carries the body out the other.

use super::geom::{Direction, Rect};
use super::maze::Maze;

pub const PROJECTILE_SIZE: i32 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PortalColor {
    Blue,
    Orange,
}

impl PortalColor {
    pub const ALL: [PortalColor; 2] = [PortalColor::Blue, PortalColor::Orange];

    pub fn other(self) -> PortalColor {
        match self {
            PortalColor::Blue => PortalColor::Orange,
            PortalColor::Orange => PortalColor::Blue,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortalState {
    Unfired,
    InFlight,
    Placed,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub color: PortalColor,
    pub rect: Rect,
    pub direction: Direction,
    pub speed: i32,
}

impl Projectile {
    /// Spawn at the shooter's centre, pushed half a body forward.
    pub fn launch(color: PortalColor, source: &Rect, direction: Direction, speed: i32) -> Self {
        let (cx, cy) = source.center();
        let (dx, dy) = direction.delta();
        let rect = Rect::centered(
            cx + dx * source.w / 2,
            cy + dy * source.h / 2,
            PROJECTILE_SIZE,
            PROJECTILE_SIZE,
        );
        Projectile { color, rect, direction, speed }
    }

    fn advance(&mut self) {
        self.rect = self.rect.shifted(self.direction, self.speed);
    }
}

#[derive(Clone, Debug)]
pub struct Portal {
    pub color: PortalColor,
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
    /// Wall normal: the opposite of the direction the projectile travelled.
    pub exit: Direction,
}

/// What happened to projectiles during one `update()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalEffect {
    Opened { color: PortalColor, row: usize, col: usize },
    /// Ran into a placed portal.
    Fizzled { color: PortalColor },
    /// Left the maze.
    Lost { color: PortalColor },
}

#[derive(Clone, Debug, Default)]
struct Slot {
    projectile: Option<Projectile>,
    placed: Option<Portal>,
}

#[derive(Clone, Debug)]
pub struct PortalController {
    blue: Slot,
    orange: Slot,
    projectile_speed: i32,
}

impl PortalController {
    pub fn new(projectile_speed: i32) -> Self {
        PortalController {
            blue: Slot::default(),
            orange: Slot::default(),
            projectile_speed,
        }
    }

    fn slot(&self, color: PortalColor) -> &Slot {
        match color {
            PortalColor::Blue => &self.blue,
            PortalColor::Orange => &self.orange,
        }
    }

    fn slot_mut(&mut self, color: PortalColor) -> &mut Slot {
        match color {
            PortalColor::Blue => &mut self.blue,
            PortalColor::Orange => &mut self.orange,
        }
    }

    /// An in-flight shot takes precedence over an older placed portal.
    pub fn state(&self, color: PortalColor) -> PortalState {
        let slot = self.slot(color);
        if slot.projectile.is_some() {
            PortalState::InFlight
        } else if slot.placed.is_some() {
            PortalState::Placed
        } else {
            PortalState::Unfired
        }
    }

    pub fn placed(&self, color: PortalColor) -> Option<&Portal> {
        self.slot(color).placed.as_ref()
    }

    pub fn portals(&self) -> impl Iterator<Item = &Portal> {
        self.blue.placed.iter().chain(self.orange.placed.iter())
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.blue.projectile.iter().chain(self.orange.projectile.iter())
    }

    /// Launch a shot of `color` toward `facing`. No facing, no shot.
    /// A new shot replaces one of the same colour still in flight.
    pub fn fire(&mut self, color: PortalColor, source: &Rect, facing: Option<Direction>) -> bool {
        let Some(dir) = facing else {
            return false;
        };
        let shot = Projectile::launch(color, source, dir, self.projectile_speed);
        self.slot_mut(color).projectile = Some(shot);
        true
    }

    /// Advance projectiles one tick and resolve their impacts.
    pub fn update(&mut self, maze: &mut Maze) -> Vec<PortalEffect> {
        let mut effects = Vec::new();

        for color in PortalColor::ALL {
            let Some(mut shot) = self.slot_mut(color).projectile.take() else {
                continue;
            };
            shot.advance();

            if self.collides(&shot.rect) {
                effects.push(PortalEffect::Fizzled { color });
                continue;
            }

            if let Some((row, col)) = maze.wall_hit(&shot.rect) {
                maze.remove_wall(row, col);
                let portal = Portal {
                    color,
                    row,
                    col,
                    rect: maze.tile_rect(row, col),
                    exit: shot.direction.opposite(),
                };
                if let Some(old) = self.slot_mut(color).placed.replace(portal) {
                    if (old.row, old.col) != (row, col) {
                        maze.restore_wall(old.row, old.col);
                    }
                }
                effects.push(PortalEffect::Opened { color, row, col });
                continue;
            }

            if !shot.rect.overlaps(&maze.bounds()) {
                effects.push(PortalEffect::Lost { color });
                continue;
            }

            self.slot_mut(color).projectile = Some(shot);
        }

        effects
    }

    pub fn portables_usable(&self) -> bool {
        self.blue.placed.is_some() && self.orange.placed.is_some()
    }

    /// Does `rect` touch any placed portal?
    pub fn collides(&self, rect: &Rect) -> bool {
        self.portals().any(|p| p.rect.overlaps(rect))
    }

    /// An incomplete pair is solid.
    pub fn blocks(&self, rect: &Rect) -> bool {
        !self.portables_usable() && self.collides(rect)
    }

    /// Carry a body touching one portal to the tile beside the other, one
    /// tile along that portal's exit direction. Only with a complete pair.
    pub fn check_portals(&self, body: &mut Rect, maze: &Maze) -> bool {
        let (Some(blue), Some(orange)) = (&self.blue.placed, &self.orange.placed) else {
            return false;
        };
        let target = if body.overlaps(&blue.rect) {
            orange
        } else if body.overlaps(&orange.rect) {
            blue
        } else {
            return false;
        };
        let (dr, dc) = target.exit.tile_delta();
        let (x, y) = maze.tile_to_world(target.row as i32 + dr, target.col as i32 + dc);
        body.x = x;
        body.y = y;
        true
    }

    /// Drop both portals and any shots, restoring the wall tiles.
    pub fn clear_portals(&mut self, maze: &mut Maze) {
        for color in PortalColor::ALL {
            let slot = self.slot_mut(color);
            slot.projectile = None;
            if let Some(old) = slot.placed.take() {
                maze.restore_wall(old.row, old.col);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::maze::tests::maze_from;

    fn corridor() -> Maze {
        maze_from(&[
            "xxxxxxx",
            "x  o  x",
            "xxxxxxx",
        ])
    }

    /// Fire and tick until the shot resolves.
    fn shoot(pc: &mut PortalController, maze: &mut Maze, color: PortalColor, from: (usize, usize), dir: Direction) -> Vec<PortalEffect> {
        let src = maze.tile_rect(from.0, from.1);
        assert!(pc.fire(color, &src, Some(dir)));
        assert_eq!(pc.state(color), PortalState::InFlight);
        for _ in 0..40 {
            let fx = pc.update(maze);
            if !fx.is_empty() {
                return fx;
            }
        }
        panic!("projectile never resolved");
    }

    #[test]
    fn no_facing_is_a_no_op() {
        let m = corridor();
        let mut pc = PortalController::new(10);
        assert!(!pc.fire(PortalColor::Blue, &m.tile_rect(1, 3), None));
        assert_eq!(pc.state(PortalColor::Blue), PortalState::Unfired);
    }

    #[test]
    fn wall_hit_places_portal_facing_back() {
        let mut m = corridor();
        let mut pc = PortalController::new(10);
        let fx = shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Left);
        assert_eq!(fx, vec![PortalEffect::Opened { color: PortalColor::Blue, row: 1, col: 0 }]);
        assert_eq!(pc.state(PortalColor::Blue), PortalState::Placed);
        let p = pc.placed(PortalColor::Blue).unwrap();
        assert_eq!(p.exit, Direction::Right);
        assert!(m.is_walkable(1, 0));
    }

    #[test]
    fn same_colour_twice_restores_the_first_wall() {
        let mut m = corridor();
        let mut pc = PortalController::new(10);
        shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Left);
        shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Right);
        assert_eq!(pc.portals().count(), 1);
        let p = pc.placed(PortalColor::Blue).unwrap();
        assert_eq!((p.row, p.col), (1, 6));
        assert!(!m.is_walkable(1, 0));
        assert!(m.is_walkable(1, 6));
    }

    #[test]
    fn incomplete_pair_blocks_complete_pair_warps() {
        let mut m = corridor();
        let mut pc = PortalController::new(10);
        shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Left);

        let mut body = m.tile_rect(1, 1).offset(-2, 0);
        assert!(!pc.portables_usable());
        assert!(pc.blocks(&body));
        assert!(!pc.check_portals(&mut body, &m));
        assert_eq!(body, m.tile_rect(1, 1).offset(-2, 0));

        shoot(&mut pc, &mut m, PortalColor::Orange, (1, 3), Direction::Right);
        assert!(pc.portables_usable());
        assert!(!pc.blocks(&body));
        assert!(pc.check_portals(&mut body, &m));
        // Orange sits on (1,6) facing left: land on (1,5).
        assert_eq!(body, m.tile_rect(1, 5));
        assert!(!pc.check_portals(&mut body, &m));
    }

    #[test]
    fn shot_into_a_portal_fizzles() {
        let mut m = corridor();
        let mut pc = PortalController::new(10);
        shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Left);
        let fx = shoot(&mut pc, &mut m, PortalColor::Orange, (1, 3), Direction::Left);
        assert_eq!(fx, vec![PortalEffect::Fizzled { color: PortalColor::Orange }]);
        assert_eq!(pc.state(PortalColor::Orange), PortalState::Unfired);
        assert_eq!(pc.state(PortalColor::Blue), PortalState::Placed);
    }

    #[test]
    fn shot_leaving_the_maze_is_lost() {
        let mut m = maze_from(&["o   "]);
        let mut pc = PortalController::new(10);
        let fx = shoot(&mut pc, &mut m, PortalColor::Orange, (0, 0), Direction::Right);
        assert_eq!(fx, vec![PortalEffect::Lost { color: PortalColor::Orange }]);
        assert_eq!(pc.state(PortalColor::Orange), PortalState::Unfired);
    }

    #[test]
    fn clear_restores_both_walls() {
        let mut m = corridor();
        let mut pc = PortalController::new(10);
        shoot(&mut pc, &mut m, PortalColor::Blue, (1, 3), Direction::Left);
        shoot(&mut pc, &mut m, PortalColor::Orange, (1, 3), Direction::Right);
        pc.clear_portals(&mut m);
        assert_eq!(pc.portals().count(), 0);
        assert!(!m.is_walkable(1, 0));
        assert!(!m.is_walkable(1, 6));
        assert_eq!(pc.state(PortalColor::Blue), PortalState::Unfired);
    }
}
