/// Tile map: maze topology, the live wall/shield layers, and collectibles.
///
/// Layers:
///   base_tiles   what the map file says (immutable after parse)
///   walls        effective wall layer; portals punch holes in it
///   shields      effective shield layer
///   collectibles arena of pellets/bonus/power items, `None` = eaten
///
/// Positions are world pixels; the maze's top-left corner sits at a fixed
/// offset and every tile is the same square size.

use rand::Rng;
use tracing::{debug, info, warn};

use super::geom::Rect;
use super::teleport::TeleportPair;
use super::tile::Tile;
use crate::error::GameError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeLayout {
    pub origin_x: i32,
    pub origin_y: i32,
    pub tile_size: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectibleKind {
    Pellet,
    Bonus,
    PowerPellet,
}

#[derive(Clone, Debug)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
}

#[derive(Clone, Debug)]
pub struct Maze {
    pub layout: MazeLayout,
    pub width: usize,
    pub height: usize,
    base_tiles: Vec<Vec<Tile>>,
    walls: Vec<Vec<bool>>,
    shields: Vec<Vec<bool>>,
    collectibles: Vec<Option<Collectible>>,
    remaining: usize,
    pub teleport: Option<TeleportPair>,
    pub player_spawn: (usize, usize),
    pub pursuer_spawns: Vec<(usize, usize)>,
    /// Bumped by every `build()`.
    pub generation: u32,
}

impl Maze {
    /// Parse the text map. Layers stay empty until `build()`.
    pub fn parse(text: &str, layout: MazeLayout) -> Result<Maze, GameError> {
        let mut lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        while lines.last().map_or(false, |l| l.trim().is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(GameError::EmptyMaze);
        }

        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(GameError::EmptyMaze);
        }

        let mut base_tiles = vec![vec![Tile::Floor; width]; height];
        let mut player_spawn = None;
        let mut pursuer_spawns = Vec::new();
        let mut endpoints = Vec::new();

        for (r, line) in lines.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch);
                base_tiles[r][c] = tile;
                match tile {
                    Tile::PlayerSpawn => player_spawn = Some((r, c)),
                    Tile::PursuerSpawn => pursuer_spawns.push((r, c)),
                    Tile::TeleportEndpoint => endpoints.push((r, c)),
                    _ => {}
                }
            }
        }

        let player_spawn = player_spawn.ok_or(GameError::NoPlayerSpawn)?;

        let mut maze = Maze {
            layout,
            width,
            height,
            base_tiles,
            walls: vec![vec![false; width]; height],
            shields: vec![vec![false; width]; height],
            collectibles: Vec::new(),
            remaining: 0,
            teleport: None,
            player_spawn,
            pursuer_spawns,
            generation: 0,
        };

        match endpoints.as_slice() {
            [a, b] => {
                let (a, b) = (maze.tile_rect(a.0, a.1), maze.tile_rect(b.0, b.1));
                maze.teleport = Some(TeleportPair::from_endpoints(a, b));
            }
            [] => debug!("maze has no teleport endpoints"),
            other => warn!(count = other.len(), "expected exactly two teleport endpoints; teleport disabled"),
        }

        Ok(maze)
    }

    /// Reset walls and shields from the topology and regenerate collectibles.
    /// Each pellet slot becomes a bonus item when a draw in 0..100 falls
    /// below `bonus_chance_percent`.
    pub fn build<R: Rng>(&mut self, rng: &mut R, bonus_chance_percent: u32) {
        self.collectibles.clear();
        self.remaining = 0;

        for r in 0..self.height {
            for c in 0..self.width {
                let tile = self.base_tiles[r][c];
                self.walls[r][c] = tile.is_wall();
                self.shields[r][c] = tile.is_collidable() && !tile.is_wall();
                if !tile.is_consumable() {
                    continue;
                }

                let kind = match tile {
                    Tile::Pellet if rng.gen_range(0..100) < bonus_chance_percent => CollectibleKind::Bonus,
                    Tile::Pellet => CollectibleKind::Pellet,
                    Tile::PowerPellet => CollectibleKind::PowerPellet,
                    _ => continue,
                };
                if kind != CollectibleKind::Bonus {
                    self.remaining += 1;
                }
                let rect = self.collectible_rect(r, c, kind);
                self.collectibles.push(Some(Collectible { kind, row: r, col: c, rect }));
            }
        }

        self.generation += 1;
        info!(
            generation = self.generation,
            collectibles = self.collectibles.len(),
            required = self.remaining,
            "maze built"
        );
    }

    // ── Grid queries ──

    pub fn in_grid(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    pub fn tile(&self, row: usize, col: usize) -> Tile {
        self.base_tiles
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(Tile::Wall)
    }

    /// True unless the cell is a live wall or shield. Out-of-grid is not walkable.
    pub fn is_walkable(&self, row: i32, col: i32) -> bool {
        if !self.in_grid(row, col) {
            return false;
        }
        let (r, c) = (row as usize, col as usize);
        !self.walls[r][c] && !self.shields[r][c]
    }

    /// Topology-only openness (ignores portals and shields). Used by the AI.
    pub fn is_open(&self, row: i32, col: i32) -> bool {
        self.in_grid(row, col) && !self.base_tiles[row as usize][col as usize].is_wall()
    }

    pub fn wall_at(&self, row: usize, col: usize) -> bool {
        self.walls.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false)
    }

    pub fn shield_at(&self, row: usize, col: usize) -> bool {
        self.shields.get(row).and_then(|r| r.get(col)).copied().unwrap_or(false)
    }

    // ── Coordinates ──

    /// World pixel → (row, col). Not clamped; pair with `in_grid`/`clamp_tile`.
    pub fn world_to_tile(&self, x: i32, y: i32) -> (i32, i32) {
        let ts = self.layout.tile_size;
        ((y - self.layout.origin_y).div_euclid(ts), (x - self.layout.origin_x).div_euclid(ts))
    }

    /// Top-left world pixel of a tile.
    pub fn tile_to_world(&self, row: i32, col: i32) -> (i32, i32) {
        let ts = self.layout.tile_size;
        (self.layout.origin_x + col * ts, self.layout.origin_y + row * ts)
    }

    pub fn clamp_tile(&self, row: i32, col: i32) -> (usize, usize) {
        (
            row.clamp(0, self.height as i32 - 1) as usize,
            col.clamp(0, self.width as i32 - 1) as usize,
        )
    }

    pub fn tile_rect(&self, row: usize, col: usize) -> Rect {
        let (x, y) = self.tile_to_world(row as i32, col as i32);
        let ts = self.layout.tile_size;
        Rect::new(x, y, ts, ts)
    }

    pub fn tile_center(&self, row: usize, col: usize) -> (i32, i32) {
        self.tile_rect(row, col).center()
    }

    /// World extent of the whole grid.
    pub fn bounds(&self) -> Rect {
        let ts = self.layout.tile_size;
        Rect::new(
            self.layout.origin_x,
            self.layout.origin_y,
            self.width as i32 * ts,
            self.height as i32 * ts,
        )
    }

    // ── Collision ──

    /// In-grid tiles a rectangle overlaps, row-major.
    fn tiles_under(&self, rect: &Rect) -> impl Iterator<Item = (usize, usize)> {
        let (r0, c0) = self.world_to_tile(rect.x, rect.y);
        let (r1, c1) = self.world_to_tile(rect.right() - 1, rect.bottom() - 1);
        let (r0, c0) = (r0.max(0), c0.max(0));
        let (r1, c1) = (r1.min(self.height as i32 - 1), c1.min(self.width as i32 - 1));
        (r0..=r1).flat_map(move |r| (c0..=c1).map(move |c| (r as usize, c as usize)))
    }

    pub fn collides_wall(&self, rect: &Rect) -> bool {
        self.wall_hit(rect).is_some()
    }

    pub fn collides_shield(&self, rect: &Rect) -> bool {
        self.tiles_under(rect).any(|(r, c)| self.shields[r][c])
    }

    /// First live wall tile the rectangle overlaps.
    pub fn wall_hit(&self, rect: &Rect) -> Option<(usize, usize)> {
        self.tiles_under(rect).find(|&(r, c)| self.walls[r][c])
    }

    /// Open a wall tile (portal placement).
    pub fn remove_wall(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.walls.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = false;
        }
    }

    /// Put a removed wall back. Only tiles that are walls in the map file can be restored.
    pub fn restore_wall(&mut self, row: usize, col: usize) {
        if self.tile(row, col).is_wall() {
            self.walls[row][col] = true;
        }
    }

    // ── Collectibles ──

    /// Ordinary and power pellets still alive. Bonus items don't count.
    pub fn collectibles_remaining(&self) -> bool {
        self.remaining > 0
    }

    pub fn collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.collectibles.iter().flatten()
    }

    /// Consume every live collectible the rectangle overlaps.
    pub fn take_collectibles(&mut self, rect: &Rect) -> Vec<CollectibleKind> {
        let mut eaten = Vec::new();
        for slot in &mut self.collectibles {
            let hit = matches!(slot, Some(item) if item.rect.overlaps(rect));
            if hit {
                if let Some(item) = slot.take() {
                    if item.kind != CollectibleKind::Bonus {
                        self.remaining = self.remaining.saturating_sub(1);
                    }
                    eaten.push(item.kind);
                }
            }
        }
        eaten
    }

    fn collectible_rect(&self, row: usize, col: usize, kind: CollectibleKind) -> Rect {
        let (cx, cy) = self.tile_center(row, col);
        let size = match kind {
            CollectibleKind::Pellet => self.layout.tile_size / 4,
            CollectibleKind::Bonus | CollectibleKind::PowerPellet => self.layout.tile_size / 2,
        };
        Rect::centered(cx, cy, size.max(1), size.max(1))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub(crate) const LAYOUT: MazeLayout = MazeLayout { origin_x: 100, origin_y: 40, tile_size: 24 };

    /// Parse and build a string-diagram maze with no bonus conversion.
    pub(crate) fn maze_from(rows: &[&str]) -> Maze {
        let mut m = Maze::parse(&rows.join("\n"), LAYOUT).unwrap();
        m.build(&mut StdRng::seed_from_u64(1), 0);
        m
    }

    #[test]
    fn walls_are_never_walkable_after_build() {
        let rows = [
            "xxxxxxx",
            "x*o* @x",
            "x x s x",
            "xg   tx",
            "xxxxxxx",
        ];
        let m = maze_from(&rows);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                if ch == 'x' || ch == 's' {
                    assert!(!m.is_walkable(r as i32, c as i32), "({r},{c})");
                } else {
                    assert!(m.is_walkable(r as i32, c as i32), "({r},{c})");
                }
            }
        }
        assert!(!m.is_walkable(-1, 0));
        assert!(!m.is_walkable(0, 7));
        assert!(m.shield_at(2, 4) && !m.wall_at(2, 4));
        assert!(m.wall_at(2, 2) && !m.shield_at(2, 2));
    }

    #[test]
    fn spawns_are_recorded_in_file_order() {
        let m = maze_from(&[
            "xxxxx",
            "xg gx",
            "x o x",
            "xg  x",
            "xxxxx",
        ]);
        assert_eq!(m.player_spawn, (2, 2));
        assert_eq!(m.pursuer_spawns, vec![(1, 1), (1, 3), (3, 1)]);
    }

    #[test]
    fn missing_player_spawn_is_an_error() {
        let err = Maze::parse("xxx\nx*x\nxxx", LAYOUT).unwrap_err();
        assert!(matches!(err, GameError::NoPlayerSpawn));
        assert!(matches!(Maze::parse("\n\n", LAYOUT), Err(GameError::EmptyMaze)));
    }

    #[test]
    fn teleport_needs_exactly_two_endpoints() {
        let one = maze_from(&["t o x"]);
        assert!(one.teleport.is_none());
        let three = maze_from(&["t o t t"]);
        assert!(three.teleport.is_none());
        let two = maze_from(&["t o  t"]);
        assert!(two.teleport.is_some());
    }

    #[test]
    fn tile_coordinates_round_trip() {
        let m = maze_from(&["xxx", "xox", "xxx"]);
        let (x, y) = m.tile_to_world(2, 1);
        assert_eq!((x, y), (124, 88));
        assert_eq!(m.world_to_tile(x, y), (2, 1));
        assert_eq!(m.world_to_tile(x + 23, y + 23), (2, 1));
        assert_eq!(m.world_to_tile(x - 1, y), (2, 0));
        assert_eq!(m.world_to_tile(99, 39), (-1, -1));
        assert_eq!(m.clamp_tile(-4, 9), (0, 2));
    }

    #[test]
    fn wall_collision_is_strict() {
        let m = maze_from(&["xxx", "xox", "xxx"]);
        let inner = m.tile_rect(1, 1);
        assert!(!m.collides_wall(&inner));
        assert!(m.collides_wall(&inner.offset(1, 0)));
        assert_eq!(m.wall_hit(&inner.offset(0, -1)), Some((0, 1)));
    }

    #[test]
    fn pellets_are_single_consume() {
        let mut m = maze_from(&["x*o@x"]);
        assert!(m.collectibles_remaining());
        let eaten = m.take_collectibles(&m.tile_rect(0, 1));
        assert_eq!(eaten, vec![CollectibleKind::Pellet]);
        assert!(m.take_collectibles(&m.tile_rect(0, 1)).is_empty());
        assert!(m.collectibles_remaining());
        let eaten = m.take_collectibles(&m.tile_rect(0, 3));
        assert_eq!(eaten, vec![CollectibleKind::PowerPellet]);
        assert!(!m.collectibles_remaining());
    }

    #[test]
    fn bonus_slots_do_not_block_level_clear() {
        let mut m = Maze::parse("o***", LAYOUT).unwrap();
        m.build(&mut StdRng::seed_from_u64(3), 100);
        assert!(m.collectibles().all(|c| c.kind == CollectibleKind::Bonus));
        assert!(!m.collectibles_remaining());
    }

    #[test]
    fn build_regenerates_collectibles_and_walls() {
        let mut m = maze_from(&["xxxx", "xo*x", "xxxx"]);
        m.take_collectibles(&m.tile_rect(1, 2));
        m.remove_wall(0, 1);
        assert!(m.is_walkable(0, 1));
        assert!(!m.collectibles_remaining());

        m.build(&mut StdRng::seed_from_u64(9), 0);
        assert!(!m.is_walkable(0, 1));
        assert!(m.collectibles_remaining());
        assert_eq!(m.generation, 2);
    }

    #[test]
    fn restore_only_touches_real_walls() {
        let mut m = maze_from(&["xo "]);
        m.remove_wall(0, 0);
        m.restore_wall(0, 0);
        m.restore_wall(0, 2);
        assert!(!m.is_walkable(0, 0));
        assert!(m.is_walkable(0, 2));
    }
}
