/// Tile kinds read from the maze text and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Floor,
    Wall,             // 'x'
    Pellet,           // '*'  (may become a bonus item at build time)
    PowerPellet,      // '@'
    Shield,           // 's'  blocks the player only
    PlayerSpawn,      // 'o'
    PursuerSpawn,     // 'g'
    TeleportEndpoint, // 't'
}

impl Tile {
    pub fn from_char(ch: char) -> Tile {
        match ch {
            'x' => Tile::Wall,
            '*' => Tile::Pellet,
            '@' => Tile::PowerPellet,
            's' => Tile::Shield,
            'o' => Tile::PlayerSpawn,
            'g' => Tile::PursuerSpawn,
            't' => Tile::TeleportEndpoint,
            _ => Tile::Floor,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Walls and shields stop movement; everything else can be occupied.
    pub fn is_collidable(self) -> bool {
        matches!(self, Tile::Wall | Tile::Shield)
    }

    /// Does this tile seed a collectible when the maze is built?
    pub fn is_consumable(self) -> bool {
        matches!(self, Tile::Pellet | Tile::PowerPellet)
    }
}
