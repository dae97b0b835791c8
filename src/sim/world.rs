/// WorldState: the complete snapshot of a running game.
///
/// ## Layers
///
/// The maze owns the tile layers (topology, live walls, shields and
/// collectibles). Agents live here: one player, the pursuers, and the
/// portal controller, which also edits the maze's wall layer.
///
/// ## Time
///
/// `tick` is the only clock. Every delayed transition (banner, staggered
/// release, rebuild after death, level advance) is a `Deadline` field
/// compared against it once per step, so cancelling one is a `clear()`.

use std::collections::VecDeque;

use rand::rngs::StdRng;

use crate::config::{GameConfig, RulesConfig, SpeedConfig, Timing};
use crate::domain::entity::{Player, Pursuer};
use crate::domain::maze::Maze;
use crate::domain::portal::PortalController;
use crate::domain::timer::Deadline;

use super::level;
use super::scores::HighScores;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    HighScores,
    /// Level banner; agents hold still until it ends.
    LevelTransition,
    Playing,
    LevelClear,
    Dying,
    GameOver,
}

/// Entries on the title menu, top to bottom.
pub const MENU_ITEMS: [&str; 3] = ["Play", "High Scores", "Quit"];

pub struct WorldState {
    // ── Maze & agents ──
    pub maze: Maze,
    pub player: Player,
    pub pursuers: Vec<Pursuer>,
    pub portals: PortalController,
    pub rng: StdRng,

    // ── Tuning ──
    pub timing: Timing,
    pub speed: SpeedConfig,
    pub rules: RulesConfig,

    // ── Meta ──
    pub phase: Phase,
    pub tick: u64,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    /// Bonus items eaten this session.
    pub items: u32,
    pub boosted: bool,
    pub high_scores: HighScores,
    /// Rank reached by the last finished session, if it made the table.
    pub last_rank: Option<usize>,

    // ── Scheduled transitions ──
    pub banner: Deadline,
    pub release: Deadline,
    /// Pursuers still waiting in the pen, in release order.
    pub release_queue: VecDeque<usize>,
    pub rebuild_at: Deadline,
    pub next_level_at: Deadline,

    // ── UI ──
    pub menu_cursor: usize,
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

// ── Construction ──

impl WorldState {
    /// The maze is parsed but not built; `level::start_session` builds it.
    pub fn new(maze: Maze, config: &GameConfig, rng: StdRng) -> Self {
        let (sr, sc) = maze.player_spawn;
        let player = Player::new(maze.tile_center(sr, sc), config.layout.tile_size, config.speed.player);
        let pursuers = level::spawn_pursuers(&maze, config.speed.pursuer);

        WorldState {
            maze,
            player,
            pursuers,
            portals: PortalController::new(config.speed.projectile),
            rng,
            timing: config.timing.to_ticks(),
            speed: config.speed.clone(),
            rules: config.rules.clone(),
            phase: Phase::Title,
            tick: 0,
            score: 0,
            level: 1,
            lives: config.rules.lives,
            items: 0,
            boosted: false,
            high_scores: HighScores::new(config.rules.high_score_count),
            last_rank: None,
            banner: Deadline::default(),
            release: Deadline::default(),
            release_queue: VecDeque::new(),
            rebuild_at: Deadline::default(),
            next_level_at: Deadline::default(),
            menu_cursor: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// A session is in progress (anything between Play and Game Over).
    pub fn in_session(&self) -> bool {
        matches!(
            self.phase,
            Phase::LevelTransition | Phase::Playing | Phase::LevelClear | Phase::Dying
        )
    }

    pub fn pursuer_speed(&self) -> i32 {
        if self.boosted {
            self.speed.pursuer_boosted
        } else {
            self.speed.pursuer
        }
    }

    /// Index of the pursuer released first: the first Blinky, else the first.
    pub fn leader(&self) -> Option<usize> {
        self.pursuers.iter().position(|p| p.leader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::PursuerKind;
    use rand::SeedableRng;

    fn world(rows: &[&str]) -> WorldState {
        let cfg = GameConfig::default();
        let maze = Maze::parse(&rows.join("\n"), cfg.layout).unwrap();
        WorldState::new(maze, &cfg, StdRng::seed_from_u64(5))
    }

    #[test]
    fn player_starts_centred_on_spawn() {
        let w = world(&["xxxx", "x o*", "xxxx"]);
        assert_eq!(w.player.rect, w.maze.tile_rect(1, 2));
        assert_eq!(w.phase, Phase::Title);
        assert_eq!(w.lives, 3);
        assert!(!w.in_session());
    }

    #[test]
    fn pursuer_identities_cycle_and_blinky_leads() {
        let w = world(&["ggggg", "  o  "]);
        let kinds: Vec<PursuerKind> = w.pursuers.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PursuerKind::Pinky, PursuerKind::Inky, PursuerKind::Clyde, PursuerKind::Blinky, PursuerKind::Pinky]
        );
        assert_eq!(w.leader(), Some(3));
    }

    #[test]
    fn first_pursuer_leads_without_a_blinky() {
        let w = world(&["g g", " o "]);
        assert_eq!(w.leader(), Some(0));
        assert_eq!(w.pursuer_speed(), 2);
    }
}
