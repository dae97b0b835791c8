/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each maze tile is two terminal columns. Agents live in world pixels and are
/// drawn on the tile under their centre.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Pursuer, PursuerKind, PursuerMode};
use crate::domain::geom::Direction;
use crate::domain::maze::CollectibleKind;
use crate::domain::portal::{PortalColor, PortalState};
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState, MENU_ITEMS};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps the
    /// gaps between rows on VTE terminals the same colour as the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Color::Reset → BASE_BG so that every cell gets an explicit background.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Fill a whole row with `bg`, then write `s` from the left edge.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Layout ──

/// Terminal columns per maze tile.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

// ── Palette ──

const WALL_FG: Color = Color::Rgb { r: 60, g: 90, b: 255 };
const WALL_BG: Color = Color::Rgb { r: 20, g: 30, b: 110 };
const SHIELD_FG: Color = Color::Rgb { r: 255, g: 150, b: 200 };
const PELLET_FG: Color = Color::Rgb { r: 255, g: 200, b: 170 };
const BONUS_FG: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 0 };
const FLEE_FG: Color = Color::Rgb { r: 40, g: 60, b: 255 };
const FLEE_BLINK_FG: Color = Color::Rgb { r: 240, g: 240, b: 255 };
const EYES_FG: Color = Color::Rgb { r: 220, g: 220, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };

fn portal_color(c: PortalColor) -> Color {
    match c {
        PortalColor::Blue => Color::Rgb { r: 40, g: 160, b: 255 },
        PortalColor::Orange => Color::Rgb { r: 255, g: 140, b: 20 },
    }
}

fn pursuer_color(kind: PursuerKind) -> Color {
    match kind {
        PursuerKind::Blinky => Color::Rgb { r: 255, g: 40, b: 40 },
        PursuerKind::Pinky => Color::Rgb { r: 255, g: 150, b: 220 },
        PursuerKind::Inky => Color::Rgb { r: 40, g: 230, b: 255 },
        PursuerKind::Clyde => Color::Rgb { r: 255, g: 170, b: 60 },
    }
}

/// HUD badge for one portal colour.
fn portal_badge(state: PortalState) -> char {
    match state {
        PortalState::Unfired => '○',
        PortalState::InFlight => '»',
        PortalState::Placed => '◉',
    }
}

/// `width` cells, filled in proportion to `remaining / total`.
fn countdown_bar(remaining: u64, total: u64, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((remaining.min(total) * width as u64 + total - 1) / total) as usize
    };
    format!("{}{}", "▮".repeat(filled), "▯".repeat(width - filled))
}

/// Death animation frames, then blank.
const DEATH_FRAMES: [char; 6] = ['ᗧ', '◔', '◑', '◕', '●', '·'];

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        // Key-release reporting drives "let go of a direction = stop".
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    /// Whether the terminal reports key releases.
    pub fn keyboard_enhanced(&self) -> bool {
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::HighScores => self.compose_high_scores(world),
            Phase::LevelTransition => self.compose_banner(world),
            Phase::Playing | Phase::LevelClear | Phase::Dying => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal's own.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: game screen ──

    fn put_tile(&mut self, row: usize, col: usize, glyph: (char, char), fg: Color, bg: Color) {
        let x = col * CELL_W;
        let y = MAP_ROW + row;
        self.front.set(x, y, Cell::from_char(glyph.0, fg, bg));
        self.front.set(x + 1, y, Cell::from_char(glyph.1, fg, bg));
    }

    /// Tile under a world-pixel centre, if it is on the grid.
    fn tile_of(w: &WorldState, center: (i32, i32)) -> Option<(usize, usize)> {
        let (r, c) = w.maze.world_to_tile(center.0, center.1);
        w.maze.in_grid(r, c).then(|| (r as usize, c as usize))
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let hearts: String = "♥".repeat(w.lives as usize);
        let best = w.high_scores.best().unwrap_or(0).max(w.score);
        let hud = format!(
            " SCORE {:<7} HI {:<7} LEVEL {:<3} LIVES {:<5} ITEMS {} ",
            w.score, best, w.level, hearts, w.items,
        );
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);

        let mut x = hud.chars().count() + 1;
        for color in PortalColor::ALL {
            let badge = portal_badge(w.portals.state(color)).to_string();
            self.front.put_str(x, HUD_ROW, &badge, portal_color(color), HUD_BG);
            x += 2;
        }
    }

    fn compose_maze(&mut self, w: &WorldState) {
        for row in 0..w.maze.height {
            for col in 0..w.maze.width {
                if w.maze.wall_at(row, col) {
                    self.put_tile(row, col, ('█', '█'), WALL_FG, WALL_BG);
                } else if w.maze.shield_at(row, col) {
                    self.put_tile(row, col, ('▔', '▔'), SHIELD_FG, Color::Reset);
                } else if w.maze.tile(row, col) == Tile::TeleportEndpoint {
                    self.put_tile(row, col, ('░', '░'), Color::DarkGrey, Color::Reset);
                }
            }
        }

        let blink_on = (w.anim_tick / 15) % 2 == 0;
        for item in w.maze.collectibles() {
            let (glyph, fg) = match item.kind {
                CollectibleKind::Pellet => (('·', ' '), PELLET_FG),
                CollectibleKind::PowerPellet if blink_on => (('●', ' '), PELLET_FG),
                CollectibleKind::PowerPellet => ((' ', ' '), PELLET_FG),
                CollectibleKind::Bonus => (('♦', ' '), BONUS_FG),
            };
            self.put_tile(item.row, item.col, glyph, fg, Color::Reset);
        }

        for portal in w.portals.portals() {
            let glyph = match portal.exit {
                Direction::Left => ('▐', '█'),
                Direction::Right => ('█', '▌'),
                Direction::Up | Direction::Down => ('▓', '▓'),
            };
            self.put_tile(portal.row, portal.col, glyph, portal_color(portal.color), Color::Reset);
        }
        for shot in w.portals.projectiles() {
            if let Some((r, c)) = Self::tile_of(w, shot.rect.center()) {
                self.put_tile(r, c, ('•', ' '), portal_color(shot.color), Color::Reset);
            }
        }
    }

    fn compose_pursuer(&mut self, w: &WorldState, p: &Pursuer) {
        let Some((r, c)) = Self::tile_of(w, p.rect.center()) else { return };
        match p.mode {
            PursuerMode::Captured if p.showing_marker(w.tick) => {
                self.front.put_str(c * CELL_W, MAP_ROW + r, "200", Color::Cyan, Color::Reset);
            }
            PursuerMode::Captured => self.put_tile(r, c, ('°', '°'), EYES_FG, Color::Reset),
            PursuerMode::Flee => {
                let fg = if p.blink { FLEE_BLINK_FG } else { FLEE_FG };
                self.put_tile(r, c, ('ᗣ', ' '), fg, Color::Reset);
            }
            PursuerMode::Normal | PursuerMode::Disabled => {
                self.put_tile(r, c, ('ᗣ', ' '), pursuer_color(p.kind), Color::Reset);
            }
        }
    }

    fn compose_player(&mut self, w: &WorldState) {
        let Some((r, c)) = Self::tile_of(w, w.player.rect.center()) else { return };
        let glyph = if w.player.alive {
            let open = (w.anim_tick / 8) % 2 == 0 || !w.player.moving;
            match (w.player.facing, open) {
                (_, false) => '●',
                (Some(Direction::Left), _) => 'ᗤ',
                (Some(Direction::Up), _) => 'ᗢ',
                (Some(Direction::Down), _) => 'ᗣ',
                (Some(Direction::Right) | None, _) => 'ᗧ',
            }
        } else {
            let frame = w.player.death_frame(w.tick, w.timing.anim_frame) as usize;
            DEATH_FRAMES.get(frame).copied().unwrap_or(' ')
        };
        self.put_tile(r, c, (glyph, ' '), PLAYER_FG, Color::Reset);
    }

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_maze(w);

        let dying = w.phase == Phase::Dying;
        if !dying {
            for p in w.pursuers.iter().filter(|p| !p.showing_marker(w.tick)) {
                self.compose_pursuer(w, p);
            }
        }
        self.compose_player(w);
        // Markers last so nothing covers the third digit.
        if !dying {
            for p in w.pursuers.iter().filter(|p| p.showing_marker(w.tick)) {
                self.compose_pursuer(w, p);
            }
        }

        let below = MAP_ROW + w.maze.height + 1;
        if w.phase == Phase::LevelClear {
            let flash = if (w.anim_tick / 10) % 2 == 0 { HI } else { Color::White };
            self.front.put_str(2, below, "LEVEL CLEAR!", flash, Color::Reset);
        } else if !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_bar(below, &msg, Color::Black, MSG_BG);
        }

        let help = " ←↑↓→ Move   A/Z Blue portal   S/X Orange portal   ESC Give up";
        self.front.put_str(0, below + 2, help, Color::DarkGrey, Color::Reset);
    }

    // ── Compose: static screens ──

    fn compose_banner(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_maze(w);
        self.compose_player(w);

        let mid_row = MAP_ROW + w.maze.height / 2;
        let mid_col = (w.maze.width * CELL_W) / 2;
        let level = format!("  LEVEL {}  ", w.level);
        let score = format!("  SCORE {}  ", w.score);
        let ready = if (w.anim_tick / 20) % 2 == 0 { "  READY!  " } else { "          " };
        let left = w.banner.remaining(w.tick).unwrap_or(0);
        let bar = format!(" {} ", countdown_bar(left, w.timing.banner, 8));
        for (i, (text, fg)) in [
            (level.as_str(), GOLD),
            (score.as_str(), Color::White),
            (ready, HI),
            (bar.as_str(), Color::DarkGrey),
        ]
            .into_iter()
            .enumerate()
        {
            let x = mid_col.saturating_sub(text.chars().count() / 2);
            self.front.put_str(x, (mid_row + i).saturating_sub(1), text, fg, Color::Black);
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  ___          _        _    ___ _                   ",
            r" | _ \___ _ _ | |_ __ _| |  / __| |_  __ _ ___ ___   ",
            r" |  _/ _ \ '_||  _/ _` | | | (__| ' \/ _` (_-</ -_)  ",
            r" |_| \___/_|   \__\__,_|_|  \___|_||_\__,_/__/\___|  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let tagline = "━━━ Terminal Edition (Rust) ━━━";
        let tx = 2 + title[1].len().saturating_sub(tagline.chars().count()) / 2;
        self.front.put_str(tx, 7, tagline, Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        let menu_base = 10;
        for (i, item) in MENU_ITEMS.iter().enumerate() {
            let (marker, fg) = if i == w.menu_cursor { ("▸ ", HI) } else { ("  ", Color::White) };
            self.front.put_str(10, menu_base + i, &format!("{marker}{item}"), fg, Color::Reset);
        }

        let help = [
            "Controls",
            "  ←↑↓→         Move (let go to stop)",
            "  A / Z        Fire blue portal",
            "  S / X        Fire orange portal",
            "  ENTER        Select      ESC  Back / give up",
        ];
        let help_base = menu_base + MENU_ITEMS.len() + 2;
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, fg, Color::Reset);
        }

        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            if msg_row > help_base + help.len() {
                let msg = format!(" ◈ {} ", w.message);
                self.front.put_bar(msg_row, &msg, Color::Black, MSG_BG);
            }
        }
    }

    fn compose_high_scores(&mut self, w: &WorldState) {
        self.front.put_str(6, 2, "╔══════════════════════╗", GOLD, Color::Reset);
        self.front.put_str(6, 3, "║     HIGH  SCORES     ║", GOLD, Color::Reset);
        self.front.put_str(6, 4, "╚══════════════════════╝", GOLD, Color::Reset);

        let scores = w.high_scores.scores();
        if scores.is_empty() {
            self.front.put_str(8, 6, "No scores yet.", Color::DarkGrey, Color::Reset);
        }
        for (i, score) in scores.iter().enumerate() {
            let fg = if Some(i) == w.last_rank { HI } else { Color::White };
            self.front.put_str(8, 6 + i, &format!("{:>2}.  {:>8}", i + 1, score), fg, Color::Reset);
        }

        let footer = 7 + scores.len().max(1);
        self.front.put_str(8, footer, "▸ ENTER / ESC: Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════╗",
            "║      GAME  OVER      ║",
            "╚══════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, Color::Rgb { r: 255, g: 60, b: 60 }, Color::Reset);
        }
        let score = format!("◈ Final Score: {}", w.score);
        let level = format!("◈ Reached Level: {}", w.level);
        let rank = match w.last_rank {
            Some(r) => format!("◈ New high score! Rank #{}", r + 1),
            None => "◈ No high score this time".to_string(),
        };
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        self.front.put_str(8, 10, &level, Color::White, Color::Reset);
        let rank_fg = if w.last_rank.is_some() { HI } else { Color::DarkGrey };
        self.front.put_str(8, 11, &rank, rank_fg, Color::Reset);
        self.front.put_str(8, 13, "▸ ENTER: Back to Title", HI, Color::Reset);

        if !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_bar(15, &msg, Color::Black, MSG_BG);
        }
    }
}
