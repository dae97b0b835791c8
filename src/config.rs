/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
/// Durations are written in milliseconds and converted once into ticks.
/// Runs before logging is up, so problems go to stderr.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::ai::AxisPreference;
use crate::domain::maze::MazeLayout;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub speed: SpeedConfig,
    pub layout: MazeLayout,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub maze_file: PathBuf,
    pub high_score_file: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub flee_ms: u64,
    pub blink_ms: u64,
    pub return_delay_ms: u64,
    pub release_interval_ms: u64,
    pub death_delay_ms: u64,
    pub clear_delay_ms: u64,
    pub banner_ms: u64,
    pub anim_frame_ms: u64,
}

/// `TimingConfig` in ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    pub flee: u64,
    pub blink: u64,
    pub return_delay: u64,
    pub release_interval: u64,
    pub death_delay: u64,
    pub clear_delay: u64,
    pub banner: u64,
    pub anim_frame: u64,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub player: i32,
    pub pursuer: i32,
    pub pursuer_boosted: i32,
    pub projectile: i32,
    pub boost_after_level: u32,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub lives: u32,
    pub bonus_chance_percent: u32,
    pub high_score_count: usize,
    pub axis_preference: AxisPreference,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub fire_blue: Vec<String>,
    pub fire_orange: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl TimingConfig {
    /// Milliseconds → whole ticks, never less than one.
    pub fn ticks(&self, ms: u64) -> u64 {
        (ms / self.tick_rate_ms.max(1)).max(1)
    }

    pub fn to_ticks(&self) -> Timing {
        Timing {
            flee: self.ticks(self.flee_ms),
            blink: self.ticks(self.blink_ms),
            return_delay: self.ticks(self.return_delay_ms),
            release_interval: self.ticks(self.release_interval_ms),
            death_delay: self.ticks(self.death_delay_ms),
            clear_delay: self.ticks(self.clear_delay_ms),
            banner: self.ticks(self.banner_ms),
            anim_frame: self.ticks(self.anim_frame_ms),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    layout: TomlLayout,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_flee")]
    flee_ms: u64,
    #[serde(default = "default_blink")]
    blink_ms: u64,
    #[serde(default = "default_return_delay")]
    return_delay_ms: u64,
    #[serde(default = "default_release_interval")]
    release_interval_ms: u64,
    #[serde(default = "default_death_delay")]
    death_delay_ms: u64,
    #[serde(default = "default_clear_delay")]
    clear_delay_ms: u64,
    #[serde(default = "default_banner")]
    banner_ms: u64,
    #[serde(default = "default_anim_frame")]
    anim_frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_player_speed")]
    player: i32,
    #[serde(default = "default_pursuer_speed")]
    pursuer: i32,
    #[serde(default = "default_pursuer_boosted")]
    pursuer_boosted: i32,
    #[serde(default = "default_projectile_speed")]
    projectile: i32,
    #[serde(default = "default_boost_after_level")]
    boost_after_level: u32,
}

#[derive(Deserialize, Debug)]
struct TomlLayout {
    #[serde(default = "default_tile_size")]
    tile_size: i32,
    #[serde(default = "default_origin_x")]
    origin_x: i32,
    #[serde(default = "default_origin_y")]
    origin_y: i32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_bonus_chance")]
    bonus_chance_percent: u32,
    #[serde(default = "default_high_score_count")]
    high_score_count: usize,
    #[serde(default = "default_axis_preference")]
    axis_preference: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_fire_blue")]
    fire_blue: Vec<String>,
    #[serde(default = "default_fire_orange")]
    fire_orange: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_maze_file")]
    maze_file: String,
    #[serde(default = "default_high_score_file")]
    high_score_file: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }          // ~60 updates/s
fn default_flee() -> u64 { 5000 }
fn default_blink() -> u64 { 250 }
fn default_return_delay() -> u64 { 1000 }
fn default_release_interval() -> u64 { 2500 }
fn default_death_delay() -> u64 { 4000 }
fn default_clear_delay() -> u64 { 1000 }
fn default_banner() -> u64 { 5000 }
fn default_anim_frame() -> u64 { 150 }

fn default_player_speed() -> i32 { 3 }
fn default_pursuer_speed() -> i32 { 2 }
fn default_pursuer_boosted() -> i32 { 3 }
fn default_projectile_speed() -> i32 { 10 }
fn default_boost_after_level() -> u32 { 3 }

fn default_tile_size() -> i32 { 24 }         // divisible by every default speed
fn default_origin_x() -> i32 { 180 }
fn default_origin_y() -> i32 { 58 }

fn default_lives() -> u32 { 3 }
fn default_bonus_chance() -> u32 { 2 }
fn default_high_score_count() -> usize { 10 }
fn default_axis_preference() -> String { "absolute".into() }

fn default_fire_blue() -> Vec<String> { vec!["X".into(), "L1".into()] }
fn default_fire_orange() -> Vec<String> { vec!["B".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

fn default_maze_file() -> String { "maze.txt".into() }
fn default_high_score_file() -> String { "high_scores.toml".into() }
fn default_log_file() -> String { "portal-chase.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            flee_ms: default_flee(),
            blink_ms: default_blink(),
            return_delay_ms: default_return_delay(),
            release_interval_ms: default_release_interval(),
            death_delay_ms: default_death_delay(),
            clear_delay_ms: default_clear_delay(),
            banner_ms: default_banner(),
            anim_frame_ms: default_anim_frame(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            player: default_player_speed(),
            pursuer: default_pursuer_speed(),
            pursuer_boosted: default_pursuer_boosted(),
            projectile: default_projectile_speed(),
            boost_after_level: default_boost_after_level(),
        }
    }
}

impl Default for TomlLayout {
    fn default() -> Self {
        TomlLayout {
            tile_size: default_tile_size(),
            origin_x: default_origin_x(),
            origin_y: default_origin_y(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            lives: default_lives(),
            bonus_chance_percent: default_bonus_chance(),
            high_score_count: default_high_score_count(),
            axis_preference: default_axis_preference(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            fire_blue: default_fire_blue(),
            fire_orange: default_fire_orange(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            maze_file: default_maze_file(),
            high_score_file: default_high_score_file(),
            log_file: default_log_file(),
        }
    }
}

fn parse_axis_preference(name: &str) -> AxisPreference {
    match name.to_ascii_lowercase().as_str() {
        "absolute" => AxisPreference::Absolute,
        "relative" => AxisPreference::Relative,
        other => {
            eprintln!("Warning: unknown axis_preference {other:?}; using \"absolute\"");
            AxisPreference::Absolute
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        let mut cfg = GameConfig::from_toml(toml_cfg);
        cfg.maze_file = resolve_data_file(&search_dirs, &cfg.maze_file);
        cfg
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: t.timing.tick_rate_ms.max(1),
                flee_ms: t.timing.flee_ms,
                blink_ms: t.timing.blink_ms,
                return_delay_ms: t.timing.return_delay_ms,
                release_interval_ms: t.timing.release_interval_ms,
                death_delay_ms: t.timing.death_delay_ms,
                clear_delay_ms: t.timing.clear_delay_ms,
                banner_ms: t.timing.banner_ms,
                anim_frame_ms: t.timing.anim_frame_ms,
            },
            speed: SpeedConfig {
                player: t.speed.player,
                pursuer: t.speed.pursuer,
                pursuer_boosted: t.speed.pursuer_boosted,
                projectile: t.speed.projectile,
                boost_after_level: t.speed.boost_after_level,
            },
            layout: MazeLayout {
                origin_x: t.layout.origin_x,
                origin_y: t.layout.origin_y,
                tile_size: t.layout.tile_size.max(4),
            },
            rules: RulesConfig {
                lives: t.rules.lives.max(1),
                bonus_chance_percent: t.rules.bonus_chance_percent.min(100),
                high_score_count: t.rules.high_score_count,
                axis_preference: parse_axis_preference(&t.rules.axis_preference),
            },
            gamepad: GamepadConfig {
                fire_blue: t.gamepad.fire_blue,
                fire_orange: t.gamepad.fire_orange,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
            },
            maze_file: PathBuf::from(t.general.maze_file),
            high_score_file: PathBuf::from(t.general.high_score_file),
            log_file: PathBuf::from(t.general.log_file),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + data dirs (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/portal-chase");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/portal-chase");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First existing `name` under the search dirs; the bare name otherwise,
/// so a later open reports the path the user configured.
fn resolve_data_file(search_dirs: &[PathBuf], name: &Path) -> PathBuf {
    if name.is_absolute() {
        return name.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or_else(|| name.to_path_buf())
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Warning: config.toml parse error: {e}");
            eprintln!("Using default settings.");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = GameConfig::from_toml(parse_toml(
            "[speed]\nplayer = 4\n\n[rules]\naxis_preference = \"relative\"\n",
        ));
        assert_eq!(cfg.speed.player, 4);
        assert_eq!(cfg.speed.pursuer, 2);
        assert_eq!(cfg.rules.axis_preference, AxisPreference::Relative);
        assert_eq!(cfg.rules.lives, 3);
        assert_eq!(cfg.layout.tile_size, 24);
        assert_eq!(cfg.maze_file, PathBuf::from("maze.txt"));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let cfg = GameConfig::from_toml(parse_toml("[speed\nplayer = "));
        assert_eq!(cfg.speed.player, 3);
        assert_eq!(cfg.rules.axis_preference, AxisPreference::Absolute);
    }

    #[test]
    fn milliseconds_become_ticks() {
        let t = GameConfig::default().timing;
        let ticks = t.to_ticks();
        assert_eq!(ticks.flee, 312);
        assert_eq!(ticks.blink, 15);
        assert_eq!(ticks.release_interval, 156);
        assert_eq!(ticks.banner, 312);
        assert_eq!(t.ticks(0), 1);
    }

    #[test]
    fn unknown_axis_preference_is_absolute() {
        assert_eq!(parse_axis_preference("Relative"), AxisPreference::Relative);
        assert_eq!(parse_axis_preference("sideways"), AxisPreference::Absolute);
    }
}
