/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::{Command, PursuerMode};
use domain::geom::Direction;
use sim::event::GameEvent;
use sim::level;
use sim::scores::HighScores;
use sim::step;
use sim::world::{Phase, WorldState, MENU_ITEMS};
use ui::gamepad::GamepadState;
use ui::input::{InputState, CONFIRM_KEYS};
use ui::renderer::Renderer;
use ui::sound::{Cue, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log_file);

    let maze = match level::load_maze(&config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Cannot start: {e}");
            std::process::exit(1);
        }
    };

    let mut world = WorldState::new(maze, &config, StdRng::from_entropy());
    match HighScores::load(&config.high_score_file, config.rules.high_score_count) {
        Ok(scores) => world.high_scores = scores,
        Err(e) => warn!(error = %e, "high scores unreadable, starting with an empty table"),
    }

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    info!("exiting");
    println!();
    println!("Thanks for playing Portal Chase!");
    if let Some(best) = world.high_scores.best() {
        println!("High Score: {best}");
    }
}

/// Logs go to a file; the terminal belongs to the renderer.
fn init_logging(path: &Path) {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    // Commands gathered between ticks, applied in arrival order.
    let mut pending: Vec<Command> = Vec::new();
    let mut pad_connected = gp.connected;

    loop {
        kb.drain_events();
        gp.update();

        if gp.connected != pad_connected {
            pad_connected = gp.connected;
            let msg = if pad_connected { "Gamepad connected" } else { "Gamepad disconnected" };
            world.set_message(msg, 120);
        }

        if kb.ctrl_c_pressed() {
            if world.in_session() {
                let mut events = Vec::new();
                level::end_session(world, &mut events);
                process_events(world, sound, config, &events);
            }
            break;
        }

        let mut events = Vec::new();
        let quit = handle_meta(world, &kb, &gp, &mut events);
        process_events(world, sound, config, &events);
        if quit {
            break;
        }

        if world.phase == Phase::Playing {
            pending.extend(kb.commands());
            pending.extend(gp.commands());
        } else {
            pending.clear();
        }

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, &pending);
            pending.clear();
            process_events(world, sound, config, &events);
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Sound cues and high-score persistence for one batch of events.
fn process_events(world: &mut WorldState, sound: Option<&SoundEngine>, config: &GameConfig, events: &[GameEvent]) {
    if let Some(sfx) = sound {
        play_cues(world, sfx, events);
    }
    for event in events {
        if let GameEvent::SessionEnded { score, rank } = event {
            match world.high_scores.save(&config.high_score_file) {
                Ok(()) => info!(score, ?rank, "high scores saved"),
                Err(e) => {
                    warn!(error = %e, "could not save high scores");
                    world.set_message("Could not save high scores", 120);
                }
            }
        }
    }
}

fn play_cues(world: &WorldState, sfx: &SoundEngine, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PelletEaten | GameEvent::PowerPelletEaten => sfx.play(Cue::Eat),
            GameEvent::BonusEaten => sfx.play(Cue::Bonus),
            GameEvent::PortalFired { .. } => sfx.play(Cue::PortalFire),
            GameEvent::PortalOpened { .. } => sfx.play(Cue::PortalOpen),
            GameEvent::PortalTravel => sfx.play(Cue::PortalTravel),
            GameEvent::PursuerReleased { .. } => sfx.play_loop(Cue::Siren),
            GameEvent::FleeStarted => sfx.play_loop(Cue::Flee),
            GameEvent::FleeEnded { .. } => {
                if !world.pursuers.iter().any(|p| p.mode == PursuerMode::Flee) {
                    sfx.play_loop(Cue::Siren);
                }
            }
            GameEvent::PursuerCaptured { .. } => {
                sfx.stop_loop();
                sfx.play(Cue::Capture);
            }
            GameEvent::PlayerKilled => {
                sfx.stop_loop();
                sfx.play(Cue::Death);
            }
            GameEvent::LevelCleared | GameEvent::SessionEnded { .. } => sfx.stop_loop(),
            GameEvent::LevelStarted { .. } => sfx.play(Cue::Transition),
            GameEvent::PortalFizzled { .. }
            | GameEvent::Teleported
            | GameEvent::PursuerHome { .. } => {}
        }
    }
}

// ── Menus ──

fn menu_move(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    kb.direction_pressed()
        .or_else(|| gp.direction_pressed())
        .filter(|d| matches!(d, Direction::Up | Direction::Down))
}

/// Screen navigation outside the simulation. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, events: &mut Vec<GameEvent>) -> bool {
    let confirm = kb.any_pressed(&CONFIRM_KEYS) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    match world.phase {
        Phase::Title => {
            match menu_move(kb, gp) {
                Some(Direction::Up) => {
                    world.menu_cursor = (world.menu_cursor + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
                }
                Some(_) => world.menu_cursor = (world.menu_cursor + 1) % MENU_ITEMS.len(),
                None => {}
            }
            if esc || kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) {
                return true;
            }
            if confirm {
                match world.menu_cursor {
                    0 => level::start_session(world, events),
                    1 => world.phase = Phase::HighScores,
                    _ => return true,
                }
            }
        }
        Phase::HighScores => {
            if confirm || esc {
                world.phase = Phase::Title;
            }
        }
        Phase::GameOver => {
            if confirm || esc {
                world.phase = Phase::Title;
                world.menu_cursor = 0;
                world.message.clear();
                world.message_timer = 0;
            }
        }
        Phase::LevelTransition | Phase::Playing | Phase::LevelClear | Phase::Dying => {
            if esc {
                level::end_session(world, events);
            }
        }
    }

    false
}
