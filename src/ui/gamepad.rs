/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Face (edge-triggered), let go → stop
///   X / L1                →  Fire blue portal
///   B / R1                →  Fire orange portal
///   A / Start             →  Confirm
///   Select                →  Back / quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Command;
use crate::domain::geom::Direction;
use crate::domain::portal::PortalColor;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held, plus press/release edges for this frame.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
    just_released: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held { self.just_pressed = true; }
        if !held && self.held { self.just_released = true; }
        self.held = held;
    }

    fn clear_edges(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    fire_blue: Vec<Btn>,
    fire_orange: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            fire_blue:   vec![Btn::X, Btn::L1],
            fire_orange: vec![Btn::B, Btn::R1],
            confirm:     vec![Btn::A, Btn::Start],
            cancel:      vec![Btn::Select],
        }
    }
}

/// D-pad and stick, indexed in `Direction::ALL` order.
#[derive(Clone, Copy, Debug, Default)]
struct DirPad {
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Left => 1,
        Direction::Down => 2,
        Direction::Right => 3,
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],
    pad: DirPad,

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "gamepad support unavailable");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            pad: DirPad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        for (names, slot) in [
            (&cfg.fire_blue, &mut map.fire_blue),
            (&cfg.fire_orange, &mut map.fire_orange),
            (&cfg.confirm, &mut map.confirm),
            (&cfg.cancel, &mut map.cancel),
        ] {
            let parsed = parse_list(names);
            if !parsed.is_empty() { *slot = parsed; }
        }
    }

    pub fn update(&mut self) {
        self.clear_edges();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    tracing::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }

        // Derive stick digital states (stick y is positive upward)
        let (x, y) = (self.stick_x, self.stick_y);
        self.pad.stick[dir_index(Direction::Up)].set(y > STICK_DEADZONE);
        self.pad.stick[dir_index(Direction::Down)].set(y < -STICK_DEADZONE);
        self.pad.stick[dir_index(Direction::Left)].set(x < -STICK_DEADZONE);
        self.pad.stick[dir_index(Direction::Right)].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.pad.dpad[dir_index(dir)].set(held);
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)].set(held);
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    /// Fresh press on the D-pad or stick.
    pub fn direction_pressed(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| {
            let i = dir_index(d);
            self.pad.dpad[i].just_pressed || self.pad.stick[i].just_pressed
        })
    }

    fn any_direction_held(&self) -> bool {
        self.pad.dpad.iter().chain(self.pad.stick.iter()).any(|b| b.held)
    }

    /// A direction was let go and none is still held.
    pub fn direction_released(&self) -> bool {
        let let_go = self.pad.dpad.iter().chain(self.pad.stick.iter()).any(|b| b.just_released);
        let_go && !self.any_direction_held()
    }

    /// Player commands for this frame, in application order.
    pub fn commands(&self) -> Vec<Command> {
        let mut out = Vec::new();
        if let Some(dir) = self.direction_pressed() {
            out.push(Command::Face(dir));
        }
        if self.direction_released() {
            out.push(Command::Release);
        }
        if self.any_just_pressed(&self.action_map.fire_blue) {
            out.push(Command::Fire(PortalColor::Blue));
        }
        if self.any_just_pressed(&self.action_map.fire_orange) {
            out.push(Command::Fire(PortalColor::Orange));
        }
        out
    }

    // ── Internal ──

    fn clear_edges(&mut self) {
        for b in self.buttons.iter_mut().chain(self.pad.dpad.iter_mut()).chain(self.pad.stick.iter_mut()) {
            b.clear_edges();
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); 10];
        self.pad = DirPad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        let mut gp = GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); 10],
            pad: DirPad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        };
        gp.update();
        gp
    }

    #[test]
    fn dpad_press_then_release() {
        let mut gp = pad();
        gp.pad.dpad[dir_index(Direction::Left)].set(true);
        assert_eq!(gp.commands(), vec![Command::Face(Direction::Left)]);

        gp.update();
        assert!(gp.commands().is_empty());
        gp.pad.dpad[dir_index(Direction::Left)].set(false);
        assert_eq!(gp.commands(), vec![Command::Release]);
    }

    #[test]
    fn stick_still_held_suppresses_release() {
        let mut gp = pad();
        gp.pad.dpad[dir_index(Direction::Up)].set(true);
        gp.pad.stick[dir_index(Direction::Up)].set(true);
        gp.update();
        gp.pad.dpad[dir_index(Direction::Up)].set(false);
        assert!(!gp.direction_released());
    }

    #[test]
    fn configured_fire_buttons() {
        let mut gp = pad();
        gp.load_button_config(&GamepadConfig {
            fire_blue: vec!["Y".into()],
            fire_orange: vec!["bogus".into()],
            confirm: vec![],
            cancel: vec!["back".into()],
        });
        gp.buttons[btn_index(Btn::Y)].set(true);
        gp.buttons[btn_index(Btn::R1)].set(true);
        assert_eq!(
            gp.commands(),
            vec![Command::Fire(PortalColor::Blue), Command::Fire(PortalColor::Orange)]
        );
        gp.buttons[btn_index(Btn::Select)].set(true);
        assert!(gp.cancel_pressed());
    }
}
