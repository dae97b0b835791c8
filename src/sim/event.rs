/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound; the main loop also
/// persists the high-score table when a session ends.

use crate::domain::portal::PortalColor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten,
    BonusEaten,
    PowerPelletEaten,
    PortalFired { color: PortalColor },
    PortalOpened { color: PortalColor, row: usize, col: usize },
    PortalFizzled { color: PortalColor },
    PortalTravel,
    Teleported,
    PursuerReleased { id: usize },
    FleeStarted,
    FleeEnded { id: usize },
    PursuerCaptured { id: usize },
    PursuerHome { id: usize },
    PlayerKilled,
    LevelCleared,
    LevelStarted { level: u32 },
    SessionEnded { score: u32, rank: Option<usize> },
}
