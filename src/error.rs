/// Error types shared across the crate.
///
/// Only a missing or unusable maze is fatal; everything else is logged and
/// the game carries on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("maze file not found: {0:?}")]
    MazeNotFound(PathBuf),

    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("maze definition is empty")]
    EmptyMaze,

    #[error("maze has no player spawn ('o')")]
    NoPlayerSpawn,

    #[error("malformed high score file: {0}")]
    ScoreFormat(#[from] toml::de::Error),

    #[error("could not encode high scores: {0}")]
    ScoreEncode(#[from] toml::ser::Error),
}
