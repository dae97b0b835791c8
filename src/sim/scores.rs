/// High-score table, persisted between runs.
///
/// ## File format (TOML):
///   ```
///   scores = [12400, 8810, 920]
///   ```
///
/// The list is kept sorted highest first and capped at the configured
/// length. A missing file is an empty table; a malformed one is an error
/// the caller logs before starting with an empty table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;

#[derive(Serialize, Deserialize, Debug, Default)]
struct ScoreFile {
    #[serde(default)]
    scores: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighScores {
    scores: Vec<u32>,
    capacity: usize,
}

impl HighScores {
    pub fn new(capacity: usize) -> Self {
        HighScores { scores: Vec::new(), capacity }
    }

    fn from_scores(mut scores: Vec<u32>, capacity: usize) -> Self {
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.truncate(capacity);
        HighScores { scores, capacity }
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn best(&self) -> Option<u32> {
        self.scores.first().copied()
    }

    /// Record a finished session. Returns the zero-based rank when the
    /// score made the table. Ties rank below the earlier entry.
    pub fn insert(&mut self, score: u32) -> Option<usize> {
        let pos = self
            .scores
            .iter()
            .position(|&s| score > s)
            .unwrap_or(self.scores.len());
        if pos >= self.capacity {
            return None;
        }
        self.scores.insert(pos, score);
        self.scores.truncate(self.capacity);
        Some(pos)
    }

    pub fn load(path: &Path, capacity: usize) -> Result<Self, GameError> {
        if !path.exists() {
            debug!(path = %path.display(), "no high score file yet");
            return Ok(HighScores::new(capacity));
        }
        let text = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ScoreFile = toml::from_str(&text)?;
        Ok(HighScores::from_scores(file.scores, capacity))
    }

    pub fn save(&self, path: &Path) -> Result<(), GameError> {
        let text = toml::to_string(&ScoreFile { scores: self.scores.clone() })?;
        std::fs::write(path, text).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("portal-chase-{}-{name}", std::process::id()))
    }

    #[test]
    fn insert_keeps_order_and_cap() {
        let mut hs = HighScores::new(3);
        assert_eq!(hs.insert(100), Some(0));
        assert_eq!(hs.insert(300), Some(0));
        assert_eq!(hs.insert(200), Some(1));
        assert_eq!(hs.scores(), &[300, 200, 100]);

        assert_eq!(hs.insert(50), None);
        assert_eq!(hs.insert(200), Some(2));
        assert_eq!(hs.scores(), &[300, 200, 200]);
        assert_eq!(hs.best(), Some(300));
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut hs = HighScores::new(0);
        assert_eq!(hs.insert(10), None);
        assert!(hs.scores().is_empty());
    }

    #[test]
    fn missing_file_is_an_empty_table() {
        let hs = HighScores::load(&temp_file("absent.toml"), 10).unwrap();
        assert!(hs.scores().is_empty());
    }

    #[test]
    fn saved_table_loads_back_sorted_and_capped() {
        let path = temp_file("scores.toml");
        std::fs::write(&path, "scores = [5, 40, 12, 7]\n").unwrap();
        let hs = HighScores::load(&path, 3).unwrap();
        assert_eq!(hs.scores(), &[40, 12, 7]);

        hs.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("scores"));
        assert_eq!(HighScores::load(&path, 3).unwrap(), hs);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = temp_file("broken.toml");
        std::fs::write(&path, "scores = [1, \"two\"").unwrap();
        let err = HighScores::load(&path, 10).unwrap_err();
        assert!(matches!(err, GameError::ScoreFormat(_)));
        let _ = std::fs::remove_file(&path);
    }
}
