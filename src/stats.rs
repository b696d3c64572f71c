//! Local persistence for play statistics and the audio toggle.
//!
//! Mirrors the browser-local storage of the front-end: one fixed JSON blob
//! for the counters, one for the audio-enabled flag. Stats change only when
//! a completed quiz is recorded.

use std::io;
use std::path::{Path, PathBuf};

use crate::types::{QuizOutcome, Stats};

const STATS_FILE: &str = "stats.json";
const AUDIO_FILE: &str = "audio.json";

/// Errors while reading or writing the local store
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored data is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// File-backed store rooted at a directory
#[derive(Debug, Clone)]
pub struct StatsStore {
    dir: PathBuf,
}

impl StatsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Load stats, defaulting to zeroed counters when nothing is stored yet.
    pub fn load(&self) -> Result<Stats, StatsError> {
        read_json_or(&self.path(STATS_FILE), Stats::default)
    }

    /// Fold a completed quiz into the stored counters.
    pub fn record(&self, outcome: QuizOutcome) -> Result<Stats, StatsError> {
        let mut stats = self.load()?;
        stats.record(outcome);
        self.save(&stats)?;
        Ok(stats)
    }

    fn save(&self, stats: &Stats) -> Result<(), StatsError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(stats)?;
        std::fs::write(self.path(STATS_FILE), json)?;
        Ok(())
    }

    /// Audio defaults to enabled until the user turns it off.
    pub fn audio_enabled(&self) -> Result<bool, StatsError> {
        read_json_or(&self.path(AUDIO_FILE), || true)
    }

    pub fn set_audio_enabled(&self, enabled: bool) -> Result<(), StatsError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(AUDIO_FILE), serde_json::to_string(&enabled)?)?;
        Ok(())
    }
}

fn read_json_or<T, F>(path: &Path, default: F) -> Result<T, StatsError>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> T,
{
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default()),
        Err(e) => Err(e.into()),
    }
}
