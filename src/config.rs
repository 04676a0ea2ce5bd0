//! Configuration file support
//!
//! Everything here is a plain constant at runtime: the scheduler's lookahead
//! interval and window are never derived from measurements.
//!
//! ```toml
//! [tempo]
//! bpm = 120.0
//! beats_per_bar = 4
//!
//! [scheduler]
//! lookahead_interval_ms = 25
//! schedule_ahead_ms = 100
//!
//! [station]
//! slots = 3
//!
//! [audio]
//! max_voices = 16
//! capture_chunk_frames = 4096
//! input = true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::scheduler::SchedulerConfig;
use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tempo: TempoSettings,
    pub scheduler: SchedulerSettings,
    pub station: StationSettings,
    pub audio: AudioSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoSettings {
    /// Metronome tempo in beats per minute
    pub bpm: f64,
    /// Beats per bar; beat 0 of every bar is accented
    pub beats_per_bar: u32,
}

impl Default for TempoSettings {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_bar: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// How often the driving timer fires
    pub lookahead_interval_ms: u64,
    /// How far into the future beats may be pre-scheduled
    pub schedule_ahead_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            lookahead_interval_ms: 25,
            schedule_ahead_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSettings {
    /// Number of loop slots
    pub slots: usize,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self { slots: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Polyphony of the synth/drum voice pool
    pub max_voices: usize,
    /// Frames per capture chunk handed to a recording slot
    pub capture_chunk_frames: usize,
    /// Try to open the default input device for the capture bus
    pub input: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            max_voices: 16,
            capture_chunk_frames: 4096,
            input: true,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tempo.bpm.is_finite() || self.tempo.bpm <= 0.0 {
            return Err(Error::InvalidTempo(self.tempo.bpm));
        }
        if self.tempo.beats_per_bar == 0 {
            return Err(Error::Config("tempo.beats_per_bar must be at least 1".into()));
        }
        if self.scheduler.lookahead_interval_ms == 0 {
            return Err(Error::Config(
                "scheduler.lookahead_interval_ms must be at least 1".into(),
            ));
        }
        if self.scheduler.schedule_ahead_ms == 0 {
            return Err(Error::Config(
                "scheduler.schedule_ahead_ms must be at least 1".into(),
            ));
        }
        if self.station.slots == 0 {
            return Err(Error::Config("station.slots must be at least 1".into()));
        }
        if self.audio.max_voices == 0 || self.audio.capture_chunk_frames == 0 {
            return Err(Error::Config(
                "audio.max_voices and audio.capture_chunk_frames must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            lookahead_interval: Duration::from_millis(self.scheduler.lookahead_interval_ms),
            schedule_ahead: self.scheduler.schedule_ahead_ms as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.station.slots, 3);
        assert_eq!(config.scheduler.lookahead_interval_ms, 25);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str("[tempo]\nbpm = 90.0\n").unwrap();
        assert_eq!(config.tempo.bpm, 90.0);
        assert_eq!(config.tempo.beats_per_bar, 4);
        assert_eq!(config.scheduler.schedule_ahead_ms, 100);
    }

    #[test]
    fn scheduler_config_converts_units() {
        let sc = Config::default().scheduler_config();
        assert_eq!(sc.lookahead_interval, Duration::from_millis(25));
        assert!((sc.schedule_ahead - 0.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_tempo() {
        let err = Config::from_toml_str("[tempo]\nbpm = 0.0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidTempo(_)));
    }

    #[test]
    fn rejects_zero_slots() {
        let err = Config::from_toml_str("[station]\nslots = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("[tempo\nbpm = 1").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
