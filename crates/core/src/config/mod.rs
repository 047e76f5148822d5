use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{song::Lane, LanebeatError, Result};

/// Top-level configuration structure for the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub playfield: Playfield,
    pub judge: JudgeConfig,
    pub effects: EffectsConfig,
    pub storage: StorageConfig,
    /// Capacity of the event store used by capture and playback.
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            playfield: Playfield::default(),
            judge: JudgeConfig::default(),
            effects: EffectsConfig::default(),
            storage: StorageConfig::default(),
            max_events: 2500,
        }
    }
}

impl GameConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings under which notes never move or can never be hit.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(LanebeatError::InvalidConfig(reason.to_string()));
        if self.playfield.note_speed <= 0 {
            return invalid("playfield.note_speed must be positive");
        }
        if self.judge.lookahead == 0 {
            return invalid("judge.lookahead must be at least 1");
        }
        if self.judge.hit_window < 0 {
            return invalid("judge.hit_window must not be negative");
        }
        Ok(())
    }
}

/// Screen geometry shared by the timeline, the hit detector and rendering.
///
/// All values are in screen units; `y` grows downwards and notes fall
/// towards `hit_line_y` at `note_speed` units per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Playfield {
    pub lane_width: i32,
    pub lane_start_x: i32,
    pub hit_line_y: i32,
    pub note_height: i32,
    pub screen_height: i32,
    pub note_speed: i32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            lane_width: 40,
            lane_start_x: 60,
            hit_line_y: 180,
            note_height: 20,
            screen_height: 240,
            note_speed: 3,
        }
    }
}

impl Playfield {
    /// Left edge of a lane.
    pub fn lane_x(&self, lane: Lane) -> i32 {
        self.lane_start_x + lane.index() as i32 * self.lane_width
    }

    /// Signed offset in screen units between an event and the hit line at
    /// `clock`. Positive values are still above the line.
    pub fn offset(&self, timestamp: u32, clock: u32) -> i64 {
        (i64::from(timestamp) - i64::from(clock)) * i64::from(self.note_speed)
    }

    /// Vertical position of a falling note at `clock`.
    pub fn note_y(&self, timestamp: u32, clock: u32) -> i64 {
        i64::from(self.hit_line_y) - self.offset(timestamp, clock)
    }

    /// True once a note has dropped below the bottom edge of the screen.
    pub fn has_passed(&self, timestamp: u32, clock: u32) -> bool {
        self.note_y(timestamp, clock) > i64::from(self.screen_height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Largest distance from the hit line, in screen units, that still scores.
    pub hit_window: i64,
    /// Number of events past the cursor head inspected each tick.
    pub lookahead: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            hit_window: 15,
            lookahead: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub capacity: usize,
    /// Ticks a score popup stays on screen.
    pub lifetime: i32,
    pub rise_per_tick: i32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            capacity: 12,
            lifetime: 20,
            rise_per_tick: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub slot_count: u8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("slots"),
            slot_count: 4,
        }
    }
}
