//! Blink count to drowsiness level classification

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exclusive upper bounds of levels 1..=3; anything above is level 4
pub const LEVEL_THRESHOLDS: [u32; 3] = [10, 20, 30];

/// Classification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Blink count cannot be negative: {0}")]
    NegativeCount(i64),

    #[error("Blink count {0} exceeds the supported range")]
    CountOutOfRange(i64),

    #[error("Level must be within 1..=4, got {0}")]
    LevelOutOfRange(u8),
}

/// Drowsiness level, 1 (awake) to 4 (at the limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::One, Level::Two, Level::Three, Level::Four];

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Short verdict shown alongside the result
    pub fn verdict(&self) -> &'static str {
        match self {
            Level::One => "Wide awake",
            Level::Two => "A little sleepy",
            Level::Three => "Very sleepy",
            Level::Four => "At the limit, take a deep breath",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.as_u8())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for Level {
    type Error = ClassifyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            4 => Ok(Level::Four),
            other => Err(ClassifyError::LevelOutOfRange(other)),
        }
    }
}

/// Map a blink count to its level. First matching bound wins.
pub fn classify(blink_count: u32) -> Level {
    if blink_count < LEVEL_THRESHOLDS[0] {
        Level::One
    } else if blink_count < LEVEL_THRESHOLDS[1] {
        Level::Two
    } else if blink_count < LEVEL_THRESHOLDS[2] {
        Level::Three
    } else {
        Level::Four
    }
}

/// Classify an untyped count, rejecting values no session can produce
pub fn classify_raw(blink_count: i64) -> Result<Level, ClassifyError> {
    if blink_count < 0 {
        return Err(ClassifyError::NegativeCount(blink_count));
    }
    let count = u32::try_from(blink_count).map_err(|_| ClassifyError::CountOutOfRange(blink_count))?;
    Ok(classify(count))
}

/// Result surface handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub blink_count: u32,
    pub level: Level,
}

impl Classification {
    pub fn from_count(blink_count: u32) -> Self {
        Self {
            blink_count,
            level: classify(blink_count),
        }
    }
}
