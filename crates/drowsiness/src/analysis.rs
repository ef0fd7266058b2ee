//! Drowsiness check report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::{classify, Classification, Level};
use crate::session::{AbortReason, ObservationResult};

/// Outcome of one drowsiness check, ready for the result screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessReport {
    /// Session identifier for log correlation
    pub session_id: Uuid,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Blink onsets counted during the window
    pub blink_count: u32,

    /// Level derived from the blink count
    pub level: Level,

    /// Whether the full window was observed
    pub completed: bool,

    /// Why the session stopped early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,

    /// Frames run through landmark inference
    pub frames_processed: u32,

    /// Frames with a detected face
    pub faces_detected: u32,
}

impl DrowsinessReport {
    /// Build a report for a session that began at `started_at`
    pub fn new(session_id: Uuid, started_at: DateTime<Utc>, result: &ObservationResult) -> Self {
        Self {
            session_id,
            started_at,
            finished_at: Utc::now(),
            blink_count: result.blink_count,
            level: classify(result.blink_count),
            completed: result.is_complete(),
            abort_reason: result.abort_reason(),
            frames_processed: result.frames_processed,
            faces_detected: result.faces_detected,
        }
    }

    /// The `{blink_count, level}` pair handed to the game surface
    pub fn classification(&self) -> Classification {
        Classification {
            blink_count: self.blink_count,
            level: self.level,
        }
    }

    /// Share of frames in which a face was visible
    pub fn face_ratio(&self) -> f32 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.faces_detected as f32 / self.frames_processed as f32
    }

    /// Whether the blink count is trustworthy enough to act on
    pub fn is_reliable(&self) -> bool {
        self.completed && self.faces_detected > 0
    }
}
