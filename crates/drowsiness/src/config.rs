//! Drowsiness check configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::landmarks::{LEFT_EYE_LOWER_LID, LEFT_EYE_UPPER_LID};
use crate::DrowsinessError;

/// Blink detection and observation window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrowsinessConfig {
    /// Eyelid aperture below which the eye counts as closed (normalized units)
    pub blink_threshold: f32,

    /// Landmark index of the upper eyelid
    pub upper_lid_index: usize,

    /// Landmark index of the lower eyelid
    pub lower_lid_index: usize,

    /// Observation window length (seconds)
    pub window_seconds: f64,

    /// Pause between samples (seconds)
    pub poll_interval_seconds: f64,
}

impl Default for DrowsinessConfig {
    fn default() -> Self {
        Self {
            blink_threshold: 0.004,
            upper_lid_index: LEFT_EYE_UPPER_LID,
            lower_lid_index: LEFT_EYE_LOWER_LID,
            window_seconds: 10.0,
            poll_interval_seconds: 0.1,
        }
    }
}

impl DrowsinessConfig {
    /// Observation window as a `Duration`
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_seconds)
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_seconds)
    }

    /// Reject values the observation loop cannot run with
    pub fn validate(&self) -> Result<(), DrowsinessError> {
        if !(self.blink_threshold.is_finite() && self.blink_threshold > 0.0) {
            return Err(DrowsinessError::Config(format!(
                "blink_threshold must be positive, got {}",
                self.blink_threshold
            )));
        }
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(DrowsinessError::Config(format!(
                "window_seconds must be positive, got {}",
                self.window_seconds
            )));
        }
        if !(self.poll_interval_seconds.is_finite() && self.poll_interval_seconds >= 0.0) {
            return Err(DrowsinessError::Config(format!(
                "poll_interval_seconds must not be negative, got {}",
                self.poll_interval_seconds
            )));
        }
        if self.upper_lid_index == self.lower_lid_index {
            return Err(DrowsinessError::Config(
                "upper and lower eyelid indices must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Face mesh model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the face mesh ONNX model
    pub path: Option<String>,

    /// Square input resolution expected by the model
    pub input_size: u32,

    /// Minimum face presence probability
    pub face_confidence: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            input_size: 192,
            face_confidence: 0.5,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), DrowsinessError> {
        if self.input_size == 0 {
            return Err(DrowsinessError::Config("model input_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.face_confidence) {
            return Err(DrowsinessError::Config(format!(
                "face_confidence must be within 0..=1, got {}",
                self.face_confidence
            )));
        }
        Ok(())
    }
}
