//! Drowsiness check core
//!
//! Blink-count based drowsiness estimation from a webcam feed:
//! - Facial landmark inference (face mesh)
//! - Debounced blink onset detection from eyelid aperture
//! - Fixed-duration observation window
//! - Blink count to level classification

pub mod analysis;
pub mod blink;
pub mod config;
pub mod detector;
pub mod landmarks;
pub mod level;
pub mod session;

pub use analysis::DrowsinessReport;
pub use blink::{detect, BlinkDetector, BlinkState};
pub use config::{DrowsinessConfig, ModelConfig};
pub use detector::FaceMeshLandmarker;
pub use landmarks::{LandmarkInference, LandmarkPoint, LandmarkSet};
pub use level::{classify, classify_raw, Classification, ClassifyError, Level};
pub use session::{
    AbortReason, Clock, Completion, ManualClock, ObservationResult, ObservationWindow,
    SessionError, SystemClock,
};

use thiserror::Error;

/// Drowsiness check error types
#[derive(Error, Debug)]
pub enum DrowsinessError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}
