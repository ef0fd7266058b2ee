//! Screen flow: camera → result → game

use drowsiness::DrowsinessReport;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("Cannot {event} while in the {from} stage")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
}

/// Where the user currently is
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Stage {
    /// Waiting for, or running, the blink measurement
    #[default]
    Camera,
    /// Measurement finished, showing the verdict
    Result { report: DrowsinessReport },
    /// Game surface is up
    Game { report: DrowsinessReport, url: String },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Camera => "camera",
            Stage::Result { .. } => "result",
            Stage::Game { .. } => "game",
        }
    }

    pub fn report(&self) -> Option<&DrowsinessReport> {
        match self {
            Stage::Camera => None,
            Stage::Result { report } | Stage::Game { report, .. } => Some(report),
        }
    }

    /// camera → result
    pub fn finish_observation(&mut self, report: DrowsinessReport) -> Result<(), StageError> {
        match self {
            Stage::Camera => {
                self.enter(Stage::Result { report });
                Ok(())
            }
            _ => Err(StageError::InvalidTransition {
                from: self.name(),
                event: "finish an observation",
            }),
        }
    }

    /// result → game
    pub fn start_game(&mut self, url: String) -> Result<(), StageError> {
        match self {
            Stage::Result { report } => {
                let report = report.clone();
                self.enter(Stage::Game { report, url });
                Ok(())
            }
            _ => Err(StageError::InvalidTransition {
                from: self.name(),
                event: "start a game",
            }),
        }
    }

    /// any → camera
    pub fn restart(&mut self) {
        self.enter(Stage::Camera);
    }

    fn enter(&mut self, next: Stage) {
        debug!("Stage {} -> {}", self.name(), next.name());
        *self = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drowsiness::{Completion, Level, ObservationResult};
    use std::time::Duration;
    use uuid::Uuid;

    fn report() -> DrowsinessReport {
        let result = ObservationResult {
            blink_count: 12,
            frames_processed: 100,
            faces_detected: 100,
            elapsed: Duration::from_secs(10),
            completion: Completion::Completed,
        };
        DrowsinessReport::new(Uuid::new_v4(), Utc::now(), &result)
    }

    #[test]
    fn test_happy_path() {
        let mut stage = Stage::default();
        assert_eq!(stage.name(), "camera");
        assert!(stage.report().is_none());

        stage.finish_observation(report()).unwrap();
        assert_eq!(stage.name(), "result");
        assert_eq!(stage.report().map(|r| r.level), Some(Level::Two));

        stage.start_game("http://127.0.0.1:7860/".into()).unwrap();
        assert!(matches!(&stage, Stage::Game { url, .. } if url == "http://127.0.0.1:7860/"));
        assert_eq!(stage.report().map(|r| r.blink_count), Some(12));

        stage.restart();
        assert_eq!(stage, Stage::Camera);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut stage = Stage::Camera;
        assert_eq!(
            stage.start_game("http://x/".into()),
            Err(StageError::InvalidTransition {
                from: "camera",
                event: "start a game"
            })
        );

        stage.finish_observation(report()).unwrap();
        assert!(stage.finish_observation(report()).is_err());
        // failed transitions leave the stage untouched
        assert_eq!(stage.name(), "result");
    }
}
