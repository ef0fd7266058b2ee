//! Debounced blink onset detection
//!
//! A blink is counted on the first frame where the eyelid aperture drops
//! below the threshold. Further closed frames belong to the same blink
//! until the eye opens again, so a long closure counts once.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::DrowsinessConfig;
use crate::landmarks::LandmarkSet;

/// Debounce state carried across frames of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlinkState {
    /// Eye currently closed as part of an already counted blink
    pub in_blink: bool,
}

impl BlinkState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Advance the debounce state by one frame.
///
/// `aperture` is `None` when no face (or no eyelid landmarks) was found;
/// that is handled like an open eye. Returns `true` only on a blink onset.
pub fn detect(aperture: Option<f32>, threshold: f32, state: &mut BlinkState) -> bool {
    match aperture {
        Some(aperture) if aperture < threshold => {
            if state.in_blink {
                false
            } else {
                state.in_blink = true;
                true
            }
        }
        _ => {
            state.in_blink = false;
            false
        }
    }
}

/// Blink detector bound to one eye's landmark pair
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    threshold: f32,
    upper_lid: usize,
    lower_lid: usize,
    state: BlinkState,
}

impl BlinkDetector {
    pub fn new(threshold: f32, upper_lid: usize, lower_lid: usize) -> Self {
        Self {
            threshold,
            upper_lid,
            lower_lid,
            state: BlinkState::default(),
        }
    }

    pub fn from_config(config: &DrowsinessConfig) -> Self {
        Self::new(
            config.blink_threshold,
            config.upper_lid_index,
            config.lower_lid_index,
        )
    }

    /// Process one frame's landmarks, returning whether a blink started
    pub fn detect(&mut self, landmarks: Option<&LandmarkSet>) -> bool {
        let aperture = landmarks.and_then(|l| l.eye_aperture(self.upper_lid, self.lower_lid));
        let onset = detect(aperture, self.threshold, &mut self.state);
        trace!(?aperture, onset, in_blink = self.state.in_blink, "blink step");
        onset
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    /// Forget any blink in progress (start of a new session)
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::from_config(&DrowsinessConfig::default())
    }
}
