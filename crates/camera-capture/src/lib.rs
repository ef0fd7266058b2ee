//! Camera Capture Library for the drowsiness check
//!
//! Provides the frame source seam used by the observation loop:
//! - `FrameSource` trait (capture / release)
//! - `CaptureGuard` for releasing the device on every exit path
//! - Image-sequence replay source standing in for a webcam

pub mod frame;
pub mod replay;

pub use frame::VideoFrame;
pub use replay::ImageSequenceSource;

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Frame directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No frames found in {}", .0.display())]
    Empty(PathBuf),

    #[error("Failed to decode frame {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

/// A device (or stand-in) producing frames on demand.
///
/// `capture` returning `None` means the device can no longer produce
/// frames. `release` must be safe to call more than once.
pub trait FrameSource {
    /// Pull the next frame
    fn capture(&mut self) -> Option<VideoFrame>;

    /// Close the underlying device handle
    fn release(&mut self);

    /// Whether `release` has been called
    fn is_released(&self) -> bool;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn capture(&mut self) -> Option<VideoFrame> {
        (**self).capture()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_released(&self) -> bool {
        (**self).is_released()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn capture(&mut self) -> Option<VideoFrame> {
        (**self).capture()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_released(&self) -> bool {
        (**self).is_released()
    }
}

/// Frame source with RAII release
pub struct CaptureGuard<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> CaptureGuard<S> {
    /// Take ownership of an acquired source
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: FrameSource> Deref for CaptureGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> DerefMut for CaptureGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for CaptureGuard<S> {
    fn drop(&mut self) {
        if !self.source.is_released() {
            debug!("Releasing frame source");
            self.source.release();
        }
    }
}
